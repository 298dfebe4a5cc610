pub mod auth;
pub mod health;
pub mod moderators;
pub mod posts;
pub mod subforums;

use actix_web::{web, HttpRequest};

use crate::error::{AppError, MALFORMED_REQUEST_MESSAGE};

/// Prefix of every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Registers the API routes. Mounted under `API_PREFIX` behind `AuthMiddleware`.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::signup)
        .service(auth::signin)
        .service(auth::refresh)
        .service(subforums::create_subforum)
        .service(subforums::find_subforums)
        .service(subforums::find_subforum)
        .service(subforums::delete_subforum)
        .service(posts::create_post)
        .service(posts::like_post)
        .service(moderators::take_down_post)
        .service(moderators::add_roles)
        .service(moderators::remove_roles);
}

fn malformed(reason: impl std::fmt::Display, req: &HttpRequest) -> actix_web::Error {
    log::debug!("malformed input on {}: {}", req.path(), reason);
    AppError::BadRequest(MALFORMED_REQUEST_MESSAGE.into()).into()
}

/// Extractor settings that turn undecodable JSON, paths and queries into the
/// standard `fail` envelope.
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, req| malformed(err, req)))
        .app_data(web::PathConfig::default().error_handler(|err, req| malformed(err, req)))
        .app_data(web::QueryConfig::default().error_handler(|err, req| malformed(err, req)));
}
