#![doc = "The `code_roast` library crate."]
#![doc = ""]
#![doc = "Forum backend: accounts with JWT access tokens and refresh cookies, subforums,"]
#![doc = "image posts, likes and role-based moderation. The binary (`main.rs`) reads the"]
#![doc = "configuration, opens the database and serves the app assembled here."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod media;
pub mod moderator;
pub mod models;
pub mod post;
pub mod response;
pub mod routes;
pub mod subforum;

use std::sync::Arc;

use actix_web::web;
use sqlx::PgPool;

use crate::auth::{AuthMiddleware, AuthRepository, AuthService, PgAuthRepository, TokenIssuer};
use crate::media::ImageUploader;
use crate::moderator::{ModeratorRepository, ModeratorService, PgModeratorRepository};
use crate::post::{PgPostRepository, PostRepository, PostService};
use crate::subforum::{PgSubforumRepository, SubforumRepository, SubforumService};

/// The storage backends the services are built on.
pub struct Repositories {
    pub auth: Arc<dyn AuthRepository>,
    pub moderators: Arc<dyn ModeratorRepository>,
    pub subforums: Arc<dyn SubforumRepository>,
    pub posts: Arc<dyn PostRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            auth: Arc::new(PgAuthRepository::new(pool.clone())),
            moderators: Arc::new(PgModeratorRepository::new(pool.clone())),
            subforums: Arc::new(PgSubforumRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool)),
        }
    }
}

/// Shared application state: the token issuer and one instance of each service.
/// Cloning is cheap; every worker gets a clone.
#[derive(Clone)]
pub struct AppState {
    tokens: web::Data<TokenIssuer>,
    auth: web::Data<AuthService>,
    moderators: web::Data<ModeratorService>,
    subforums: web::Data<SubforumService>,
    posts: web::Data<PostService>,
}

impl AppState {
    pub fn new(
        tokens: TokenIssuer,
        repos: Repositories,
        uploader: Arc<dyn ImageUploader>,
    ) -> Self {
        Self {
            auth: web::Data::new(AuthService::new(repos.auth, tokens.clone())),
            moderators: web::Data::new(ModeratorService::new(repos.moderators)),
            subforums: web::Data::new(SubforumService::new(repos.subforums, uploader.clone())),
            posts: web::Data::new(PostService::new(repos.posts, uploader)),
            tokens: web::Data::new(tokens),
        }
    }

    /// Registers the state, the health check and the authenticated API scope.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.tokens.clone())
            .app_data(self.auth.clone())
            .app_data(self.moderators.clone())
            .app_data(self.subforums.clone())
            .app_data(self.posts.clone())
            .configure(routes::extractor_config)
            .service(routes::health::health)
            .service(
                web::scope(routes::API_PREFIX)
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            );
    }
}
