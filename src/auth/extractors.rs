use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::error::AppError;

/// The verified access-token claims of the caller.
///
/// Only usable on routes behind `AuthMiddleware`, which inserts the claims
/// into the request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().cloned() {
            Some(claims) => ready(Ok(AuthenticatedUser(claims))),
            None => {
                let err = AppError::Unauthorized("invalid or missing access token".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

/// Where a sign-in came from, recorded on the authentication row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub agent: String,
    pub remote_ip: String,
}

impl FromRequest for ClientInfo {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let agent = req
            .headers()
            .get(actix_web::http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let remote_ip = req
            .connection_info()
            .realip_remote_addr()
            .unwrap_or_default()
            .to_string();

        ready(Ok(ClientInfo { agent, remote_ip }))
    }
}
