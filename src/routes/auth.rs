use actix_web::cookie::{time::Duration, Cookie};
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};

use crate::auth::{
    AuthResponse, AuthService, ClientInfo, LoginRequest, RegisterRequest, REFRESH_TOKEN_COOKIE,
};
use crate::error::AppError;
use crate::response::ApiResponse;

/// Path the refresh cookie is scoped to.
const REFRESH_COOKIE_PATH: &str = "/api/v1/refresh";

fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(REFRESH_TOKEN_COOKIE, token.to_string())
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .max_age(Duration::weeks(1))
        .finish()
}

fn auth_response(status: StatusCode, auth: AuthResponse) -> HttpResponse {
    HttpResponse::build(status)
        .cookie(refresh_cookie(&auth.refresh_token))
        .json(ApiResponse::success(status, auth))
}

/// Register a new user
///
/// Creates the account with the `member` role and signs it in.
#[post("/signup")]
pub async fn signup(
    service: web::Data<AuthService>,
    client: ClientInfo,
    input: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let auth = service.register(input.into_inner(), client).await?;
    Ok(auth_response(StatusCode::CREATED, auth))
}

/// Login user
#[post("/signin")]
pub async fn signin(
    service: web::Data<AuthService>,
    client: ClientInfo,
    input: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let auth = service.login(input.into_inner(), client).await?;
    Ok(auth_response(StatusCode::OK, auth))
}

/// Exchange the refresh-token cookie for a new access token.
#[get("/refresh")]
pub async fn refresh(
    service: web::Data<AuthService>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let cookie = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("refresh token is missing".into()))?;

    let auth = service.refresh(cookie.value()).await?;
    Ok(auth_response(StatusCode::OK, auth))
}
