pub mod extractors;
pub mod middleware;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::PublicUser;

// Re-export necessary items
pub use extractors::{AuthenticatedUser, ClientInfo};
pub use middleware::{AuthMiddleware, RoleGuard};
pub use password::{hash_password, verify_password};
pub use repository::{AuthRepository, PgAuthRepository};
pub use service::AuthService;
pub use token::{Claims, TokenIssuer};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
/// Shared by unknown-email and wrong-password logins so the two are indistinguishable.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "email or password is incorrect";

/// Represents the payload for a user login request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "fullname is required"))]
    pub fullname: String,
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(must_match(
        other = "password",
        message = "password confirmation must match password"
    ))]
    pub password_confirmation: String,
}

/// Returned by signup, signin and refresh.
/// The refresh token is also set as an HTTP-only cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}
