use std::sync::Arc;

use actix_web::web;
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::auth::repository::AuthRepository;
use crate::auth::{
    hash_password, verify_password, AuthResponse, ClientInfo, LoginRequest, RegisterRequest,
    TokenIssuer, INVALID_CREDENTIALS_MESSAGE,
};
use crate::error::AppError;
use crate::models::user::{NewSession, NewUser};

/// Signup, signin and refresh-token exchange.
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    tokens: TokenIssuer,
}

fn new_session(client: ClientInfo) -> NewSession {
    NewSession {
        id: Uuid::now_v7(),
        refresh_token: Uuid::now_v7().to_string(),
        last_login: Utc::now(),
        remote_ip: client.remote_ip,
        agent: client.agent,
    }
}

/// Runs a bcrypt job on the blocking thread pool.
async fn off_worker<T, F>(job: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    web::block(job)
        .await
        .map_err(|e| AppError::InternalServerError(format!("password job did not finish: {}", e)))?
}

fn invalid_credentials() -> AppError {
    AppError::BadRequest(INVALID_CREDENTIALS_MESSAGE.into())
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, tokens: TokenIssuer) -> Self {
        Self { repo, tokens }
    }

    pub async fn register(
        &self,
        input: RegisterRequest,
        client: ClientInfo,
    ) -> Result<AuthResponse, AppError> {
        input.validate()?;

        let password = input.password;
        let password_hash = off_worker(move || hash_password(&password)).await?;
        let user = NewUser {
            id: Uuid::now_v7(),
            fullname: input.fullname,
            email: input.email,
            password_hash,
            created_at: Utc::now(),
        };
        let session = new_session(client);
        let refresh_token = session.refresh_token.clone();

        let user = self.repo.register(user, session).await?;
        let access_token = self.tokens.issue(&user)?;
        log::info!("registered user {}", user.id);

        Ok(AuthResponse {
            user,
            access_token,
            refresh_token,
        })
    }

    pub async fn login(
        &self,
        input: LoginRequest,
        client: ClientInfo,
    ) -> Result<AuthResponse, AppError> {
        input.validate()?;

        let credentials = self
            .repo
            .find_credentials(&input.email)
            .await?
            .ok_or_else(invalid_credentials)?;

        // nothing is written and no connection is held while bcrypt runs
        let password = input.password;
        let stored = credentials.password.clone();
        if !off_worker(move || verify_password(&password, &stored)).await? {
            return Err(invalid_credentials());
        }

        let session = new_session(client);
        let refresh_token = session.refresh_token.clone();
        let user = self.repo.record_login(credentials, session).await?;
        let access_token = self.tokens.issue(&user)?;
        log::info!("user {} signed in", user.id);

        Ok(AuthResponse {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Issues a fresh access token for the owner of `refresh_token`. The refresh
    /// token itself is returned unchanged.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let user = self.repo.find_by_refresh_token(refresh_token).await?;
        let access_token = self.tokens.issue(&user)?;
        log::debug!("refreshed access token for user {}", user.id);

        Ok(AuthResponse {
            user,
            access_token,
            refresh_token: refresh_token.to_string(),
        })
    }
}
