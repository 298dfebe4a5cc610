use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::user::{NewSession, NewUser, UserCredentials};
use crate::models::{PublicUser, Role, RoleRecord};

pub const DUPLICATE_EMAIL_MESSAGE: &str = "this email is already registered, please try signin instead";
pub const REFRESH_TOKEN_COLLISION_MESSAGE: &str = "fail to process your request, please try again";
pub const REFRESH_TOKEN_NOT_FOUND_MESSAGE: &str = "refresh token lookup not found";

#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Creates the user, its first session and its `member` role atomically.
    async fn register(&self, user: NewUser, session: NewSession) -> Result<PublicUser, AppError>;

    /// Stored credentials for `email`, if such a user exists.
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;

    /// Records a session for an already verified user and returns them with
    /// their current roles. Session insert and role lookup share one transaction.
    async fn record_login(
        &self,
        user: UserCredentials,
        session: NewSession,
    ) -> Result<PublicUser, AppError>;

    /// Resolves the owner of a refresh token together with their current roles.
    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<PublicUser, AppError>;
}

pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Current roles of `user_id`, ordered by id.
pub(crate) async fn roles_of<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<RoleRecord>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, RoleRecord>(
        "SELECT r.id, r.name FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = $1
         ORDER BY r.id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

async fn insert_session<'e, E>(executor: E, user_id: Uuid, session: &NewSession) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO authentication (id, refresh_token, last_login, remote_ip, agent, user_id)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(session.id)
    .bind(&session.refresh_token)
    .bind(session.last_login)
    .bind(&session.remote_ip)
    .bind(&session.agent)
    .bind(user_id)
    .execute(executor)
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e, "authentication_refresh_token_key") {
            AppError::BadRequest(REFRESH_TOKEN_COLLISION_MESSAGE.into())
        } else {
            AppError::database("insert authentication", e)
        }
    })?;
    Ok(())
}

#[async_trait]
impl AuthRepository for PgAuthRepository {
    async fn register(&self, user: NewUser, session: NewSession) -> Result<PublicUser, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin registration", e))?;

        sqlx::query(
            "INSERT INTO users (id, fullname, email, password, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(user.id)
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e, "users_email_key") {
                AppError::BadRequest(DUPLICATE_EMAIL_MESSAGE.into())
            } else {
                AppError::database("insert user", e)
            }
        })?;

        insert_session(&mut *tx, user.id, &session).await?;

        sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id)
            .bind(Role::Member.id())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("insert member role", e))?;

        let roles = roles_of(&mut *tx, user.id)
            .await
            .map_err(|e| AppError::database("select roles", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit registration", e))?;

        Ok(PublicUser {
            id: user.id,
            email: user.email,
            fullname: user.fullname,
            roles,
        })
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        sqlx::query_as::<_, UserCredentials>(
            "SELECT id, fullname, email, password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database("select user by email", e))
    }

    async fn record_login(
        &self,
        user: UserCredentials,
        session: NewSession,
    ) -> Result<PublicUser, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin login", e))?;

        insert_session(&mut *tx, user.id, &session).await?;

        let roles = roles_of(&mut *tx, user.id)
            .await
            .map_err(|e| AppError::database("select roles", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit login", e))?;

        Ok(PublicUser {
            id: user.id,
            email: user.email,
            fullname: user.fullname,
            roles,
        })
    }

    async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<PublicUser, AppError> {
        let user: Option<(Uuid, String, String)> = sqlx::query_as(
            "SELECT u.id, u.email, u.fullname FROM authentication a
             JOIN users u ON u.id = a.user_id
             WHERE a.refresh_token = $1",
        )
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database("select user by refresh token", e))?;

        let (id, email, fullname) =
            user.ok_or_else(|| AppError::Unauthorized(REFRESH_TOKEN_NOT_FOUND_MESSAGE.into()))?;

        let roles = roles_of(&self.pool, id)
            .await
            .map_err(|e| AppError::database("select roles", e))?;

        Ok(PublicUser {
            id,
            email,
            fullname,
            roles,
        })
    }
}
