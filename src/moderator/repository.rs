use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repository::roles_of;
use crate::db::{self, Violation};
use crate::error::AppError;
use crate::models::RoleRecord;

pub const DUPLICATE_ROLE_MESSAGE: &str = "this user already has that role";
pub const UNKNOWN_USER_OR_ROLE_MESSAGE: &str = "user or role not found";
pub const ROLE_NOT_ASSIGNED_MESSAGE: &str = "role not found for this user";

#[async_trait]
pub trait ModeratorRepository: Send + Sync {
    /// Grants every role in `role_ids` or none of them. Returns the user's
    /// full role set afterwards.
    async fn add_roles(&self, user_id: Uuid, role_ids: &[i32]) -> Result<Vec<RoleRecord>, AppError>;

    /// Revokes every role in `role_ids` or none of them. Returns the roles the
    /// user still holds.
    async fn remove_roles(
        &self,
        user_id: Uuid,
        role_ids: &[i32],
    ) -> Result<Vec<RoleRecord>, AppError>;
}

pub struct PgModeratorRepository {
    pool: PgPool,
}

impl PgModeratorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ModeratorRepository for PgModeratorRepository {
    async fn add_roles(&self, user_id: Uuid, role_ids: &[i32]) -> Result<Vec<RoleRecord>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin add roles", e))?;

        let result = sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, role_id FROM UNNEST($2::int[]) AS role_id",
        )
        .bind(user_id)
        .bind(role_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| match db::violation(&e) {
            Some((Violation::Unique, _)) => AppError::BadRequest(DUPLICATE_ROLE_MESSAGE.into()),
            Some((Violation::ForeignKey, _)) => {
                AppError::BadRequest(UNKNOWN_USER_OR_ROLE_MESSAGE.into())
            }
            None => AppError::database("insert user roles", e),
        })?;

        if result.rows_affected() != role_ids.len() as u64 {
            return Err(AppError::DatabaseError(format!(
                "insert user roles: expected {} rows, inserted {}",
                role_ids.len(),
                result.rows_affected()
            )));
        }

        let roles = roles_of(&mut *tx, user_id)
            .await
            .map_err(|e| AppError::database("select roles", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit add roles", e))?;

        Ok(roles)
    }

    async fn remove_roles(
        &self,
        user_id: Uuid,
        role_ids: &[i32],
    ) -> Result<Vec<RoleRecord>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin remove roles", e))?;

        for role_id in role_ids {
            let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database("delete user role", e))?;

            if result.rows_affected() == 0 {
                return Err(AppError::BadRequest(ROLE_NOT_ASSIGNED_MESSAGE.into()));
            }
        }

        let roles = roles_of(&mut *tx, user_id)
            .await
            .map_err(|e| AppError::database("select roles", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit remove roles", e))?;

        Ok(roles)
    }
}
