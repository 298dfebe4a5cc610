use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Subforum;

pub const SUBFORUM_NOT_FOUND_MESSAGE: &str = "subforum not found";

#[async_trait]
pub trait SubforumRepository: Send + Sync {
    async fn create(&self, subforum: Subforum) -> Result<Subforum, AppError>;
    async fn find_by_name(&self, name: &str) -> Result<Vec<Subforum>, AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subforum>, AppError>;
    /// Deletes subforum `id` only if `user_id` owns it. `NotFound` otherwise.
    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError>;
}

pub struct PgSubforumRepository {
    pool: PgPool,
}

impl PgSubforumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubforumRepository for PgSubforumRepository {
    async fn create(&self, subforum: Subforum) -> Result<Subforum, AppError> {
        sqlx::query_as::<_, Subforum>(
            "INSERT INTO subforums (id, name, description, user_id, icon, banner, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, name, description, user_id, icon, banner, created_at",
        )
        .bind(subforum.id)
        .bind(&subforum.name)
        .bind(&subforum.description)
        .bind(subforum.user_id)
        .bind(&subforum.icon)
        .bind(&subforum.banner)
        .bind(subforum.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database("insert subforum", e))
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Subforum>, AppError> {
        sqlx::query_as::<_, Subforum>(
            "SELECT id, name, description, user_id, icon, banner, created_at
             FROM subforums WHERE name = $1
             ORDER BY created_at DESC",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database("select subforums by name", e))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subforum>, AppError> {
        sqlx::query_as::<_, Subforum>(
            "SELECT id, name, description, user_id, icon, banner, created_at
             FROM subforums WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database("select subforum by id", e))
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin delete subforum", e))?;

        let result = sqlx::query("DELETE FROM subforums WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database("delete subforum", e))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(SUBFORUM_NOT_FOUND_MESSAGE.into()));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit delete subforum", e))
    }
}
