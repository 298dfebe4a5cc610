use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{self, Violation};
use crate::error::AppError;
use crate::models::post::{LikeCount, NewLike, NewPost, PostProjectionRow, PostStatusChange};
use crate::models::{PostDetail, PostStatus};

pub const POST_NOT_FOUND_MESSAGE: &str = "post not found";
pub const DUPLICATE_LIKE_MESSAGE: &str = "you already liked this post";
pub const UNKNOWN_SUBFORUM_MESSAGE: &str =
    "failed to upload new post, enter correct information and try again";

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Stores the post and its media, then reads back the joined projection.
    async fn create(&self, post: NewPost) -> Result<PostDetail, AppError>;

    /// Marks the post as taken down. `NotFound` when no such post exists.
    async fn take_down(&self, id: Uuid, at: DateTime<Utc>) -> Result<PostStatusChange, AppError>;

    /// Records the like and returns the post's like count afterwards.
    async fn like(&self, like: NewLike) -> Result<LikeCount, AppError>;
}

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: NewPost) -> Result<PostDetail, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin create post", e))?;

        sqlx::query(
            "INSERT INTO posts (id, caption, user_id, subforum_id, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(post.id)
        .bind(&post.caption)
        .bind(post.user_id)
        .bind(post.subforum_id)
        .bind(PostStatus::Published)
        .bind(post.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if db::is_foreign_key_violation(&e) {
                AppError::BadRequest(UNKNOWN_SUBFORUM_MESSAGE.into())
            } else {
                AppError::database("insert post", e)
            }
        })?;

        let ids: Vec<Uuid> = post.media.iter().map(|m| m.id).collect();
        let urls: Vec<String> = post.media.iter().map(|m| m.media_url.clone()).collect();
        let created: Vec<DateTime<Utc>> = post.media.iter().map(|m| m.created_at).collect();

        sqlx::query(
            "INSERT INTO post_media (id, post_id, media_url, created_at)
             SELECT m.id, $1, m.media_url, m.created_at
             FROM UNNEST($2::uuid[], $3::text[], $4::timestamptz[]) AS m(id, media_url, created_at)",
        )
        .bind(post.id)
        .bind(ids)
        .bind(urls)
        .bind(created)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database("insert post media", e))?;

        let rows = sqlx::query_as::<_, PostProjectionRow>(
            "SELECT p.id, p.caption, p.status, p.created_at, p.updated_at, pm.media_url,
                    u.id AS user_id, u.fullname AS user_fullname,
                    sf.id AS subforum_id, sf.name AS subforum_name
             FROM posts p
             JOIN users u ON u.id = p.user_id
             JOIN subforums sf ON sf.id = p.subforum_id
             LEFT JOIN post_media pm ON pm.post_id = p.id
             WHERE p.id = $1
             ORDER BY pm.created_at, pm.id",
        )
        .bind(post.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| AppError::database("select post projection", e))?;

        let detail = PostDetail::from_rows(rows).ok_or_else(|| {
            AppError::DatabaseError(format!("post {} missing right after insert", post.id))
        })?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit create post", e))?;

        Ok(detail)
    }

    async fn take_down(&self, id: Uuid, at: DateTime<Utc>) -> Result<PostStatusChange, AppError> {
        let row: Option<(Uuid, PostStatus, Option<DateTime<Utc>>)> = sqlx::query_as(
            "UPDATE posts SET status = $1, updated_at = $2 WHERE id = $3
             RETURNING id, status, updated_at",
        )
        .bind(PostStatus::TakeDown)
        .bind(at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database("update post status", e))?;

        let (id, status, updated_at) =
            row.ok_or_else(|| AppError::NotFound(POST_NOT_FOUND_MESSAGE.into()))?;

        Ok(PostStatusChange {
            id,
            status,
            updated_at: updated_at.unwrap_or(at),
        })
    }

    async fn like(&self, like: NewLike) -> Result<LikeCount, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database("begin like post", e))?;

        let result = sqlx::query("INSERT INTO likes (post_id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(like.post_id)
            .bind(like.user_id)
            .bind(like.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| match db::violation(&e) {
                Some((Violation::Unique, _)) => AppError::BadRequest(DUPLICATE_LIKE_MESSAGE.into()),
                Some((Violation::ForeignKey, _)) => {
                    AppError::NotFound(POST_NOT_FOUND_MESSAGE.into())
                }
                None => AppError::database("insert like", e),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::DatabaseError(
                "insert like: no rows affected".into(),
            ));
        }

        let like_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(like.post_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::database("count likes", e))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database("commit like post", e))?;

        Ok(LikeCount {
            id: like.post_id,
            like_count,
        })
    }
}
