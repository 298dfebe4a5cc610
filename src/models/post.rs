use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::media::UploadedFile;

/// Maximum number of media files attached to a single post.
pub const MAX_POST_MEDIA: usize = 10;

/// Represents the moderation status of a post.
/// Corresponds to the `post_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "post_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Visible to everyone.
    Published,
    /// Waiting for approval.
    Pending,
    /// Removed by a moderator.
    TakeDown,
}

/// An attachment row about to be inserted into `post_media`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPostMedia {
    pub id: Uuid,
    pub media_url: String,
    pub created_at: DateTime<Utc>,
}

/// A post row plus its attachments, inserted in one transaction.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Uuid,
    pub caption: String,
    pub user_id: Uuid,
    pub subforum_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub media: Vec<NewPostMedia>,
}

/// Multipart input for creating a post.
#[derive(Debug, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "caption is required"))]
    pub caption: String,
    #[validate(required(message = "subforum_id is required and must be a valid id"))]
    pub subforum_id: Option<Uuid>,
    #[validate(length(
        min = 1,
        max = 10,
        message = "post_media must contain between 1 and 10 images"
    ))]
    pub media: Vec<UploadedFile>,
}

/// One row of the post/user/subforum/media projection. A post with several
/// attachments yields one row per attachment; `media_url` is NULL when there are none.
#[derive(Debug, Clone, FromRow)]
pub struct PostProjectionRow {
    pub id: Uuid,
    pub caption: String,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub media_url: Option<String>,
    pub user_id: Uuid,
    pub user_fullname: String,
    pub subforum_id: Uuid,
    pub subforum_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub id: Uuid,
    pub fullname: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSubforum {
    pub id: Uuid,
    pub name: String,
}

/// A fully denormalized post as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: Uuid,
    pub caption: String,
    pub status: PostStatus,
    pub media: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub user: PostAuthor,
    pub subforum: PostSubforum,
}

impl PostDetail {
    /// Folds the per-attachment rows of a single post into one detail.
    /// Returns `None` when `rows` is empty.
    pub fn from_rows(rows: Vec<PostProjectionRow>) -> Option<Self> {
        let mut rows = rows.into_iter();
        let first = rows.next()?;
        let mut media: Vec<String> = first.media_url.clone().into_iter().collect();
        media.extend(rows.filter_map(|row| row.media_url));

        Some(Self {
            id: first.id,
            caption: first.caption,
            status: first.status,
            media,
            created_at: first.created_at,
            updated_at: first.updated_at,
            user: PostAuthor {
                id: first.user_id,
                fullname: first.user_fullname,
            },
            subforum: PostSubforum {
                id: first.subforum_id,
                name: first.subforum_name,
            },
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub post: PostDetail,
}

/// Result of a takedown: the post id, its new status and when it changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStatusChange {
    pub id: Uuid,
    pub status: PostStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostStatusResponse {
    pub post: PostStatusChange,
}

/// A row about to be inserted into `likes`.
#[derive(Debug, Clone)]
pub struct NewLike {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCount {
    pub id: Uuid,
    pub like_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub post: LikeCount,
}
