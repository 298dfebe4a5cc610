use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::media::UploadedFile;

/// Represents a subforum as stored in the `subforums` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subforum {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub user_id: Uuid,
    pub icon: String,
    pub banner: String,
    pub created_at: DateTime<Utc>,
}

/// Multipart input for creating a subforum. `icon` and `banner` are the raw uploads.
#[derive(Debug, Validate)]
pub struct CreateSubforumRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(required(message = "icon is required"))]
    pub icon: Option<UploadedFile>,
    #[validate(required(message = "banner is required"))]
    pub banner: Option<UploadedFile>,
}

/// Query string for `GET /subforums`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubforumQuery {
    #[validate(length(min = 1, message = "name is required"))]
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubforumMedia {
    pub icon: String,
    pub banner: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubforumDetail {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub media: SubforumMedia,
}

impl From<Subforum> for SubforumDetail {
    fn from(subforum: Subforum) -> Self {
        Self {
            id: subforum.id,
            name: subforum.name,
            description: subforum.description,
            created_at: subforum.created_at,
            media: SubforumMedia {
                icon: subforum.icon,
                banner: subforum.banner,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubforumResponse {
    pub subforum: SubforumDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubforumListResponse {
    pub subforums: Vec<SubforumDetail>,
}
