//! Granting and revoking roles.

pub mod repository;
pub mod service;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::RoleRecord;

pub use repository::{ModeratorRepository, PgModeratorRepository};
pub use service::ModeratorService;

/// Body of `POST /moderators` and `DELETE /moderators`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateRoleRequest {
    #[validate(required(message = "user_id is required"))]
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, message = "role_id must contain at least one role"))]
    pub role_id: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoles {
    pub id: Uuid,
    pub roles: Vec<RoleRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateRoleResponse {
    pub user: UserRoles,
}
