use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Permission grants a user can hold. The discriminants are the `roles.id`
/// values seeded by the initial migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    CreateSubforum = 1,
    UpdateSubforum = 2,
    DeleteSubforum = 3,
    Member = 4,
    DeletePost = 5,
    ApprovePost = 6,
    TakeDownPost = 7,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::CreateSubforum,
        Role::UpdateSubforum,
        Role::DeleteSubforum,
        Role::Member,
        Role::DeletePost,
        Role::ApprovePost,
        Role::TakeDownPost,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::CreateSubforum => "create_subforum",
            Role::UpdateSubforum => "update_subforum",
            Role::DeleteSubforum => "delete_subforum",
            Role::Member => "member",
            Role::DeletePost => "delete_post",
            Role::ApprovePost => "approve_post",
            Role::TakeDownPost => "take_down_post",
        }
    }

    pub fn from_id(id: i32) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.id() == id)
    }

    pub fn record(self) -> RoleRecord {
        RoleRecord {
            id: self.id(),
            name: self.name().to_string(),
        }
    }
}

/// A role as stored in the `roles` table and embedded in responses and tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RoleRecord {
    pub id: i32,
    pub name: String,
}

/// A row about to be inserted into `users`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The columns of `users` needed to authenticate a login attempt.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub password: String,
}

/// A row about to be inserted into `authentication`: one per sign-in session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub refresh_token: String,
    pub last_login: DateTime<Utc>,
    pub remote_ip: String,
    pub agent: String,
}

/// The user fields that may leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
    pub roles: Vec<RoleRecord>,
}

impl PublicUser {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r.id == role.id())
    }
}
