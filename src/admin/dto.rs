use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo_types::{User, UserId};

/// Full user row as the admin sees it, stored hash included.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserRecord {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            password_hash: u.password_hash,
            created_at: u.created_at,
        }
    }
}

/// Passwords arrive in plaintext and are hashed before storage.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateResponseRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub comments: String,
}
