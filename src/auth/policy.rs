use axum::extract::FromRef;

use crate::{auth::repo_types::User, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    pub fn can_administer(self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Decides which role an authenticated user holds. Only the designated
/// admin account gets `Role::Admin`.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    admin_username: String,
}

impl FromRef<AppState> for AccessPolicy {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.config.admin.username.clone())
    }
}

impl AccessPolicy {
    pub fn new(admin_username: impl Into<String>) -> Self {
        Self {
            admin_username: admin_username.into(),
        }
    }

    pub fn role_of(&self, user: &User) -> Role {
        if user.username == self.admin_username {
            Role::Admin
        } else {
            Role::Member
        }
    }
}
