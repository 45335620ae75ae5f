use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    policy::AccessPolicy,
    repo::UserRepo,
    repo_types::User,
    session::{SessionRepo, SessionRow, SESSION_COOKIE},
};
use crate::{error::AppError, state::AppState};

/// Whatever the client's cookie resolves to: no session, an anonymous
/// session, or an authenticated one.
#[derive(Debug, Clone, Default)]
pub struct ClientSession {
    pub session: Option<SessionRow>,
    pub user: Option<User>,
}

impl ClientSession {
    pub fn id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ClientSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(raw) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
            return Ok(Self::default());
        };
        let Ok(id) = Uuid::parse_str(&raw) else {
            debug!("malformed session cookie ignored");
            return Ok(Self::default());
        };

        let Some(session) = SessionRepo::from_ref(state).load(id).await? else {
            return Ok(Self::default());
        };
        let user = match session.user_id {
            Some(uid) => UserRepo::from_ref(state).find_by_id(uid).await?,
            None => None,
        };
        Ok(Self {
            session: Some(session),
            user,
        })
    }
}

/// Requires an authenticated session, otherwise redirects to `/login`.
pub struct AuthUser {
    pub user: User,
    pub session_id: Uuid,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let client = ClientSession::from_request_parts(parts, state).await?;
        match (client.session, client.user) {
            (Some(session), Some(user)) => Ok(AuthUser {
                user,
                session_id: session.id,
            }),
            _ => Err(AppError::Unauthorized),
        }
    }
}

/// Requires the admin role; anyone else is sent back to sign-in.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser { user, .. } = AuthUser::from_request_parts(parts, state).await?;
        if !AccessPolicy::from_ref(state).role_of(&user).can_administer() {
            warn!(user_id = user.id, username = %user.username, "admin gateway denied");
            return Err(AppError::Unauthorized);
        }
        Ok(AdminUser(user))
    }
}
