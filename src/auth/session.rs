use axum::{extract::FromRef, response::Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sqlx::{FromRow, SqlitePool};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{auth::repo_types::UserId, error::AppError, state::AppState};

pub const SESSION_COOKIE: &str = "survey_session";

/// Server-side session. `user_id` is `None` for an anonymous visitor that only
/// carries a flash notice.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub user_id: Option<UserId>,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct SessionRepo {
    db: SqlitePool,
    ttl: Duration,
    cookie_secure: bool,
}

impl FromRef<AppState> for SessionRepo {
    fn from_ref(state: &AppState) -> Self {
        let cfg = &state.config.session;
        Self {
            db: state.db.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
            cookie_secure: cfg.cookie_secure,
        }
    }
}

impl SessionRepo {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            ttl: Duration::days(14),
            cookie_secure: false,
        }
    }

    #[cfg(test)]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Open a new session. `previous` is destroyed first so a login always
    /// rotates the session id.
    pub async fn start(&self, user_id: Option<UserId>, previous: Option<Uuid>) -> Result<Uuid, AppError> {
        let mut tx = self.db.begin().await?;
        if let Some(old) = previous {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(old)
                .execute(&mut *tx)
                .await?;
        }
        let id = Uuid::new_v4();
        let expires_at = (OffsetDateTime::now_utc() + self.ttl).unix_timestamp();
        sqlx::query("INSERT INTO sessions (id, user_id, flash, expires_at) VALUES (?, ?, NULL, ?)")
            .bind(id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        debug!(session_id = %id, ?user_id, "session started");
        Ok(id)
    }

    /// Live session by id; expired rows are removed and reported as absent.
    pub async fn load(&self, id: Uuid) -> Result<Option<SessionRow>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT id, user_id, expires_at FROM sessions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        match row {
            Some(s) if s.expires_at <= OffsetDateTime::now_utc().unix_timestamp() => {
                self.destroy(id).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub async fn destroy(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Queue a one-shot notice for the client's next page. Opens an anonymous
    /// session when the client has none; returns the id to put in the cookie.
    pub async fn flash(&self, current: Option<Uuid>, message: &str) -> Result<Uuid, AppError> {
        if let Some(id) = current {
            let res = sqlx::query("UPDATE sessions SET flash = ? WHERE id = ?")
                .bind(message)
                .bind(id)
                .execute(&self.db)
                .await?;
            if res.rows_affected() > 0 {
                return Ok(id);
            }
        }
        let id = self.start(None, None).await?;
        sqlx::query("UPDATE sessions SET flash = ? WHERE id = ?")
            .bind(message)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(id)
    }

    /// Read and clear the pending notice.
    pub async fn take_flash(&self, id: Uuid) -> Result<Option<String>, AppError> {
        let mut tx = self.db.begin().await?;
        let flash: Option<(Option<String>,)> =
            sqlx::query_as("SELECT flash FROM sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((Some(message),)) = flash else {
            return Ok(None);
        };
        sqlx::query("UPDATE sessions SET flash = NULL WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(message))
    }

    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(OffsetDateTime::now_utc().unix_timestamp())
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }

    /// Cookie carrying `id` back to the client.
    pub fn cookie(&self, id: Uuid) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .max_age(self.ttl)
            .build()
    }

    /// Flash `message` and send the client to `to`.
    pub async fn redirect_with_flash(
        &self,
        jar: CookieJar,
        current: Option<Uuid>,
        message: &str,
        to: &str,
    ) -> Result<(CookieJar, Redirect), AppError> {
        let id = self.flash(current, message).await?;
        Ok((jar.add(self.cookie(id)), Redirect::to(to)))
    }
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
