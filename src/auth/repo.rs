use axum::extract::FromRef;
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tracing::warn;

use crate::{
    auth::{
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{User, UserId},
    },
    error::AppError,
    state::AppState,
};

/// Credential store over the `users` table.
#[derive(Clone)]
pub struct UserRepo {
    db: SqlitePool,
}

impl FromRef<AppState> for UserRepo {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.db.clone())
    }
}

impl UserRepo {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Hash `password` and insert a new user.
    /// Fails with `DuplicateUsername` when the name is taken.
    pub async fn create(&self, username: &str, password: &str) -> Result<UserId, AppError> {
        let hash = hash_password_blocking(password).await?;
        let res = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(&hash)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.db)
        .await?;
        Ok(res.last_insert_rowid())
    }

    /// Find a user by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Look the user up and check the password. Unknown user, wrong password
    /// and an unreadable stored hash all come back as `None`.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, AppError> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };
        match verify_password_blocking(password, &user.password_hash).await {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(e) => {
                warn!(error = %e, user_id = user.id, "stored password hash unreadable");
                Ok(None)
            }
        }
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, AppError> {
        Ok(self.authenticate(username, password).await?.is_some())
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }

    /// Rename and/or reset the password. Both changes commit together or
    /// not at all.
    pub async fn update(
        &self,
        id: UserId,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), AppError> {
        let hash = match password {
            Some(p) => Some(hash_password_blocking(p).await?),
            None => None,
        };

        let mut tx = self.db.begin().await?;
        let exists: Option<(UserId,)> = sqlx::query_as("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound);
        }
        if let Some(username) = username {
            sqlx::query("UPDATE users SET username = ? WHERE id = ?")
                .bind(username)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(hash) = &hash {
            sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
                .bind(hash)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Refused with `ForeignKeyViolation` while the user still owns responses.
    pub async fn delete(&self, id: UserId) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> UserRepo {
        UserRepo::from_ref(&AppState::in_memory().await)
    }

    #[tokio::test]
    async fn verify_accepts_correct_and_rejects_wrong_password() {
        let users = repo().await;
        users.create("alice", "pw1").await.unwrap();

        assert!(users.verify("alice", "pw1").await.unwrap());
        assert!(!users.verify("alice", "pw2").await.unwrap());
    }

    #[tokio::test]
    async fn verify_unknown_user_is_false_not_error() {
        let users = repo().await;
        assert!(!users.verify("nobody", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_reported_and_not_inserted() {
        let users = repo().await;
        users.create("bob", "pw1").await.unwrap();

        let err = users.create("bob", "other").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));

        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = 'bob'")
            .fetch_one(&users.db)
            .await
            .unwrap();
        assert_eq!(n, 1);
        // the first password still works
        assert!(users.verify("bob", "pw1").await.unwrap());
    }

    #[tokio::test]
    async fn stored_password_is_hashed() {
        let users = repo().await;
        users.create("carol", "plain-secret").await.unwrap();
        let user = users.find_by_username("carol").await.unwrap().unwrap();
        assert_ne!(user.password_hash, "plain-secret");
        assert!(user.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn corrupted_hash_fails_closed() {
        let users = repo().await;
        let id = users.create("dave", "pw").await.unwrap();
        sqlx::query("UPDATE users SET password_hash = 'garbage' WHERE id = ?")
            .bind(id)
            .execute(&users.db)
            .await
            .unwrap();
        assert!(!users.verify("dave", "pw").await.unwrap());
    }

    #[tokio::test]
    async fn update_and_delete_missing_user_is_not_found() {
        let users = repo().await;
        assert!(matches!(users.update(999, Some("x"), None).await, Err(AppError::NotFound)));
        assert!(matches!(users.delete(999).await, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn rename_to_taken_username_is_duplicate() {
        let users = repo().await;
        let id = users.create("erin", "pw").await.unwrap();
        let err = users.update(id, Some("admin"), Some("new-pw")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
        // the password change was rolled back with the rename
        assert!(users.verify("erin", "pw").await.unwrap());
        assert!(!users.verify("erin", "new-pw").await.unwrap());
    }

    #[tokio::test]
    async fn update_applies_both_changes() {
        let users = repo().await;
        let id = users.create("frank", "pw").await.unwrap();
        users.update(id, Some("frankie"), Some("pw2")).await.unwrap();
        assert!(users.find_by_username("frank").await.unwrap().is_none());
        assert!(users.verify("frankie", "pw2").await.unwrap());
    }
}
