use std::{str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tracing::{info, warn};

use crate::{
    auth::{repo::UserRepo, session::SessionRepo},
    config::AppConfig,
    error::AppError,
    survey::repo::SurveyRepo,
};

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("parse database url {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool = SqlitePoolOptions::new().max_connections(10);
    if database_url.contains(":memory:") {
        // an in-memory database lives and dies with its single connection
        pool = pool
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    pool.connect_with(options)
        .await
        .context("connect to database")
}

/// Bring the store to a servable state: schema, stale sessions, default admin.
/// Safe to run on every start.
pub async fn bootstrap(db: &SqlitePool, config: &AppConfig) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;

    let purged = SessionRepo::new(db.clone())
        .purge_expired()
        .await
        .context("purge expired sessions")?;
    if purged > 0 {
        info!(purged, "expired sessions removed");
    }

    let users = UserRepo::new(db.clone());
    let admin = &config.admin;
    if users
        .find_by_username(&admin.username)
        .await
        .context("look up admin user")?
        .is_some()
    {
        info!(username = %admin.username, "admin user already exists");
        return Ok(());
    }

    match users.create(&admin.username, &admin.password).await {
        Ok(id) => info!(user_id = id, username = %admin.username, "admin user created"),
        // another process seeded it between our check and insert
        Err(AppError::DuplicateUsername) => {
            warn!(username = %admin.username, "admin user created concurrently")
        }
        Err(e) => return Err(anyhow::Error::new(e).context("create admin user")),
    }
    Ok(())
}

/// Row counts logged once the store is ready.
pub async fn log_store_summary(db: &SqlitePool) -> anyhow::Result<()> {
    let users = UserRepo::new(db.clone()).count().await?;
    let responses = SurveyRepo::new(db.clone()).count().await?;
    info!(users, responses, "store ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let config = AppConfig::for_tests();
        let db = connect(&config.database_url).await.unwrap();
        bootstrap(&db, &config).await.unwrap();
        bootstrap(&db, &config).await.unwrap();

        let (admins,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(&config.admin.username)
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(admins, 1);
    }

    #[tokio::test]
    async fn bootstrap_seeds_working_admin_credentials() {
        let config = AppConfig::for_tests();
        let db = connect(&config.database_url).await.unwrap();
        bootstrap(&db, &config).await.unwrap();

        let users = UserRepo::new(db);
        assert!(users.verify("admin", "admin123").await.unwrap());
        assert!(!users.verify("admin", "admin").await.unwrap());
    }
}
