use crate::config::AppConfig;
use crate::db;
use crate::report::chart::{ChartRenderer, PlottersRenderer};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub charts: Arc<dyn ChartRenderer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let state = Self::with_config(config).await?;
        db::log_store_summary(&state.db).await?;
        Ok(state)
    }

    /// Connect, run bootstrap and wire the default chart renderer.
    pub async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::bootstrap(&pool, &config).await?;
        let charts = Arc::new(PlottersRenderer::default()) as Arc<dyn ChartRenderer>;
        Ok(Self::from_parts(pool, Arc::new(config), charts))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, charts: Arc<dyn ChartRenderer>) -> Self {
        Self { db, config, charts }
    }

    /// Fresh bootstrapped state over a private in-memory database.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::with_config(AppConfig::for_tests())
            .await
            .expect("in-memory state")
    }
}
