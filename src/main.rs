mod admin;
mod app;
mod auth;
mod config;
mod db;
mod error;
mod report;
mod state;
mod survey;
mod views;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let default_filter = if config::env_flag("APP_DEBUG", true) {
        "survey=debug,axum=info,tower_http=info,sqlx=warn"
    } else {
        "survey=info,axum=info,tower_http=info,sqlx=warn"
    };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    let config = app_state.config.clone();
    tracing::info!(
        database = %config.database_url,
        admin = %config.admin.username,
        debug = config.debug,
        "survey service starting"
    );

    let app = app::build_app(app_state);
    app::serve(app, &config).await
}
