use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser, error::AppError, report::render_gender_distribution,
    state::AppState, survey::repo::SurveyRepo, views,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/results", get(results))
        .route("/results/chart.png", get(chart_png))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn results(
    State(state): State<AppState>,
    State(surveys): State<SurveyRepo>,
    auth: AuthUser,
) -> Result<Html<String>, AppError> {
    let image = render_gender_distribution(&surveys, state.charts.clone()).await?;
    Ok(views::results(&auth.user, &image.to_base64()))
}

#[instrument(skip_all, fields(user_id = _auth.user.id))]
pub async fn chart_png(
    State(state): State<AppState>,
    State(surveys): State<SurveyRepo>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let image = render_gender_distribution(&surveys, state.charts.clone()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        image.into_bytes(),
    ))
}
