pub mod chart;
pub mod distribution;
pub mod handlers;

use std::sync::Arc;

use anyhow::Context;

use crate::{error::AppError, state::AppState, survey::repo::SurveyRepo};
use axum::Router;

use self::{
    chart::{BarChart, ChartImage, ChartRenderer},
    distribution::GenderDistribution,
};

pub fn router() -> Router<AppState> {
    handlers::report_routes()
}

/// Count every stored response by gender and draw the bar chart.
pub async fn render_gender_distribution(
    surveys: &SurveyRepo,
    renderer: Arc<dyn ChartRenderer>,
) -> Result<ChartImage, AppError> {
    let responses = surveys.list_all().await?;
    let distribution = GenderDistribution::from_responses(&responses);
    tracing::debug!(responses = responses.len(), "rendering gender chart");

    let chart = BarChart {
        title: "Gender distribution".into(),
        x_label: "Gender".into(),
        y_label: "Responses".into(),
        bars: distribution.bars(),
    };
    let image = tokio::task::spawn_blocking(move || renderer.render(&chart))
        .await
        .context("chart task panicked")??;
    Ok(image)
}
