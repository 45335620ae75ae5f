use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::{AuthUser, ClientSession},
        handlers::take_flash,
        session::SessionRepo,
    },
    error::AppError,
    state::AppState,
    survey::{dto::survey_form, repo::SurveyRepo},
    views,
};

pub fn survey_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/thank_you", get(thank_you))
}

pub async fn index(
    State(sessions): State<SessionRepo>,
    client: ClientSession,
) -> Result<Html<String>, AppError> {
    let flash = take_flash(&sessions, &client).await?;
    Ok(views::index(client.user.as_ref(), flash.as_deref()))
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn submit(
    State(surveys): State<SurveyRepo>,
    State(sessions): State<SessionRepo>,
    auth: AuthUser,
    jar: CookieJar,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<(CookieJar, Redirect), AppError> {
    let answers = survey_form(pairs);
    match surveys.submit(auth.user.id, &answers).await {
        Ok(response_id) => {
            info!(response_id, interests = answers.interests.len(), "survey submitted");
            Ok((jar, Redirect::to("/thank_you")))
        }
        Err(e @ AppError::ForeignKeyViolation) => {
            warn!(error = %e, "survey rejected by store");
            sessions
                .redirect_with_flash(
                    jar,
                    Some(auth.session_id),
                    "Your answers could not be saved. Please try again.",
                    "/",
                )
                .await
        }
        Err(e) => Err(e),
    }
}

pub async fn thank_you(auth: AuthUser) -> Html<String> {
    views::thank_you(&auth.user)
}
