use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::CredentialsForm,
        extractors::{AuthUser, ClientSession},
        repo::UserRepo,
        services::validate_credentials,
        session::{removal_cookie, SessionRepo},
    },
    error::AppError,
    state::AppState,
    views,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// Pending flash notice for this client, consumed.
pub(crate) async fn take_flash(
    sessions: &SessionRepo,
    client: &ClientSession,
) -> Result<Option<String>, AppError> {
    match client.id() {
        Some(id) => sessions.take_flash(id).await,
        None => Ok(None),
    }
}

pub async fn register_page(
    State(sessions): State<SessionRepo>,
    client: ClientSession,
) -> Result<Html<String>, AppError> {
    let flash = take_flash(&sessions, &client).await?;
    Ok(views::register(flash.as_deref()))
}

#[instrument(skip(users, sessions, client, jar, form))]
pub async fn register(
    State(users): State<UserRepo>,
    State(sessions): State<SessionRepo>,
    client: ClientSession,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<(CookieJar, Redirect), AppError> {
    let username = match validate_credentials(&form.username, &form.password) {
        Ok(u) => u,
        Err(AppError::Validation(msg)) => {
            warn!(%msg, "registration rejected");
            return sessions
                .redirect_with_flash(jar, client.id(), &msg, "/register")
                .await;
        }
        Err(e) => return Err(e),
    };

    match users.create(&username, &form.password).await {
        Ok(user_id) => {
            info!(user_id, %username, "user registered");
            sessions
                .redirect_with_flash(
                    jar,
                    client.id(),
                    "Registration successful! You can now log in.",
                    "/login",
                )
                .await
        }
        Err(AppError::DuplicateUsername) => {
            warn!(%username, "username already registered");
            sessions
                .redirect_with_flash(jar, client.id(), "Username already taken.", "/register")
                .await
        }
        Err(e) => Err(e),
    }
}

pub async fn login_page(
    State(sessions): State<SessionRepo>,
    client: ClientSession,
) -> Result<Response, AppError> {
    if client.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    let flash = take_flash(&sessions, &client).await?;
    Ok(views::login(flash.as_deref()).into_response())
}

#[instrument(skip(users, sessions, client, jar, form))]
pub async fn login(
    State(users): State<UserRepo>,
    State(sessions): State<SessionRepo>,
    client: ClientSession,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let Some(user) = users.authenticate(username, &form.password).await? else {
        // same notice whether the user is unknown or the password is wrong
        warn!(%username, "login failed");
        let status = AppError::InvalidCredentials.status();
        return Ok((status, views::login(Some(INVALID_CREDENTIALS))).into_response());
    };

    let session_id = sessions.start(Some(user.id), client.id()).await?;
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok((jar.add(sessions.cookie(session_id)), Redirect::to("/")).into_response())
}

#[instrument(skip_all, fields(user_id = auth.user.id))]
pub async fn logout(
    State(sessions): State<SessionRepo>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AppError> {
    sessions.destroy(auth.session_id).await?;
    info!("user logged out");
    Ok((jar.remove(removal_cookie()), Redirect::to("/login")))
}
