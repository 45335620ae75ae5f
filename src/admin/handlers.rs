use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    admin::dto::{CreateResponseRequest, CreateUserRequest, UpdateUserRequest, UserRecord},
    auth::{
        extractors::AdminUser,
        policy::AccessPolicy,
        repo::UserRepo,
        repo_types::UserId,
        services::{is_valid_username, validate_credentials},
    },
    error::AppError,
    state::AppState,
    survey::{
        repo::SurveyRepo,
        repo_types::{NewSurveyResponse, ResponseId, SurveyResponse, SurveyResponsePatch},
    },
    views,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(overview))
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/admin/responses", get(list_responses).post(create_response))
        .route(
            "/admin/responses/:id",
            get(get_response).put(update_response).delete(delete_response),
        )
}

pub async fn overview(
    State(users): State<UserRepo>,
    State(surveys): State<SurveyRepo>,
    AdminUser(admin): AdminUser,
) -> Result<Html<String>, AppError> {
    let all_users = users.list_all().await?;
    let responses = surveys.list_all().await?;
    Ok(views::admin_overview(&admin, &all_users, &responses))
}

// --- users ---

pub async fn list_users(
    State(users): State<UserRepo>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserRecord>>, AppError> {
    let all = users.list_all().await?;
    Ok(Json(all.into_iter().map(UserRecord::from).collect()))
}

#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn create_user(
    State(users): State<UserRepo>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserRecord>), AppError> {
    let username = validate_credentials(&body.username, &body.password)?;
    let id = users.create(&username, &body.password).await?;
    info!(user_id = id, %username, "admin created user");
    let user = users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(users): State<UserRepo>,
    _admin: AdminUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserRecord>, AppError> {
    let user = users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(admin = %admin.username, user_id = id))]
pub async fn update_user(
    State(users): State<UserRepo>,
    State(policy): State<AccessPolicy>,
    AdminUser(admin): AdminUser,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserRecord>, AppError> {
    let target = users.find_by_id(id).await?.ok_or(AppError::NotFound)?;

    let username = body.username.as_deref().map(str::trim);
    if let Some(username) = username {
        if !is_valid_username(username) {
            return Err(AppError::Validation(
                "Username must be 1 to 100 characters without spaces.".into(),
            ));
        }
        if policy.role_of(&target).can_administer() && username != target.username {
            return Err(AppError::Validation(
                "The designated admin account cannot be renamed.".into(),
            ));
        }
    }
    if body.password.as_deref() == Some("") {
        return Err(AppError::Validation("Password is required.".into()));
    }

    users.update(id, username, body.password.as_deref()).await?;
    info!("admin updated user");
    let user = users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(admin = %admin.username, user_id = id))]
pub async fn delete_user(
    State(users): State<UserRepo>,
    State(policy): State<AccessPolicy>,
    AdminUser(admin): AdminUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    let target = users.find_by_id(id).await?.ok_or(AppError::NotFound)?;
    if policy.role_of(&target).can_administer() {
        return Err(AppError::Validation(
            "The designated admin account cannot be deleted.".into(),
        ));
    }
    users.delete(id).await?;
    info!("admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

// --- survey responses ---

pub async fn list_responses(
    State(surveys): State<SurveyRepo>,
    _admin: AdminUser,
) -> Result<Json<Vec<SurveyResponse>>, AppError> {
    Ok(Json(surveys.list_all().await?))
}

#[instrument(skip_all, fields(admin = %admin.username, owner = body.user_id))]
pub async fn create_response(
    State(surveys): State<SurveyRepo>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateResponseRequest>,
) -> Result<(StatusCode, Json<SurveyResponse>), AppError> {
    let answers = NewSurveyResponse {
        name: body.name,
        age: body.age,
        gender: body.gender,
        interests: body.interests,
        comments: body.comments,
    };
    let id = surveys.submit(body.user_id, &answers).await?;
    info!(response_id = id, "admin created survey response");
    let created = surveys.find(id).await?.ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_response(
    State(surveys): State<SurveyRepo>,
    _admin: AdminUser,
    Path(id): Path<ResponseId>,
) -> Result<Json<SurveyResponse>, AppError> {
    let found = surveys.find(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(found))
}

#[instrument(skip_all, fields(admin = %admin.username, response_id = id))]
pub async fn update_response(
    State(surveys): State<SurveyRepo>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ResponseId>,
    Json(patch): Json<SurveyResponsePatch>,
) -> Result<Json<SurveyResponse>, AppError> {
    let updated = surveys.update(id, &patch).await?;
    info!("admin updated survey response");
    Ok(Json(updated))
}

#[instrument(skip_all, fields(admin = %admin.username, response_id = id))]
pub async fn delete_response(
    State(surveys): State<SurveyRepo>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ResponseId>,
) -> Result<StatusCode, AppError> {
    surveys.delete(id).await?;
    info!("admin deleted survey response");
    Ok(StatusCode::NO_CONTENT)
}
