use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("username already taken")]
    DuplicateUsername,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("login required")]
    Unauthorized,
    #[error("referenced user does not exist")]
    ForeignKeyViolation,
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateUsername,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::ForeignKeyViolation
            }
            _ => AppError::Database(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateUsername | AppError::ForeignKeyViolation => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::SEE_OTHER,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // gated routes funnel back to sign-in instead of a 403 page
            AppError::Unauthorized => Redirect::to("/login").into_response(),
            AppError::Database(ref e) => {
                error!(error = %e, "database failure");
                internal()
            }
            AppError::Internal(ref e) => {
                error!(error = %e, "internal failure");
                internal()
            }
            other => (other.status(), Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_redirects_to_login() {
        let res = AppError::Unauthorized.into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers()[axum::http::header::LOCATION], "/login");
    }

    #[test]
    fn store_conflicts_map_to_409() {
        assert_eq!(AppError::DuplicateUsername.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(AppError::ForeignKeyViolation.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound));
    }

    #[test]
    fn internal_errors_hide_details() {
        let res = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
