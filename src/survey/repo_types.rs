use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::auth::repo_types::UserId;

pub type ResponseId = i64;

/// Row of `survey_responses`, without its interests.
#[derive(Debug, FromRow)]
pub struct SurveyResponseRow {
    pub id: ResponseId,
    pub user_id: UserId,
    pub name: String,
    pub age: String,
    pub gender: String,
    pub comments: String,
    pub created_at: OffsetDateTime,
}

/// A stored survey response with its interests in submission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SurveyResponse {
    pub id: ResponseId,
    pub user_id: UserId,
    pub name: String,
    pub age: String, // raw form text, never coerced
    pub gender: String,
    pub interests: Vec<String>,
    pub comments: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SurveyResponse {
    pub fn from_row(r: SurveyResponseRow, interests: Vec<String>) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            age: r.age,
            gender: r.gender,
            interests,
            comments: r.comments,
            created_at: r.created_at,
        }
    }

    /// Display form of the interests: `"sports, music"`.
    pub fn interests_joined(&self) -> String {
        self.interests.join(", ")
    }
}

/// Values of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewSurveyResponse {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub interests: Vec<String>,
    pub comments: String,
}

/// Partial update applied by the admin gateway; `None` leaves a column alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SurveyResponsePatch {
    pub user_id: Option<UserId>,
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub interests: Option<Vec<String>>,
    pub comments: Option<String>,
}
