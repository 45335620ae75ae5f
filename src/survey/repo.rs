use std::collections::HashMap;

use axum::extract::FromRef;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::OffsetDateTime;

use crate::{
    auth::repo_types::UserId,
    error::AppError,
    state::AppState,
    survey::repo_types::{
        NewSurveyResponse, ResponseId, SurveyResponse, SurveyResponsePatch, SurveyResponseRow,
    },
};

/// Survey repository over `survey_responses` and its interests table.
#[derive(Clone)]
pub struct SurveyRepo {
    db: SqlitePool,
}

impl FromRef<AppState> for SurveyRepo {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.db.clone())
    }
}

async fn insert_interests(
    tx: &mut Transaction<'_, Sqlite>,
    response_id: ResponseId,
    interests: &[String],
) -> Result<(), AppError> {
    for (position, interest) in interests.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO survey_response_interests (response_id, position, interest)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(response_id)
        .bind(position as i64)
        .bind(interest)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

impl SurveyRepo {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Store one submission owned by `user_id`. The response and its
    /// interests land together or not at all.
    pub async fn submit(&self, user_id: UserId, new: &NewSurveyResponse) -> Result<ResponseId, AppError> {
        let mut tx = self.db.begin().await?;
        let res = sqlx::query(
            r#"
            INSERT INTO survey_responses (user_id, name, age, gender, comments, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.age)
        .bind(&new.gender)
        .bind(&new.comments)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *tx)
        .await?;
        let id = res.last_insert_rowid();
        insert_interests(&mut tx, id, &new.interests).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Every response in insertion order.
    pub async fn list_all(&self) -> Result<Vec<SurveyResponse>, AppError> {
        let rows = sqlx::query_as::<_, SurveyResponseRow>(
            r#"
            SELECT id, user_id, name, age, gender, comments, created_at
            FROM survey_responses
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let interest_rows: Vec<(ResponseId, String)> = sqlx::query_as(
            r#"
            SELECT response_id, interest
            FROM survey_response_interests
            ORDER BY response_id, position
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut interests: HashMap<ResponseId, Vec<String>> = HashMap::new();
        for (response_id, interest) in interest_rows {
            interests.entry(response_id).or_default().push(interest);
        }

        Ok(rows
            .into_iter()
            .map(|r| {
                let list = interests.remove(&r.id).unwrap_or_default();
                SurveyResponse::from_row(r, list)
            })
            .collect())
    }

    pub async fn find(&self, id: ResponseId) -> Result<Option<SurveyResponse>, AppError> {
        let row = sqlx::query_as::<_, SurveyResponseRow>(
            r#"
            SELECT id, user_id, name, age, gender, comments, created_at
            FROM survey_responses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let interests: Vec<(String,)> = sqlx::query_as(
            "SELECT interest FROM survey_response_interests WHERE response_id = ? ORDER BY position",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(SurveyResponse::from_row(
            row,
            interests.into_iter().map(|(i,)| i).collect(),
        )))
    }

    /// Apply `patch`; a given interest list replaces the stored one.
    pub async fn update(&self, id: ResponseId, patch: &SurveyResponsePatch) -> Result<SurveyResponse, AppError> {
        let mut tx = self.db.begin().await?;
        let current = sqlx::query_as::<_, SurveyResponseRow>(
            r#"
            SELECT id, user_id, name, age, gender, comments, created_at
            FROM survey_responses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound)?;

        sqlx::query(
            r#"
            UPDATE survey_responses
            SET user_id = ?, name = ?, age = ?, gender = ?, comments = ?
            WHERE id = ?
            "#,
        )
        .bind(patch.user_id.unwrap_or(current.user_id))
        .bind(patch.name.as_ref().unwrap_or(&current.name))
        .bind(patch.age.as_ref().unwrap_or(&current.age))
        .bind(patch.gender.as_ref().unwrap_or(&current.gender))
        .bind(patch.comments.as_ref().unwrap_or(&current.comments))
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if let Some(interests) = &patch.interests {
            sqlx::query("DELETE FROM survey_response_interests WHERE response_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            insert_interests(&mut tx, id, interests).await?;
        }
        tx.commit().await?;

        self.find(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, id: ResponseId) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM survey_responses WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM survey_responses")
            .fetch_one(&self.db)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::UserRepo;

    async fn setup() -> (SurveyRepo, UserId) {
        let state = AppState::in_memory().await;
        let uid = UserRepo::from_ref(&state).create("alice", "pw1").await.unwrap();
        (SurveyRepo::from_ref(&state), uid)
    }

    fn answers(gender: &str, interests: &[&str]) -> NewSurveyResponse {
        NewSurveyResponse {
            name: "Alice".into(),
            age: "30".into(),
            gender: gender.into(),
            interests: interests.iter().map(|s| s.to_string()).collect(),
            comments: "hi".into(),
        }
    }

    #[tokio::test]
    async fn submit_keeps_interest_order() {
        let (surveys, uid) = setup().await;
        let id = surveys.submit(uid, &answers("ж", &["sports", "music"])).await.unwrap();

        let stored = surveys.find(id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, uid);
        assert_eq!(stored.gender, "ж");
        assert_eq!(stored.interests_joined(), "sports, music");
    }

    #[tokio::test]
    async fn empty_fields_are_stored_as_empty_text() {
        let (surveys, uid) = setup().await;
        let id = surveys.submit(uid, &NewSurveyResponse::default()).await.unwrap();

        let stored = surveys.find(id).await.unwrap().unwrap();
        assert_eq!(stored.age, "");
        assert!(stored.interests.is_empty());
        assert_eq!(stored.interests_joined(), "");
    }

    #[tokio::test]
    async fn unknown_owner_is_rejected_without_partial_rows() {
        let (surveys, _) = setup().await;
        let err = surveys.submit(4242, &answers("м", &["travel"])).await.unwrap_err();
        assert!(matches!(err, AppError::ForeignKeyViolation));

        assert_eq!(surveys.count().await.unwrap(), 0);
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM survey_response_interests")
            .fetch_one(&surveys.db)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn list_all_groups_interests_per_response() {
        let (surveys, uid) = setup().await;
        surveys.submit(uid, &answers("м", &["reading"])).await.unwrap();
        surveys.submit(uid, &answers("ж", &[])).await.unwrap();
        surveys.submit(uid, &answers("м", &["movies", "travel"])).await.unwrap();

        let all = surveys.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].interests, vec!["reading"]);
        assert!(all[1].interests.is_empty());
        assert_eq!(all[2].interests, vec!["movies", "travel"]);
        assert_eq!(all[2].gender, "м");
    }

    #[tokio::test]
    async fn interests_with_commas_come_back_intact() {
        let (surveys, uid) = setup().await;
        let id = surveys
            .submit(uid, &answers("м", &["rock, pop", "jazz"]))
            .await
            .unwrap();
        let stored = surveys.find(id).await.unwrap().unwrap();
        assert_eq!(stored.interests, vec!["rock, pop", "jazz"]);
    }

    #[tokio::test]
    async fn list_all_attributes_each_response_to_its_owner() {
        let state = AppState::in_memory().await;
        let users = UserRepo::from_ref(&state);
        let surveys = SurveyRepo::from_ref(&state);
        let alice = users.create("alice", "pw").await.unwrap();
        let bob = users.create("bob", "pw").await.unwrap();
        for owner in [alice, bob, alice] {
            surveys.submit(owner, &answers("м", &[])).await.unwrap();
        }

        let owners: Vec<UserId> = surveys.list_all().await.unwrap().iter().map(|r| r.user_id).collect();
        assert_eq!(owners, vec![alice, bob, alice]);
    }

    #[tokio::test]
    async fn update_replaces_interests_and_keeps_untouched_fields() {
        let (surveys, uid) = setup().await;
        let id = surveys.submit(uid, &answers("м", &["sports"])).await.unwrap();

        let patch = SurveyResponsePatch {
            gender: Some("ж".into()),
            interests: Some(vec!["music".into(), "travel".into()]),
            ..Default::default()
        };
        let updated = surveys.update(id, &patch).await.unwrap();
        assert_eq!(updated.gender, "ж");
        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.interests, vec!["music", "travel"]);
    }

    #[tokio::test]
    async fn update_to_unknown_owner_is_foreign_key_violation() {
        let (surveys, uid) = setup().await;
        let id = surveys.submit(uid, &answers("м", &[])).await.unwrap();
        let patch = SurveyResponsePatch {
            user_id: Some(999),
            ..Default::default()
        };
        assert!(matches!(
            surveys.update(id, &patch).await,
            Err(AppError::ForeignKeyViolation)
        ));
        assert_eq!(surveys.find(id).await.unwrap().unwrap().user_id, uid);
    }

    #[tokio::test]
    async fn delete_cascades_interests() {
        let (surveys, uid) = setup().await;
        let id = surveys.submit(uid, &answers("м", &["sports", "music"])).await.unwrap();

        surveys.delete(id).await.unwrap();
        assert!(surveys.find(id).await.unwrap().is_none());
        assert!(matches!(surveys.delete(id).await, Err(AppError::NotFound)));
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM survey_response_interests")
            .fetch_one(&surveys.db)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn owner_with_responses_cannot_be_deleted() {
        let state = AppState::in_memory().await;
        let users = UserRepo::from_ref(&state);
        let surveys = SurveyRepo::from_ref(&state);
        let uid = users.create("bob", "pw").await.unwrap();
        surveys.submit(uid, &answers("м", &[])).await.unwrap();

        assert!(matches!(users.delete(uid).await, Err(AppError::ForeignKeyViolation)));
    }
}
