use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::QuizAttempt,
    repositories::is_duplicate_key,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Insert a new attempt. A second in-progress attempt for a limited user
    /// is rejected with `Conflict`.
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>>;
    async fn find_in_progress_for_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>>;
    async fn count_for_day(&self, user_id: &str, quiz_id: &str, day: &str) -> AppResult<u64>;
    /// Persist a terminal attempt, only if the stored one is still in progress.
    /// Returns false when another request finished it first.
    async fn finish(&self, attempt: &QuizAttempt) -> AppResult<bool>;
    async fn update_score(&self, id: &str, score: f64) -> AppResult<()>;
    async fn list_for_user(
        &self,
        user_id: &str,
        quiz_id: Option<String>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, u64)>;
}

pub struct MongoQuizAttemptRepository {
    collection: Collection<QuizAttempt>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("quiz_attempts");
        Self { collection }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // At most one running attempt per limited user.
        let active_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! {
                        "status": "in-progress",
                        "enforce_limits": true
                    })
                    .name("one_active_attempt_per_user".to_string())
                    .build(),
            )
            .build();

        let daily_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1, "attempt_day": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_quiz_day".to_string())
                    .build(),
            )
            .build();

        let history_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_history".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(active_index).await?;
        self.collection.create_index(daily_index).await?;
        self.collection.create_index(history_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        match self.collection.insert_one(&attempt).await {
            Ok(_) => Ok(attempt),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(
                "You already have an in-progress quiz. Please complete it before starting another quiz."
                    .to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn find_in_progress_for_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! {
                "user_id": user_id,
                "status": "in-progress"
            })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn count_for_day(&self, user_id: &str, quiz_id: &str, day: &str) -> AppResult<u64> {
        let count = self
            .collection
            .count_documents(doc! {
                "user_id": user_id,
                "quiz_id": quiz_id,
                "attempt_day": day
            })
            .await?;
        Ok(count)
    }

    async fn finish(&self, attempt: &QuizAttempt) -> AppResult<bool> {
        let result = self
            .collection
            .replace_one(
                doc! {
                    "id": &attempt.id,
                    "status": "in-progress"
                },
                attempt,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn update_score(&self, id: &str, score: f64) -> AppResult<()> {
        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$set": { "score": score } })
            .await?;

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "Result with ID {} not found.",
                id
            )));
        }
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        quiz_id: Option<String>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, u64)> {
        let mut filter = doc! { "user_id": user_id };

        if let Some(qid) = quiz_id {
            filter.insert("quiz_id", qid);
        }

        let total = self.collection.count_documents(filter.clone()).await?;

        let attempts = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(offset.max(0) as u64)
            .limit(limit)
            .await?
            .try_collect()
            .await?;

        Ok((attempts, total))
    }
}
