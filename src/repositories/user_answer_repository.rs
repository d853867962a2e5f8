use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Client, Collection, IndexModel};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::UserAnswer,
    repositories::is_duplicate_key,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAnswerRepository: Send + Sync {
    /// Insert every answer or none of them.
    async fn create_many(&self, answers: Vec<UserAnswer>) -> AppResult<Vec<UserAnswer>>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserAnswer>>;
    async fn find_by_attempt(&self, result_id: &str) -> AppResult<Vec<UserAnswer>>;
    async fn update_choice(&self, answer: UserAnswer) -> AppResult<UserAnswer>;
}

pub struct MongoUserAnswerRepository {
    client: Client,
    collection: Collection<UserAnswer>,
}

fn duplicate_answer() -> AppError {
    AppError::Conflict("This answer has already been submitted for the question.".to_string())
}

impl MongoUserAnswerRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("user_answers");
        Self {
            client: db.client().clone(),
            collection,
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for user_answers collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        // One document per single-answer question, one per pair on multi-answer ones.
        let slot_index = IndexModel::builder()
            .keys(doc! { "result_id": 1, "slot": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("result_slot_unique".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(slot_index).await?;

        log::info!("Successfully created indexes for user_answers collection");
        Ok(())
    }
}

#[async_trait]
impl UserAnswerRepository for MongoUserAnswerRepository {
    async fn create_many(&self, answers: Vec<UserAnswer>) -> AppResult<Vec<UserAnswer>> {
        if answers.is_empty() {
            return Ok(answers);
        }

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let inserted = self
            .collection
            .insert_many(&answers)
            .session(&mut session)
            .await;

        if let Err(e) = inserted {
            if let Err(abort_err) = session.abort_transaction().await {
                log::warn!("Failed to abort answer batch transaction: {}", abort_err);
            }
            if is_duplicate_key(&e) {
                return Err(duplicate_answer());
            }
            return Err(e.into());
        }

        match session.commit_transaction().await {
            Ok(()) => Ok(answers),
            Err(e) if is_duplicate_key(&e) => Err(duplicate_answer()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserAnswer>> {
        let answer = self.collection.find_one(doc! { "id": id }).await?;
        Ok(answer)
    }

    async fn find_by_attempt(&self, result_id: &str) -> AppResult<Vec<UserAnswer>> {
        let answers = self
            .collection
            .find(doc! { "result_id": result_id })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(answers)
    }

    async fn update_choice(&self, answer: UserAnswer) -> AppResult<UserAnswer> {
        let result = match self
            .collection
            .replace_one(doc! { "id": &answer.id }, &answer)
            .await
        {
            Ok(result) => result,
            Err(e) if is_duplicate_key(&e) => return Err(duplicate_answer()),
            Err(e) => return Err(e.into()),
        };

        if result.matched_count == 0 {
            return Err(AppError::NotFound(format!(
                "User answer with ID {} not found.",
                answer.id
            )));
        }

        Ok(answer)
    }
}
