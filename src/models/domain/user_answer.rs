use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (question, choice) pair recorded against an attempt.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, SimpleObject)]
pub struct UserAnswer {
    pub id: String,
    pub result_id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub question_id: String,
    pub choice_id: String,
    /// Uniqueness key within an attempt: the question id for single-answer
    /// questions, `question:choice` for multi-answer ones.
    #[graphql(skip)]
    pub slot: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserAnswer {
    pub fn new(
        result_id: &str,
        user_id: &str,
        quiz_id: &str,
        question_id: &str,
        choice_id: &str,
        allow_multiple_answers: bool,
        now: DateTime<Utc>,
    ) -> Self {
        UserAnswer {
            id: Uuid::new_v4().to_string(),
            result_id: result_id.to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            question_id: question_id.to_string(),
            choice_id: choice_id.to_string(),
            slot: Self::slot_for(question_id, choice_id, allow_multiple_answers),
            created_at: now,
            updated_at: None,
        }
    }

    pub fn slot_for(question_id: &str, choice_id: &str, allow_multiple_answers: bool) -> String {
        if allow_multiple_answers {
            format!("{}:{}", question_id, choice_id)
        } else {
            question_id.to_string()
        }
    }
}
