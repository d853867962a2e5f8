use async_graphql::InputObject;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, InputObject)]
pub struct StartAttemptRequest {
    #[validate(length(min = 1, message = "Quiz ID is required"))]
    pub quiz_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, InputObject)]
pub struct AnswerInput {
    #[validate(length(min = 1, message = "question_id is required"))]
    pub question_id: String,

    #[validate(length(min = 1, message = "choice_id is required"))]
    pub choice_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, InputObject)]
pub struct SubmitAnswersRequest {
    #[validate(length(min = 1, message = "Quiz ID is required"))]
    pub quiz_id: String,

    #[validate(length(min = 1, message = "answers must be a non-empty list"), nested)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, InputObject)]
pub struct UpdateAnswerRequest {
    #[validate(length(min = 1, message = "choice_id is required to update the answer"))]
    pub choice_id: String,
}

/// Offset/limit with defaults applied. Bounds are checked on `AttemptListQuery`.
#[derive(Debug, Clone)]
pub struct PaginationParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: Some(0),
            limit: Some(20),
        }
    }
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AttemptListQuery {
    pub quiz_id: Option<String>,

    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl AttemptListQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            offset: self.offset,
            limit: self.limit,
        }
    }
}
