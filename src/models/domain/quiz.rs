use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz_question::QuizQuestion;

/// A quiz as authored by the content subsystem. Questions and their choices are
/// embedded, so ownership ("belongs to") is structural. Read-only to this service.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub time_limit: u32, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Where a choice id sits relative to a question of the quiz.
#[derive(Debug, PartialEq, Eq)]
pub enum ChoiceLocation<'a> {
    InQuestion(&'a QuizQuestion),
    OtherQuestion(&'a QuizQuestion),
    Missing,
}

impl Quiz {
    pub fn new(title: &str, time_limit: u32, questions: Vec<QuizQuestion>) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: None,
            time_limit,
            topic_id: None,
            questions,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn question(&self, question_id: &str) -> Option<&QuizQuestion> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Locate `choice_id` with respect to `question_id`.
    pub fn locate_choice(&self, question_id: &str, choice_id: &str) -> ChoiceLocation<'_> {
        match self.questions.iter().find(|q| q.choice(choice_id).is_some()) {
            Some(owner) if owner.id == question_id => ChoiceLocation::InQuestion(owner),
            Some(owner) => ChoiceLocation::OtherQuestion(owner),
            None => ChoiceLocation::Missing,
        }
    }

    /// Questions in presentation order.
    pub fn ordered_questions(&self) -> Vec<&QuizQuestion> {
        let mut questions: Vec<&QuizQuestion> = self.questions.iter().collect();
        questions.sort_by_key(|q| q.order_number);
        questions
    }
}
