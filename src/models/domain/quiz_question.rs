use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text of the placeholder choice every question carries. It is never correct,
/// never selectable and never shown to quiz takers.
pub const RESERVED_CHOICE_TEXT: &str = "no_answer";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question_text: String,
    pub order_number: i32,
    #[serde(default)]
    pub allow_multiple_answers: bool,
    #[serde(default)]
    pub choices: Vec<QuizChoice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizChoice {
    pub id: String,
    pub choice_text: String,
    pub is_correct: bool,
    pub order_number: i32,
}

impl QuizChoice {
    pub fn new(choice_text: &str, is_correct: bool, order_number: i32) -> Self {
        QuizChoice {
            id: Uuid::new_v4().to_string(),
            choice_text: choice_text.to_string(),
            is_correct,
            order_number,
        }
    }

    pub fn reserved(order_number: i32) -> Self {
        Self::new(RESERVED_CHOICE_TEXT, false, order_number)
    }

    pub fn is_reserved(&self) -> bool {
        self.choice_text == RESERVED_CHOICE_TEXT
    }
}

impl QuizQuestion {
    /// Builds a question the way authoring stores it: the given choices followed
    /// by the reserved placeholder.
    pub fn new(
        question_text: &str,
        order_number: i32,
        allow_multiple_answers: bool,
        mut choices: Vec<QuizChoice>,
    ) -> Self {
        let next_order = choices.iter().map(|c| c.order_number).max().unwrap_or(0) + 1;
        choices.push(QuizChoice::reserved(next_order));

        QuizQuestion {
            id: Uuid::new_v4().to_string(),
            question_text: question_text.to_string(),
            order_number,
            allow_multiple_answers,
            choices,
        }
    }

    pub fn choice(&self, choice_id: &str) -> Option<&QuizChoice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// Choices a quiz taker may pick, in presentation order.
    pub fn selectable_choices(&self) -> Vec<&QuizChoice> {
        let mut choices: Vec<&QuizChoice> =
            self.choices.iter().filter(|c| !c.is_reserved()).collect();
        choices.sort_by_key(|c| c.order_number);
        choices
    }

    pub fn correct_choices(&self) -> Vec<&QuizChoice> {
        self.selectable_choices()
            .into_iter()
            .filter(|c| c.is_correct)
            .collect()
    }
}
