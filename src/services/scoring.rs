use std::collections::HashSet;
use std::str::FromStr;

use async_graphql::Enum;
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::models::domain::{Quiz, QuizAttempt, QuizChoice, QuizQuestion, UserAnswer};
use crate::models::domain::RESERVED_CHOICE_TEXT;

/// How the per-incorrect-choice penalty of a multi-answer question is sized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PenaltyBasis {
    /// `1 / (stored choices - 1)`, the reserved placeholder counted as stored.
    #[default]
    StoredChoicesMinusOne,
    /// `1 / selectable choices`, the reserved placeholder never counted.
    SelectableChoices,
}

impl FromStr for PenaltyBasis {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "stored-minus-one" => Ok(PenaltyBasis::StoredChoicesMinusOne),
            "selectable" => Ok(PenaltyBasis::SelectableChoices),
            other => Err(AppError::ValidationError(format!(
                "Unknown penalty basis '{}'",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Enum)]
#[serde(rename_all = "lowercase")]
pub enum QuestionOutcome {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QuestionScore {
    pub question_id: String,
    pub question_order_number: i32,
    pub question_text: String,
    pub user_choice: String,
    pub correct_choice: String,
    pub points_awarded: f64,
    pub outcome: QuestionOutcome,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreReport {
    pub total_score: f64,
    pub max_score: usize,
    pub percentage: f64,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub unanswered_count: usize,
    pub breakdown: Vec<QuestionScore>,
    pub feedback: &'static str,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScoringEngine {
    penalty_basis: PenaltyBasis,
}

impl ScoringEngine {
    pub fn new(penalty_basis: PenaltyBasis) -> Self {
        Self { penalty_basis }
    }

    /// Grade a finished attempt. Pure: the same inputs always give the same report.
    pub fn score(
        &self,
        attempt: &QuizAttempt,
        quiz: &Quiz,
        answers: &[UserAnswer],
    ) -> AppResult<ScoreReport> {
        if !attempt.status.is_terminal() {
            return Err(AppError::Conflict(
                "Quiz has not been completed or timed out yet.".to_string(),
            ));
        }

        let mut ordered_answers: Vec<&UserAnswer> =
            answers.iter().filter(|a| a.result_id == attempt.id).collect();
        ordered_answers.sort_by_key(|a| a.created_at);

        let mut total = 0.0;
        let mut correct_count = 0;
        let mut incorrect_count = 0;
        let mut unanswered_count = 0;
        let mut breakdown = Vec::with_capacity(quiz.questions.len());

        for question in quiz.ordered_questions() {
            let selected = selected_choices(question, &ordered_answers);
            let (points, outcome) = if question.allow_multiple_answers {
                self.grade_multiple(question, &selected)
            } else {
                grade_single(&selected)
            };

            match outcome {
                QuestionOutcome::Correct => correct_count += 1,
                QuestionOutcome::Incorrect => incorrect_count += 1,
                QuestionOutcome::Unanswered => unanswered_count += 1,
            }
            total += points;

            breakdown.push(QuestionScore {
                question_id: question.id.clone(),
                question_order_number: question.order_number,
                question_text: question.question_text.clone(),
                user_choice: join_texts(&selected).unwrap_or_else(|| RESERVED_CHOICE_TEXT.to_string()),
                correct_choice: join_texts(&question.correct_choices()).unwrap_or_default(),
                points_awarded: round2(points),
                outcome,
            });
        }

        let max_score = quiz.questions.len();
        let total_score = round2(total);
        let percentage = if max_score > 0 {
            total_score / max_score as f64 * 100.0
        } else {
            0.0
        };

        Ok(ScoreReport {
            total_score,
            max_score,
            percentage: round2(percentage),
            correct_count,
            incorrect_count,
            unanswered_count,
            breakdown,
            feedback: feedback_for(percentage),
        })
    }

    fn grade_multiple(
        &self,
        question: &QuizQuestion,
        selected: &[&QuizChoice],
    ) -> (f64, QuestionOutcome) {
        let correct: HashSet<&str> = question
            .correct_choices()
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();

        if correct.is_empty() {
            log::warn!(
                "Multi-answer question {} has no correct choices; awarding 0",
                question.id
            );
            return (0.0, QuestionOutcome::Incorrect);
        }

        let penalty_denominator = match self.penalty_basis {
            PenaltyBasis::StoredChoicesMinusOne => question.choices.len().saturating_sub(1),
            PenaltyBasis::SelectableChoices => question.selectable_choices().len(),
        };
        let credit = 1.0 / correct.len() as f64;
        let penalty = if penalty_denominator == 0 {
            0.0
        } else {
            1.0 / penalty_denominator as f64
        };

        let correct_selections = selected
            .iter()
            .filter(|c| correct.contains(c.id.as_str()))
            .count();
        let incorrect_selections = selected.len() - correct_selections;

        let points = (correct_selections as f64 * credit - incorrect_selections as f64 * penalty)
            .max(0.0);

        let chosen: HashSet<&str> = selected.iter().map(|c| c.id.as_str()).collect();
        let outcome = if chosen == correct {
            QuestionOutcome::Correct
        } else {
            QuestionOutcome::Incorrect
        };

        (points, outcome)
    }
}

fn grade_single(selected: &[&QuizChoice]) -> (f64, QuestionOutcome) {
    match selected.first() {
        Some(choice) if choice.is_correct => (1.0, QuestionOutcome::Correct),
        Some(_) => (0.0, QuestionOutcome::Incorrect),
        None => (0.0, QuestionOutcome::Unanswered),
    }
}

/// Choices the attempt selected for `question`. Single-answer questions keep
/// only the oldest answer; multi-answer selections follow choice order. Answers
/// pointing at the reserved placeholder or at unknown choices are ignored.
fn selected_choices<'q>(question: &'q QuizQuestion, answers: &[&UserAnswer]) -> Vec<&'q QuizChoice> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut selected: Vec<&QuizChoice> = answers
        .iter()
        .filter(|a| a.question_id == question.id)
        .filter_map(|a| question.choice(&a.choice_id))
        .filter(|c| !c.is_reserved())
        .filter(|c| seen.insert(c.id.clone()))
        .collect();

    if question.allow_multiple_answers {
        selected.sort_by_key(|c| c.order_number);
    } else {
        selected.truncate(1);
    }
    selected
}

fn join_texts(choices: &[&QuizChoice]) -> Option<String> {
    if choices.is_empty() {
        return None;
    }
    Some(
        choices
            .iter()
            .map(|c| c.choice_text.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

pub fn feedback_for(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "Excellent! You're a star!"
    } else if percentage >= 80.0 {
        "Great job! Keep it up!"
    } else if percentage >= 70.0 {
        "Good effort! You're on the right track!"
    } else if percentage >= 50.0 {
        "Satisfactory. Aim higher next time!"
    } else {
        "Needs improvement. Keep practicing!"
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
