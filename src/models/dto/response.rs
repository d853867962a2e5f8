use async_graphql::SimpleObject;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    models::domain::{AttemptStatus, Quiz, QuizAttempt, QuizChoice, QuizQuestion, UserAnswer},
    services::scoring::{QuestionOutcome, QuestionScore, ScoreReport},
};

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct StartAttemptResponse {
    pub result_id: String,
    pub quiz_id: String,
    pub time_limit: u32,
    pub start_time: DateTime<Utc>,
    pub status: AttemptStatus,
}

impl StartAttemptResponse {
    pub fn new(attempt: &QuizAttempt, quiz: &Quiz) -> Self {
        Self {
            result_id: attempt.id.clone(),
            quiz_id: attempt.quiz_id.clone(),
            time_limit: quiz.time_limit,
            start_time: attempt.start_time,
            status: attempt.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct StopAttemptResponse {
    pub result_id: String,
    pub quiz_title: String,
    pub status: AttemptStatus,
    pub time_limit: u32,
    /// Minutes, rounded.
    pub completion_time: i64,
    pub date: String,
}

impl StopAttemptResponse {
    pub fn new(attempt: &QuizAttempt, quiz: &Quiz) -> Self {
        Self {
            result_id: attempt.id.clone(),
            quiz_title: quiz.title.clone(),
            status: attempt.status,
            time_limit: quiz.time_limit,
            completion_time: attempt.completion_minutes(),
            date: attempt.display_date(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct UpdateAnswerResponse {
    pub message: String,
    pub answer: UserAnswer,
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct AnswerDetail {
    pub question_order_number: i32,
    pub question_text: String,
    pub user_choice: String,
    pub correct_choice: String,
    pub points_awarded: f64,
    pub outcome: QuestionOutcome,
}

impl From<QuestionScore> for AnswerDetail {
    fn from(score: QuestionScore) -> Self {
        AnswerDetail {
            question_order_number: score.question_order_number,
            question_text: score.question_text,
            user_choice: score.user_choice,
            correct_choice: score.correct_choice,
            points_awarded: score.points_awarded,
            outcome: score.outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct FeedbackReport {
    pub result_id: String,
    pub quiz_title: String,
    pub feedback: String,
    pub date: String,
    pub completion_time: i64,
    pub time_limit: u32,
    pub status: AttemptStatus,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    pub no_answers: usize,
    pub total_questions: usize,
    pub user_score: f64,
    pub total_score: usize,
    pub percentage: f64,
    pub answers: Vec<AnswerDetail>,
}

impl FeedbackReport {
    pub fn new(attempt: &QuizAttempt, quiz: &Quiz, report: ScoreReport) -> Self {
        FeedbackReport {
            result_id: attempt.id.clone(),
            quiz_title: quiz.title.clone(),
            feedback: report.feedback.to_string(),
            date: attempt.display_date(),
            completion_time: attempt.completion_minutes(),
            time_limit: quiz.time_limit,
            status: attempt.status,
            correct_answers: report.correct_count,
            incorrect_answers: report.incorrect_count,
            no_answers: report.unanswered_count,
            total_questions: report.max_score,
            user_score: report.total_score,
            total_score: report.max_score,
            percentage: report.percentage,
            answers: report.breakdown.into_iter().map(AnswerDetail::from).collect(),
        }
    }
}

/// A choice as shown to a quiz taker; correctness is never exposed.
#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PaperChoice {
    pub id: String,
    pub choice_text: String,
    pub order_number: i32,
}

impl From<&QuizChoice> for PaperChoice {
    fn from(choice: &QuizChoice) -> Self {
        PaperChoice {
            id: choice.id.clone(),
            choice_text: choice.choice_text.clone(),
            order_number: choice.order_number,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PaperQuestion {
    pub id: String,
    pub question_text: String,
    pub order_number: i32,
    pub allow_multiple_answers: bool,
    pub choices: Vec<PaperChoice>,
}

impl From<&QuizQuestion> for PaperQuestion {
    fn from(question: &QuizQuestion) -> Self {
        PaperQuestion {
            id: question.id.clone(),
            question_text: question.question_text.clone(),
            order_number: question.order_number,
            allow_multiple_answers: question.allow_multiple_answers,
            choices: question
                .selectable_choices()
                .into_iter()
                .map(PaperChoice::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct QuizPaper {
    pub result_id: String,
    pub quiz_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub time_limit: u32,
    pub deadline: DateTime<Utc>,
    pub questions: Vec<PaperQuestion>,
}

impl QuizPaper {
    pub fn new(attempt: &QuizAttempt, quiz: &Quiz) -> Self {
        QuizPaper {
            result_id: attempt.id.clone(),
            quiz_id: quiz.id.clone(),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            time_limit: quiz.time_limit,
            deadline: attempt.deadline(quiz.time_limit),
            questions: quiz
                .ordered_questions()
                .into_iter()
                .map(PaperQuestion::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PaginationMetadata {
    pub offset: i64,
    pub limit: i64,
    pub total: u64,
    pub has_more: bool,
}

impl PaginationMetadata {
    pub fn new(offset: i64, limit: i64, total: u64) -> Self {
        let has_more = (offset.max(0) as u64).saturating_add(limit.max(0) as u64) < total;
        Self {
            offset,
            limit,
            total,
            has_more,
        }
    }
}

#[derive(Debug, Clone, Serialize, SimpleObject)]
pub struct PaginatedAttempts {
    pub data: Vec<QuizAttempt>,
    pub pagination: PaginationMetadata,
}
