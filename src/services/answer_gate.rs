//! Validation of writes to an attempt's answer set.
//!
//! Both entry points are pure: they take the already-loaded attempt, quiz and
//! recorded answers and return the records to persist. A batch is validated in
//! full before anything is written, so a rejected batch leaves storage untouched.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::{
    auth::{require_owner_or_admin, Actor},
    errors::{AppError, AppResult},
    models::{
        domain::{quiz::ChoiceLocation, Quiz, QuizAttempt, QuizQuestion, UserAnswer},
        dto::request::AnswerInput,
    },
    services::attempt_lifecycle::ensure_writable,
};

/// Outcome of an update request.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerChange {
    Unchanged(UserAnswer),
    Replaced(UserAnswer),
}

/// Validate a batch of answers and build the records to insert.
pub fn validate_batch(
    attempt: &QuizAttempt,
    quiz: &Quiz,
    stated_quiz_id: &str,
    inputs: &[AnswerInput],
    recorded: &[UserAnswer],
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<Vec<UserAnswer>> {
    if attempt.quiz_id != stated_quiz_id {
        return Err(AppError::Conflict(
            "The quiz ID does not match the result's associated quiz.".to_string(),
        ));
    }

    ensure_writable(attempt, quiz, actor, now, "add answers to this quiz")?;

    let mut pairs: HashSet<(String, String)> = recorded
        .iter()
        .map(|a| (a.question_id.clone(), a.choice_id.clone()))
        .collect();
    let mut answered: HashSet<String> = recorded.iter().map(|a| a.question_id.clone()).collect();

    let mut staged = Vec::with_capacity(inputs.len());
    for input in inputs {
        let question = quiz.question(&input.question_id).ok_or_else(|| {
            AppError::NotFound(format!(
                "Question with ID {} not found in this quiz.",
                input.question_id
            ))
        })?;
        selectable_choice(quiz, question, &input.choice_id)?;

        let pair = (input.question_id.clone(), input.choice_id.clone());
        if pairs.contains(&pair) {
            return Err(AppError::Conflict(format!(
                "An answer for question {} with choice {} has already been submitted.",
                input.question_id, input.choice_id
            )));
        }

        if !question.allow_multiple_answers && answered.contains(&input.question_id) {
            return Err(AppError::Conflict(format!(
                "Question {} accepts a single answer. Use PUT /api/answers/{{answer_id}} to change it.",
                input.question_id
            )));
        }

        pairs.insert(pair);
        answered.insert(input.question_id.clone());
        staged.push(UserAnswer::new(
            &attempt.id,
            &attempt.user_id,
            &attempt.quiz_id,
            &question.id,
            &input.choice_id,
            question.allow_multiple_answers,
            now,
        ));
    }

    Ok(staged)
}

/// Validate re-pointing `answer` at `new_choice_id`. The question never changes.
pub fn validate_update(
    attempt: &QuizAttempt,
    quiz: &Quiz,
    answer: &UserAnswer,
    new_choice_id: &str,
    recorded: &[UserAnswer],
    actor: &Actor,
    now: DateTime<Utc>,
) -> AppResult<AnswerChange> {
    require_owner_or_admin(actor, &answer.user_id, "update this answer")?;
    ensure_writable(attempt, quiz, actor, now, "update this answer")?;

    let question = quiz.question(&answer.question_id).ok_or_else(|| {
        AppError::NotFound(format!(
            "Question with ID {} not found in this quiz.",
            answer.question_id
        ))
    })?;
    selectable_choice(quiz, question, new_choice_id)?;

    if answer.choice_id == new_choice_id {
        return Ok(AnswerChange::Unchanged(answer.clone()));
    }

    let taken = recorded
        .iter()
        .any(|a| a.id != answer.id && a.question_id == answer.question_id && a.choice_id == new_choice_id);
    if taken {
        return Err(AppError::Conflict(format!(
            "An answer for question {} with choice {} has already been submitted.",
            answer.question_id, new_choice_id
        )));
    }

    let mut updated = answer.clone();
    updated.choice_id = new_choice_id.to_string();
    updated.slot = UserAnswer::slot_for(
        &question.id,
        new_choice_id,
        question.allow_multiple_answers,
    );
    updated.updated_at = Some(now);

    Ok(AnswerChange::Replaced(updated))
}

fn selectable_choice(quiz: &Quiz, question: &QuizQuestion, choice_id: &str) -> AppResult<()> {
    match quiz.locate_choice(&question.id, choice_id) {
        ChoiceLocation::Missing => Err(AppError::NotFound(format!(
            "Choice with ID {} not found.",
            choice_id
        ))),
        ChoiceLocation::OtherQuestion(_) => Err(AppError::Conflict(format!(
            "Choice {} does not belong to question {}.",
            choice_id, question.id
        ))),
        ChoiceLocation::InQuestion(owner) => match owner.choice(choice_id) {
            Some(choice) if choice.is_reserved() => Err(AppError::Conflict(format!(
                "Choice {} is not selectable.",
                choice_id
            ))),
            _ => Ok(()),
        },
    }
}
