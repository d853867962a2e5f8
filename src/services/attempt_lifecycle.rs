//! State machine of a single quiz attempt.
//!
//! `in-progress` is the only non-terminal state; `stop` moves it exactly once to
//! `completed` or `timed-out`. Expiry is observed when a request touches the
//! attempt, never scheduled: an abandoned attempt stays `in-progress` in storage
//! until its owner stops it.

use chrono::{DateTime, Utc};

use crate::{
    auth::{require_owner_or_admin, Actor},
    errors::{AppError, AppResult},
    models::domain::{AttemptStatus, Quiz, QuizAttempt},
};

/// Result of a stop request.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// The attempt moved to a terminal state.
    Finished(QuizAttempt),
    /// An admin stopped an attempt that had already ended; nothing changed.
    AlreadyFinished(QuizAttempt),
}

impl StopOutcome {
    pub fn attempt(&self) -> &QuizAttempt {
        match self {
            StopOutcome::Finished(attempt) | StopOutcome::AlreadyFinished(attempt) => attempt,
        }
    }

    pub fn into_attempt(self) -> QuizAttempt {
        match self {
            StopOutcome::Finished(attempt) | StopOutcome::AlreadyFinished(attempt) => attempt,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttemptLifecycle {
    max_daily_attempts: u32,
}

impl AttemptLifecycle {
    pub fn new(max_daily_attempts: u32) -> Self {
        Self { max_daily_attempts }
    }

    pub fn max_daily_attempts(&self) -> u32 {
        self.max_daily_attempts
    }

    /// Check the single-active and daily-cap limits for a non-admin start.
    /// `active` holds the actor's in-progress attempts across all quizzes and
    /// `started_today` the attempts on this quiz created on the current UTC day.
    pub fn ensure_can_start(
        &self,
        actor: &Actor,
        active: &[QuizAttempt],
        started_today: u64,
    ) -> AppResult<()> {
        if actor.is_admin() {
            return Ok(());
        }

        if !active.is_empty() {
            return Err(AppError::Conflict(
                "You already have an in-progress quiz. Please complete it before starting another quiz."
                    .to_string(),
            ));
        }

        if started_today >= u64::from(self.max_daily_attempts) {
            return Err(AppError::Conflict(format!(
                "You've reached the maximum number of attempts ({}) for today.",
                self.max_daily_attempts
            )));
        }

        Ok(())
    }

    pub fn begin(&self, actor: &Actor, quiz: &Quiz, now: DateTime<Utc>) -> QuizAttempt {
        QuizAttempt::start(&actor.user_id, &quiz.id, !actor.is_admin(), now)
    }

    /// Finish the attempt. The terminal state depends only on whether the
    /// deadline had passed at `now`.
    pub fn stop(
        &self,
        attempt: &QuizAttempt,
        quiz: &Quiz,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> AppResult<StopOutcome> {
        require_owner_or_admin(actor, &attempt.user_id, "stop this quiz")?;

        if !attempt.is_in_progress() {
            if actor.is_admin() {
                return Ok(StopOutcome::AlreadyFinished(attempt.clone()));
            }
            return Err(AppError::Conflict(
                "Quiz has already been completed or timed out.".to_string(),
            ));
        }

        let mut finished = attempt.clone();
        finished.status = if is_expired(attempt, quiz, now) {
            AttemptStatus::TimedOut
        } else {
            AttemptStatus::Completed
        };
        finished.submitted_at = Some(now);
        finished.end_time = Some(now);
        finished.time_taken = (now - attempt.start_time).num_seconds().max(0);
        finished.updated_at = Some(now);

        Ok(StopOutcome::Finished(finished))
    }
}

impl Default for AttemptLifecycle {
    fn default() -> Self {
        Self::new(3)
    }
}

/// True once `now` is strictly past `start_time + time_limit`.
pub fn is_expired(attempt: &QuizAttempt, quiz: &Quiz, now: DateTime<Utc>) -> bool {
    now > attempt.deadline(quiz.time_limit)
}

/// Gate shared by every write to an attempt: owner or admin, and for
/// non-admins the attempt must still be running and within its time limit.
pub fn ensure_writable(
    attempt: &QuizAttempt,
    quiz: &Quiz,
    actor: &Actor,
    now: DateTime<Utc>,
    action: &str,
) -> AppResult<()> {
    require_owner_or_admin(actor, &attempt.user_id, action)?;

    if actor.is_admin() {
        return Ok(());
    }

    if !attempt.is_in_progress() {
        return Err(AppError::Conflict(
            "Quiz has already been completed or timed out.".to_string(),
        ));
    }

    if is_expired(attempt, quiz, now) {
        return Err(AppError::Forbidden(
            "Time limit exceeded: You can no longer submit answers.".to_string(),
        ));
    }

    Ok(())
}
