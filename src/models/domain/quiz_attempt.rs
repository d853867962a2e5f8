use async_graphql::{Enum, SimpleObject};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::attempt_day;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Enum, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
    TimedOut,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in-progress",
            AttemptStatus::Completed => "completed",
            AttemptStatus::TimedOut => "timed-out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AttemptStatus::InProgress)
    }
}

/// One user's timed try at a quiz.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, SimpleObject)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub status: AttemptStatus,
    pub score: f64,
    pub time_taken: i64, // seconds, set when the attempt ends
    pub start_time: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// False for attempts started by admins; those are exempt from the
    /// single-active and daily-cap limits and from the storage guard.
    #[graphql(skip)]
    pub enforce_limits: bool,
    #[graphql(skip)]
    pub attempt_day: String,
}

impl QuizAttempt {
    pub fn start(user_id: &str, quiz_id: &str, enforce_limits: bool, now: DateTime<Utc>) -> Self {
        QuizAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            status: AttemptStatus::InProgress,
            score: 0.0,
            time_taken: 0,
            start_time: now,
            submitted_at: None,
            end_time: None,
            created_at: now,
            updated_at: None,
            enforce_limits,
            attempt_day: attempt_day(now),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == AttemptStatus::InProgress
    }

    pub fn deadline(&self, time_limit_minutes: u32) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(time_limit_minutes))
    }

    /// Whole minutes spent, rounded to the nearest minute.
    pub fn completion_minutes(&self) -> i64 {
        (self.time_taken as f64 / 60.0).round() as i64
    }

    pub fn display_date(&self) -> String {
        self.created_at.format("%d-%m-%y").to_string()
    }
}
