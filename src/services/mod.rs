pub mod answer_gate;
pub mod attempt_lifecycle;
pub mod quiz_attempt_service;
pub mod scoring;

pub use quiz_attempt_service::{AttemptRepositories, QuizAttemptService};
