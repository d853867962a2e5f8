pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod user_answer_repository;
pub mod user_repository;

use mongodb::error::{Error, ErrorKind, WriteFailure};

pub use quiz_attempt_repository::{MongoQuizAttemptRepository, QuizAttemptRepository};
pub use quiz_repository::{MongoQuizRepository, QuizRepository};
pub use user_answer_repository::{MongoUserAnswerRepository, UserAnswerRepository};
pub use user_repository::{MongoUserRepository, UserRepository};

const DUPLICATE_KEY: i32 = 11000;

/// True when the server rejected a write because of a unique index.
pub(crate) fn is_duplicate_key(err: &Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|w| w.code == DUPLICATE_KEY)),
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}
