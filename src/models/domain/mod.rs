pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod user;
pub mod user_answer;
pub use quiz::Quiz;
pub use quiz_attempt::{AttemptStatus, QuizAttempt};
pub use quiz_question::{QuizChoice, QuizQuestion, RESERVED_CHOICE_TEXT};
pub use user::{User, UserRole};
pub use user_answer::UserAnswer;
