#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::RwLock;

use quiz_attempt_server::{
    app_state::AppState,
    clock::ManualClock,
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{AttemptStatus, Quiz, QuizAttempt, QuizChoice, QuizQuestion, User, UserAnswer},
    repositories::{QuizAttemptRepository, QuizRepository, UserAnswerRepository, UserRepository},
    services::AttemptRepositories,
};

pub struct InMemoryQuizRepository {
    quizzes: Arc<RwLock<HashMap<String, Quiz>>>,
}

impl InMemoryQuizRepository {
    pub fn new() -> Self {
        Self {
            quizzes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    }
}

#[async_trait]
impl QuizRepository for InMemoryQuizRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(id).cloned())
    }
}

pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

/// Mirrors the Mongo partial unique index on running, limited attempts.
pub struct InMemoryQuizAttemptRepository {
    attempts: Arc<RwLock<HashMap<String, QuizAttempt>>>,
}

impl InMemoryQuizAttemptRepository {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn all(&self) -> Vec<QuizAttempt> {
        self.attempts.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryQuizAttemptRepository {
    async fn create(&self, attempt: QuizAttempt) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;

        let clashes = attempt.enforce_limits
            && attempt.status == AttemptStatus::InProgress
            && attempts.values().any(|a| {
                a.user_id == attempt.user_id
                    && a.enforce_limits
                    && a.status == AttemptStatus::InProgress
            });
        if clashes {
            return Err(AppError::Conflict(
                "You already have an in-progress quiz. Please complete it before starting another quiz."
                    .to_string(),
            ));
        }

        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<QuizAttempt>> {
        Ok(self.attempts.read().await.get(id).cloned())
    }

    async fn find_in_progress_for_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id && a.status == AttemptStatus::InProgress)
            .cloned()
            .collect())
    }

    async fn count_for_day(&self, user_id: &str, quiz_id: &str, day: &str) -> AppResult<u64> {
        Ok(self
            .attempts
            .read()
            .await
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id && a.attempt_day == day)
            .count() as u64)
    }

    async fn finish(&self, attempt: &QuizAttempt) -> AppResult<bool> {
        let mut attempts = self.attempts.write().await;
        match attempts.get_mut(&attempt.id) {
            Some(stored) if stored.status == AttemptStatus::InProgress => {
                *stored = attempt.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_score(&self, id: &str, score: f64) -> AppResult<()> {
        let mut attempts = self.attempts.write().await;
        let stored = attempts
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Result with ID {} not found.", id)))?;
        stored.score = score;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        quiz_id: Option<String>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuizAttempt>, u64)> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<QuizAttempt> = attempts
            .values()
            .filter(|a| a.user_id == user_id)
            .filter(|a| quiz_id.as_deref().map_or(true, |q| a.quiz_id == q))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = items.len() as u64;
        let page = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }
}

/// Mirrors the Mongo unique `(result_id, slot)` index and the batch transaction.
pub struct InMemoryUserAnswerRepository {
    answers: Arc<RwLock<HashMap<String, UserAnswer>>>,
}

impl InMemoryUserAnswerRepository {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn count(&self) -> usize {
        self.answers.read().await.len()
    }
}

fn slot_taken(answers: &HashMap<String, UserAnswer>, candidate: &UserAnswer) -> bool {
    answers.values().any(|a| {
        a.id != candidate.id && a.result_id == candidate.result_id && a.slot == candidate.slot
    })
}

#[async_trait]
impl UserAnswerRepository for InMemoryUserAnswerRepository {
    async fn create_many(&self, answers: Vec<UserAnswer>) -> AppResult<Vec<UserAnswer>> {
        let mut stored = self.answers.write().await;

        let mut staged = stored.clone();
        for answer in &answers {
            if slot_taken(&staged, answer) {
                return Err(AppError::Conflict(
                    "This answer has already been submitted for the question.".to_string(),
                ));
            }
            staged.insert(answer.id.clone(), answer.clone());
        }

        *stored = staged;
        Ok(answers)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<UserAnswer>> {
        Ok(self.answers.read().await.get(id).cloned())
    }

    async fn find_by_attempt(&self, result_id: &str) -> AppResult<Vec<UserAnswer>> {
        let mut answers: Vec<UserAnswer> = self
            .answers
            .read()
            .await
            .values()
            .filter(|a| a.result_id == result_id)
            .cloned()
            .collect();
        answers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(answers)
    }

    async fn update_choice(&self, answer: UserAnswer) -> AppResult<UserAnswer> {
        let mut stored = self.answers.write().await;
        if !stored.contains_key(&answer.id) {
            return Err(AppError::NotFound(format!(
                "User answer with ID {} not found.",
                answer.id
            )));
        }
        if slot_taken(&stored, &answer) {
            return Err(AppError::Conflict(
                "This answer has already been submitted for the question.".to_string(),
            ));
        }
        stored.insert(answer.id.clone(), answer.clone());
        Ok(answer)
    }
}

/// Everything a test needs: the wired state plus handles on its storage and clock.
pub struct TestHarness {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub quizzes: Arc<InMemoryQuizRepository>,
    pub users: Arc<InMemoryUserRepository>,
    pub attempts: Arc<InMemoryQuizAttemptRepository>,
    pub answers: Arc<InMemoryUserAnswerRepository>,
}

pub fn start_of_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 9, 0, 0).unwrap()
}

impl TestHarness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualClock::new(start_of_day()));
        let quizzes = Arc::new(InMemoryQuizRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let attempts = Arc::new(InMemoryQuizAttemptRepository::new());
        let answers = Arc::new(InMemoryUserAnswerRepository::new());

        let repos = AttemptRepositories {
            attempts: attempts.clone(),
            answers: answers.clone(),
            quizzes: quizzes.clone(),
            users: users.clone(),
        };
        let state = AppState::from_parts(Config::test_config(), repos, clock.clone());

        Self {
            state,
            clock,
            quizzes,
            users,
            attempts,
            answers,
        }
    }
}

/// One single-answer question whose correct choice is "5".
pub fn arithmetic_quiz() -> Quiz {
    let question = QuizQuestion::new(
        "2 + 3?",
        1,
        false,
        vec![
            QuizChoice::new("4", false, 1),
            QuizChoice::new("5", true, 2),
            QuizChoice::new("6", false, 3),
        ],
    );
    Quiz::new("Arithmetic", 10, vec![question])
}

/// One multi-answer question with two correct choices out of three.
pub fn primes_quiz() -> Quiz {
    let question = QuizQuestion::new(
        "Which are prime?",
        1,
        true,
        vec![
            QuizChoice::new("2", true, 1),
            QuizChoice::new("3", true, 2),
            QuizChoice::new("4", false, 3),
        ],
    );
    Quiz::new("Primes", 10, vec![question])
}

pub fn choice_id(quiz: &Quiz, text: &str) -> String {
    quiz.questions
        .iter()
        .flat_map(|q| q.choices.iter())
        .find(|c| c.choice_text == text)
        .map(|c| c.id.clone())
        .unwrap_or_else(|| panic!("no choice '{}' in quiz", text))
}
