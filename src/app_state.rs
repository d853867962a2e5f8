use std::sync::Arc;

use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    db::Database,
    errors::AppResult,
    repositories::{
        MongoQuizAttemptRepository, MongoQuizRepository, MongoUserAnswerRepository,
        MongoUserRepository,
    },
    services::{
        attempt_lifecycle::AttemptLifecycle, scoring::ScoringEngine, AttemptRepositories,
        QuizAttemptService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub attempt_service: Arc<QuizAttemptService>,
    pub config: Arc<Config>,
    /// Absent when the state is assembled over non-Mongo repositories.
    pub database: Option<Database>,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let db = Database::connect(&config).await?;

        let attempts = Arc::new(MongoQuizAttemptRepository::new(&db));
        attempts.ensure_indexes().await?;
        let answers = Arc::new(MongoUserAnswerRepository::new(&db));
        answers.ensure_indexes().await?;
        let quizzes = Arc::new(MongoQuizRepository::new(&db));
        quizzes.ensure_indexes().await?;
        let users = Arc::new(MongoUserRepository::new(&db));

        let repos = AttemptRepositories {
            attempts,
            answers,
            quizzes,
            users,
        };

        let mut state = Self::from_parts(config, repos, Arc::new(SystemClock));
        state.database = Some(db);
        Ok(state)
    }

    /// Wire the service over arbitrary repositories and clock.
    pub fn from_parts(config: Config, repos: AttemptRepositories, clock: Arc<dyn Clock>) -> Self {
        let attempt_service = Arc::new(QuizAttemptService::new(
            repos,
            clock,
            AttemptLifecycle::new(config.max_daily_attempts),
            ScoringEngine::new(config.penalty_basis),
        ));

        Self {
            attempt_service,
            config: Arc::new(config),
            database: None,
        }
    }

    pub async fn health_check(&self) -> AppResult<()> {
        match &self.database {
            Some(db) => db.health_check().await,
            None => Ok(()),
        }
    }
}
