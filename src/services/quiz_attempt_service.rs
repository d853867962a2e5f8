use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{require_owner_or_admin, Actor},
    clock::{attempt_day, Clock},
    errors::{AppError, AppResult},
    models::{
        domain::{Quiz, QuizAttempt, UserAnswer},
        dto::{
            request::{AttemptListQuery, StartAttemptRequest, SubmitAnswersRequest, UpdateAnswerRequest},
            response::{
                FeedbackReport, PaginatedAttempts, PaginationMetadata, QuizPaper,
                StartAttemptResponse, StopAttemptResponse, UpdateAnswerResponse,
            },
        },
    },
    repositories::{QuizAttemptRepository, QuizRepository, UserAnswerRepository, UserRepository},
    services::{
        answer_gate::{self, AnswerChange},
        attempt_lifecycle::{AttemptLifecycle, StopOutcome},
        scoring::ScoringEngine,
    },
};

/// Storage collaborators the attempt service reads and writes through.
#[derive(Clone)]
pub struct AttemptRepositories {
    pub attempts: Arc<dyn QuizAttemptRepository>,
    pub answers: Arc<dyn UserAnswerRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// Entry point for every attempt operation. Loads what a request needs,
/// delegates the decision to the lifecycle, gate or scoring engine and
/// persists the result.
pub struct QuizAttemptService {
    repos: AttemptRepositories,
    clock: Arc<dyn Clock>,
    lifecycle: AttemptLifecycle,
    scoring: ScoringEngine,
}

impl QuizAttemptService {
    pub fn new(
        repos: AttemptRepositories,
        clock: Arc<dyn Clock>,
        lifecycle: AttemptLifecycle,
        scoring: ScoringEngine,
    ) -> Self {
        Self {
            repos,
            clock,
            lifecycle,
            scoring,
        }
    }

    pub async fn start_attempt(
        &self,
        actor: &Actor,
        request: StartAttemptRequest,
    ) -> AppResult<StartAttemptResponse> {
        request.validate()?;

        let quiz = self.load_quiz(&request.quiz_id).await?;
        self.repos
            .users
            .find_by_id(&actor.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        let now = self.clock.now();
        if !actor.is_admin() {
            let active = self
                .repos
                .attempts
                .find_in_progress_for_user(&actor.user_id)
                .await?;
            let started_today = self
                .repos
                .attempts
                .count_for_day(&actor.user_id, &quiz.id, &attempt_day(now))
                .await?;
            self.lifecycle
                .ensure_can_start(actor, &active, started_today)?;
        }

        let attempt = self.lifecycle.begin(actor, &quiz, now);
        let attempt = self.repos.attempts.create(attempt).await?;

        log::info!(
            "User {} started attempt {} on quiz {}",
            actor.user_id,
            attempt.id,
            quiz.id
        );

        Ok(StartAttemptResponse::new(&attempt, &quiz))
    }

    pub async fn submit_answers(
        &self,
        actor: &Actor,
        result_id: &str,
        request: SubmitAnswersRequest,
    ) -> AppResult<Vec<UserAnswer>> {
        request.validate()?;

        let attempt = self.load_attempt(result_id).await?;
        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        let recorded = self.repos.answers.find_by_attempt(&attempt.id).await?;

        let staged = answer_gate::validate_batch(
            &attempt,
            &quiz,
            &request.quiz_id,
            &request.answers,
            &recorded,
            actor,
            self.clock.now(),
        )?;

        let created = self.repos.answers.create_many(staged).await?;
        log::debug!(
            "Recorded {} answer(s) for attempt {}",
            created.len(),
            attempt.id
        );
        Ok(created)
    }

    pub async fn update_answer(
        &self,
        actor: &Actor,
        answer_id: &str,
        request: UpdateAnswerRequest,
    ) -> AppResult<UpdateAnswerResponse> {
        request.validate()?;

        let answer = self
            .repos
            .answers
            .find_by_id(answer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("User answer with ID {} not found.", answer_id))
            })?;
        let attempt = self.load_attempt(&answer.result_id).await?;
        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        let recorded = self.repos.answers.find_by_attempt(&attempt.id).await?;

        let change = answer_gate::validate_update(
            &attempt,
            &quiz,
            &answer,
            &request.choice_id,
            &recorded,
            actor,
            self.clock.now(),
        )?;

        match change {
            AnswerChange::Unchanged(answer) => Ok(UpdateAnswerResponse {
                message: "No changes made to the user answer".to_string(),
                answer,
            }),
            AnswerChange::Replaced(updated) => {
                let answer = self.repos.answers.update_choice(updated).await?;
                Ok(UpdateAnswerResponse {
                    message: "User answer updated successfully".to_string(),
                    answer,
                })
            }
        }
    }

    pub async fn stop_attempt(&self, actor: &Actor, result_id: &str) -> AppResult<StopAttemptResponse> {
        let attempt = self.load_attempt(result_id).await?;
        let quiz = self.load_quiz(&attempt.quiz_id).await?;

        let outcome = self
            .lifecycle
            .stop(&attempt, &quiz, actor, self.clock.now())?;

        let finished = match outcome {
            StopOutcome::AlreadyFinished(attempt) => attempt,
            StopOutcome::Finished(finished) => {
                if !self.repos.attempts.finish(&finished).await? {
                    // Another stop won the race.
                    if !actor.is_admin() {
                        return Err(AppError::Conflict(
                            "Quiz has already been completed or timed out.".to_string(),
                        ));
                    }
                    self.load_attempt(result_id).await?
                } else {
                    log::info!(
                        "Attempt {} finished as {}",
                        finished.id,
                        finished.status.as_str()
                    );
                    finished
                }
            }
        };

        Ok(StopAttemptResponse::new(&finished, &quiz))
    }

    pub async fn get_feedback(&self, actor: &Actor, result_id: &str) -> AppResult<FeedbackReport> {
        let mut attempt = self.load_attempt(result_id).await?;
        require_owner_or_admin(actor, &attempt.user_id, "view the feedback for this quiz")?;

        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        let answers = self.repos.answers.find_by_attempt(&attempt.id).await?;
        let report = self.scoring.score(&attempt, &quiz, &answers)?;

        if report.total_score != attempt.score {
            self.repos
                .attempts
                .update_score(&attempt.id, report.total_score)
                .await?;
            log::info!(
                "Stored score {} for attempt {} (was {})",
                report.total_score,
                attempt.id,
                attempt.score
            );
            attempt.score = report.total_score;
        }

        Ok(FeedbackReport::new(&attempt, &quiz, report))
    }

    pub async fn get_attempt(&self, actor: &Actor, result_id: &str) -> AppResult<QuizAttempt> {
        let attempt = self.load_attempt(result_id).await?;
        require_owner_or_admin(actor, &attempt.user_id, "view this result")?;
        Ok(attempt)
    }

    pub async fn list_attempts(
        &self,
        actor: &Actor,
        query: AttemptListQuery,
    ) -> AppResult<PaginatedAttempts> {
        query.validate()?;

        let pagination = query.pagination();
        let (offset, limit) = (pagination.offset(), pagination.limit());

        let (data, total) = self
            .repos
            .attempts
            .list_for_user(&actor.user_id, query.quiz_id, offset, limit)
            .await?;

        Ok(PaginatedAttempts {
            data,
            pagination: PaginationMetadata::new(offset, limit, total),
        })
    }

    pub async fn list_answers(&self, actor: &Actor, result_id: &str) -> AppResult<Vec<UserAnswer>> {
        let attempt = self.load_attempt(result_id).await?;
        require_owner_or_admin(actor, &attempt.user_id, "view the answers for this quiz")?;

        let mut answers = self.repos.answers.find_by_attempt(&attempt.id).await?;
        answers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(answers)
    }

    pub async fn question_paper(&self, actor: &Actor, result_id: &str) -> AppResult<QuizPaper> {
        let attempt = self.load_attempt(result_id).await?;
        require_owner_or_admin(actor, &attempt.user_id, "view this quiz")?;

        if !actor.is_admin() && !attempt.is_in_progress() {
            return Err(AppError::Forbidden(
                "The questions are only available while the quiz is in progress.".to_string(),
            ));
        }

        let quiz = self.load_quiz(&attempt.quiz_id).await?;
        Ok(QuizPaper::new(&attempt, &quiz))
    }

    async fn load_attempt(&self, result_id: &str) -> AppResult<QuizAttempt> {
        self.repos
            .attempts
            .find_by_id(result_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Result with ID {} not found.", result_id)))
    }

    async fn load_quiz(&self, quiz_id: &str) -> AppResult<Quiz> {
        self.repos
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz with ID {} not found.", quiz_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::ManualClock,
        models::domain::{AttemptStatus, QuizChoice, QuizQuestion, User, UserRole},
        repositories::{
            quiz_attempt_repository::MockQuizAttemptRepository,
            quiz_repository::MockQuizRepository,
            user_answer_repository::MockUserAnswerRepository,
            user_repository::MockUserRepository,
        },
    };
    use chrono::{TimeZone, Utc};

    fn sample_quiz() -> Quiz {
        let question = QuizQuestion::new(
            "2 + 3?",
            1,
            false,
            vec![QuizChoice::new("5", true, 1), QuizChoice::new("6", false, 2)],
        );
        Quiz::new("Arithmetic", 10, vec![question])
    }

    fn service(
        attempts: MockQuizAttemptRepository,
        answers: MockUserAnswerRepository,
        quizzes: MockQuizRepository,
        users: MockUserRepository,
    ) -> QuizAttemptService {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap());
        QuizAttemptService::new(
            AttemptRepositories {
                attempts: Arc::new(attempts),
                answers: Arc::new(answers),
                quizzes: Arc::new(quizzes),
                users: Arc::new(users),
            },
            Arc::new(clock),
            AttemptLifecycle::default(),
            ScoringEngine::default(),
        )
    }

    #[tokio::test]
    async fn start_propagates_storage_failure() {
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(|_| Err(AppError::DatabaseError("connection reset".to_string())));

        let service = service(
            MockQuizAttemptRepository::new(),
            MockUserAnswerRepository::new(),
            quizzes,
            MockUserRepository::new(),
        );

        let result = service
            .start_attempt(
                &Actor::user("u-1"),
                StartAttemptRequest {
                    quiz_id: "quiz-1".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }

    #[tokio::test]
    async fn start_for_unknown_user_is_not_found() {
        let quiz = sample_quiz();
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(quiz.clone())));
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().returning(|_| Ok(None));
        let mut attempts = MockQuizAttemptRepository::new();
        attempts.expect_create().never();

        let service = service(attempts, MockUserAnswerRepository::new(), quizzes, users);

        let result = service
            .start_attempt(
                &Actor::user("ghost"),
                StartAttemptRequest {
                    quiz_id: "quiz-1".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn admin_start_skips_limit_queries() {
        let quiz = sample_quiz();
        let quiz_id = quiz.id.clone();
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(quiz.clone())));
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .returning(|_| Ok(Some(User::new("root", "root@example.com", UserRole::Admin))));
        let mut attempts = MockQuizAttemptRepository::new();
        attempts.expect_find_in_progress_for_user().never();
        attempts.expect_count_for_day().never();
        attempts.expect_create().times(1).returning(Ok);

        let service = service(attempts, MockUserAnswerRepository::new(), quizzes, users);

        let response = service
            .start_attempt(&Actor::admin("root"), StartAttemptRequest { quiz_id })
            .await
            .expect("admin start");
        assert_eq!(response.status, AttemptStatus::InProgress);
        assert_eq!(response.time_limit, 10);
    }

    #[tokio::test]
    async fn lost_stop_race_is_a_conflict_for_users() {
        let quiz = sample_quiz();
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();
        let attempt = QuizAttempt::start("u-1", &quiz.id, true, start);
        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(quiz.clone())));
        let mut attempts = MockQuizAttemptRepository::new();
        attempts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(attempt.clone())));
        attempts.expect_finish().times(1).returning(|_| Ok(false));

        let service = service(attempts, MockUserAnswerRepository::new(), quizzes, MockUserRepository::new());

        let result = service.stop_attempt(&Actor::user("u-1"), "any").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn feedback_skips_write_when_score_is_current() {
        let quiz = sample_quiz();
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();
        let mut attempt = QuizAttempt::start("u-1", &quiz.id, true, start);
        attempt.status = AttemptStatus::Completed;
        let answer = UserAnswer::new(
            &attempt.id,
            "u-1",
            &quiz.id,
            &quiz.questions[0].id,
            &quiz.questions[0].choices[0].id,
            false,
            start,
        );
        attempt.score = 1.0;

        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(quiz.clone())));
        let mut attempts = MockQuizAttemptRepository::new();
        attempts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(attempt.clone())));
        attempts.expect_update_score().never();
        let mut answers = MockUserAnswerRepository::new();
        answers
            .expect_find_by_attempt()
            .returning(move |_| Ok(vec![answer.clone()]));

        let service = service(attempts, answers, quizzes, MockUserRepository::new());

        let report = service
            .get_feedback(&Actor::user("u-1"), "any")
            .await
            .expect("feedback");
        assert_eq!(report.user_score, 1.0);
        assert_eq!(report.feedback, "Excellent! You're a star!");
    }

    #[tokio::test]
    async fn failed_answer_insert_is_reported() {
        let quiz = sample_quiz();
        let quiz_id = quiz.id.clone();
        let question_id = quiz.questions[0].id.clone();
        let choice_id = quiz.questions[0].choices[0].id.clone();
        let start = Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap();
        let attempt = QuizAttempt::start("u-1", &quiz.id, true, start);

        let mut quizzes = MockQuizRepository::new();
        quizzes
            .expect_find_by_id()
            .returning(move |_| Ok(Some(quiz.clone())));
        let mut attempts = MockQuizAttemptRepository::new();
        attempts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(attempt.clone())));
        let mut answers = MockUserAnswerRepository::new();
        answers.expect_find_by_attempt().returning(|_| Ok(vec![]));
        answers
            .expect_create_many()
            .returning(|_| Err(AppError::DatabaseError("transaction aborted".to_string())));

        let service = service(attempts, answers, quizzes, MockUserRepository::new());

        let result = service
            .submit_answers(
                &Actor::user("u-1"),
                "any",
                SubmitAnswersRequest {
                    quiz_id,
                    answers: vec![crate::models::dto::request::AnswerInput {
                        question_id,
                        choice_id,
                    }],
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::DatabaseError(_))));
    }
}
