use async_graphql::{Context, Object, Result, ID};

use crate::{
    graphql::helpers::{into_graphql, resolver_parts},
    models::{
        domain::{QuizAttempt, UserAnswer},
        dto::{
            request::AttemptListQuery,
            response::{FeedbackReport, PaginatedAttempts, QuizPaper},
        },
    },
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn attempt(&self, ctx: &Context<'_>, id: ID) -> Result<QuizAttempt> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(state.attempt_service.get_attempt(&actor, &id).await)
    }

    /// The caller's own attempts, newest first.
    async fn attempts(
        &self,
        ctx: &Context<'_>,
        quiz_id: Option<ID>,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PaginatedAttempts> {
        let (state, actor) = resolver_parts(ctx)?;
        let query = AttemptListQuery {
            quiz_id: quiz_id.map(|id| id.to_string()),
            offset,
            limit,
        };
        into_graphql(state.attempt_service.list_attempts(&actor, query).await)
    }

    async fn attempt_questions(&self, ctx: &Context<'_>, result_id: ID) -> Result<QuizPaper> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(state.attempt_service.question_paper(&actor, &result_id).await)
    }

    async fn attempt_answers(&self, ctx: &Context<'_>, result_id: ID) -> Result<Vec<UserAnswer>> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(state.attempt_service.list_answers(&actor, &result_id).await)
    }

    async fn attempt_feedback(&self, ctx: &Context<'_>, result_id: ID) -> Result<FeedbackReport> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(state.attempt_service.get_feedback(&actor, &result_id).await)
    }
}
