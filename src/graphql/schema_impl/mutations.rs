use async_graphql::{Context, Object, Result, ID};

use crate::{
    graphql::helpers::{into_graphql, resolver_parts},
    models::{
        domain::UserAnswer,
        dto::{
            request::{StartAttemptRequest, SubmitAnswersRequest, UpdateAnswerRequest},
            response::{StartAttemptResponse, StopAttemptResponse, UpdateAnswerResponse},
        },
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn start_attempt(
        &self,
        ctx: &Context<'_>,
        input: StartAttemptRequest,
    ) -> Result<StartAttemptResponse> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(state.attempt_service.start_attempt(&actor, input).await)
    }

    async fn submit_answers(
        &self,
        ctx: &Context<'_>,
        result_id: ID,
        input: SubmitAnswersRequest,
    ) -> Result<Vec<UserAnswer>> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(
            state
                .attempt_service
                .submit_answers(&actor, &result_id, input)
                .await,
        )
    }

    async fn update_answer(
        &self,
        ctx: &Context<'_>,
        answer_id: ID,
        input: UpdateAnswerRequest,
    ) -> Result<UpdateAnswerResponse> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(
            state
                .attempt_service
                .update_answer(&actor, &answer_id, input)
                .await,
        )
    }

    async fn stop_attempt(&self, ctx: &Context<'_>, result_id: ID) -> Result<StopAttemptResponse> {
        let (state, actor) = resolver_parts(ctx)?;
        into_graphql(state.attempt_service.stop_attempt(&actor, &result_id).await)
    }
}
