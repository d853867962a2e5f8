use async_graphql::{Context, ErrorExtensions};

use crate::{
    app_state::AppState,
    auth::{actor_from_context, Actor},
    errors::AppResult,
};

/// Convert a service result into a GraphQL result carrying `extensions.code`.
pub fn into_graphql<T>(result: AppResult<T>) -> async_graphql::Result<T> {
    result.map_err(|e| e.extend())
}

/// Application state and acting user for a resolver.
pub fn resolver_parts<'a>(ctx: &Context<'a>) -> async_graphql::Result<(&'a AppState, Actor)> {
    let state = ctx.data::<AppState>()?;
    let actor = into_graphql(actor_from_context(ctx))?;
    Ok((state, actor))
}
