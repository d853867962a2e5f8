use async_graphql::Context;

use crate::{
    auth::{claims::Actor, Claims},
    errors::{AppError, AppResult},
};

pub fn require_owner_or_admin(actor: &Actor, resource_owner: &str, action: &str) -> AppResult<()> {
    if !actor.is_admin() && !actor.owns(resource_owner) {
        log::debug!("User {} denied: {}", actor.user_id, action);
        return Err(AppError::Forbidden(format!(
            "You are not authorized to {}.",
            action
        )));
    }
    Ok(())
}

pub fn extract_claims_from_context(ctx: &Context<'_>) -> AppResult<Claims> {
    ctx.data::<Claims>()
        .cloned()
        .map_err(|_| AppError::Unauthorized("Authentication required".to_string()))
}

pub fn actor_from_context(ctx: &Context<'_>) -> AppResult<Actor> {
    extract_claims_from_context(ctx).map(|claims| Actor::from(&claims))
}
