use std::sync::Arc;

use actix_web::{get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::request::{
        AttemptListQuery, StartAttemptRequest, SubmitAnswersRequest, UpdateAnswerRequest,
    },
};

#[post("/attempts")]
async fn start_attempt(
    state: web::Data<Arc<AppState>>,
    request: web::Json<StartAttemptRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .start_attempt(&auth.actor(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(response))
}

#[get("/attempts")]
async fn list_attempts(
    state: web::Data<Arc<AppState>>,
    query: web::Query<AttemptListQuery>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .list_attempts(&auth.actor(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/attempts/{result_id}")]
async fn get_attempt(
    state: web::Data<Arc<AppState>>,
    result_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .get_attempt(&auth.actor(), &result_id)
        .await?;
    Ok(HttpResponse::Ok().json(attempt))
}

#[get("/attempts/{result_id}/questions")]
async fn get_question_paper(
    state: web::Data<Arc<AppState>>,
    result_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let paper = state
        .attempt_service
        .question_paper(&auth.actor(), &result_id)
        .await?;
    Ok(HttpResponse::Ok().json(paper))
}

#[post("/attempts/{result_id}/answers")]
async fn submit_answers(
    state: web::Data<Arc<AppState>>,
    result_id: web::Path<String>,
    request: web::Json<SubmitAnswersRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let answers = state
        .attempt_service
        .submit_answers(&auth.actor(), &result_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(answers))
}

#[get("/attempts/{result_id}/answers")]
async fn list_answers(
    state: web::Data<Arc<AppState>>,
    result_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let answers = state
        .attempt_service
        .list_answers(&auth.actor(), &result_id)
        .await?;
    Ok(HttpResponse::Ok().json(answers))
}

#[put("/answers/{answer_id}")]
async fn update_answer(
    state: web::Data<Arc<AppState>>,
    answer_id: web::Path<String>,
    request: web::Json<UpdateAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .update_answer(&auth.actor(), &answer_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/attempts/{result_id}/stop")]
async fn stop_attempt(
    state: web::Data<Arc<AppState>>,
    result_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let response = state
        .attempt_service
        .stop_attempt(&auth.actor(), &result_id)
        .await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/attempts/{result_id}/feedback")]
async fn get_feedback(
    state: web::Data<Arc<AppState>>,
    result_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let report = state
        .attempt_service
        .get_feedback(&auth.actor(), &result_id)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Mount the attempt routes; the caller supplies the `/api` scope and auth.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(start_attempt)
        .service(list_attempts)
        .service(get_attempt)
        .service(get_question_paper)
        .service(submit_answers)
        .service(list_answers)
        .service(update_answer)
        .service(stop_attempt)
        .service(get_feedback);
}
