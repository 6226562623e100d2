//! Poll authoring handlers. Every route requires an authenticated owner (or a superadmin).

use super::Paging;
use crate::error::AppError;
use crate::extractors::{ApiJson, CurrentUser};
use crate::response::{message, success_many, success_one, success_one_ok};
use crate::schemas::{ChoiceCreate, PollCreate, PollUpdate, QuestionCreate, QuestionUpdate, StatusChange};
use crate::service::PollService;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(PollService::list(state.store(), &me, paging.skip, paging.limit).await?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<PollCreate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(PollService::create(state.store(), &me, body).await?))
}

pub async fn read(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let poll = PollService::get_owned(state.store(), &me, id).await?;
    Ok(success_one_ok(PollService::detail(state.store(), poll).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<PollUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(PollService::update(state.store(), &me, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    PollService::delete(state.store(), &me, id).await?;
    Ok(message(StatusCode::OK, "Poll was deleted"))
}

/// POST /api/polls/:id/status
pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<StatusChange>,
) -> Result<impl IntoResponse, AppError> {
    let poll = PollService::change_status(state.store(), &state.settings, &me, id, body.status).await?;
    Ok(success_one_ok(poll))
}

/// POST /api/polls/:id/questions
pub async fn add_question(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<QuestionCreate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(PollService::add_question(state.store(), &me, id, body).await?))
}

/// PUT /api/questions/:id
pub async fn update_question(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<QuestionUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(PollService::update_question(state.store(), &me, id, body).await?))
}

/// DELETE /api/questions/:id
pub async fn delete_question(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    PollService::delete_question(state.store(), &me, id).await?;
    Ok(message(StatusCode::OK, "Question was deleted"))
}

/// POST /api/questions/:id/choices
pub async fn add_choice(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<ChoiceCreate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(PollService::add_choice(state.store(), &me, id, body).await?))
}

/// DELETE /api/choices/:id
pub async fn delete_choice(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    PollService::delete_choice(state.store(), &me, id).await?;
    Ok(message(StatusCode::OK, "Choice was deleted"))
}

/// GET /api/polls/:id/responses
pub async fn responses(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(PollService::responses(state.store(), &me, id).await?))
}

/// GET /api/polls/:id/results
pub async fn results(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(PollService::results(state.store(), &me, id).await?))
}
