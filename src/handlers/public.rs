//! Unauthenticated participation in published polls.

use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::response::{success_one, success_one_ok};
use crate::schemas::SubmitResponses;
use crate::service::PollService;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

/// GET /api/public/polls/:uuid
pub async fn read(State(state): State<AppState>, Path(uuid): Path<Uuid>) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(PollService::public_detail(state.store(), uuid).await?))
}

/// POST /api/public/polls/:uuid/responses
pub async fn submit(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    ApiJson(body): ApiJson<SubmitResponses>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one(PollService::submit(state.store(), uuid, body).await?))
}
