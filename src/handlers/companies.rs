use super::Paging;
use crate::error::AppError;
use crate::extractors::{ApiJson, CurrentUser};
use crate::response::{message, success_many, success_one, success_one_ok};
use crate::schemas::{CompanyCreate, CompanyUpdate};
use crate::service::CompanyService;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, AppError> {
    let companies = CompanyService::list(state.store(), &me, paging.skip, paging.limit).await?;
    Ok(success_many(companies))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<CompanyCreate>,
) -> Result<impl IntoResponse, AppError> {
    let company = CompanyService::create(state.store(), &me, body).await?;
    Ok(success_one(company))
}

pub async fn read(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(CompanyService::get(state.store(), &me, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<CompanyUpdate>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(CompanyService::update(state.store(), &me, id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    CompanyService::delete(state.store(), &me, id).await?;
    Ok(message(StatusCode::OK, "Company was deleted"))
}

/// GET /api/companies/:id/invitations
pub async fn invitations(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_many(CompanyService::invitations(state.store(), &me, id).await?))
}
