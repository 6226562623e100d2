//! User administration, profile and registration handlers.

use super::Paging;
use crate::auth::require_roles;
use crate::error::AppError;
use crate::extractors::{ApiJson, CurrentUser};
use crate::models::Role;
use crate::response::{message, success_many, success_one, success_one_ok};
use crate::schemas::{
    RegistrationCompletion, TokenBody, UpdateUserProfile, UserCreate, UserCreateByEmail, UserOut, UserUpdate,
};
use crate::service::UserService;
use crate::state::AppState;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

const ADMINS: &[Role] = &[Role::Superadmin, Role::Admin];

/// GET /api/users
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Query(paging): Query<Paging>,
) -> Result<impl IntoResponse, AppError> {
    require_roles(&me, ADMINS)?;
    let users = UserService::get_multi(state.store(), &me, paging.skip, paging.limit).await?;
    Ok(success_many(users.iter().map(UserOut::from).collect()))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<UserCreate>,
) -> Result<impl IntoResponse, AppError> {
    require_roles(&me, ADMINS)?;
    let user = UserService::create(state.store(), &state.settings, &me, body).await?;
    Ok(success_one(UserOut::from(user)))
}

/// GET /api/users/me
pub async fn me(CurrentUser(me): CurrentUser) -> impl IntoResponse {
    success_one_ok(UserOut::from(me))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<UpdateUserProfile>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::profile_update(state.store(), &me, body).await?;
    Ok(success_one_ok(UserOut::from(user)))
}

/// GET /api/users/:id
pub async fn read(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_roles(&me, ADMINS)?;
    let user = UserService::get_visible(state.store(), &me, id).await?;
    Ok(success_one_ok(UserOut::from(user)))
}

/// PUT /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::update(state.store(), &me, id, body).await?;
    Ok(success_one_ok(UserOut::from(user)))
}

/// DELETE /api/users/:id
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_roles(&me, ADMINS)?;
    UserService::delete(state.store(), &me, id).await?;
    Ok(message(StatusCode::OK, "User was deleted"))
}

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    ApiJson(body): ApiJson<UserCreateByEmail>,
) -> Result<impl IntoResponse, AppError> {
    require_roles(&me, ADMINS)?;
    let link = UserService::invite(state.store(), &state.settings, &me, body).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// POST /api/users/register/verify
pub async fn verify_registration(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<TokenBody>,
) -> Result<impl IntoResponse, AppError> {
    let out = UserService::verify_registration(state.store(), &state.settings, &body.token).await?;
    Ok(Json(out))
}

/// POST /api/users/register/complete
pub async fn complete_registration(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegistrationCompletion>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::complete_registration(state.store(), &state.settings, body).await?;
    Ok(success_one(UserOut::from(user)))
}

/// POST /api/users/upload_avatar/:id (multipart field `file`)
pub async fn upload_avatar(
    State(state): State<AppState>,
    CurrentUser(me): CurrentUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
        let out = UserService::upload_avatar(
            state.store(),
            &state.settings,
            &me,
            id,
            content_type.as_deref(),
            file_name.as_deref(),
            &bytes,
        )
        .await?;
        return Ok(Json(out));
    }
    Err(AppError::Validation("file is required".into()))
}
