use crate::auth::create_access_token;
use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::response::message;
use crate::schemas::{AccessToken, LoginRequest, NewPassword, PasswordRecovery};
use crate::service::UserService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Duration;

/// POST /api/login/access-token
pub async fn access_token(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<AccessToken>, AppError> {
    let user = UserService::authenticate(state.store(), &body.email, &body.password).await?;
    let token = create_access_token(
        user.id,
        &state.settings.secret_key,
        Duration::minutes(state.settings.access_token_expire_minutes),
    )?;
    tracing::debug!(user_id = user.id, "access token issued");
    Ok(Json(AccessToken {
        access_token: token,
        token_type: "bearer".into(),
    }))
}

/// POST /api/password-recovery
pub async fn recover_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<PasswordRecovery>,
) -> Result<impl IntoResponse, AppError> {
    UserService::recover_password(state.store(), &state.settings, &body.email).await?;
    Ok(message(StatusCode::OK, "Password recovery email sent"))
}

/// POST /api/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPassword>,
) -> Result<impl IntoResponse, AppError> {
    UserService::reset_password(state.store(), &state.settings, body).await?;
    Ok(message(StatusCode::OK, "Password updated successfully"))
}
