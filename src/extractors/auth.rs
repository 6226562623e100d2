//! Bearer-token authentication.

use crate::auth::verify_access_token;
use crate::error::AppError;
use crate::models::User;
use crate::service::UserService;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};

/// The authenticated, active user behind `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

fn bearer(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim()).filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
        let user_id = verify_access_token(token, &state.settings.secret_key)?;
        let user = match UserService::get_or_404(state.store(), user_id).await {
            Ok(u) => u,
            Err(AppError::NotFound(_)) => return Err(AppError::Unauthorized("Could not validate credentials".into())),
            Err(e) => return Err(e),
        };
        if !user.is_active {
            return Err(AppError::BadRequest("Inactive user".into()));
        }
        Ok(CurrentUser(user))
    }
}
