//! JSON body extractor: accepts camelCase or snake_case keys, checks field rules, then deserializes.

use crate::case::snake_case_keys;
use crate::error::AppError;
use crate::service::{RequestValidator, Rules};
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A request body type with its validation rules.
pub trait RequestBody: DeserializeOwned + Send {
    const RULES: &'static Rules = &[];
    /// Updates only check the fields that are present.
    const PARTIAL: bool = false;
}

pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: RequestBody,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        snake_case_keys(&mut value);
        let Value::Object(body) = &value else {
            return Err(AppError::BadRequest("body must be a JSON object".into()));
        };
        if T::PARTIAL {
            RequestValidator::validate_partial(body, T::RULES)?;
        } else {
            RequestValidator::validate(body, T::RULES)?;
        }
        let parsed = serde_json::from_value(value).map_err(|e| AppError::Validation(e.to_string()))?;
        Ok(ApiJson(parsed))
    }
}
