//! Liveness, readiness and build info. Mounted outside `/api`.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// 503 while the store does not answer a ping.
async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.store().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "store": "ok" }))),
        Err(e) => {
            tracing::warn!(error = %e, "store ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "store": "unavailable" })),
            )
        }
    }
}

async fn version() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
}
