//! Router assembly.

mod api;
mod common;
mod openapi;

pub use api::api_routes;
pub use common::common_routes;
pub use openapi::ApiDoc;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Room for multipart framing on top of the avatar itself.
const BODY_OVERHEAD: usize = 64 * 1024;

fn cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

/// The full application: common routes, `/api`, OpenAPI, with tracing, CORS and a body size limit.
pub fn app(state: AppState) -> Router {
    let body_limit = state.settings.max_avatar_bytes + BODY_OVERHEAD;
    // CORS stays innermost: it needs a `Default` response body.
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors(&state.settings.cors_origins));
    Router::new()
        .merge(common_routes())
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware)
        .with_state(state)
}
