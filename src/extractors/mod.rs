//! Request extractors.

mod auth;
mod json;

pub use auth::CurrentUser;
pub use json::{ApiJson, RequestBody};
