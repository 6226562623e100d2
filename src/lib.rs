//! testdesk: poll authoring and participation backend with company and user administration.

pub mod auth;
pub mod case;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod response;
pub mod routes;
pub mod schemas;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, TokenError};
pub use routes::app;
pub use settings::{Settings, StoreKind};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_schema, MemoryStore, PgStore, Store};
