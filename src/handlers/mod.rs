//! HTTP handlers per resource.

pub mod companies;
pub mod login;
pub mod polls;
pub mod public;
pub mod users;

use serde::Deserialize;

/// `?skip=&limit=` paging; the CRUD base applies the default and the cap on `limit`.
#[derive(Debug, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: Option<u32>,
}
