use super::Model;
use crate::store::{tables, TableDef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Model for Company {
    const TABLE: &'static TableDef = &tables::COMPANIES;

    fn id(&self) -> i64 {
        self.id
    }
}
