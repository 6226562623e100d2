use super::{roles_column, Model, Role};
use crate::store::{tables, TableDef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pending (or consumed) registration invite. `token` is the signed registration token
/// sent to the invitee; it is never echoed back in API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Invitation {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub token: String,
    #[serde(with = "roles_column")]
    pub roles: Vec<Role>,
    pub full_name: Option<String>,
    pub company_id: Option<i64>,
    pub is_active: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Model for Invitation {
    const TABLE: &'static TableDef = &tables::INVITATIONS;

    fn id(&self) -> i64 {
        self.id
    }
}
