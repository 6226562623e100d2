use crate::extractors::RequestBody;
use crate::service::{Rules, ValidationRule};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CompanyCreate {
    pub name: String,
}

impl RequestBody for CompanyCreate {
    const RULES: &'static Rules = &[("name", ValidationRule::new().required().length(1, 255))];
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct CompanyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RequestBody for CompanyUpdate {
    const RULES: &'static Rules = &[("name", ValidationRule::new().length(1, 255))];
    const PARTIAL: bool = true;
}
