use crate::extractors::RequestBody;
use crate::models::{roles_column, Role, User};
use crate::service::{Rules, ValidationRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const EMAIL: ValidationRule = ValidationRule::new().required().email().max_length(255);
const PASSWORD: ValidationRule = ValidationRule::new().length(8, 128);
const FULL_NAME: ValidationRule = ValidationRule::new().max_length(255);

/// User as returned by the API; never includes the password hash.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserOut {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: String,
    pub is_active: bool,
    pub roles: Vec<Role>,
    pub company_id: Option<i64>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserOut {
    fn from(u: &User) -> Self {
        UserOut {
            id: u.id,
            full_name: u.full_name.clone(),
            email: u.email.clone(),
            is_active: u.is_active,
            roles: u.roles.clone(),
            company_id: u.company_id,
            avatar: u.avatar.clone(),
            created_at: u.created_at,
        }
    }
}

impl From<User> for UserOut {
    fn from(u: User) -> Self {
        UserOut::from(&u)
    }
}

/// Direct creation by an administrator.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl RequestBody for UserCreate {
    const RULES: &'static Rules = &[
        ("email", EMAIL),
        ("password", PASSWORD.required()),
        ("full_name", FULL_NAME),
    ];
}

/// Administrative update of another user (or oneself).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<Role>>,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl RequestBody for UserUpdate {
    const RULES: &'static Rules = &[("email", EMAIL), ("password", PASSWORD), ("full_name", FULL_NAME)];
    const PARTIAL: bool = true;
}

/// Self-service profile update; a new password needs the current one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub old_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl RequestBody for UpdateUserProfile {
    const RULES: &'static Rules = &[("email", EMAIL), ("new_password", PASSWORD), ("full_name", FULL_NAME)];
    const PARTIAL: bool = true;
}

/// Invitation request: the invitee gets a registration link.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateByEmail {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub company_id: Option<i64>,
}

impl RequestBody for UserCreateByEmail {
    const RULES: &'static Rules = &[("email", EMAIL), ("full_name", FULL_NAME)];
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationLink {
    pub message: String,
    pub link: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenBody {
    pub token: String,
}

impl RequestBody for TokenBody {
    const RULES: &'static Rules = &[("token", ValidationRule::new().required())];
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenVerificationResponse {
    pub message: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub full_name: Option<String>,
    pub company_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegistrationCompletion {
    pub token: String,
    pub password: String,
    #[serde(default)]
    pub company_id: Option<i64>,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl RequestBody for RegistrationCompletion {
    const RULES: &'static Rules = &[
        ("token", ValidationRule::new().required()),
        ("password", PASSWORD.required()),
        ("full_name", FULL_NAME),
    ];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl RequestBody for LoginRequest {
    const RULES: &'static Rules = &[
        ("email", ValidationRule::new().required()),
        ("password", ValidationRule::new().required()),
    ];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PasswordRecovery {
    pub email: String,
}

impl RequestBody for PasswordRecovery {
    const RULES: &'static Rules = &[("email", EMAIL)];
}

/// Sets a new password with a reset token.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPassword {
    pub token: String,
    pub new_password: String,
}

impl RequestBody for NewPassword {
    const RULES: &'static Rules = &[
        ("token", ValidationRule::new().required()),
        ("new_password", PASSWORD.required()),
    ];
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUploaded {
    pub message: String,
    pub path_to_avatar: String,
}

/// Columns written when a user row is created.
#[derive(Debug, Default, Serialize)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(serialize_with = "roles_column::serialize")]
    pub roles: Vec<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Columns changed on a user row; unset fields are left as they are.
#[derive(Debug, Default, Serialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hashed_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "roles_opt")]
    pub roles: Option<Vec<Role>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

fn roles_opt<S: serde::Serializer>(roles: &Option<Vec<Role>>, s: S) -> Result<S::Ok, S::Error> {
    match roles {
        Some(r) => roles_column::serialize(r, s),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::to_row;
    use serde_json::json;

    #[test]
    fn new_user_omits_unset_columns() {
        let row = to_row(&NewUser {
            email: "a@example.com".into(),
            hashed_password: "h".into(),
            roles: vec![Role::Admin, Role::User],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(row["roles"], json!("admin,user"));
        assert!(!row.contains_key("company_id"));
        assert!(!row.contains_key("is_active"));
    }

    #[test]
    fn user_changes_only_carry_set_fields() {
        let row = to_row(&UserChanges {
            roles: Some(vec![Role::Superadmin]),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(row.len(), 1);
        assert_eq!(row["roles"], json!("superadmin"));
    }
}
