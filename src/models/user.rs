use super::Model;
use crate::store::{tables, TableDef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

// Clients historically send "ADMIN" as often as "admin".
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encode roles the way the `roles` column stores them: `"admin,user"`.
pub fn roles_joined(roles: &[Role]) -> String {
    roles.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(",")
}

/// Split a stored `roles` column. Unknown entries are dropped.
pub fn roles_split(stored: &str) -> Vec<Role> {
    stored
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match s.parse() {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring stored role");
                None
            }
        })
        .collect()
}

pub(crate) mod roles_column {
    use super::*;

    pub fn serialize<S: Serializer>(roles: &[Role], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&roles_joined(roles))
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored {
        Joined(String),
        List(Vec<Role>),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Role>, D::Error> {
        Ok(match Stored::deserialize(d)? {
            Stored::Joined(s) => roles_split(&s),
            Stored::List(v) => v,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
    #[serde(with = "roles_column")]
    pub roles: Vec<Role>,
    pub company_id: Option<i64>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(*r))
    }

    pub fn is_superadmin(&self) -> bool {
        self.has_role(Role::Superadmin)
    }

    pub fn is_admin(&self) -> bool {
        self.has_any_role(&[Role::Superadmin, Role::Admin])
    }

    /// Whether this user may read and manage `other`: superadmins everyone,
    /// admins the non-superadmin users of their own company, everyone themselves.
    pub fn can_manage(&self, other: &User) -> bool {
        if self.id == other.id || self.is_superadmin() {
            return true;
        }
        if other.is_superadmin() {
            return false;
        }
        self.has_role(Role::Admin) && self.company_id.is_some() && self.company_id == other.company_id
    }
}

impl Model for User {
    const TABLE: &'static TableDef = &tables::USERS;

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: i64, roles: &str, company_id: Option<i64>) -> User {
        serde_json::from_value(json!({
            "id": id,
            "full_name": null,
            "email": format!("u{}@example.com", id),
            "hashed_password": "x",
            "is_active": true,
            "roles": roles,
            "company_id": company_id,
            "avatar": null,
            "created_at": "2024-02-14T10:48:40+00:00"
        }))
        .unwrap()
    }

    #[test]
    fn roles_decode_from_joined_column() {
        let u = user(1, "superadmin,admin", None);
        assert_eq!(u.roles, vec![Role::Superadmin, Role::Admin]);
        assert_eq!(roles_joined(&u.roles), "superadmin,admin");
    }

    #[test]
    fn empty_and_unknown_roles_are_dropped() {
        assert!(roles_split("").is_empty());
        assert_eq!(roles_split("user,wizard"), vec![Role::User]);
    }

    #[test]
    fn role_parsing_ignores_case() {
        let roles: Vec<Role> = serde_json::from_value(json!(["ADMIN", "User"])).unwrap();
        assert_eq!(roles, vec![Role::Admin, Role::User]);
        assert_eq!(serde_json::to_value(Role::Superadmin).unwrap(), json!("superadmin"));
    }

    #[test]
    fn admin_manages_only_own_company() {
        let admin = user(1, "admin", Some(7));
        assert!(admin.can_manage(&user(2, "user", Some(7))));
        assert!(!admin.can_manage(&user(3, "user", Some(8))));
        assert!(!user(4, "user", Some(7)).can_manage(&user(2, "user", Some(7))));
        assert!(user(5, "superadmin", None).can_manage(&user(3, "user", Some(8))));
    }

    #[test]
    fn admin_cannot_manage_a_superadmin_of_its_company() {
        let admin = user(1, "admin", Some(7));
        let root = user(2, "superadmin", Some(7));
        assert!(!admin.can_manage(&root));
        assert!(root.can_manage(&admin));
        assert!(root.can_manage(&root));
    }
}
