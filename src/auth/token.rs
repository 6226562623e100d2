//! HS256 tokens: registration invites, password resets and API access.
//!
//! Every kind carries a `typ` claim, so one can never stand in for another.

use crate::error::{AppError, TokenError};
use crate::models::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const TYP_REGISTER: &str = "register";
const TYP_ACCESS: &str = "access";
const TYP_RESET: &str = "reset";

/// Claims of a registration token: who is invited, with which roles, into which company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationClaims {
    /// Invitee email.
    pub sub: String,
    pub roles: Vec<Role>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub company_id: Option<i64>,
    pub typ: String,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: String,
    pub typ: String,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResetClaims {
    /// Account email.
    sub: String,
    typ: String,
    exp: i64,
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("sign token: {}", e)))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Result<T, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<T>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}

fn expiry(lifetime: Duration) -> i64 {
    (Utc::now() + lifetime).timestamp()
}

pub fn create_registration_token(
    email: &str,
    roles: &[Role],
    full_name: Option<&str>,
    company_id: Option<i64>,
    secret: &str,
    lifetime: Duration,
) -> Result<String, AppError> {
    let claims = RegistrationClaims {
        sub: email.to_string(),
        roles: roles.to_vec(),
        full_name: full_name.map(str::to_string),
        company_id,
        typ: TYP_REGISTER.to_string(),
        exp: expiry(lifetime),
    };
    sign(&claims, secret)
}

/// Check signature, expiry (no leeway) and kind of a registration token.
pub fn verify_registration_token(token: &str, secret: &str) -> Result<RegistrationClaims, TokenError> {
    let claims: RegistrationClaims = verify(token, secret)?;
    if claims.typ != TYP_REGISTER {
        return Err(TokenError::Invalid);
    }
    Ok(claims)
}

pub fn create_access_token(user_id: i64, secret: &str, lifetime: Duration) -> Result<String, AppError> {
    let claims = AccessClaims {
        sub: user_id.to_string(),
        typ: TYP_ACCESS.to_string(),
        exp: expiry(lifetime),
    };
    sign(&claims, secret)
}

/// Verify an access token and return the user id it was issued to.
pub fn verify_access_token(token: &str, secret: &str) -> Result<i64, TokenError> {
    let claims: AccessClaims = verify(token, secret)?;
    if claims.typ != TYP_ACCESS {
        return Err(TokenError::Invalid);
    }
    claims.sub.parse().map_err(|_| TokenError::Invalid)
}

pub fn create_password_reset_token(email: &str, secret: &str, lifetime: Duration) -> Result<String, AppError> {
    let claims = ResetClaims {
        sub: email.to_string(),
        typ: TYP_RESET.to_string(),
        exp: expiry(lifetime),
    };
    sign(&claims, secret)
}

/// Verify a password reset token and return the email it was issued for.
pub fn verify_password_reset_token(token: &str, secret: &str) -> Result<String, TokenError> {
    let claims: ResetClaims = verify(token, secret)?;
    if claims.typ != TYP_RESET {
        return Err(TokenError::Invalid);
    }
    Ok(claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn registration_token_verifies_before_expiry() {
        let t = create_registration_token(
            "new@example.com",
            &[Role::Admin],
            Some("New Person"),
            Some(3),
            SECRET,
            Duration::hours(1),
        )
        .unwrap();
        let c = verify_registration_token(&t, SECRET).unwrap();
        assert_eq!(c.sub, "new@example.com");
        assert_eq!(c.roles, vec![Role::Admin]);
        assert_eq!(c.full_name.as_deref(), Some("New Person"));
        assert_eq!(c.company_id, Some(3));
    }

    #[test]
    fn expired_registration_token() {
        let t = create_registration_token("a@example.com", &[Role::User], None, None, SECRET, Duration::seconds(-5))
            .unwrap();
        assert_eq!(verify_registration_token(&t, SECRET), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_or_foreign_tokens_are_invalid() {
        let t = create_registration_token("a@example.com", &[Role::User], None, None, SECRET, Duration::hours(1))
            .unwrap();
        assert_eq!(verify_registration_token(&t, "other-secret"), Err(TokenError::Invalid));
        assert_eq!(verify_registration_token("not.a.token", SECRET), Err(TokenError::Invalid));
        assert_eq!(verify_access_token(&t, SECRET), Err(TokenError::Invalid));
    }

    #[test]
    fn access_token_carries_user_id() {
        let t = create_access_token(42, SECRET, Duration::minutes(5)).unwrap();
        assert_eq!(verify_access_token(&t, SECRET), Ok(42));
        assert_eq!(verify_registration_token(&t, SECRET).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn reset_token_is_its_own_kind() {
        let t = create_password_reset_token("a@example.com", SECRET, Duration::hours(1)).unwrap();
        assert_eq!(verify_password_reset_token(&t, SECRET).as_deref(), Ok("a@example.com"));
        assert_eq!(verify_access_token(&t, SECRET), Err(TokenError::Invalid));
        let invite = create_registration_token("a@example.com", &[Role::User], None, None, SECRET, Duration::hours(1))
            .unwrap();
        assert_eq!(verify_password_reset_token(&invite, SECRET), Err(TokenError::Invalid));
        let expired = create_password_reset_token("a@example.com", SECRET, Duration::seconds(-5)).unwrap();
        assert_eq!(verify_password_reset_token(&expired, SECRET), Err(TokenError::Expired));
    }
}
