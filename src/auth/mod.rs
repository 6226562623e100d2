//! Passwords, signed tokens and role checks.

mod password;
mod token;

pub use password::{hash_password, verify_password};
pub use token::{
    create_access_token, create_password_reset_token, create_registration_token, verify_access_token,
    verify_password_reset_token, verify_registration_token, RegistrationClaims,
};

use crate::error::AppError;
use crate::models::{Role, User};

/// Reject `user` unless it holds at least one of `roles`.
pub fn require_roles(user: &User, roles: &[Role]) -> Result<(), AppError> {
    if user.has_any_role(roles) {
        Ok(())
    } else {
        tracing::debug!(user_id = user.id, required = ?roles, "role check failed");
        Err(AppError::Forbidden("The user doesn't have enough privileges".into()))
    }
}
