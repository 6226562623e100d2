//! Users: administration, self-service profile, invitations and registration completion.

use super::crud::CrudBase;
use crate::auth::{self, RegistrationClaims};
use crate::error::{AppError, TokenError};
use crate::models::{roles_column, Company, Invitation, Role, User};
use crate::schemas::{
    AvatarUploaded, NewPassword, NewUser, RegistrationCompletion, RegistrationLink, TokenVerificationResponse, UpdateUserProfile,
    UserChanges, UserCreate, UserCreateByEmail, UserUpdate,
};
use crate::settings::Settings;
use crate::store::Store;
use chrono::Duration;
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use uuid::Uuid;

pub type UserCrud<'a> = CrudBase<'a, User, NewUser, UserChanges>;

#[derive(Debug, Serialize)]
pub(crate) struct NewInvitation {
    pub email: String,
    pub token: String,
    #[serde(serialize_with = "roles_column::serialize")]
    pub roles: Vec<Role>,
    pub full_name: Option<String>,
    pub company_id: Option<i64>,
    pub created_by: Option<i64>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct InvitationChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "roles_opt")]
    pub roles: Option<Vec<Role>>,
    /// `Some(None)` clears the column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i64>,
}

fn roles_opt<S: serde::Serializer>(roles: &Option<Vec<Role>>, s: S) -> Result<S::Ok, S::Error> {
    match roles {
        Some(r) => roles_column::serialize(r, s),
        None => s.serialize_none(),
    }
}

pub(crate) type InvitationCrud<'a> = CrudBase<'a, Invitation, NewInvitation, InvitationChanges>;
type CompanyLookup<'a> = CrudBase<'a, Company, (), ()>;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct UserService;

impl UserService {
    pub async fn get_or_404(store: &dyn Store, id: i64) -> Result<User, AppError> {
        UserCrud::new(store)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn get_by_email(store: &dyn Store, email: &str) -> Result<Option<User>, AppError> {
        UserCrud::new(store).find_one(&[("email", json!(normalize_email(email)))]).await
    }

    /// Load a user the caller may see: 404 when missing, 403 when outside the caller's reach.
    pub async fn get_visible(store: &dyn Store, current: &User, id: i64) -> Result<User, AppError> {
        let user = Self::get_or_404(store, id).await?;
        if !current.can_manage(&user) {
            return Err(AppError::Forbidden("The user doesn't have enough privileges".into()));
        }
        Ok(user)
    }

    /// Users visible to the caller: everyone for a superadmin, the caller's company for an admin.
    pub async fn get_multi(store: &dyn Store, current: &User, skip: u32, limit: Option<u32>) -> Result<Vec<User>, AppError> {
        let crud = UserCrud::new(store);
        if current.is_superadmin() {
            return crud.get_multi(skip, limit).await;
        }
        match current.company_id {
            Some(company_id) => crud.find(&[("company_id", json!(company_id))], skip, limit).await,
            None => Ok(vec![current.clone()]),
        }
    }

    async fn ensure_email_free(store: &dyn Store, email: &str, except: Option<i64>) -> Result<(), AppError> {
        if let Some(existing) = Self::get_by_email(store, email).await? {
            if Some(existing.id) != except {
                return Err(AppError::Conflict("User with this email already exists".into()));
            }
        }
        Ok(())
    }

    async fn ensure_company_exists(store: &dyn Store, company_id: i64) -> Result<(), AppError> {
        match CompanyLookup::new(store).get(company_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Company not found".into())),
        }
    }

    /// Check that `current` may hand out `roles` within `company_id`, and resolve the company to use.
    fn authorize_grant(current: &User, roles: &[Role], company_id: Option<i64>) -> Result<Option<i64>, AppError> {
        if current.is_superadmin() {
            return Ok(company_id);
        }
        if !current.has_role(Role::Admin) {
            return Err(AppError::Forbidden("The user doesn't have enough privileges".into()));
        }
        if roles.contains(&Role::Superadmin) {
            return Err(AppError::Forbidden("Only a superadmin can grant the superadmin role".into()));
        }
        match (company_id, current.company_id) {
            (Some(requested), own) if Some(requested) != own => {
                Err(AppError::Forbidden("Admins can only manage users of their own company".into()))
            }
            (_, own) => Ok(own),
        }
    }

    pub async fn create(store: &dyn Store, settings: &Settings, current: &User, input: UserCreate) -> Result<User, AppError> {
        let email = normalize_email(&input.email);
        let roles = input.roles.unwrap_or_else(|| vec![Role::User]);
        let company_id = Self::authorize_grant(current, &roles, input.company_id)?;
        Self::ensure_email_free(store, &email, None).await?;
        if let Some(cid) = company_id {
            Self::ensure_company_exists(store, cid).await?;
        }
        let user = UserCrud::new(store)
            .create(&NewUser {
                email,
                hashed_password: auth::hash_password(&input.password)?,
                full_name: input.full_name,
                roles,
                company_id,
                is_active: input.is_active,
                avatar: Some(settings.default_avatar_path.clone()),
            })
            .await?;
        tracing::info!(user_id = user.id, created_by = current.id, "user created");
        Ok(user)
    }

    pub async fn update(store: &dyn Store, current: &User, id: i64, input: UserUpdate) -> Result<User, AppError> {
        let target = Self::get_visible(store, current, id).await?;
        let privileged = input.roles.is_some() || input.company_id.is_some() || input.is_active.is_some();
        let mut company_id = input.company_id;
        if privileged {
            let roles = input.roles.clone().unwrap_or_default();
            let resolved = Self::authorize_grant(current, &roles, input.company_id)?;
            if input.company_id.is_some() {
                company_id = resolved;
            }
        }
        if let Some(cid) = company_id {
            Self::ensure_company_exists(store, cid).await?;
        }
        let email = input.email.as_deref().map(normalize_email);
        if let Some(e) = &email {
            Self::ensure_email_free(store, e, Some(target.id)).await?;
        }
        let changes = UserChanges {
            full_name: input.full_name,
            email,
            hashed_password: input.password.as_deref().map(auth::hash_password).transpose()?,
            roles: input.roles,
            company_id,
            is_active: input.is_active,
            avatar: None,
        };
        let user = UserCrud::new(store)
            .update(target.id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        tracing::info!(user_id = user.id, updated_by = current.id, "user updated");
        Ok(user)
    }

    pub async fn profile_update(store: &dyn Store, current: &User, input: UpdateUserProfile) -> Result<User, AppError> {
        let hashed_password = match input.new_password.as_deref() {
            Some(new_password) => {
                let old = input.old_password.as_deref().unwrap_or_default();
                if !auth::verify_password(old, &current.hashed_password) {
                    return Err(AppError::BadRequest("Incorrect password".into()));
                }
                Some(auth::hash_password(new_password)?)
            }
            None => None,
        };
        let email = input.email.as_deref().map(normalize_email);
        if let Some(e) = &email {
            Self::ensure_email_free(store, e, Some(current.id)).await?;
        }
        let changes = UserChanges {
            full_name: input.full_name,
            email,
            hashed_password,
            avatar: input.avatar,
            ..Default::default()
        };
        UserCrud::new(store)
            .update(current.id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn delete(store: &dyn Store, current: &User, id: i64) -> Result<User, AppError> {
        let target = Self::get_visible(store, current, id).await?;
        let removed = UserCrud::new(store)
            .remove(target.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        tracing::info!(user_id = removed.id, deleted_by = current.id, "user deleted");
        Ok(removed)
    }

    /// Check credentials for the access-token login.
    pub async fn authenticate(store: &dyn Store, email: &str, password: &str) -> Result<User, AppError> {
        let user = Self::get_by_email(store, email).await?;
        let Some(user) = user.filter(|u| auth::verify_password(password, &u.hashed_password)) else {
            return Err(AppError::Unauthorized("Incorrect email or password".into()));
        };
        if !user.is_active {
            return Err(AppError::BadRequest("Inactive user".into()));
        }
        Ok(user)
    }

    /// Issue a password reset link for an existing account. The link is logged, never returned.
    pub async fn recover_password(store: &dyn Store, settings: &Settings, email: &str) -> Result<(), AppError> {
        let user = Self::get_by_email(store, email)
            .await?
            .ok_or_else(|| AppError::NotFound("The user with this email does not exist".into()))?;
        let token = auth::create_password_reset_token(
            &user.email,
            &settings.secret_key,
            Duration::hours(settings.reset_token_expire_hours),
        )?;
        let link = format!("{}?token={}", settings.reset_password_url, token);
        tracing::info!(to = %user.email, link = %link, "password recovery email");
        Ok(())
    }

    pub async fn reset_password(store: &dyn Store, settings: &Settings, input: NewPassword) -> Result<User, AppError> {
        let email = auth::verify_password_reset_token(&input.token, &settings.secret_key)?;
        let user = Self::get_by_email(store, &email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if !user.is_active {
            return Err(AppError::BadRequest("Inactive user".into()));
        }
        let changes = UserChanges {
            hashed_password: Some(auth::hash_password(&input.new_password)?),
            ..Default::default()
        };
        let user = UserCrud::new(store)
            .update(user.id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        tracing::info!(user_id = user.id, "password reset");
        Ok(user)
    }

    /// Invite a new user: sign a registration token, store it as the active invitation for the email,
    /// and return the registration link that would be mailed.
    pub async fn invite(
        store: &dyn Store,
        settings: &Settings,
        current: &User,
        input: UserCreateByEmail,
    ) -> Result<RegistrationLink, AppError> {
        let email = normalize_email(&input.email);
        let roles = if input.roles.is_empty() { vec![Role::User] } else { input.roles };
        let company_id = Self::authorize_grant(current, &roles, input.company_id)?;
        Self::ensure_email_free(store, &email, None).await?;
        if let Some(cid) = company_id {
            Self::ensure_company_exists(store, cid).await?;
        }
        let token = auth::create_registration_token(
            &email,
            &roles,
            input.full_name.as_deref(),
            company_id,
            &settings.secret_key,
            Duration::hours(settings.register_token_expire_hours),
        )?;

        let invitations = InvitationCrud::new(store);
        match invitations.find_one(&[("email", json!(email))]).await? {
            Some(existing) => {
                invitations
                    .update(
                        existing.id,
                        &InvitationChanges {
                            token: Some(token.clone()),
                            roles: Some(roles),
                            full_name: Some(input.full_name),
                            company_id: Some(company_id),
                            is_active: Some(true),
                            created_by: Some(current.id),
                        },
                    )
                    .await?;
            }
            None => {
                invitations
                    .create(&NewInvitation {
                        email: email.clone(),
                        token: token.clone(),
                        roles,
                        full_name: input.full_name,
                        company_id,
                        created_by: Some(current.id),
                    })
                    .await?;
            }
        }

        let link = format!("{}?token={}", settings.frontend_url, token);
        tracing::info!(to = %email, invited_by = current.id, link = %link, "registration email");
        Ok(RegistrationLink {
            message: "Registration link was sent".into(),
            link,
        })
    }

    /// Verify a registration token against its active invitation.
    async fn check_registration(
        store: &dyn Store,
        settings: &Settings,
        token: &str,
    ) -> Result<(RegistrationClaims, Invitation), AppError> {
        let claims = auth::verify_registration_token(token, &settings.secret_key)?;
        let invitation = InvitationCrud::new(store)
            .find_one(&[("email", json!(claims.sub)), ("token", json!(token))])
            .await?
            .filter(|i| i.is_active)
            .ok_or_else(|| AppError::Unauthorized("Invitation is no longer active".into()))?;
        Ok((claims, invitation))
    }

    pub async fn verify_registration(
        store: &dyn Store,
        settings: &Settings,
        token: &str,
    ) -> Result<TokenVerificationResponse, AppError> {
        let (claims, _) = Self::check_registration(store, settings, token).await?;
        Ok(TokenVerificationResponse {
            message: "Token is valid".into(),
            email: claims.sub,
            roles: claims.roles,
            full_name: claims.full_name,
            company_id: claims.company_id,
        })
    }

    /// Create the invited account and close the invitation.
    pub async fn complete_registration(
        store: &dyn Store,
        settings: &Settings,
        input: RegistrationCompletion,
    ) -> Result<User, AppError> {
        let (claims, invitation) = Self::check_registration(store, settings, &input.token).await?;
        if claims.roles.is_empty() {
            return Err(TokenError::Invalid.into());
        }
        Self::ensure_email_free(store, &claims.sub, None).await?;
        let user = UserCrud::new(store)
            .create(&NewUser {
                email: claims.sub,
                hashed_password: auth::hash_password(&input.password)?,
                full_name: input.full_name.or(claims.full_name),
                roles: claims.roles,
                company_id: claims.company_id.or(input.company_id),
                is_active: Some(true),
                avatar: Some(settings.default_avatar_path.clone()),
            })
            .await?;
        InvitationCrud::new(store)
            .update(
                invitation.id,
                &InvitationChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(user_id = user.id, invitation_id = invitation.id, "registration completed");
        Ok(user)
    }

    /// Store an uploaded avatar under `MEDIA_DIR/{id}/` and point the user at it.
    pub async fn upload_avatar(
        store: &dyn Store,
        settings: &Settings,
        current: &User,
        id: i64,
        content_type: Option<&str>,
        file_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<AvatarUploaded, AppError> {
        let target = Self::get_visible(store, current, id).await?;
        let mime = content_type.unwrap_or_default();
        let Some(subtype) = mime.strip_prefix("image/") else {
            return Err(AppError::BadRequest("Avatar must be an image".into()));
        };
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Avatar file is empty".into()));
        }
        if bytes.len() > settings.max_avatar_bytes {
            return Err(AppError::BadRequest("Avatar file is too large".into()));
        }
        let ext = file_name
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or(subtype)
            .to_lowercase();
        let file = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = settings.media_dir.join(target.id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file), bytes).await?;

        let url = format!("{}/media/{}/{}", settings.server_host.trim_end_matches('/'), target.id, file);
        UserCrud::new(store)
            .update(
                target.id,
                &UserChanges {
                    avatar: Some(url.clone()),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(user_id = target.id, file = %file, "avatar stored");
        Ok(AvatarUploaded {
            message: "Avatar uploaded".into(),
            path_to_avatar: url,
        })
    }

    /// Create the configured first superuser when it does not exist yet.
    pub async fn create_initial_user(store: &dyn Store, settings: &Settings) -> Result<Option<User>, AppError> {
        let (Some(email), Some(password)) = (&settings.first_superuser_email, &settings.first_superuser_password) else {
            return Ok(None);
        };
        if Self::get_by_email(store, email).await?.is_some() {
            return Ok(None);
        }
        let user = UserCrud::new(store)
            .create(&NewUser {
                email: normalize_email(email),
                hashed_password: auth::hash_password(password)?,
                full_name: Some("Superadmin".into()),
                roles: vec![Role::Superadmin],
                is_active: Some(true),
                avatar: Some(settings.default_avatar_path.clone()),
                ..Default::default()
            })
            .await?;
        tracing::info!(user_id = user.id, "initial superuser created");
        Ok(Some(user))
    }
}
