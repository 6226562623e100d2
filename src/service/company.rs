use super::crud::CrudBase;
use super::user::InvitationCrud;
use crate::error::AppError;
use crate::models::{Company, Invitation, Role, User};
use crate::schemas::{CompanyCreate, CompanyUpdate};
use crate::store::Store;
use serde_json::json;

pub type CompanyCrud<'a> = CrudBase<'a, Company, CompanyCreate, CompanyUpdate>;

pub struct CompanyService;

impl CompanyService {
    fn ensure_superadmin(current: &User) -> Result<(), AppError> {
        crate::auth::require_roles(current, &[Role::Superadmin])
    }

    pub async fn list(store: &dyn Store, current: &User, skip: u32, limit: Option<u32>) -> Result<Vec<Company>, AppError> {
        let crud = CompanyCrud::new(store);
        if current.is_superadmin() {
            return crud.get_multi(skip, limit).await;
        }
        match current.company_id {
            Some(id) => Ok(crud.get(id).await?.into_iter().collect()),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get(store: &dyn Store, current: &User, id: i64) -> Result<Company, AppError> {
        if !current.is_superadmin() && current.company_id != Some(id) {
            return Err(AppError::Forbidden("The user doesn't have enough privileges".into()));
        }
        CompanyCrud::new(store)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".into()))
    }

    pub async fn create(store: &dyn Store, current: &User, input: CompanyCreate) -> Result<Company, AppError> {
        Self::ensure_superadmin(current)?;
        let input = CompanyCreate {
            name: input.name.trim().to_string(),
        };
        let crud = CompanyCrud::new(store);
        if crud.find_one(&[("name", json!(input.name))]).await?.is_some() {
            return Err(AppError::Conflict("Company with this name already exists".into()));
        }
        let company = crud.create(&input).await?;
        tracing::info!(company_id = company.id, "company created");
        Ok(company)
    }

    pub async fn update(store: &dyn Store, current: &User, id: i64, input: CompanyUpdate) -> Result<Company, AppError> {
        Self::ensure_superadmin(current)?;
        CompanyCrud::new(store)
            .update(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".into()))
    }

    /// Delete a company; its invitations go with it and its users are detached.
    pub async fn delete(store: &dyn Store, current: &User, id: i64) -> Result<Company, AppError> {
        Self::ensure_superadmin(current)?;
        let removed = CompanyCrud::new(store)
            .remove(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Company not found".into()))?;
        tracing::info!(company_id = removed.id, "company deleted");
        Ok(removed)
    }

    pub async fn invitations(store: &dyn Store, current: &User, company_id: i64) -> Result<Vec<Invitation>, AppError> {
        let own_admin = current.has_role(Role::Admin) && current.company_id == Some(company_id);
        if !current.is_superadmin() && !own_admin {
            return Err(AppError::Forbidden("The user doesn't have enough privileges".into()));
        }
        Self::get(store, current, company_id).await?;
        InvitationCrud::new(store).find_all(&[("company_id", json!(company_id))]).await
    }
}
