//! Generic CRUD over one model and its create/update inputs.

use crate::error::AppError;
use crate::models::Model;
use crate::store::{Row, Store};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

/// Serialize an input struct into a column map. Fields skipped by serde are left untouched.
pub fn to_row<T: Serialize>(input: &T) -> Result<Row, AppError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(_) => Err(AppError::Internal("input did not serialize to an object".into())),
        Err(e) => Err(AppError::Internal(format!("serialize input: {}", e))),
    }
}

/// Decode a stored row into its model type.
pub fn from_row<M: DeserializeOwned>(row: Row) -> Result<M, AppError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| AppError::Internal(format!("decode row: {}", e)))
}

/// CRUD helpers for model `M`, created from `C` and updated from `U`.
pub struct CrudBase<'a, M, C, U> {
    store: &'a dyn Store,
    _marker: PhantomData<fn() -> (M, C, U)>,
}

impl<'a, M, C, U> CrudBase<'a, M, C, U>
where
    M: Model,
    C: Serialize + Sync,
    U: Serialize + Sync,
{
    pub fn new(store: &'a dyn Store) -> Self {
        CrudBase {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, id: i64) -> Result<Option<M>, AppError> {
        self.store.fetch(M::TABLE, id).await?.map(from_row).transpose()
    }

    /// Page through all rows ordered by id. `limit` defaults to 100 and is capped at 1000.
    pub async fn get_multi(&self, skip: u32, limit: Option<u32>) -> Result<Vec<M>, AppError> {
        self.find(&[], skip, limit).await
    }

    pub async fn find(&self, filters: &[(&str, Value)], skip: u32, limit: Option<u32>) -> Result<Vec<M>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        self.store
            .list(M::TABLE, filters, skip, Some(limit))
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    /// Every row matching `filters`, without paging.
    pub async fn find_all(&self, filters: &[(&str, Value)]) -> Result<Vec<M>, AppError> {
        self.store
            .list(M::TABLE, filters, 0, None)
            .await?
            .into_iter()
            .map(from_row)
            .collect()
    }

    pub async fn find_one(&self, filters: &[(&str, Value)]) -> Result<Option<M>, AppError> {
        let mut rows = self.store.list(M::TABLE, filters, 0, Some(1)).await?;
        rows.pop().map(from_row).transpose()
    }

    pub async fn create(&self, input: &C) -> Result<M, AppError> {
        let values = to_row(input)?;
        let row = self.store.insert(M::TABLE, &values).await?;
        tracing::debug!(table = M::TABLE.name, "created");
        from_row(row)
    }

    /// Apply the set fields of `input`. None when the row does not exist.
    pub async fn update(&self, id: i64, input: &U) -> Result<Option<M>, AppError> {
        let changes = to_row(input)?;
        if changes.is_empty() {
            return self.get(id).await;
        }
        self.store.update(M::TABLE, id, &changes).await?.map(from_row).transpose()
    }

    /// Delete by id, returning the removed row.
    pub async fn remove(&self, id: i64) -> Result<Option<M>, AppError> {
        self.store.delete(M::TABLE, id).await?.map(from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Company;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[derive(Serialize)]
    struct NewCompany {
        name: String,
    }

    #[derive(Serialize, Default)]
    struct CompanyChanges {
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    }

    type Companies<'a> = CrudBase<'a, Company, NewCompany, CompanyChanges>;

    #[tokio::test]
    async fn create_get_update_remove() {
        let store = MemoryStore::new();
        let crud = Companies::new(&store);
        let c = crud.create(&NewCompany { name: "Acme".into() }).await.unwrap();
        assert_eq!(crud.get(c.id).await.unwrap().unwrap().name, "Acme");

        let unchanged = crud.update(c.id, &CompanyChanges::default()).await.unwrap().unwrap();
        assert_eq!(unchanged.name, "Acme");
        let renamed = crud
            .update(c.id, &CompanyChanges { name: Some("Globex".into()) })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Globex");

        assert_eq!(crud.remove(c.id).await.unwrap().unwrap().id, c.id);
        assert!(crud.get(c.id).await.unwrap().is_none());
        assert!(crud.remove(c.id).await.unwrap().is_none());
        assert!(crud.update(c.id, &CompanyChanges::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_multi_pages_and_find_one_filters() {
        let store = MemoryStore::new();
        let crud = Companies::new(&store);
        for name in ["a", "b", "c"] {
            crud.create(&NewCompany { name: name.into() }).await.unwrap();
        }
        let page = crud.get_multi(1, Some(5)).await.unwrap();
        assert_eq!(page.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);
        let b = crud.find_one(&[("name", json!("b"))]).await.unwrap().unwrap();
        assert_eq!(b.id, 2);
        assert!(crud.find_one(&[("name", json!("z"))]).await.unwrap().is_none());
    }
}
