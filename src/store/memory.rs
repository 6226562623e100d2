//! In-memory backend for tests and local development (`STORE=memory`).
//!
//! Enforces the same constraints as the PostgreSQL schema: NOT NULL, UNIQUE, foreign keys and
//! ON DELETE actions, reporting violations with the status codes the Postgres backend produces.

use super::{tables, ColumnDefault, OnDelete, Row, Store, TableDef, PK};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Tables {
    rows: HashMap<&'static str, BTreeMap<i64, Row>>,
    next_id: HashMap<&'static str, i64>,
}

impl Tables {
    fn rows(&self, table: &str) -> impl Iterator<Item = (&i64, &Row)> {
        self.rows.get(table).into_iter().flat_map(|t| t.iter())
    }

    fn get(&self, table: &str, id: i64) -> Option<&Row> {
        self.rows.get(table).and_then(|t| t.get(&id))
    }

    fn allocate_id(&mut self, table: &'static str) -> i64 {
        let next = self.next_id.entry(table).or_insert(0);
        *next += 1;
        *next
    }

    /// NOT NULL, CHECK, foreign key and UNIQUE constraints for a row about to be stored under `id`.
    fn check_row(&self, table: &TableDef, row: &Row, id: Option<i64>) -> Result<(), AppError> {
        for check in table.checks {
            if !check.accepts(row.get(check.column).unwrap_or(&Value::Null)) {
                return Err(AppError::BadRequest(format!("{} violated", check.name)));
            }
        }
        for c in table.columns {
            let v = row.get(c.name).unwrap_or(&Value::Null);
            if v.is_null() {
                if !c.nullable {
                    return Err(AppError::BadRequest(format!("{}.{} cannot be null", table.name, c.name)));
                }
                continue;
            }
            if let Some(fk) = c.references {
                let exists = v.as_i64().map(|ref_id| self.get(fk.table, ref_id).is_some()).unwrap_or(false);
                if !exists {
                    return Err(AppError::BadRequest(format!(
                        "{}.{} references a missing {} row",
                        table.name, c.name, fk.table
                    )));
                }
            }
            if c.unique {
                let taken = self
                    .rows(table.name)
                    .any(|(other_id, other)| Some(*other_id) != id && other.get(c.name) == Some(v));
                if taken {
                    return Err(AppError::Conflict(format!("{}.{} already exists", table.name, c.name)));
                }
            }
        }
        Ok(())
    }

    /// Collect rows removed by deleting `table`/`id` (following CASCADE) and columns nulled by SET NULL.
    fn plan_delete(
        &self,
        table: &'static TableDef,
        id: i64,
        removed: &mut Vec<(&'static str, i64)>,
        nulled: &mut Vec<(&'static str, i64, &'static str)>,
    ) -> Result<(), AppError> {
        if removed.iter().any(|(t, i)| *t == table.name && *i == id) {
            return Ok(());
        }
        removed.push((table.name, id));
        for child in tables::ALL.iter().copied() {
            for col in child.columns {
                let Some(fk) = col.references else { continue };
                if fk.table != table.name {
                    continue;
                }
                let referencing: Vec<i64> = self
                    .rows(child.name)
                    .filter(|(_, r)| r.get(col.name).and_then(Value::as_i64) == Some(id))
                    .map(|(cid, _)| *cid)
                    .collect();
                for cid in referencing {
                    match fk.on_delete {
                        OnDelete::Cascade => self.plan_delete(child, cid, removed, nulled)?,
                        OnDelete::SetNull => nulled.push((child.name, cid, col.name)),
                        OnDelete::Restrict => {
                            return Err(AppError::BadRequest(format!(
                                "{} {} is still referenced by {}",
                                table.name, id, child.name
                            )))
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn default_value(d: &ColumnDefault) -> Value {
    match d {
        ColumnDefault::Now => Value::String(Utc::now().to_rfc3339()),
        ColumnDefault::RandomUuid => Value::String(uuid::Uuid::new_v4().to_string()),
        ColumnDefault::Literal { json, .. } => serde_json::from_str(json).unwrap_or(Value::Null),
    }
}

fn matches(row: &Row, filters: &[(&str, Value)]) -> bool {
    filters.iter().all(|(col, val)| {
        let v = row.get(*col).unwrap_or(&Value::Null);
        v == val
    })
}

/// Process-local table storage guarded by an async RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError> {
        Ok(self.inner.read().await.get(table.name, id).cloned())
    }

    async fn list(
        &self,
        table: &'static TableDef,
        filters: &[(&str, Value)],
        offset: u32,
        limit: Option<u32>,
    ) -> Result<Vec<Row>, AppError> {
        let filters: Vec<(&str, Value)> = filters
            .iter()
            .filter(|(c, _)| table.has_column(c))
            .cloned()
            .collect();
        let db = self.inner.read().await;
        let rows = db
            .rows(table.name)
            .map(|(_, r)| r)
            .filter(|r| matches(r, &filters))
            .skip(offset as usize)
            .take(limit.map(|n| n as usize).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn insert(&self, table: &'static TableDef, values: &Row) -> Result<Row, AppError> {
        let mut row = Row::new();
        for c in table.columns {
            let v = match values.get(c.name) {
                Some(v) => v.clone(),
                None => c.default.as_ref().map(default_value).unwrap_or(Value::Null),
            };
            row.insert(c.name.to_string(), v);
        }
        let mut db = self.inner.write().await;
        db.check_row(table, &row, None)?;
        let id = db.allocate_id(table.name);
        row.insert(PK.to_string(), Value::from(id));
        db.rows.entry(table.name).or_default().insert(id, row.clone());
        debug!(table = table.name, id, "inserted row");
        Ok(row)
    }

    async fn update(&self, table: &'static TableDef, id: i64, changes: &Row) -> Result<Option<Row>, AppError> {
        let mut db = self.inner.write().await;
        let Some(mut row) = db.get(table.name, id).cloned() else {
            return Ok(None);
        };
        for (k, v) in changes {
            if k != PK && table.column(k).is_some() {
                row.insert(k.clone(), v.clone());
            }
        }
        db.check_row(table, &row, Some(id))?;
        db.rows.entry(table.name).or_default().insert(id, row.clone());
        Ok(Some(row))
    }

    async fn delete(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError> {
        let mut db = self.inner.write().await;
        let Some(row) = db.get(table.name, id).cloned() else {
            return Ok(None);
        };
        let mut removed = Vec::new();
        let mut nulled = Vec::new();
        db.plan_delete(table, id, &mut removed, &mut nulled)?;
        for (t, i) in &removed {
            if let Some(rows) = db.rows.get_mut(t) {
                rows.remove(i);
            }
        }
        for (t, i, col) in nulled {
            if let Some(r) = db.rows.get_mut(t).and_then(|rows| rows.get_mut(&i)) {
                r.insert(col.to_string(), Value::Null);
            }
        }
        debug!(table = table.name, id, removed = removed.len(), "deleted row");
        Ok(Some(row))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
