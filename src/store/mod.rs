//! Row storage: table definitions and the `Store` trait with PostgreSQL and in-memory backends.
//!
//! Rows travel as JSON objects keyed by column name; every table has a `BIGSERIAL` primary key `id`.

mod memory;
mod postgres;
pub mod tables;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_schema, PgStore};

use crate::error::AppError;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One table row, keyed by column name.
pub type Row = Map<String, Value>;

/// Primary key column present on every table.
pub const PK: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
}

impl OnDelete {
    pub fn as_sql(self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
        }
    }
}

/// `CHECK (column IN (allowed...))`.
#[derive(Debug, Clone, Copy)]
pub struct CheckDef {
    pub name: &'static str,
    pub column: &'static str,
    pub allowed: &'static [&'static str],
}

impl CheckDef {
    pub fn accepts(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => self.allowed.iter().any(|a| *a == s.as_str()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub table: &'static str,
    pub on_delete: OnDelete,
}

/// Column default, expressed both as SQL and as the value the in-memory store fills in.
#[derive(Debug, Clone, Copy)]
pub enum ColumnDefault {
    Now,
    RandomUuid,
    Literal { sql: &'static str, json: &'static str },
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    /// PostgreSQL type; also used as the cast on bound parameters.
    pub pg_type: &'static str,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
    pub references: Option<ForeignKey>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, pg_type: &'static str) -> Self {
        ColumnDef {
            name,
            pg_type,
            nullable: true,
            unique: false,
            default: None,
            references: None,
        }
    }

    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub const fn default(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub const fn references(mut self, table: &'static str, on_delete: OnDelete) -> Self {
        self.references = Some(ForeignKey { table, on_delete });
        self
    }
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    /// Columns other than the primary key.
    pub columns: &'static [ColumnDef],
    /// Non-unique single-column indexes.
    pub indexes: &'static [&'static str],
    pub checks: &'static [CheckDef],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == PK || self.column(name).is_some()
    }
}

/// Read the primary key of a stored row.
pub fn row_id(row: &Row) -> Option<i64> {
    row.get(PK).and_then(Value::as_i64)
}

/// Storage backend for table rows. Filters are exact-match per column; lists are ordered by `id`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError>;

    async fn list(
        &self,
        table: &'static TableDef,
        filters: &[(&str, Value)],
        offset: u32,
        limit: Option<u32>,
    ) -> Result<Vec<Row>, AppError>;

    /// Insert one row; columns absent from `values` take their default (or NULL). Returns the stored row.
    async fn insert(&self, table: &'static TableDef, values: &Row) -> Result<Row, AppError>;

    /// Set the given columns on one row. Returns the updated row, or None when the id is unknown.
    async fn update(&self, table: &'static TableDef, id: i64, changes: &Row) -> Result<Option<Row>, AppError>;

    /// Delete one row (applying ON DELETE actions). Returns the deleted row, or None when the id is unknown.
    async fn delete(&self, table: &'static TableDef, id: i64) -> Result<Option<Row>, AppError>;

    /// Cheap liveness check of the backend.
    async fn ping(&self) -> Result<(), AppError>;
}
