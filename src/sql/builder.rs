//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from table definitions.

use crate::store::{Row, TableDef, PK};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from table definitions).
pub(crate) fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// Placeholder with a cast to the column type, e.g. `$3::timestamptz`.
fn placeholder(table: &TableDef, col: &str, n: u32) -> String {
    if col == PK {
        return format!("${}::bigint", n);
    }
    table
        .column(col)
        .map(|c| format!("${}::{}", n, c.pg_type))
        .unwrap_or_else(|| format!("${}", n))
}

fn select_column_list(table: &TableDef) -> String {
    std::iter::once(quoted(PK))
        .chain(table.columns.iter().map(|c| quoted(c.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key. Caller adds id as sole param.
pub fn select_by_id(table: &TableDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1::bigint",
        select_column_list(table),
        quoted(table.name),
        quoted(PK)
    );
    q
}

/// SELECT list with optional filters (exact match per column), ORDER BY pk, optional LIMIT/OFFSET.
/// Filters on unknown columns are ignored; params are bound in filter order.
pub fn select_list(table: &TableDef, filters: &[(&str, Value)], limit: Option<u32>, offset: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for (col, val) in filters {
        if !table.has_column(col) {
            continue;
        }
        if val.is_null() {
            where_parts.push(format!("{} IS NULL", quoted(col)));
            continue;
        }
        let n = q.push_param(val.clone());
        where_parts.push(format!("{} = {}", quoted(col), placeholder(table, col, n)));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let limit_clause = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let offset_clause = if offset > 0 { format!(" OFFSET {}", offset) } else { String::new() };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}{}",
        select_column_list(table),
        quoted(table.name),
        where_clause,
        quoted(PK),
        limit_clause,
        offset_clause
    );
    q
}

/// INSERT: every non-PK column; values from body. Columns with a DB default are omitted
/// when the body does not provide them so the default applies.
pub fn insert(table: &TableDef, body: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.columns {
        let val = body.get(c.name).cloned();
        if val.is_none() && c.default.is_some() {
            continue;
        }
        let n = q.push_param(val.unwrap_or(Value::Null));
        cols.push(quoted(c.name));
        placeholders.push(placeholder(table, c.name, n));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(table.name),
            select_column_list(table)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(table.name),
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(table)
        )
    };
    q
}

/// UPDATE by id: SET only columns present in body (and in the table). With nothing to set,
/// degrades to a SELECT so the caller still receives the current row.
pub fn update(table: &TableDef, id: i64, body: &Row) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (k, v) in body {
        if k == PK {
            continue;
        }
        let Some(c) = table.column(k) else { continue };
        let n = q.push_param(v.clone());
        sets.push(format!("{} = {}", quoted(c.name), placeholder(table, c.name, n)));
    }
    if sets.is_empty() {
        return select_by_id(table, id);
    }
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}::bigint RETURNING {}",
        quoted(table.name),
        sets.join(", "),
        quoted(PK),
        n,
        select_column_list(table)
    );
    q
}

/// DELETE by id, returning the deleted row.
pub fn delete(table: &TableDef, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(Value::from(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1::bigint RETURNING {}",
        quoted(table.name),
        quoted(PK),
        select_column_list(table)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tables::{POLLS, QUESTIONS, USERS};
    use serde_json::json;

    #[test]
    fn select_list_casts_filters_and_orders_by_id() {
        let q = select_list(&USERS, &[("company_id", json!(3)), ("bogus", json!(1))], Some(10), 20);
        assert_eq!(
            q.sql,
            "SELECT \"id\", \"full_name\", \"email\", \"hashed_password\", \"is_active\", \"roles\", \
             \"company_id\", \"avatar\", \"created_at\" FROM \"users\" WHERE \"company_id\" = $1::bigint \
             ORDER BY \"id\" LIMIT 10 OFFSET 20"
        );
        assert_eq!(q.params, vec![json!(3)]);
    }

    #[test]
    fn insert_skips_defaulted_columns_not_in_body() {
        let mut body = Row::new();
        body.insert("title".into(), json!("Lunch"));
        body.insert("user_id".into(), json!(1));
        let q = insert(&POLLS, &body);
        assert!(q.sql.starts_with("INSERT INTO \"polls\" (\"title\", \"description\""));
        let column_list = q.sql.split(" VALUES ").next().unwrap_or_default();
        assert!(!column_list.contains("poll_status"));
        assert!(!column_list.contains("uuid"));
        assert_eq!(q.params.len(), 8);
        assert!(q.sql.contains("$1::text"));
        assert_eq!(q.params[0], json!("Lunch"));
    }

    #[test]
    fn update_quotes_reserved_column_names() {
        let mut body = Row::new();
        body.insert("order".into(), json!(2));
        body.insert("id".into(), json!(99));
        let q = update(&QUESTIONS, 5, &body);
        assert!(q.sql.starts_with("UPDATE \"questions\" SET \"order\" = $1::integer WHERE \"id\" = $2::bigint"));
        assert_eq!(q.params, vec![json!(2), json!(5)]);
    }

    #[test]
    fn empty_update_reads_the_row() {
        let q = update(&QUESTIONS, 5, &Row::new());
        assert!(q.sql.starts_with("SELECT"));
        assert_eq!(q.params, vec![json!(5)]);
    }
}
