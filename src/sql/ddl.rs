//! DDL for the table definitions: CREATE TABLE with constraints, then indexes.
//! Statements are idempotent (IF NOT EXISTS) so they can run on every start.

use super::builder::quoted;
use crate::store::{ColumnDefault, TableDef, PK};

fn default_sql(d: &ColumnDefault) -> &'static str {
    match d {
        ColumnDefault::Now => "NOW()",
        ColumnDefault::RandomUuid => "gen_random_uuid()",
        ColumnDefault::Literal { sql, .. } => *sql,
    }
}

/// CREATE TABLE IF NOT EXISTS for one table, including PK, UNIQUE, FK and CHECK constraints.
pub fn create_table(table: &TableDef) -> String {
    let mut col_defs: Vec<String> = vec![format!("{} BIGSERIAL PRIMARY KEY", quoted(PK))];
    for c in table.columns {
        let mut def = format!("{} {}", quoted(c.name), c.pg_type.to_uppercase());
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(ref d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(default_sql(d));
        }
        if c.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(fk) = c.references {
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE {}",
                quoted(fk.table),
                quoted(PK),
                fk.on_delete.as_sql()
            ));
        }
        col_defs.push(def);
    }
    for check in table.checks {
        let allowed: Vec<String> = check.allowed.iter().map(|v| format!("'{}'", v.replace('\'', "''"))).collect();
        col_defs.push(format!(
            "CONSTRAINT {} CHECK ({} IN ({}))",
            quoted(check.name),
            quoted(check.column),
            allowed.join(", ")
        ));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quoted(table.name),
        col_defs.join(",\n  ")
    )
}

/// Non-unique btree indexes, named `ix_<table>_<column>`.
pub fn create_indexes(table: &TableDef) -> Vec<String> {
    table
        .indexes
        .iter()
        .map(|col| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("ix_{}_{}", table.name, col)),
                quoted(table.name),
                quoted(col)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tables::{POLLS, QUESTIONS, RESPONSES};

    #[test]
    fn poll_title_index_is_not_unique() {
        let ddl = create_table(&POLLS);
        assert!(ddl.contains("\"title\" TEXT NOT NULL,"));
        assert!(ddl.contains("\"uuid\" UUID NOT NULL DEFAULT gen_random_uuid() UNIQUE"));
        let idx = create_indexes(&POLLS);
        assert!(idx.contains(&"CREATE INDEX IF NOT EXISTS \"ix_polls_title\" ON \"polls\" (\"title\")".to_string()));
        assert!(idx.iter().all(|s| !s.contains("UNIQUE")));
    }

    #[test]
    fn children_cascade_on_delete() {
        let ddl = create_table(&QUESTIONS);
        assert!(ddl.contains("REFERENCES \"polls\" (\"id\") ON DELETE CASCADE"));
        let ddl = create_table(&RESPONSES);
        assert!(ddl.contains("\"question_id\" BIGINT NOT NULL REFERENCES \"questions\" (\"id\") ON DELETE CASCADE"));
    }

    #[test]
    fn question_type_is_checked() {
        let ddl = create_table(&QUESTIONS);
        assert!(ddl.contains("CONSTRAINT \"questions_type_check\" CHECK (\"type\" IN ('SINGLE ANSWER', 'PLURAL ANSWER'"));
    }
}
