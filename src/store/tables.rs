//! Table definitions, listed in creation order (referenced tables first).

use super::{CheckDef, ColumnDef, ColumnDefault, OnDelete, TableDef};

const NOW: ColumnDefault = ColumnDefault::Now;
const FALSE: ColumnDefault = ColumnDefault::Literal { sql: "FALSE", json: "false" };
const TRUE: ColumnDefault = ColumnDefault::Literal { sql: "TRUE", json: "true" };

pub const COMPANIES: TableDef = TableDef {
    name: "companies",
    columns: &[
        ColumnDef::new("name", "text").not_null().unique(),
        ColumnDef::new("created_at", "timestamptz").not_null().default(NOW),
    ],
    indexes: &[],
    checks: &[],
};

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::new("full_name", "text"),
        ColumnDef::new("email", "text").not_null().unique(),
        ColumnDef::new("hashed_password", "text").not_null(),
        ColumnDef::new("is_active", "boolean").not_null().default(TRUE),
        ColumnDef::new("roles", "text")
            .not_null()
            .default(ColumnDefault::Literal { sql: "'user'", json: "\"user\"" }),
        ColumnDef::new("company_id", "bigint").references("companies", OnDelete::SetNull),
        ColumnDef::new("avatar", "text"),
        ColumnDef::new("created_at", "timestamptz").not_null().default(NOW),
    ],
    indexes: &["full_name"],
    checks: &[],
};

pub const INVITATIONS: TableDef = TableDef {
    name: "invitations",
    columns: &[
        ColumnDef::new("email", "text").not_null(),
        ColumnDef::new("token", "text").not_null(),
        ColumnDef::new("roles", "text").not_null(),
        ColumnDef::new("full_name", "text"),
        ColumnDef::new("company_id", "bigint").references("companies", OnDelete::Cascade),
        ColumnDef::new("is_active", "boolean").not_null().default(TRUE),
        ColumnDef::new("created_by", "bigint").references("users", OnDelete::SetNull),
        ColumnDef::new("created_at", "timestamptz").not_null().default(NOW),
    ],
    indexes: &["email", "token"],
    checks: &[],
};

pub const POLLS: TableDef = TableDef {
    name: "polls",
    columns: &[
        ColumnDef::new("uuid", "uuid").not_null().unique().default(ColumnDefault::RandomUuid),
        ColumnDef::new("created_at", "timestamptz").not_null().default(NOW),
        ColumnDef::new("title", "text").not_null(),
        ColumnDef::new("description", "text"),
        ColumnDef::new("poll_cover", "text"),
        ColumnDef::new("poll_status", "text")
            .not_null()
            .default(ColumnDefault::Literal { sql: "'DRAFT'", json: "\"DRAFT\"" }),
        ColumnDef::new("poll_url", "text"),
        ColumnDef::new("user_id", "bigint").not_null().references("users", OnDelete::Restrict),
        ColumnDef::new("active_from", "timestamptz"),
        ColumnDef::new("active_duration", "integer"),
        ColumnDef::new("max_participants", "integer"),
    ],
    // indexed, not unique
    indexes: &["title", "description", "user_id"],
    checks: &[CheckDef {
        name: "polls_status_check",
        column: "poll_status",
        allowed: &["DRAFT", "PUBLISHED", "ENDED", "ARCHIVED"],
    }],
};

pub const QUESTIONS: TableDef = TableDef {
    name: "questions",
    columns: &[
        ColumnDef::new("type", "text").not_null(),
        ColumnDef::new("text", "text"),
        ColumnDef::new("question_cover", "text"),
        ColumnDef::new("option_pass", "boolean").not_null().default(FALSE),
        ColumnDef::new("option_other_answer", "boolean").not_null().default(FALSE),
        ColumnDef::new("poll_id", "bigint").not_null().references("polls", OnDelete::Cascade),
        ColumnDef::new("order", "integer")
            .not_null()
            .default(ColumnDefault::Literal { sql: "10", json: "10" }),
    ],
    indexes: &["type", "poll_id", "order"],
    checks: &[CheckDef {
        name: "questions_type_check",
        column: "type",
        allowed: &["SINGLE ANSWER", "PLURAL ANSWER", "FREE ANSWER", "FREE TEXT ANSWER"],
    }],
};

pub const CHOICES: TableDef = TableDef {
    name: "choices",
    columns: &[
        ColumnDef::new("text", "text"),
        ColumnDef::new("choice_cover", "text"),
        ColumnDef::new("text_fields_count", "integer"),
        ColumnDef::new("question_id", "bigint").not_null().references("questions", OnDelete::Cascade),
    ],
    indexes: &["question_id"],
    checks: &[],
};

pub const RESPONSES: TableDef = TableDef {
    name: "responses",
    columns: &[
        ColumnDef::new("created_at", "timestamptz").not_null().default(NOW),
        ColumnDef::new("poll_id", "bigint").not_null().references("polls", OnDelete::Cascade),
        ColumnDef::new("question_id", "bigint").not_null().references("questions", OnDelete::Cascade),
        ColumnDef::new("answer_text", "jsonb"),
        ColumnDef::new("answer_choice", "jsonb"),
        ColumnDef::new("user_token", "text").not_null(),
    ],
    indexes: &["poll_id", "user_token"],
    checks: &[],
};

/// Every table, referenced tables before referencing ones.
pub static ALL: [&TableDef; 7] = [
    &COMPANIES,
    &USERS,
    &INVITATIONS,
    &POLLS,
    &QUESTIONS,
    &CHOICES,
    &RESPONSES,
];

