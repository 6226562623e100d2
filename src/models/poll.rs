use super::Model;
use crate::store::{tables, TableDef};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    Draft,
    Published,
    Ended,
    Archived,
}

impl PollStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PollStatus::Draft => "DRAFT",
            PollStatus::Published => "PUBLISHED",
            PollStatus::Ended => "ENDED",
            PollStatus::Archived => "ARCHIVED",
        }
    }

    /// DRAFT -> PUBLISHED -> ENDED -> ARCHIVED, and DRAFT -> ARCHIVED.
    pub fn can_transition(self, to: PollStatus) -> bool {
        use PollStatus::*;
        matches!(
            (self, to),
            (Draft, Published) | (Published, Ended) | (Ended, Archived) | (Draft, Archived)
        )
    }
}

impl fmt::Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum QuestionType {
    #[serde(rename = "SINGLE ANSWER")]
    Single,
    #[serde(rename = "PLURAL ANSWER")]
    Plural,
    #[serde(rename = "FREE ANSWER")]
    Free,
    #[serde(rename = "FREE TEXT ANSWER")]
    FreeText,
}

impl QuestionType {
    pub fn has_choices(self) -> bool {
        matches!(self, QuestionType::Single | QuestionType::Plural)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Poll {
    pub id: i64,
    pub uuid: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub poll_cover: Option<String>,
    pub poll_status: PollStatus,
    pub poll_url: Option<String>,
    pub user_id: i64,
    pub active_from: Option<DateTime<Utc>>,
    /// Minutes after `active_from` during which responses are accepted.
    pub active_duration: Option<i32>,
    pub max_participants: Option<i32>,
}

impl Poll {
    /// End of the active window, when both bounds are set.
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        let from = self.active_from?;
        let minutes = self.active_duration?;
        Some(from + Duration::minutes(i64::from(minutes)))
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        if self.poll_status != PollStatus::Published {
            return false;
        }
        if matches!(self.active_from, Some(from) if now < from) {
            return false;
        }
        !matches!(self.ends_at(), Some(end) if now >= end)
    }
}

impl Model for Poll {
    const TABLE: &'static TableDef = &tables::POLLS;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Question {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub text: Option<String>,
    pub question_cover: Option<String>,
    pub option_pass: bool,
    pub option_other_answer: bool,
    pub poll_id: i64,
    pub order: i32,
}

impl Model for Question {
    const TABLE: &'static TableDef = &tables::QUESTIONS;

    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Choice {
    pub id: i64,
    pub text: Option<String>,
    pub choice_cover: Option<String>,
    pub text_fields_count: Option<i32>,
    pub question_id: i64,
}

impl Model for Choice {
    const TABLE: &'static TableDef = &tables::CHOICES;

    fn id(&self) -> i64 {
        self.id
    }
}

/// One answered question of one submission; `user_token` groups the rows of a submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Response {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub poll_id: i64,
    pub question_id: i64,
    pub answer_text: Option<Vec<String>>,
    pub answer_choice: Option<Vec<i64>>,
    pub user_token: String,
}

impl Model for Response {
    const TABLE: &'static TableDef = &tables::RESPONSES;

    fn id(&self) -> i64 {
        self.id
    }
}
