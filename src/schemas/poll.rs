use crate::extractors::RequestBody;
use crate::models::{Choice, Poll, PollStatus, Question, QuestionType};
use crate::service::{Rules, ValidationRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const TITLE: ValidationRule = ValidationRule::new().length(1, 255);
const DURATION: ValidationRule = ValidationRule::new().range(1, 525_600);
const PARTICIPANTS: ValidationRule = ValidationRule::new().range(1, 1_000_000);
const QUESTION_TYPES: &[&str] = &["SINGLE ANSWER", "PLURAL ANSWER", "FREE ANSWER", "FREE TEXT ANSWER"];

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChoiceCreate {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub choice_cover: Option<String>,
    #[serde(default)]
    pub text_fields_count: Option<i32>,
}

impl RequestBody for ChoiceCreate {}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuestionCreate {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub question_cover: Option<String>,
    #[serde(default)]
    pub option_pass: Option<bool>,
    #[serde(default)]
    pub option_other_answer: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub choices: Vec<ChoiceCreate>,
}

impl RequestBody for QuestionCreate {
    const RULES: &'static Rules = &[("type", ValidationRule::new().required().one_of(QUESTION_TYPES))];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PollCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub poll_cover: Option<String>,
    #[serde(default)]
    pub active_from: Option<DateTime<Utc>>,
    /// Minutes.
    #[serde(default)]
    pub active_duration: Option<i32>,
    #[serde(default)]
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub questions: Vec<QuestionCreate>,
}

impl RequestBody for PollCreate {
    const RULES: &'static Rules = &[
        ("title", TITLE.required()),
        ("active_duration", DURATION),
        ("max_participants", PARTICIPANTS),
    ];
}

/// Editable poll fields; also the column set written on update.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct PollUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
}

impl RequestBody for PollUpdate {
    const RULES: &'static Rules = &[
        ("title", TITLE),
        ("active_duration", DURATION),
        ("max_participants", PARTICIPANTS),
    ];
    const PARTIAL: bool = true;
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusChange {
    pub status: PollStatus,
}

impl RequestBody for StatusChange {
    const RULES: &'static Rules = &[(
        "status",
        ValidationRule::new().required().one_of(&["DRAFT", "PUBLISHED", "ENDED", "ARCHIVED"]),
    )];
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct QuestionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_pass: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_other_answer: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

impl RequestBody for QuestionUpdate {
    const PARTIAL: bool = true;
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct Answer {
    pub question_id: i64,
    #[serde(default)]
    pub answer_text: Option<Vec<String>>,
    #[serde(default)]
    pub answer_choice: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitResponses {
    pub answers: Vec<Answer>,
}

impl RequestBody for SubmitResponses {}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub user_token: String,
    pub answers: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub choices: Vec<Choice>,
}

/// A poll with its questions (ordered) and their choices.
#[derive(Debug, Serialize, ToSchema)]
pub struct PollDetail {
    #[serde(flatten)]
    pub poll: Poll,
    pub questions: Vec<QuestionDetail>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceCount {
    pub choice_id: i64,
    pub text: Option<String>,
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub text: Option<String>,
    pub answered: usize,
    pub choices: Vec<ChoiceCount>,
    pub text_answers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PollResults {
    pub poll_id: i64,
    pub participants: usize,
    pub questions: Vec<QuestionResult>,
}

/// Columns written when a poll row is created.
#[derive(Debug, Serialize)]
pub struct NewPoll {
    pub title: String,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
}

/// Columns written on a status transition.
#[derive(Debug, Default, Serialize)]
pub struct PollStateChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_status: Option<PollStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    pub poll_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_pass: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_other_answer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct NewChoice {
    pub question_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_fields_count: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct NewResponse {
    pub poll_id: i64,
    pub question_id: i64,
    pub answer_text: Option<Vec<String>>,
    pub answer_choice: Option<Vec<i64>>,
    pub user_token: String,
}

/// Responses and choices are never edited in place.
#[derive(Debug, Serialize)]
pub struct NoChanges {}
