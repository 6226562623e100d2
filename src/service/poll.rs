//! Polls: authoring, lifecycle, public participation and results.

use super::crud::CrudBase;
use crate::error::AppError;
use crate::models::{Choice, Poll, PollStatus, Question, QuestionType, Response, User};
use crate::schemas::{
    Answer, ChoiceCount, ChoiceCreate, NewChoice, NewPoll, NewQuestion, NewResponse, NoChanges, PollCreate,
    PollDetail, PollResults, PollStateChange, PollUpdate, QuestionCreate, QuestionDetail, QuestionResult,
    QuestionUpdate, SubmissionReceipt, SubmitResponses,
};
use crate::settings::Settings;
use crate::store::Store;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub type PollCrud<'a> = CrudBase<'a, Poll, NewPoll, PollUpdate>;
pub(crate) type PollStateCrud<'a> = CrudBase<'a, Poll, NewPoll, PollStateChange>;
pub type QuestionCrud<'a> = CrudBase<'a, Question, NewQuestion, QuestionUpdate>;
pub type ChoiceCrud<'a> = CrudBase<'a, Choice, NewChoice, NoChanges>;
pub type ResponseCrud<'a> = CrudBase<'a, Response, NewResponse, NoChanges>;

pub struct PollService;

impl PollService {
    pub async fn list(store: &dyn Store, current: &User, skip: u32, limit: Option<u32>) -> Result<Vec<Poll>, AppError> {
        let crud = PollCrud::new(store);
        if current.is_superadmin() {
            crud.get_multi(skip, limit).await
        } else {
            crud.find(&[("user_id", json!(current.id))], skip, limit).await
        }
    }

    /// Load a poll owned by the caller (superadmins own every poll).
    pub async fn get_owned(store: &dyn Store, current: &User, id: i64) -> Result<Poll, AppError> {
        let poll = PollCrud::new(store)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".into()))?;
        if poll.user_id != current.id && !current.is_superadmin() {
            return Err(AppError::Forbidden("Not the owner of this poll".into()));
        }
        Ok(poll)
    }

    async fn get_draft(store: &dyn Store, current: &User, id: i64) -> Result<Poll, AppError> {
        let poll = Self::get_owned(store, current, id).await?;
        if poll.poll_status != PollStatus::Draft {
            return Err(AppError::Conflict(format!(
                "Poll is {}; only DRAFT polls can be edited",
                poll.poll_status
            )));
        }
        Ok(poll)
    }

    async fn get_question(store: &dyn Store, id: i64) -> Result<Question, AppError> {
        QuestionCrud::new(store)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".into()))
    }

    /// Questions of a poll ordered by (`order`, `id`).
    async fn questions_of(store: &dyn Store, poll_id: i64) -> Result<Vec<Question>, AppError> {
        let mut questions = QuestionCrud::new(store).find_all(&[("poll_id", json!(poll_id))]).await?;
        questions.sort_by_key(|q| (q.order, q.id));
        Ok(questions)
    }

    async fn choices_of(store: &dyn Store, question_id: i64) -> Result<Vec<Choice>, AppError> {
        ChoiceCrud::new(store).find_all(&[("question_id", json!(question_id))]).await
    }

    pub async fn detail(store: &dyn Store, poll: Poll) -> Result<PollDetail, AppError> {
        let mut questions = Vec::new();
        for question in Self::questions_of(store, poll.id).await? {
            let choices = Self::choices_of(store, question.id).await?;
            questions.push(QuestionDetail { question, choices });
        }
        Ok(PollDetail { poll, questions })
    }

    async fn insert_question(store: &dyn Store, poll_id: i64, input: QuestionCreate) -> Result<QuestionDetail, AppError> {
        let question = QuestionCrud::new(store)
            .create(&NewQuestion {
                kind: input.kind,
                poll_id,
                text: input.text,
                question_cover: input.question_cover,
                option_pass: input.option_pass,
                option_other_answer: input.option_other_answer,
                order: input.order,
            })
            .await?;
        let mut choices = Vec::with_capacity(input.choices.len());
        for c in input.choices {
            choices.push(Self::insert_choice(store, question.id, c).await?);
        }
        Ok(QuestionDetail { question, choices })
    }

    async fn insert_choice(store: &dyn Store, question_id: i64, input: ChoiceCreate) -> Result<Choice, AppError> {
        ChoiceCrud::new(store)
            .create(&NewChoice {
                question_id,
                text: input.text,
                choice_cover: input.choice_cover,
                text_fields_count: input.text_fields_count,
            })
            .await
    }

    /// Create a DRAFT poll with its nested questions and choices. A failure part way removes the poll again.
    pub async fn create(store: &dyn Store, current: &User, input: PollCreate) -> Result<PollDetail, AppError> {
        let crud = PollCrud::new(store);
        let poll = crud
            .create(&NewPoll {
                title: input.title,
                user_id: current.id,
                description: input.description,
                poll_cover: input.poll_cover,
                active_from: input.active_from,
                active_duration: input.active_duration,
                max_participants: input.max_participants,
            })
            .await?;
        let mut questions = Vec::with_capacity(input.questions.len());
        for q in input.questions {
            match Self::insert_question(store, poll.id, q).await {
                Ok(detail) => questions.push(detail),
                Err(e) => {
                    crud.remove(poll.id).await?;
                    return Err(e);
                }
            }
        }
        questions.sort_by_key(|d| (d.question.order, d.question.id));
        tracing::info!(poll_id = poll.id, user_id = current.id, questions = questions.len(), "poll created");
        Ok(PollDetail { poll, questions })
    }

    pub async fn update(store: &dyn Store, current: &User, id: i64, input: PollUpdate) -> Result<Poll, AppError> {
        let poll = Self::get_draft(store, current, id).await?;
        PollCrud::new(store)
            .update(poll.id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".into()))
    }

    pub async fn delete(store: &dyn Store, current: &User, id: i64) -> Result<Poll, AppError> {
        let poll = Self::get_owned(store, current, id).await?;
        let removed = PollCrud::new(store)
            .remove(poll.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".into()))?;
        tracing::info!(poll_id = removed.id, "poll deleted");
        Ok(removed)
    }

    /// Move a poll along its lifecycle. Publishing stamps `active_from` (when unset) and `poll_url`.
    pub async fn change_status(
        store: &dyn Store,
        settings: &Settings,
        current: &User,
        id: i64,
        to: PollStatus,
    ) -> Result<Poll, AppError> {
        let poll = Self::get_owned(store, current, id).await?;
        if !poll.poll_status.can_transition(to) {
            return Err(AppError::Conflict(format!(
                "Cannot change poll status from {} to {}",
                poll.poll_status, to
            )));
        }
        let mut changes = PollStateChange {
            poll_status: Some(to),
            ..Default::default()
        };
        if to == PollStatus::Published {
            if poll.active_from.is_none() {
                changes.active_from = Some(Utc::now());
            }
            changes.poll_url = Some(format!(
                "{}/api/public/polls/{}",
                settings.server_host.trim_end_matches('/'),
                poll.uuid
            ));
        }
        let updated = PollStateCrud::new(store)
            .update(poll.id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".into()))?;
        tracing::info!(poll_id = updated.id, from = %poll.poll_status, to = %to, "poll status changed");
        Ok(updated)
    }

    pub async fn add_question(
        store: &dyn Store,
        current: &User,
        poll_id: i64,
        input: QuestionCreate,
    ) -> Result<QuestionDetail, AppError> {
        let poll = Self::get_draft(store, current, poll_id).await?;
        Self::insert_question(store, poll.id, input).await
    }

    pub async fn update_question(
        store: &dyn Store,
        current: &User,
        question_id: i64,
        input: QuestionUpdate,
    ) -> Result<Question, AppError> {
        let question = Self::get_question(store, question_id).await?;
        Self::get_draft(store, current, question.poll_id).await?;
        QuestionCrud::new(store)
            .update(question.id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".into()))
    }

    pub async fn delete_question(store: &dyn Store, current: &User, question_id: i64) -> Result<Question, AppError> {
        let question = Self::get_question(store, question_id).await?;
        Self::get_draft(store, current, question.poll_id).await?;
        QuestionCrud::new(store)
            .remove(question.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Question not found".into()))
    }

    pub async fn add_choice(
        store: &dyn Store,
        current: &User,
        question_id: i64,
        input: ChoiceCreate,
    ) -> Result<Choice, AppError> {
        let question = Self::get_question(store, question_id).await?;
        Self::get_draft(store, current, question.poll_id).await?;
        Self::insert_choice(store, question.id, input).await
    }

    pub async fn delete_choice(store: &dyn Store, current: &User, choice_id: i64) -> Result<Choice, AppError> {
        let crud = ChoiceCrud::new(store);
        let choice = crud
            .get(choice_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Choice not found".into()))?;
        let question = Self::get_question(store, choice.question_id).await?;
        Self::get_draft(store, current, question.poll_id).await?;
        crud.remove(choice.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Choice not found".into()))
    }

    pub async fn responses(store: &dyn Store, current: &User, poll_id: i64) -> Result<Vec<Response>, AppError> {
        let poll = Self::get_owned(store, current, poll_id).await?;
        ResponseCrud::new(store).find_all(&[("poll_id", json!(poll.id))]).await
    }

    /// Per-question choice counts and free-text answers.
    pub async fn results(store: &dyn Store, current: &User, poll_id: i64) -> Result<PollResults, AppError> {
        let poll = Self::get_owned(store, current, poll_id).await?;
        let responses = ResponseCrud::new(store).find_all(&[("poll_id", json!(poll.id))]).await?;
        let participants = responses.iter().map(|r| r.user_token.as_str()).collect::<HashSet<_>>().len();
        let mut by_question: HashMap<i64, Vec<&Response>> = HashMap::new();
        for r in &responses {
            by_question.entry(r.question_id).or_default().push(r);
        }

        let mut questions = Vec::new();
        for question in Self::questions_of(store, poll.id).await? {
            let answers = by_question.remove(&question.id).unwrap_or_default();
            let choices = Self::choices_of(store, question.id)
                .await?
                .into_iter()
                .map(|c| ChoiceCount {
                    choice_id: c.id,
                    count: answers
                        .iter()
                        .filter(|r| r.answer_choice.as_ref().is_some_and(|ids| ids.contains(&c.id)))
                        .count(),
                    text: c.text,
                })
                .collect();
            let text_answers = answers
                .iter()
                .filter_map(|r| r.answer_text.as_ref())
                .flatten()
                .cloned()
                .collect();
            questions.push(QuestionResult {
                question_id: question.id,
                kind: question.kind,
                text: question.text,
                answered: answers.len(),
                choices,
                text_answers,
            });
        }
        Ok(PollResults {
            poll_id: poll.id,
            participants,
            questions,
        })
    }

    async fn get_by_uuid(store: &dyn Store, uuid: Uuid) -> Result<Poll, AppError> {
        PollCrud::new(store)
            .find_one(&[("uuid", json!(uuid))])
            .await?
            .ok_or_else(|| AppError::NotFound("Poll not found".into()))
    }

    /// A published poll as shown to participants; anything unpublished is hidden.
    pub async fn public_detail(store: &dyn Store, uuid: Uuid) -> Result<PollDetail, AppError> {
        let poll = Self::get_by_uuid(store, uuid).await?;
        if poll.poll_status != PollStatus::Published {
            return Err(AppError::NotFound("Poll not found".into()));
        }
        Self::detail(store, poll).await
    }

    /// Record one anonymous submission. All answers are checked before anything is stored.
    pub async fn submit(store: &dyn Store, uuid: Uuid, input: SubmitResponses) -> Result<SubmissionReceipt, AppError> {
        Self::submit_at(store, uuid, input, Utc::now()).await
    }

    pub(crate) async fn submit_at(
        store: &dyn Store,
        uuid: Uuid,
        input: SubmitResponses,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, AppError> {
        let poll = Self::get_by_uuid(store, uuid).await?;
        if !poll.is_open_at(now) {
            return Err(AppError::Conflict("Poll is not accepting responses".into()));
        }
        let responses = ResponseCrud::new(store);
        if let Some(max) = poll.max_participants {
            let existing = responses.find_all(&[("poll_id", json!(poll.id))]).await?;
            let participants = existing.iter().map(|r| r.user_token.as_str()).collect::<HashSet<_>>().len();
            if participants >= usize::try_from(max).unwrap_or(0) {
                return Err(AppError::Conflict("Poll has reached its participant limit".into()));
            }
        }

        let questions = Self::questions_of(store, poll.id).await?;
        let cleaned: Vec<Answer> = input.answers.iter().map(without_blank_texts).collect();
        let mut answered: HashMap<i64, &Answer> = HashMap::new();
        for a in &cleaned {
            if !questions.iter().any(|q| q.id == a.question_id) {
                return Err(AppError::BadRequest(format!(
                    "Question {} does not belong to this poll",
                    a.question_id
                )));
            }
            if answered.insert(a.question_id, a).is_some() {
                return Err(AppError::BadRequest(format!("Question {} answered twice", a.question_id)));
            }
        }

        let mut rows = Vec::new();
        for q in &questions {
            let answer = answered.get(&q.id).copied().filter(|a| !is_blank(a));
            let Some(answer) = answer else {
                if q.option_pass {
                    continue;
                }
                return Err(AppError::Validation(format!("Question {} requires an answer", q.id)));
            };
            let choices = Self::choices_of(store, q.id).await?;
            check_answer(q, &choices, answer)?;
            rows.push(answer);
        }

        let user_token = Uuid::new_v4().to_string();
        for a in &rows {
            responses
                .create(&NewResponse {
                    poll_id: poll.id,
                    question_id: a.question_id,
                    answer_text: a.answer_text.clone(),
                    answer_choice: a.answer_choice.clone(),
                    user_token: user_token.clone(),
                })
                .await?;
        }
        tracing::info!(poll_id = poll.id, answers = rows.len(), "responses recorded");
        Ok(SubmissionReceipt {
            user_token,
            answers: rows.len(),
        })
    }
}

/// Trim text answers and drop whitespace-only entries. Empty lists become None.
fn without_blank_texts(a: &Answer) -> Answer {
    let texts: Vec<String> = a
        .answer_text
        .iter()
        .flatten()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    Answer {
        question_id: a.question_id,
        answer_text: Some(texts).filter(|t| !t.is_empty()),
        answer_choice: a.answer_choice.clone().filter(|c| !c.is_empty()),
    }
}

fn is_blank(a: &Answer) -> bool {
    a.answer_text.as_ref().map_or(true, |t| t.is_empty()) && a.answer_choice.as_ref().map_or(true, |c| c.is_empty())
}

/// Shape rules per question type, plus choice ownership.
fn check_answer(q: &Question, choices: &[Choice], a: &Answer) -> Result<(), AppError> {
    let picked = a.answer_choice.as_deref().unwrap_or_default();
    let texts = a.answer_text.as_deref().unwrap_or_default();
    let invalid = |what: &str| AppError::Validation(format!("Question {}: {}", q.id, what));

    for id in picked {
        if !choices.iter().any(|c| c.id == *id) {
            return Err(AppError::BadRequest(format!(
                "Choice {} does not belong to question {}",
                id, q.id
            )));
        }
    }
    if picked.iter().collect::<HashSet<_>>().len() != picked.len() {
        return Err(invalid("a choice was picked twice"));
    }
    if !texts.is_empty() && q.kind.has_choices() && !q.option_other_answer {
        return Err(invalid("free text is not allowed"));
    }
    match q.kind {
        QuestionType::Single => {
            if picked.len() + texts.len() != 1 {
                return Err(invalid("exactly one answer is required"));
            }
        }
        QuestionType::Plural => {
            if picked.is_empty() && texts.is_empty() {
                return Err(invalid("at least one answer is required"));
            }
        }
        QuestionType::Free => {
            if !picked.is_empty() || texts.is_empty() {
                return Err(invalid("one or more text answers are required"));
            }
        }
        QuestionType::FreeText => {
            if !picked.is_empty() || texts.len() != 1 {
                return Err(invalid("exactly one text answer is required"));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::ChoiceCreate;
    use crate::service::UserService;
    use crate::store::MemoryStore;

    async fn owner(store: &MemoryStore) -> User {
        let s = Settings {
            first_superuser_email: Some("owner@example.com".into()),
            first_superuser_password: Some("ownerpassword".into()),
            ..Settings::default()
        };
        UserService::create_initial_user(store, &s).await.unwrap().unwrap()
    }

    fn question(kind: QuestionType, choices: &[&str]) -> QuestionCreate {
        QuestionCreate {
            kind,
            text: Some("q".into()),
            question_cover: None,
            option_pass: None,
            option_other_answer: None,
            order: None,
            choices: choices
                .iter()
                .map(|t| ChoiceCreate {
                    text: Some(t.to_string()),
                    choice_cover: None,
                    text_fields_count: None,
                })
                .collect(),
        }
    }

    fn poll_input(questions: Vec<QuestionCreate>, max_participants: Option<i32>) -> PollCreate {
        PollCreate {
            title: "Lunch".into(),
            description: None,
            poll_cover: None,
            active_from: None,
            active_duration: None,
            max_participants,
            questions,
        }
    }

    fn answer(question_id: i64, choice: Option<i64>, text: Option<&str>) -> Answer {
        Answer {
            question_id,
            answer_text: text.map(|t| vec![t.to_string()]),
            answer_choice: choice.map(|c| vec![c]),
        }
    }

    async fn published(store: &MemoryStore, user: &User, input: PollCreate) -> PollDetail {
        let detail = PollService::create(store, user, input).await.unwrap();
        PollService::change_status(store, &Settings::default(), user, detail.poll.id, PollStatus::Published)
            .await
            .unwrap();
        PollService::public_detail(store, detail.poll.uuid).await.unwrap()
    }

    #[tokio::test]
    async fn nested_create_orders_questions() {
        let store = MemoryStore::new();
        let user = owner(&store).await;
        let mut late = question(QuestionType::FreeText, &[]);
        late.order = Some(20);
        let mut early = question(QuestionType::Single, &["a", "b"]);
        early.order = Some(1);
        let detail = PollService::create(&store, &user, poll_input(vec![late, early], None)).await.unwrap();
        assert_eq!(detail.poll.poll_status, PollStatus::Draft);
        assert_eq!(detail.questions[0].question.kind, QuestionType::Single);
        assert_eq!(detail.questions[0].choices.len(), 2);

        let reloaded = PollService::detail(&store, detail.poll.clone()).await.unwrap();
        assert_eq!(reloaded.questions[1].question.order, 20);
    }

    #[tokio::test]
    async fn lifecycle_is_enforced() {
        let store = MemoryStore::new();
        let user = owner(&store).await;
        let s = Settings::default();
        let id = PollService::create(&store, &user, poll_input(vec![], None)).await.unwrap().poll.id;

        let err = PollService::change_status(&store, &s, &user, id, PollStatus::Ended).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let p = PollService::change_status(&store, &s, &user, id, PollStatus::Published).await.unwrap();
        assert!(p.active_from.is_some());
        assert!(p.poll_url.as_deref().unwrap().ends_with(&p.uuid.to_string()));

        let err = PollService::update(&store, &user, id, PollUpdate::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let err = PollService::change_status(&store, &s, &user, id, PollStatus::Draft).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn draft_polls_reject_submissions() {
        let store = MemoryStore::new();
        let user = owner(&store).await;
        let detail = PollService::create(&store, &user, poll_input(vec![question(QuestionType::FreeText, &[])], None))
            .await
            .unwrap();
        let qid = detail.questions[0].question.id;
        let err = PollService::submit(
            &store,
            detail.poll.uuid,
            SubmitResponses {
                answers: vec![answer(qid, None, Some("hi"))],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(matches!(
            PollService::public_detail(&store, detail.poll.uuid).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn participant_limit() {
        let store = MemoryStore::new();
        let user = owner(&store).await;
        let detail = published(&store, &user, poll_input(vec![question(QuestionType::Single, &["y", "n"])], Some(1))).await;
        let q = &detail.questions[0];
        let submit = || SubmitResponses {
            answers: vec![answer(q.question.id, Some(q.choices[0].id), None)],
        };
        let receipt = PollService::submit(&store, detail.poll.uuid, submit()).await.unwrap();
        assert_eq!(receipt.answers, 1);
        let err = PollService::submit(&store, detail.poll.uuid, submit()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn answer_shapes_are_checked() {
        let store = MemoryStore::new();
        let user = owner(&store).await;
        let detail = published(
            &store,
            &user,
            poll_input(
                vec![question(QuestionType::Single, &["y", "n"]), question(QuestionType::Free, &[])],
                None,
            ),
        )
        .await;
        let single = &detail.questions[0];
        let free = detail.questions[1].question.id;
        let uuid = detail.poll.uuid;

        // unanswered required question
        let err = PollService::submit(&store, uuid, SubmitResponses { answers: vec![answer(free, None, Some("x"))] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // two choices on a single-answer question
        let two = Answer {
            question_id: single.question.id,
            answer_text: None,
            answer_choice: Some(vec![single.choices[0].id, single.choices[1].id]),
        };
        let err = PollService::submit(&store, uuid, SubmitResponses { answers: vec![two, answer(free, None, Some("x"))] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // question from nowhere
        let err = PollService::submit(&store, uuid, SubmitResponses { answers: vec![answer(999, None, Some("x"))] })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let ok = SubmitResponses {
            answers: vec![answer(single.question.id, Some(single.choices[1].id), None), answer(free, None, Some("x"))],
        };
        PollService::submit(&store, uuid, ok).await.unwrap();

        let results = PollService::results(&store, &user, detail.poll.id).await.unwrap();
        assert_eq!(results.participants, 1);
        assert_eq!(results.questions[0].choices[1].count, 1);
        assert_eq!(results.questions[0].choices[0].count, 0);
        assert_eq!(results.questions[1].text_answers, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn window_closes_after_duration() {
        let store = MemoryStore::new();
        let user = owner(&store).await;
        let mut input = poll_input(vec![question(QuestionType::FreeText, &[])], None);
        input.active_duration = Some(10);
        let detail = published(&store, &user, input).await;
        let qid = detail.questions[0].question.id;
        let later = Utc::now() + chrono::Duration::minutes(11);
        let err = PollService::submit_at(
            &store,
            detail.poll.uuid,
            SubmitResponses {
                answers: vec![answer(qid, None, Some("late"))],
            },
            later,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
