mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

async fn create_poll(app: &TestApp, max_participants: Option<i64>) -> Value {
    let (status, body) = app
        .root(
            Method::POST,
            "/api/polls",
            Some(json!({
                "title": "Team lunch",
                "maxParticipants": max_participants,
                "questions": [
                    {"type": "SINGLE ANSWER", "text": "Where?", "choices": [{"text": "Pizza"}, {"text": "Sushi"}]},
                    {"type": "FREE TEXT ANSWER", "text": "Anything else?", "optionPass": true, "order": 20}
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

async fn set_status(app: &TestApp, id: i64, status: &str) -> (StatusCode, Value) {
    app.root(Method::POST, &format!("/api/polls/{}/status", id), Some(json!({"status": status})))
        .await
}

#[tokio::test]
async fn nested_create_returns_detail() {
    let app = TestApp::new().await;
    let poll = create_poll(&app, None).await;
    assert_eq!(poll["pollStatus"], "DRAFT");
    assert_eq!(poll["questions"][0]["type"], "SINGLE ANSWER");
    assert_eq!(poll["questions"][0]["choices"][1]["text"], "Sushi");
    assert_eq!(poll["questions"][1]["optionPass"], true);
}

#[tokio::test]
async fn transitions_outside_lifecycle_are_409() {
    let app = TestApp::new().await;
    let id = create_poll(&app, None).await["id"].as_i64().unwrap();
    assert_eq!(set_status(&app, id, "ENDED").await.0, StatusCode::CONFLICT);
    let (status, body) = set_status(&app, id, "PUBLISHED").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["pollUrl"].is_string());
    assert_eq!(set_status(&app, id, "DRAFT").await.0, StatusCode::CONFLICT);
    let (status, _) = app
        .root(Method::PUT, &format!("/api/polls/{}", id), Some(json!({"title": "Renamed"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(set_status(&app, id, "ENDED").await.0, StatusCode::OK);
    assert_eq!(set_status(&app, id, "ARCHIVED").await.0, StatusCode::OK);
}

#[tokio::test]
async fn public_submission_rules() {
    let app = TestApp::new().await;
    let poll = create_poll(&app, Some(1)).await;
    let id = poll["id"].as_i64().unwrap();
    let uuid = poll["uuid"].as_str().unwrap().to_string();
    let question = poll["questions"][0]["id"].as_i64().unwrap();
    let sushi = poll["questions"][0]["choices"][1]["id"].as_i64().unwrap();
    let url = format!("/api/public/polls/{}/responses", uuid);
    let answers = json!({"answers": [{"questionId": question, "answerChoice": [sushi]}]});

    // draft: hidden and closed
    let (status, _) = app.send(Method::GET, &format!("/api/public/polls/{}", uuid), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::POST, &url, None, Some(answers.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    set_status(&app, id, "PUBLISHED").await;
    let (status, body) = app.send(Method::GET, &format!("/api/public/polls/{}", uuid), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 2);

    let (status, body) = app.send(Method::POST, &url, None, Some(answers.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert!(body["data"]["userToken"].is_string());

    // max_participants = 1
    let (status, _) = app.send(Method::POST, &url, None, Some(answers)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.root(Method::GET, &format!("/api/polls/{}/results", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["participants"], 1);
    assert_eq!(body["data"]["questions"][0]["choices"][1]["count"], 1);
}

#[tokio::test]
async fn deleting_a_poll_removes_its_questions() {
    let app = TestApp::new().await;
    let poll = create_poll(&app, None).await;
    let id = poll["id"].as_i64().unwrap();
    let question = poll["questions"][0]["id"].as_i64().unwrap();

    let (status, body) = app.root(Method::DELETE, &format!("/api/polls/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Poll was deleted");
    let (status, _) = app.root(Method::GET, &format!("/api/polls/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .root(Method::PUT, &format!("/api/questions/{}", question), Some(json!({"text": "?"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_of_polls_cannot_be_deleted() {
    let app = TestApp::new().await;
    app.create_user("author@example.com", &["user"]).await;
    let token = app.login("author@example.com", "password123").await;
    let (status, body) = app
        .send(Method::POST, "/api/polls", Some(&token), Some(json!({"title": "Mine"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let owner = body["data"]["userId"].as_i64().unwrap();

    let (status, _) = app.root(Method::DELETE, &format!("/api/users/{}", owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // other users cannot see it
    app.create_user("other@example.com", &["user"]).await;
    let other = app.login("other@example.com", "password123").await;
    let poll_id = body["data"]["id"].as_i64().unwrap();
    let (status, _) = app.send(Method::GET, &format!("/api/polls/{}", poll_id), Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

async fn publish(app: &TestApp, questions: Value) -> (i64, String, Value) {
    let (status, body) = app
        .root(Method::POST, "/api/polls", Some(json!({"title": "Survey", "questions": questions})))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(set_status(app, id, "PUBLISHED").await.0, StatusCode::OK);
    let url = format!("/api/public/polls/{}/responses", body["data"]["uuid"].as_str().unwrap());
    (id, url, body["data"]["questions"].clone())
}

#[tokio::test]
async fn whitespace_answers_count_as_unanswered() {
    let app = TestApp::new().await;
    let (id, url, questions) = publish(&app, json!([{"type": "FREE TEXT ANSWER", "text": "Why?"}])).await;
    let q = questions[0]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(Method::POST, &url, None, Some(json!({"answers": [{"questionId": q, "answerText": ["   "]}]})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .send(Method::POST, &url, None, Some(json!({"answers": [{"questionId": q, "answerText": ["", " because "]}]})))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let (_, body) = app.root(Method::GET, &format!("/api/polls/{}/responses", id), None).await;
    assert_eq!(body["meta"]["count"], 1);
    assert_eq!(body["data"][0]["answerText"], json!(["because"]));
}

#[tokio::test]
async fn answers_must_match_their_question() {
    let app = TestApp::new().await;
    let (_, url, questions) = publish(
        &app,
        json!([
            {"type": "SINGLE ANSWER", "text": "Where?", "choices": [{"text": "Pizza"}, {"text": "Sushi"}]},
            {"type": "SINGLE ANSWER", "text": "When?", "optionOtherAnswer": true, "choices": [{"text": "Noon"}]}
        ]),
    )
    .await;
    let where_q = questions[0]["id"].as_i64().unwrap();
    let pizza = questions[0]["choices"][0]["id"].as_i64().unwrap();
    let sushi = questions[0]["choices"][1]["id"].as_i64().unwrap();
    let when_q = questions[1]["id"].as_i64().unwrap();
    let noon = questions[1]["choices"][0]["id"].as_i64().unwrap();

    // the same question twice
    let (status, _) = app
        .send(
            Method::POST,
            &url,
            None,
            Some(json!({"answers": [
                {"questionId": where_q, "answerChoice": [pizza]},
                {"questionId": where_q, "answerChoice": [sushi]},
                {"questionId": when_q, "answerChoice": [noon]}
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // a choice of another question
    let (status, _) = app
        .send(
            Method::POST,
            &url,
            None,
            Some(json!({"answers": [
                {"questionId": where_q, "answerChoice": [noon]},
                {"questionId": when_q, "answerChoice": [noon]}
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // free text only where other answers are allowed
    let (status, _) = app
        .send(
            Method::POST,
            &url,
            None,
            Some(json!({"answers": [
                {"questionId": where_q, "answerText": ["Tacos"]},
                {"questionId": when_q, "answerChoice": [noon]}
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, body) = app
        .send(
            Method::POST,
            &url,
            None,
            Some(json!({"answers": [
                {"questionId": where_q, "answerChoice": [sushi]},
                {"questionId": when_q, "answerText": ["Evening"]}
            ]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["answers"], 2);
}

#[tokio::test]
async fn status_names_are_case_sensitive() {
    let app = TestApp::new().await;
    let id = create_poll(&app, None).await["id"].as_i64().unwrap();
    let (status, body) = set_status(&app, id, "published").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert!(body["error"]["message"].as_str().unwrap().contains("status must be one of"));
}
