use std::{num::NonZeroUsize, sync::Arc};

use poem::{Route, http::StatusCode, test::TestClient};
use serde_json::json;

use email_dispatch::{
    application::{
        services::delivery_queue::DeliveryQueue,
        usecases::{
            get_email::GetEmailUseCase, list_emails::ListEmailsUseCase,
            submit_email::SubmitEmailUseCase,
        },
    },
    infrastructure::repositories::in_memory::InMemoryEmailRepository,
    presentation::http::{
        endpoints::root::{ApiState, build_app},
        security::API_KEY_HEADER,
    },
};

const API_KEY: &str = "test-key";

fn app() -> (TestClient<Route>, Arc<DeliveryQueue>) {
    let repo = Arc::new(InMemoryEmailRepository::new());
    let queue = Arc::new(DeliveryQueue::new(NonZeroUsize::new(8).unwrap()));
    let state = Arc::new(ApiState {
        submit_email_usecase: Arc::new(SubmitEmailUseCase::new(repo.clone(), queue.clone())),
        get_email_usecase: Arc::new(GetEmailUseCase::new(repo.clone())),
        list_emails_usecase: Arc::new(ListEmailsUseCase::new(repo)),
        api_key: API_KEY.to_string(),
    });
    (
        TestClient::new(build_app(state, "http://localhost:8080")),
        queue,
    )
}

fn send_body(subject: &str) -> serde_json::Value {
    json!({
        "to": "alice@example.com; bob@example.com",
        "subject": subject,
        "body": "<p>Hello</p>",
    })
}

#[tokio::test]
async fn health_needs_no_key() {
    let (cli, _) = app();
    let resp = cli.get("/api/health").send().await;
    resp.assert_status_is_ok();
    resp.assert_text("OK").await;
}

#[tokio::test]
async fn rejects_missing_and_wrong_keys() {
    let (cli, queue) = app();

    let resp = cli
        .post("/api/email/send")
        .body_json(&send_body("Hi"))
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    let resp = cli
        .post("/api/email/send")
        .header(API_KEY_HEADER, "wrong")
        .body_json(&send_body("Hi"))
        .send()
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    let resp = cli.get("/api/email").header(API_KEY_HEADER, "wrong").send().await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    assert!(queue.is_empty());
}

#[tokio::test]
async fn send_queues_email_and_exposes_its_status() {
    let (cli, queue) = app();

    let resp = cli
        .post("/api/email/send")
        .header(API_KEY_HEADER, API_KEY)
        .body_json(&send_body("Hi"))
        .send()
        .await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let body = json.value().object();
    body.get("message").assert_string("Email queued successfully");
    body.get("status").assert_string("Pending");
    let id = body.get("id").string().to_string();
    assert_eq!(queue.len(), 1);

    let resp = cli
        .get(format!("/api/email/{id}"))
        .header(API_KEY_HEADER, API_KEY)
        .send()
        .await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let email = json.value().object();
    email.get("id").assert_string(&id);
    email.get("subject").assert_string("Hi");
    email.get("to").assert_string("alice@example.com; bob@example.com");
    email.get("is_html").assert_bool(true);
    email.get("status").assert_string("Pending");
    email.get("retry_count").assert_i64(0);

    let resp = cli
        .get("/api/email/pending")
        .header(API_KEY_HEADER, API_KEY)
        .send()
        .await;
    resp.assert_status_is_ok();
    let json = resp.json().await;
    let pending = json.value().array();
    pending.assert_len(1);
    pending.get(0).object().get("id").assert_string(&id);
}

#[tokio::test]
async fn blank_subject_is_a_bad_request() {
    let (cli, queue) = app();

    let resp = cli
        .post("/api/email/send")
        .header(API_KEY_HEADER, API_KEY)
        .body_json(&send_body("   "))
        .send()
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    resp.assert_text("Subject is required").await;

    let resp = cli.get("/api/email").header(API_KEY_HEADER, API_KEY).send().await;
    resp.assert_status_is_ok();
    resp.json().await.value().array().assert_len(0);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn unknown_email_is_not_found() {
    let (cli, _) = app();

    let resp = cli
        .get(format!("/api/email/{}", uuid::Uuid::new_v4()))
        .header(API_KEY_HEADER, API_KEY)
        .send()
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
    resp.assert_text("Email not found").await;
}
