use crate::{build_router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use zoozy_core::mail::{MailError, Mailer, PasswordResetMail};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<PasswordResetMail>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<PasswordResetMail> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, mail: PasswordResetMail) -> Result<(), MailError> {
        self.sent.lock().expect("mailer lock").push(mail);
        Ok(())
    }
}

async fn test_state() -> (AppState, Arc<RecordingMailer>) {
    let pool = zoozy_core::db::connect_in_memory()
        .await
        .expect("connect database");
    zoozy_core::migrations::run(&pool)
        .await
        .expect("run migrations");
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(
        pool,
        mailer.clone(),
        "https://app.zoozy.test/",
        CancellationToken::new(),
    );
    (state, mailer)
}

async fn send_raw(
    state: &AppState,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost:8080");
    let body = match body {
        Some(body) => {
            builder = builder.header("content-type", "application/json");
            Body::from(body)
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request");
    let response = build_router(state.clone())
        .oneshot(request)
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    if bytes.is_empty() {
        return (status, Value::Null);
    }
    let payload: Value = serde_json::from_slice(&bytes).expect("json body");
    (status, payload)
}

async fn post_json(state: &AppState, uri: &str, payload: Value) -> (StatusCode, Value) {
    send_raw(state, Method::POST, uri, Some(payload.to_string())).await
}

async fn put_json(state: &AppState, uri: &str, payload: Value) -> (StatusCode, Value) {
    send_raw(state, Method::PUT, uri, Some(payload.to_string())).await
}

async fn get_json(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send_raw(state, Method::GET, uri, None).await
}

async fn delete(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send_raw(state, Method::DELETE, uri, None).await
}

async fn register_user(state: &AppState, email: &str, name: &str) -> i64 {
    let (status, payload) = post_json(
        state,
        "/api/auth/register",
        json!({ "email": email, "password": "secret-pass", "displayName": name }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register {email}: {payload}");
    payload
        .pointer("/user/id")
        .and_then(Value::as_i64)
        .expect("user id")
}

async fn notifications_for(state: &AppState, user_id: i64) -> Vec<Value> {
    let (status, payload) = get_json(state, &format!("/api/notifications?userId={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    payload.as_array().cloned().expect("notification array")
}

async fn post_job(state: &AppState, user_id: i64) -> i64 {
    let (status, payload) = post_json(
        state,
        "/api/userrequests",
        json!({
            "userId": user_id,
            "petName": "Milo",
            "serviceName": "Dog walking",
            "startDate": "2025-06-01",
            "endDate": "2025-06-03",
            "location": "Kadikoy"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{payload}");
    payload.get("id").and_then(Value::as_i64).expect("job id")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (state, _) = test_state().await;
    let (status, payload) = get_json(&state, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!({ "status": "ok" }));
}

#[tokio::test]
async fn openapi_contract_contains_api_paths() {
    let (state, _) = test_state().await;
    let (status, payload) = get_json(&state, "/api/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.get("openapi").and_then(Value::as_str), Some("3.0.3"));
    assert_eq!(
        payload.pointer("/servers/0/url").and_then(Value::as_str),
        Some("http://localhost:8080")
    );
    assert!(payload.pointer("/paths/~1api~1firebase~1sync/post").is_some());
    assert!(payload.pointer("/paths/~1api~1auth~1login/post").is_some());
    assert!(payload
        .pointer("/paths/~1api~1userfavorites~1by-identifier/delete")
        .is_some());
    assert!(payload.pointer("/components/schemas/SyncReport").is_some());
}

#[tokio::test]
async fn register_rejects_duplicate_email_ignoring_case() {
    let (state, _) = test_state().await;
    register_user(&state, "Ann@Example.com", "Ann").await;

    let (status, payload) = post_json(
        &state,
        "/api/auth/register",
        json!({ "email": "ann@example.com", "password": "other-pass", "displayName": "Ann 2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload.get("code").and_then(Value::as_str), Some("EMAIL_TAKEN"));

    let (status, _) = post_json(
        &state,
        "/api/auth/register",
        json!({ "email": "bob@example.com", "password": "", "displayName": "Bob" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_checks_password_and_provider() {
    let (state, _) = test_state().await;
    register_user(&state, "ann@example.com", "Ann").await;

    let (status, payload) = post_json(
        &state,
        "/api/auth/login",
        json!({ "email": "ANN@example.com", "password": "secret-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.get("success"), Some(&json!(true)));
    assert_eq!(
        payload.pointer("/user/email").and_then(Value::as_str),
        Some("ann@example.com")
    );
    assert!(payload.pointer("/user/passwordHash").is_none());

    let (status, payload) = post_json(
        &state,
        "/api/auth/login",
        json!({ "email": "ann@example.com", "password": "wrong-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload.get("code").and_then(Value::as_str), Some("AUTH_FAILED"));

    let (status, payload) = post_json(
        &state,
        "/api/auth/google-login",
        json!({ "firebaseUid": "uid-carl", "email": "carl@example.com", "displayName": "Carl" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload.pointer("/user/provider").and_then(Value::as_str),
        Some("google")
    );

    let (status, payload) = post_json(
        &state,
        "/api/auth/login",
        json!({ "email": "carl@example.com", "password": "anything" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        payload.get("code").and_then(Value::as_str),
        Some("PROVIDER_MISMATCH")
    );
}

#[tokio::test]
async fn google_login_links_existing_email_account() {
    let (state, _) = test_state().await;
    let user_id = register_user(&state, "ann@example.com", "Ann").await;

    let (status, payload) = post_json(
        &state,
        "/api/auth/google-login",
        json!({ "firebaseUid": "uid-ann", "email": "ann@example.com", "displayName": "Ann G" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.pointer("/user/id").and_then(Value::as_i64), Some(user_id));
    assert_eq!(
        payload.pointer("/user/firebaseUid").and_then(Value::as_str),
        Some("uid-ann")
    );

    let (status, payload) = get_json(&state, "/api/users/exists/uid-ann").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload, json!({ "exists": true }));
}

#[tokio::test]
async fn password_reset_lifecycle() {
    let (state, mailer) = test_state().await;
    register_user(&state, "ann@example.com", "Ann").await;

    let (status, unknown) = post_json(
        &state,
        "/api/auth/reset-password",
        json!({ "email": "nobody@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(mailer.sent().is_empty());

    let (status, known) = post_json(
        &state,
        "/api/auth/reset-password",
        json!({ "email": "ann@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unknown, known);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "ann@example.com");
    let (base, reset_token) = sent[0]
        .reset_url
        .split_once("?token=")
        .expect("token in reset url");
    assert_eq!(base, "https://app.zoozy.test/reset-password");
    assert_eq!(reset_token.len(), 32);

    let (status, _) = post_json(
        &state,
        "/api/auth/confirm-reset-password",
        json!({ "token": reset_token, "newPassword": "short" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &state,
        "/api/auth/confirm-reset-password",
        json!({ "token": reset_token, "newPassword": "brand-new-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &state,
        "/api/auth/login",
        json!({ "email": "ann@example.com", "password": "brand-new-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, payload) = post_json(
        &state,
        "/api/auth/confirm-reset-password",
        json!({ "token": reset_token, "newPassword": "another-pass" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload.get("code").and_then(Value::as_str), Some("INVALID_TOKEN"));
}

#[tokio::test]
async fn profile_update_accepts_only_inline_images() {
    let (state, _) = test_state().await;
    let user_id = register_user(&state, "ann@example.com", "Ann").await;
    let inline = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUg";

    let (status, payload) = put_json(
        &state,
        &format!("/api/users/{user_id}"),
        json!({ "displayName": "Annie", "photoUrl": inline }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.get("displayName").and_then(Value::as_str), Some("Annie"));
    assert_eq!(payload.get("photoUrl").and_then(Value::as_str), Some(inline));

    let (status, payload) = put_json(
        &state,
        &format!("/api/users/{user_id}"),
        json!({ "photoUrl": "https://cdn.example.com/a.png" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload.get("photoUrl"), Some(&Value::Null));

    let (status, _) = put_json(&state, "/api/users/not-a-number", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sync_rejects_missing_or_malformed_payload_without_writing() {
    let (state, _) = test_state().await;

    for body in ["null", "", "{\"pets\": ["] {
        let (status, payload) =
            send_raw(&state, Method::POST, "/api/firebase/sync", Some(body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(
            payload.get("code").and_then(Value::as_str),
            Some("INVALID_REQUEST")
        );
    }

    let (status, _) = post_json(
        &state,
        "/api/firebase/sync",
        json!({ "pets": [{ "externalId": " ", "name": "Rex", "species": "dog", "ownerName": "Ann" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_logs")
        .fetch_one(&state.pool)
        .await
        .expect("count sync logs");
    assert_eq!(logs, 0);
}

#[tokio::test]
async fn sync_reports_counters_and_converges() {
    let (state, _) = test_state().await;
    let batch = json!({
        "payloadSource": "mobile",
        "pets": [{ "externalId": "pet-1", "name": "Rex", "species": "dog", "ownerName": "Ann" }],
        "providers": [{ "externalId": "prov-1", "name": "Happy Paws", "serviceType": "walking", "location": "Oslo", "rating": 4.5 }],
        "requests": [{
            "externalId": "req-1",
            "petFirebaseId": "pet-1",
            "providerFirebaseId": "prov-2",
            "serviceType": "boarding",
            "preferredDate": "2025-05-01T10:00:00"
        }]
    });

    let (status, report) = post_json(&state, "/api/firebase/sync", batch.clone()).await;
    assert_eq!(status, StatusCode::OK, "{report}");
    assert_eq!(report.get("petsCreated"), Some(&json!(1)));
    assert_eq!(report.get("providersCreated"), Some(&json!(2)));
    assert_eq!(report.get("requestsCreated"), Some(&json!(1)));
    assert_eq!(report.get("totalChanges"), Some(&json!(4)));

    let (status, report) = post_json(&state, "/api/firebase/sync", batch).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report.get("petsCreated"), Some(&json!(0)));
    assert_eq!(report.get("providersCreated"), Some(&json!(0)));
    assert_eq!(report.get("requestsCreated"), Some(&json!(0)));
    assert_eq!(report.get("petsUpdated"), Some(&json!(1)));
    assert_eq!(report.get("providersUpdated"), Some(&json!(1)));
    assert_eq!(report.get("requestsUpdated"), Some(&json!(1)));

    let (status, providers) = get_json(&state, "/api/serviceproviders").await;
    assert_eq!(status, StatusCode::OK);
    let providers = providers.as_array().expect("provider array");
    assert_eq!(providers.len(), 2);
    let placeholder = providers
        .iter()
        .find(|provider| provider.get("externalId") == Some(&json!("prov-2")))
        .expect("placeholder provider");
    assert_eq!(placeholder.get("name"), Some(&json!("Unknown")));
    assert_eq!(placeholder.get("serviceType"), Some(&json!("boarding")));

    let (status, logs) = get_json(&state, "/api/firebase/sync-logs?limit=5").await;
    assert_eq!(status, StatusCode::OK);
    let logs = logs.as_array().expect("log array");
    assert_eq!(logs.len(), 2);
    assert!(logs
        .iter()
        .all(|log| log.get("payloadSource") == Some(&json!("mobile"))));
    let mut notes: Vec<&str> = logs
        .iter()
        .filter_map(|log| log.get("notes").and_then(Value::as_str))
        .collect();
    notes.sort_unstable();
    assert_eq!(notes, vec!["Total changes: 3", "Total changes: 4"]);
}

#[tokio::test]
async fn referenced_pet_cannot_be_deleted() {
    let (state, _) = test_state().await;
    let (status, _) = post_json(
        &state,
        "/api/firebase/sync",
        json!({
            "requests": [{
                "externalId": "req-1",
                "petExternalId": "pet-1",
                "providerExternalId": "prov-1",
                "serviceType": "walking",
                "preferredDate": "2025-05-01"
            }]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, requests) = get_json(&state, "/api/servicerequests").await;
    let request = &requests.as_array().expect("request array")[0];
    assert_eq!(
        request.pointer("/petProfile/externalId").and_then(Value::as_str),
        Some("pet-1")
    );
    let pet_id = request
        .get("petProfileId")
        .and_then(Value::as_str)
        .expect("pet id")
        .to_string();
    let request_id = request
        .get("id")
        .and_then(Value::as_str)
        .expect("request id")
        .to_string();

    let (status, payload) = delete(&state, &format!("/api/petprofiles/{pet_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload.get("code").and_then(Value::as_str), Some("REFERENCED"));

    let (status, _) = delete(&state, &format!("/api/servicerequests/{request_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = delete(&state, &format!("/api/petprofiles/{pet_id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get_json(&state, &format!("/api/petprofiles/{pet_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pet_crud_generates_external_id_and_rejects_duplicates() {
    let (state, _) = test_state().await;
    let (status, pet) = post_json(
        &state,
        "/api/petprofiles",
        json!({ "name": "Rex", "species": "dog", "ownerName": "Ann" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let external_id = pet
        .get("externalId")
        .and_then(Value::as_str)
        .expect("external id")
        .to_string();
    assert!(!external_id.is_empty());

    let (status, payload) = post_json(
        &state,
        "/api/petprofiles",
        json!({ "externalId": external_id, "name": "Rex 2", "species": "dog", "ownerName": "Ann" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload.get("code").and_then(Value::as_str), Some("CONFLICT"));

    let (status, _) = get_json(&state, "/api/petprofiles/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn service_request_requires_existing_parents() {
    let (state, _) = test_state().await;
    let (status, payload) = post_json(
        &state,
        "/api/servicerequests",
        json!({
            "petProfileId": uuid::Uuid::new_v4(),
            "serviceProviderId": uuid::Uuid::new_v4(),
            "serviceType": "walking",
            "preferredDate": "2025-05-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        payload.get("message").and_then(Value::as_str),
        Some("invalid pet profile id")
    );
}

#[tokio::test]
async fn job_fan_out_reaches_other_active_users_only() {
    let (state, _) = test_state().await;
    let poster = register_user(&state, "ann@example.com", "Ann").await;
    let active = register_user(&state, "bob@example.com", "Bob").await;
    let inactive = register_user(&state, "cem@example.com", "Cem").await;
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1")
        .bind(inactive)
        .execute(&state.pool)
        .await
        .expect("deactivate user");

    let job_id = post_job(&state, poster).await;

    assert!(notifications_for(&state, poster).await.is_empty());
    assert!(notifications_for(&state, inactive).await.is_empty());
    let received = notifications_for(&state, active).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].get("type"), Some(&json!("job")));
    assert_eq!(received[0].get("relatedJobId"), Some(&json!(job_id)));
    assert_eq!(received[0].get("relatedUsername"), Some(&json!("Ann")));
    assert_eq!(received[0].get("title"), Some(&json!("Ann posted a new job")));

    let (_, job) = get_json(&state, &format!("/api/userrequests/{job_id}")).await;
    assert_eq!(job.get("dayDiff"), Some(&json!(2)));

    let (status, _) = post_json(
        &state,
        "/api/userrequests",
        json!({
            "userId": 9999,
            "petName": "Milo",
            "serviceName": "Dog walking",
            "startDate": "2025-06-01",
            "endDate": "2025-06-03"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn message_notifies_receiver_but_not_self() {
    let (state, _) = test_state().await;
    let ann = register_user(&state, "ann@example.com", "Ann").await;
    let bob = register_user(&state, "bob@example.com", "Bob").await;
    let job_id = post_job(&state, ann).await;

    let (status, message) = post_json(
        &state,
        "/api/messages",
        json!({ "senderId": bob, "receiverId": ann, "jobId": job_id, "messageText": "I can help" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_id = message.get("id").and_then(Value::as_i64).expect("message id");

    let (status, _) = post_json(
        &state,
        "/api/messages",
        json!({ "senderId": ann, "receiverId": ann, "jobId": job_id, "messageText": "note to self" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let received = notifications_for(&state, ann).await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].get("type"), Some(&json!("message")));
    assert_eq!(received[0].get("title"), Some(&json!("Bob sent you a message")));

    let (status, conversation) =
        get_json(&state, &format!("/api/messages?jobId={job_id}&userId={ann}")).await;
    assert_eq!(status, StatusCode::OK);
    let conversation = conversation.as_array().expect("conversation");
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[0].get("id"), Some(&json!(message_id)));
    assert_eq!(conversation[0].get("senderName"), Some(&json!("Bob")));

    let (status, _) = post_json(
        &state,
        "/api/messages",
        json!({ "senderId": bob, "receiverId": ann, "jobId": 9999, "messageText": "hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let notification_id = received[0].get("id").and_then(Value::as_i64).expect("id");
    let (status, _) = put_json(
        &state,
        &format!("/api/notifications/{notification_id}/read"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let received = notifications_for(&state, ann).await;
    assert_eq!(received[0].get("isRead"), Some(&json!(true)));
}

#[tokio::test]
async fn user_service_publishes_job_and_notifies() {
    let (state, _) = test_state().await;
    let ann = register_user(&state, "ann@example.com", "Ann").await;
    let bob = register_user(&state, "bob@example.com", "Bob").await;

    let (status, service) = post_json(
        &state,
        "/api/userservices",
        json!({
            "userId": ann,
            "serviceName": "Dog walking",
            "price": "20",
            "description": "Daily walks",
            "address": "Moda"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{service}");

    let (_, jobs) = get_json(&state, &format!("/api/userrequests?userId={ann}")).await;
    let jobs = jobs.as_array().expect("job array");
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].get("petName"), Some(&json!("Service Request")));
    assert_eq!(jobs[0].get("serviceName"), Some(&json!("Dog walking")));
    assert_eq!(jobs[0].get("dayDiff"), Some(&json!(30)));
    assert_eq!(jobs[0].get("note"), Some(&json!("Daily walks")));
    assert_eq!(jobs[0].get("location"), Some(&json!("Moda")));

    assert_eq!(notifications_for(&state, bob).await.len(), 1);

    let (_, others) = get_json(&state, &format!("/api/userservices/others?excludeUserId={bob}")).await;
    let others = others.as_array().expect("service array");
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].get("displayName"), Some(&json!("Ann")));
    assert_eq!(others[0].get("serviceName"), Some(&json!("Dog walking")));

    let (_, own) = get_json(&state, &format!("/api/userservices/others?excludeUserId={ann}")).await;
    assert_eq!(own, json!([]));
}

#[tokio::test]
async fn favorites_are_unique_per_card() {
    let (state, _) = test_state().await;
    let ann = register_user(&state, "ann@example.com", "Ann").await;
    let bob = register_user(&state, "bob@example.com", "Bob").await;
    let card = json!({ "title": "Happy Paws", "tip": "provider", "imageUrl": "https://img/1.png" });

    for user_id in [ann, bob] {
        let mut payload = card.clone();
        payload["userId"] = json!(user_id);
        let (status, _) = post_json(&state, "/api/userfavorites", payload).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let mut duplicate = card.clone();
    duplicate["userId"] = json!(ann);
    let (status, _) = post_json(&state, "/api/userfavorites", duplicate).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let query = "title=Happy%20Paws&tip=provider&imageUrl=https%3A%2F%2Fimg%2F1.png";
    let (_, count) = get_json(&state, &format!("/api/userfavorites/count?{query}")).await;
    assert_eq!(count, json!({ "count": 2 }));

    let (_, users) = get_json(&state, &format!("/api/userfavorites/users?{query}")).await;
    assert_eq!(users.as_array().map(Vec::len), Some(2));
    assert_eq!(users[0].get("displayName"), Some(&json!("Ann")));

    let uri = format!("/api/userfavorites/by-identifier?userId={ann}&{query}");
    let (status, _) = delete(&state, &uri).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = delete(&state, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, favorites) = get_json(&state, "/api/userfavorites?tip=provider").await;
    assert_eq!(favorites.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn comments_validate_rating_and_clear_by_card() {
    let (state, _) = test_state().await;
    let ann = register_user(&state, "ann@example.com", "Ann").await;

    let (status, _) = post_json(
        &state,
        "/api/usercomments",
        json!({ "userId": ann, "cardId": "card-1", "message": "Great", "rating": 7 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, comment) = post_json(
        &state,
        "/api/usercomments",
        json!({ "userId": ann, "cardId": "card-1", "message": "Great" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment.get("rating"), Some(&json!(5)));
    assert_eq!(comment.get("authorName"), Some(&json!("Ann")));

    let (_, comments) = get_json(&state, "/api/usercomments?cardId=card-1").await;
    assert_eq!(comments.as_array().map(Vec::len), Some(1));

    let (status, _) = delete(&state, "/api/usercomments/by-card?cardId=card-1").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = delete(&state, "/api/usercomments/by-card?cardId=card-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
