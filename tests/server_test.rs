//! HTTP routes driven through the router without a socket

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;
use xai_study::session::SessionId;
use xai_study::{server, Study, StudyConfig};

fn study() -> (TempDir, Arc<Study>) {
    let dir = TempDir::new().unwrap();
    let train = dir.path().join("train");
    for class in ["Gadwall", "Mallard"] {
        fs::create_dir_all(train.join(class)).unwrap();
        fs::write(train.join(class).join(format!("{class}.jpg")), b"\xFF\xD8\xFFjpeg").unwrap();
    }
    let config = StudyConfig::default()
        .with_image_root(&train)
        .with_test_image_root(dir.path().join("test"))
        .with_table_path(dir.path().join("user_guesses.csv"))
        .with_class_labels(["Gadwall", "Mallard"]);
    let study = Study::builder().config(config).build().unwrap();
    (dir, Arc::new(study))
}

fn app() -> (TempDir, Router) {
    let (dir, study) = study();
    (dir, server::router(study))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (_dir, app) = app();
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (_dir, app) = app();

    let (status, view) = send_json(&app, "POST", "/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(view["phase"]["state"], "welcome");
    let id = view["session_id"].as_str().unwrap().to_string();

    let submit = format!("/v1/sessions/{id}/submit");
    let (status, view) = send_json(&app, "POST", &submit, Some(json!({"action": "name", "value": "Alice"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"]["state"], "guessing");
    assert_eq!(view["trial_header"], "Trial 1/2");

    let (_, view) = send_json(&app, "POST", &submit, Some(json!({"action": "guess", "value": ""}))).await;
    assert_eq!(view["phase"]["index"], 0);

    for _ in 0..2 {
        send_json(&app, "POST", &submit, Some(json!({"action": "guess", "value": "Gadwall"}))).await;
    }
    let (_, view) = send_json(&app, "GET", &format!("/v1/sessions/{id}"), None).await;
    assert_eq!(view["phase"]["state"], "completed");

    let (_, view) = send_json(&app, "POST", &submit, Some(json!({"action": "teaching", "value": "control"}))).await;
    assert_eq!(view["phase"]["state"], "teaching_selected");
    assert_eq!(view["phase"]["teaching"], "control");
    assert_eq!(view["show_proceed"], true);

    // Empty test pool: straight to the end.
    let (_, view) = send_json(&app, "POST", &submit, Some(json!({"action": "proceed"}))).await;
    assert_eq!(view["phase"]["state"], "testing_completed");
}

#[tokio::test]
async fn test_current_image_bytes() {
    let (_dir, app) = app();
    let (_, view) = send_json(&app, "POST", "/v1/sessions", None).await;
    let id = view["session_id"].as_str().unwrap().to_string();

    let image = format!("/v1/sessions/{id}/image");
    let request = Request::builder().uri(image.as_str()).body(Body::empty()).unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send_json(
        &app,
        "POST",
        &format!("/v1/sessions/{id}/submit"),
        Some(json!({"action": "name", "value": "Bob"})),
    )
    .await;

    let request = Request::builder().uri(image.as_str()).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(body.starts_with(b"\xFF\xD8\xFF"));
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let (_dir, app) = app();
    let id = Uuid::new_v4();

    let (status, _) = send_json(&app, "GET", &format!("/v1/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/v1/sessions/{id}/submit"),
        Some(json!({"action": "guess", "value": "Gadwall"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .uri(format!("/v1/sessions/{id}/image"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_session_id_rejected() {
    let (_dir, app) = app();
    let (status, _) = send_json(&app, "GET", "/v1/sessions/not-a-uuid", None).await;
    assert!(status.is_client_error());
}

#[tokio::test(flavor = "current_thread")]
async fn test_reads_wait_off_the_runtime_while_session_is_locked() {
    let (_dir, study) = study();
    let app = server::router(Arc::clone(&study));
    let id: SessionId = study.start_session().session_id.parse().unwrap();

    // Hold the session's slot the way a submit does while rewriting the table.
    let (locked_tx, locked_rx) = mpsc::channel();
    let holder = {
        let study = Arc::clone(&study);
        thread::spawn(move || {
            study.sessions().update(&id, |_| {
                locked_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(300));
                Ok(())
            })
        })
    };
    locked_rx.recv().unwrap();

    let ticked = Arc::new(AtomicBool::new(false));
    let ticker = {
        let ticked = Arc::clone(&ticked);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            ticked.store(true, Ordering::SeqCst);
        })
    };

    let (status, view) = send_json(&app, "GET", &format!("/v1/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"]["state"], "welcome");
    assert!(ticked.load(Ordering::SeqCst), "runtime stalled while the session was locked");

    let request = Request::builder()
        .uri(format!("/v1/sessions/{id}/image"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    holder.join().unwrap().unwrap();
    ticker.await.unwrap();
}
