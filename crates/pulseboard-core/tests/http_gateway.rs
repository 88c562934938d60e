//! HttpGateway against a local mock worker.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

use pulseboard_core::gateway::{NewTask, StatusExtras};
use pulseboard_core::models::{AssistantProfile, NewAccessEntry, TaskStatus};
use pulseboard_core::{Gateway, GatewayError, HttpGateway};

const KEY: &str = "secret-key";

#[derive(Default)]
struct Worker {
    tasks: Mutex<Vec<Value>>,
    content: Mutex<Option<String>>,
}

type Shared = Arc<Worker>;

fn authorized(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", KEY);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response()),
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn list_tasks(State(worker): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(Value::Array(worker.tasks.lock().clone())).into_response()
}

async fn create_task(
    State(worker): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let description = body["description"].as_str().unwrap_or("No description provided");
    let task = json!({
        "id": format!("task-{}", worker.tasks.lock().len() + 1),
        "title": body["title"].as_str().unwrap_or(description),
        "description": description,
        "status": "pending",
        "repetition": body["repetition"],
        "createdAt": "2026-03-15T12:00:00.000Z",
        "startedAt": null,
        "completedAt": null,
        "links": [],
        "notes": ""
    });
    worker.tasks.lock().insert(0, task.clone());
    (StatusCode::CREATED, Json(task)).into_response()
}

async fn update_status(
    State(worker): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut tasks = worker.tasks.lock();
    let Some(task) = tasks.iter_mut().find(|t| t["id"] == id) else {
        return error(StatusCode::NOT_FOUND, "Task not found");
    };
    match body["status"].as_str() {
        Some(status @ ("pending" | "in_progress" | "completed")) => {
            task["status"] = json!(status);
            if status == "in_progress" {
                task["startedAt"] = json!("2026-03-15T12:05:00.000Z");
            }
            if let Some(notes) = body["notes"].as_str() {
                task["notes"] = json!(notes);
            }
            Json(task.clone()).into_response()
        }
        _ => error(
            StatusCode::BAD_REQUEST,
            "Status must be one of: pending, in_progress, completed",
        ),
    }
}

async fn delete_task(
    State(worker): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let mut tasks = worker.tasks.lock();
    let before = tasks.len();
    tasks.retain(|t| t["id"] != id);
    if tasks.len() == before {
        return error(StatusCode::NOT_FOUND, "Task not found");
    }
    Json(json!({ "success": true })).into_response()
}

async fn heartbeat(headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({
        "novaStatus": "working",
        "activeThreads": 3,
        "activeTasks": [{ "title": "triage inbox", "startedAt": "2026-03-15T11:00:00Z", "eta": "10m" }],
        "recentlyCompleted": [],
        "lastHeartbeat": 1773576000000_i64,
        "mood": "focused"
    }))
    .into_response()
}

async fn get_content(State(worker): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let content = worker.content.lock().clone();
    Json(json!({ "content": content })).into_response()
}

async fn set_content(
    State(worker): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    let content = body["content"].as_str().unwrap_or_default().to_string();
    *worker.content.lock() = Some(content.clone());
    Json(json!({ "success": true, "content": content })).into_response()
}

async fn save_profile(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    Json(json!({ "success": true, "profile": body })).into_response()
}

async fn create_access(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = authorized(&headers) {
        return denied;
    }
    if body.get("name").and_then(Value::as_str).is_none() {
        return error(StatusCode::BAD_REQUEST, "Name is required");
    }
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn spawn_worker() -> (String, Shared) {
    let worker = Shared::default();
    let app = Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/:id", axum::routing::delete(delete_task))
        .route("/api/tasks/:id/status", put(update_status))
        .route("/api/heartbeat", get(heartbeat))
        .route("/api/heartbeat/content", get(get_content).post(set_content))
        .route("/api/assistant/profile", post(save_profile))
        .route("/api/access", post(create_access))
        .with_state(worker.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/", addr), worker)
}

#[tokio::test]
async fn test_task_lifecycle_over_http() {
    let (url, worker) = spawn_worker().await;
    let gateway = HttpGateway::new(Some(url), Some(KEY.to_string()));

    assert!(gateway.list_tasks().await.unwrap().is_empty());

    let created = gateway
        .create_task(NewTask {
            title: None,
            description: Some("write report".to_string()),
            repetition: None,
        })
        .await
        .unwrap();
    assert_eq!(created.title, "write report");
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(
        created.created_at,
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    );

    let started = gateway
        .update_task_status(
            &created.id,
            TaskStatus::InProgress,
            StatusExtras {
                notes: Some("on it".to_string()),
                links: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);
    assert!(started.started_at.is_some());
    assert_eq!(started.notes.as_deref(), Some("on it"));
    assert_eq!(worker.tasks.lock()[0]["status"], "in_progress");

    gateway.delete_task(&created.id).await.unwrap();
    assert!(gateway.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_error_statuses_are_classified() {
    let (url, _) = spawn_worker().await;

    let anonymous = HttpGateway::new(Some(url.clone()), None);
    assert!(matches!(
        anonymous.list_tasks().await,
        Err(GatewayError::Unauthorized)
    ));

    let gateway = HttpGateway::new(Some(url), Some(KEY.to_string()));
    match gateway.delete_task("missing").await {
        Err(GatewayError::NotFound(message)) => assert_eq!(message, "Task not found"),
        other => panic!("expected not found, got {:?}", other),
    }

    let err = gateway
        .create_access(NewAccessEntry::default())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Name is required");
}

#[tokio::test]
async fn test_heartbeat_documents() {
    let (url, _) = spawn_worker().await;
    let gateway = HttpGateway::new(Some(url), Some(KEY.to_string()));

    let heartbeat = gateway.get_heartbeat().await.unwrap();
    assert_eq!(heartbeat.assistant_status, "working");
    assert_eq!(heartbeat.active_threads, 3);
    assert_eq!(heartbeat.active_tasks.len(), 1);
    assert_eq!(heartbeat.interval, 60);
    assert_eq!(
        heartbeat.last_heartbeat,
        Utc.timestamp_millis_opt(1_773_576_000_000).single()
    );
    assert_eq!(heartbeat.extra.get("mood"), Some(&json!("focused")));

    // Never-pushed content comes back as null
    assert_eq!(gateway.get_heartbeat_content().await.unwrap(), "");
    let saved = gateway.update_heartbeat_content("- check inbox").await.unwrap();
    assert_eq!(saved, "- check inbox");
    assert_eq!(gateway.get_heartbeat_content().await.unwrap(), "- check inbox");
}

#[tokio::test]
async fn test_profile_envelope_is_unwrapped() {
    let (url, _) = spawn_worker().await;
    let gateway = HttpGateway::new(Some(url), Some(KEY.to_string()));
    let profile = AssistantProfile {
        name: "Atlas".to_string(),
        ..Default::default()
    };
    let saved = gateway.update_assistant_profile(&profile).await.unwrap();
    assert_eq!(saved, profile);
}
