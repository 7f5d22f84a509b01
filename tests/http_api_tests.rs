#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use study_planner::{Planner, StudyTask, http_api};
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let state = http_api::AppState::new(Planner::new());
    http_api::router(state)
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap()
}

fn put_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn topic_payload(title: &str, hours: f64) -> Value {
    json!({
        "title": title,
        "difficulty": "MEDIUM",
        "estimated_hours": hours,
        "created_date": "2025-01-01",
        "kind": { "type": "topic", "subject": "Math" }
    })
}

#[tokio::test]
async fn task_lifecycle_via_http_api() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(post_json("/tasks", topic_payload("Calculus", 4.0)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.clone().oneshot(get("/tasks/1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let fetched: StudyTask = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(fetched.id, 1);
    assert_eq!(fetched.title, "Calculus");

    let response = app
        .clone()
        .oneshot(put_json("/tasks/1/status", json!({ "status": "DONE" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/analytics/progress")).await.unwrap();
    let report = json_body(response).await;
    assert_eq!(report["totalTasks"], 1);
    assert_eq!(report["completedTasks"], 1);
    assert_eq!(report["difficultyBreakdown"]["MEDIUM"], 1);
}

#[tokio::test]
async fn invalid_task_is_rejected() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(post_json("/tasks", topic_payload("Calculus", -1.0)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "invalid_request");

    let response = app.oneshot(get("/tasks")).await.unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn missing_task_is_not_found() {
    let app = new_router();
    let response = app.oneshot(get("/tasks/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cyclic_dependency_is_a_conflict() {
    let app = new_router();
    for title in ["A", "B"] {
        app.clone()
            .oneshot(post_json("/tasks", topic_payload(title, 1.0)))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(post_json("/tasks/2/dependencies", json!({ "prerequisite": 1 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json("/tasks/1/dependencies", json!({ "prerequisite": 2 })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn overlapping_sessions_show_up_as_conflicts() {
    let app = new_router();
    app.clone()
        .oneshot(post_json("/tasks", topic_payload("Calculus", 4.0)))
        .await
        .unwrap();
    for (start, end) in [
        ("2025-01-05T09:00:00", "2025-01-05T11:00:00"),
        ("2025-01-05T10:00:00", "2025-01-05T12:00:00"),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/sessions",
                json!({ "task_id": 1, "start": start, "end": end, "location": "Library" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.oneshot(get("/conflicts")).await.unwrap();
    let conflicts = json_body(response).await;
    assert_eq!(conflicts.as_array().unwrap().len(), 1);
    assert_eq!(conflicts[0]["id"], "session:1:2");
    assert_eq!(conflicts[0]["kind"], "session_overlap");
    assert_eq!(
        conflicts[0]["message"],
        "Time conflict between sessions 1 and 2"
    );
}

#[tokio::test]
async fn revision_completion_and_due_list() {
    let app = new_router();
    app.clone()
        .oneshot(post_json("/tasks", topic_payload("Calculus", 4.0)))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/revisions/due?date=2025-01-02"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(post_json("/tasks/1/revision?date=2025-01-02", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plan = json_body(response).await;
    assert_eq!(plan["next_due"], "2025-01-03");
    assert_eq!(plan["stage"], 2);

    let response = app
        .oneshot(get("/revisions/due?date=2025-01-02"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn export_and_algorithm_settings() {
    let app = new_router();
    app.clone()
        .oneshot(post_json("/tasks", topic_payload("Calculus", 4.0)))
        .await
        .unwrap();

    let response = app.clone().oneshot(get("/export/csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/csv");
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("id,title,"));

    let response = app.clone().oneshot(get("/export/xml")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(put_json("/settings/algorithm", json!({ "algorithm": "supermemo" })))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["algorithm"], "supermemo");
}
