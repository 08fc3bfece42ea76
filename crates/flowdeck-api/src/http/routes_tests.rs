use super::*;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use flowdeck_config::{BroadcastScope, Config};
use flowdeck_engine::{
    EventBroadcaster, FixedDurations, MemoryWorkflowStore, SchedulerTiming, TemplateRegistry,
    WorkflowEngine,
};

fn create_test_state() -> Arc<AppState> {
    let engine = WorkflowEngine::from_config(&Config::default()).unwrap();
    Arc::new(AppState::new(Arc::new(engine)))
}

/// Engine whose standard run finishes in 1s + 4 x (1s + 1s).
fn create_fast_state() -> Arc<AppState> {
    let engine = WorkflowEngine::new(
        TemplateRegistry::builtin(),
        Arc::new(MemoryWorkflowStore::new()),
        Arc::new(EventBroadcaster::new(BroadcastScope::Global, 16)),
        Arc::new(FixedDurations::new(Duration::from_secs(1), 30)),
        SchedulerTiming {
            initial_delay: Duration::from_secs(1),
            inter_step_delay: Duration::from_secs(1),
            mean_step: Duration::from_secs(1),
        },
    );
    Arc::new(AppState::new(Arc::new(engine)))
}

async fn send(app: &Router, method: &str, uri: &str, payload: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match payload {
        Some(payload) => builder
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn execute(app: &Router, template: &str, name: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/workflows/execute",
        Some(json!({ "workflow_name": template, "request": { "name": name } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    json["workflow_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_execute_then_get_shows_first_step() {
    let app = create_router(create_test_state());
    let (status, json) = send(
        &app,
        "POST",
        "/api/workflows/execute",
        Some(json!({
            "workflow_name": "standard_process",
            "request": { "name": "Demo", "description": "smoke test", "priority": "high" }
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Workflow started successfully");
    let id = json["workflow_id"].as_str().unwrap();
    assert!(id.starts_with("wf_"));
    assert_eq!(id.len(), 11);
    assert!(id[3..].chars().all(|c| c.is_ascii_alphanumeric()));

    let (status, json) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["workflow"]["status"], "running");
    assert_eq!(json["workflow"]["currentStep"], "Planning");
    assert_eq!(json["workflow"]["name"], "Demo");
    assert_eq!(json["workflow"]["priority"], "high");
    assert_eq!(json["workflow"]["steps"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_execute_missing_fields() {
    let app = create_router(create_test_state());

    for payload in [
        json!({ "request": { "name": "Demo" } }),
        json!({ "workflow_name": "standard_process" }),
        json!({ "workflow_name": "", "request": {} }),
    ] {
        let (status, json) = send(&app, "POST", "/api/workflows/execute", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Missing required fields");
    }
}

#[tokio::test]
async fn test_execute_malformed_body() {
    let app = create_router(create_test_state());
    let request = Request::builder()
        .method("POST")
        .uri("/api/workflows/execute")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_execute_unknown_template() {
    let app = create_router(create_test_state());
    let (status, json) = send(
        &app,
        "POST",
        "/api/workflows/execute",
        Some(json!({ "workflow_name": "nonexistent", "request": { "name": "x" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid workflow template");

    let (_, json) = send(&app, "GET", "/api/workflows/active", None).await;
    assert!(json["workflows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_workflow_is_404() {
    let app = create_router(create_test_state());
    for (method, uri) in [
        ("GET", "/api/workflows/wf_00000000"),
        ("POST", "/api/workflows/wf_00000000/pause"),
        ("POST", "/api/workflows/wf_00000000/stop"),
        ("POST", "/api/workflows/wf_00000000/resume"),
    ] {
        let (status, json) = send(&app, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Workflow not found");
    }
}

#[tokio::test]
async fn test_active_lists_summaries() {
    let app = create_router(create_test_state());
    let id = execute(&app, "content_creation", "Blog post").await;

    let (status, json) = send(&app, "GET", "/api/workflows/active", None).await;
    assert_eq!(status, StatusCode::OK);
    let workflows = json["workflows"].as_array().unwrap();
    assert_eq!(workflows.len(), 1);
    assert_eq!(workflows[0]["id"], id.as_str());
    assert_eq!(workflows[0]["currentStep"], "Research");
    assert!(workflows[0].get("startedAt").is_some());
    assert!(workflows[0].get("eta").is_some());
    assert!(workflows[0].get("steps").is_none());
}

#[tokio::test]
async fn test_stop_archives_and_second_stop_is_404() {
    let app = create_router(create_test_state());
    let id = execute(&app, "standard_process", "Demo").await;

    let (status, json) = send(&app, "POST", &format!("/api/workflows/{}/stop", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Workflow stopped");

    let (_, json) = send(&app, "GET", "/api/workflows/active", None).await;
    assert!(json["workflows"].as_array().unwrap().is_empty());

    let (_, json) = send(&app, "GET", "/api/workflows/history", None).await;
    let history = json["workflows"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["status"], "stopped");
    assert!(history[0]["completedAt"].is_string());

    let (status, _) = send(&app, "POST", &format!("/api/workflows/{}/stop", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Archived workflows stay readable.
    let (status, json) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["workflow"]["status"], "stopped");
}

#[tokio::test]
async fn test_pause_and_resume() {
    let app = create_router(create_test_state());
    let id = execute(&app, "standard_process", "Demo").await;

    let (status, _) = send(&app, "POST", &format!("/api/workflows/{}/resume", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(&app, "POST", &format!("/api/workflows/{}/pause", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Workflow paused");

    let (_, json) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
    assert_eq!(json["workflow"]["status"], "paused");

    let (status, json) = send(&app, "POST", &format!("/api/workflows/{}/resume", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Workflow resumed");

    let (_, json) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
    assert_eq!(json["workflow"]["status"], "running");
}

#[tokio::test(start_paused = true)]
async fn test_history_pagination() {
    let app = create_router(create_fast_state());
    let mut ids = Vec::new();
    for i in 0..3 {
        let id = execute(&app, "standard_process", &format!("run {}", i)).await;
        send(&app, "POST", &format!("/api/workflows/{}/stop", id), None).await;
        ids.push(id);
    }

    let (_, json) = send(&app, "GET", "/api/workflows/history?offset=1&limit=1", None).await;
    let page = json["workflows"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"], ids[1].as_str());

    let (_, json) = send(&app, "GET", "/api/workflows/history?offset=2", None).await;
    let page = json["workflows"].as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"], ids[0].as_str());

    let (status, json) = send(&app, "GET", "/api/workflows/history?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test(start_paused = true)]
async fn test_completed_workflow_moves_to_history() {
    let app = create_router(create_fast_state());
    let id = execute(&app, "standard_process", "Demo").await;

    tokio::time::sleep(Duration::from_secs(15)).await;

    let (_, json) = send(&app, "GET", "/api/workflows/active", None).await;
    assert!(json["workflows"].as_array().unwrap().is_empty());

    let (_, json) = send(&app, "GET", &format!("/api/workflows/{}", id), None).await;
    let workflow = &json["workflow"];
    assert_eq!(workflow["status"], "completed");
    assert_eq!(workflow["progress"], 100);
    assert_eq!(workflow["results"], "Workflow completed successfully");
    assert_eq!(workflow["logs"].as_array().unwrap().len(), 8);
    assert_eq!(workflow["steps"][3]["duration"], "30s");
}

#[tokio::test]
async fn test_templates_endpoint() {
    let app = create_router(create_test_state());
    let (status, json) = send(&app, "GET", "/api/templates", None).await;
    assert_eq!(status, StatusCode::OK);
    let templates = json["templates"].as_array().unwrap();
    assert_eq!(templates.len(), 4);
    assert_eq!(templates[0]["name"], "content_creation");
    assert_eq!(templates[3]["name"], "standard_process");
    assert_eq!(templates[3]["displayName"], "Standard Multi-Agent Process");
}

#[tokio::test]
async fn test_health_and_livez() {
    let app = create_router(create_test_state());

    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["active_workflows"], 0);

    let response = app
        .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requests_are_counted() {
    let state = create_test_state();
    let app = create_router(state.clone());
    send(&app, "GET", "/livez", None).await;
    send(&app, "GET", "/api/workflows/active", None).await;
    assert_eq!(state.request_count(), 2);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let app = create_router(create_test_state());
    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/workflows/execute")
                .header("origin", "http://dashboard.example")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = create_router(create_test_state());
    let (status, _) = send(&app, "GET", "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
