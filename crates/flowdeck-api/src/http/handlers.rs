//! Workflow HTTP handlers.
//!
//! - GET  /api/workflows/active       - Active workflow summaries
//! - GET  /api/workflows/history      - Archived workflows (paginated)
//! - POST /api/workflows/execute      - Start a workflow from a template
//! - GET  /api/workflows/{id}         - Full workflow, active or archived
//! - POST /api/workflows/{id}/pause   - Pause
//! - POST /api/workflows/{id}/resume  - Resume a paused workflow
//! - POST /api/workflows/{id}/stop    - Stop and archive
//! - GET  /api/templates              - Template catalog

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use flowdeck_engine::RequestMeta;

use crate::error::InterfaceError;
use crate::state::AppState;

type ApiResult = Result<Json<Value>, InterfaceError>;

/// Body of `POST /api/workflows/execute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteRequest {
    #[serde(default)]
    pub workflow_name: Option<String>,
    #[serde(default)]
    pub request: Option<RequestMeta>,
}

/// Pagination of `GET /api/workflows/history`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/workflows/active
pub async fn list_active(State(state): State<Arc<AppState>>) -> ApiResult {
    let workflows = state.engine.list_active().await?;
    Ok(Json(json!({ "success": true, "workflows": workflows })))
}

/// GET /api/workflows/history
pub async fn list_history(
    State(state): State<Arc<AppState>>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult {
    let Query(page) = query.map_err(|e| InterfaceError::BadRequest(e.body_text()))?;
    let history = state.engine.list_history().await?;

    let offset = page.offset.unwrap_or(0);
    let workflows: Vec<_> = match page.limit {
        Some(limit) => history.into_iter().skip(offset).take(limit).collect(),
        None => history.into_iter().skip(offset).collect(),
    };
    Ok(Json(json!({ "success": true, "workflows": workflows })))
}

/// POST /api/workflows/execute
pub async fn execute_workflow(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body.map_err(|e| {
        debug!("Rejected execute body: {}", e.body_text());
        InterfaceError::BadRequest("Missing required fields".to_string())
    })?;
    let (Some(workflow_name), Some(request)) = (body.workflow_name, body.request) else {
        return Err(InterfaceError::BadRequest(
            "Missing required fields".to_string(),
        ));
    };
    if workflow_name.is_empty() {
        return Err(InterfaceError::BadRequest(
            "Missing required fields".to_string(),
        ));
    }

    let workflow_id = state.engine.execute(&workflow_name, request).await?;
    info!("Execute request accepted: {} ({})", workflow_id, workflow_name);

    Ok(Json(json!({
        "success": true,
        "workflow_id": workflow_id,
        "message": "Workflow started successfully",
    })))
}

/// GET /api/workflows/{id}
pub async fn get_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    let workflow = state.engine.get(&id).await?;
    Ok(Json(json!({ "success": true, "workflow": workflow })))
}

/// POST /api/workflows/{id}/pause
pub async fn pause_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.engine.pause(&id).await?;
    Ok(Json(json!({ "success": true, "message": "Workflow paused" })))
}

/// POST /api/workflows/{id}/resume
pub async fn resume_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.engine.resume(&id).await?;
    Ok(Json(json!({ "success": true, "message": "Workflow resumed" })))
}

/// POST /api/workflows/{id}/stop
pub async fn stop_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult {
    state.engine.stop(&id).await?;
    Ok(Json(json!({ "success": true, "message": "Workflow stopped" })))
}

/// GET /api/templates
pub async fn list_templates(State(state): State<Arc<AppState>>) -> ApiResult {
    let templates: Vec<Value> = state
        .engine
        .templates()
        .list()
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "displayName": t.display_name,
                "steps": t.steps,
                "agents": t.agents,
            })
        })
        .collect();
    Ok(Json(json!({ "success": true, "templates": templates })))
}
