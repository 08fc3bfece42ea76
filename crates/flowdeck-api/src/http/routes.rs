//! HTTP route definitions.

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{self, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::InterfaceError;
use crate::http::handlers;
use crate::http::monitoring;
use crate::state::AppState;
use crate::websocket::ws_handler;

/// Create the main router.
///
/// ## Route Structure
///
/// ```text
/// /api/workflows
///   GET    /api/workflows/active       - Active workflow summaries
///   GET    /api/workflows/history      - Archived workflows (?offset=&limit=)
///   POST   /api/workflows/execute      - Start a workflow
///   GET    /api/workflows/{id}         - Get workflow
///   POST   /api/workflows/{id}/pause   - Pause workflow
///   POST   /api/workflows/{id}/resume  - Resume workflow
///   POST   /api/workflows/{id}/stop    - Stop workflow
///
/// /api/templates - Template catalog
///
/// /health  - Detailed health check
/// /livez   - Liveness probe
///
/// /ws      - WebSocket lifecycle event stream
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let workflow_routes = Router::new()
        .route("/active", get(handlers::list_active))
        .route("/history", get(handlers::list_history))
        .route("/execute", post(handlers::execute_workflow))
        .route("/{id}", get(handlers::get_workflow))
        .route("/{id}/pause", post(handlers::pause_workflow))
        .route("/{id}/resume", post(handlers::resume_workflow))
        .route("/{id}/stop", post(handlers::stop_workflow));

    let api_routes = Router::new()
        .nest("/workflows", workflow_routes)
        .route("/templates", get(handlers::list_templates));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(monitoring::health_check))
        .route("/livez", get(monitoring::liveness_probe))
        .route("/ws", get(ws_handler))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(state, count_requests))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        )
}

async fn count_requests(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    state.increment_requests();
    next.run(request).await
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    InterfaceError::Internal(format!("handler panicked: {}", detail)).into_response()
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
