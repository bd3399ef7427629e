use crate::config::AppState;
use crate::middleware::auth;
use anyhow::Result;
use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
    Json, Router,
};
use command_center_core::StoreError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod handlers;
mod mcp;

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    addr: &str,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    Ok(())
}

/// Create the API router. Everything except the health check sits behind
/// the shared-secret guard.
pub fn create_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let guarded = Router::new()
        // MCP gateway
        .route("/api/mcp", get(mcp::describe).post(mcp::handle))
        // Dashboard REST API
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route(
            "/api/tasks/{id}",
            patch(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/api/events", get(handlers::list_events).post(handlers::create_event))
        .route("/api/events/{id}", delete(handlers::delete_event))
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route("/api/projects/{id}", patch(handlers::update_project))
        .route("/api/inbox", get(handlers::list_inbox).post(handlers::push_inbox))
        .route("/api/inbox/{id}", patch(handlers::mark_inbox_read))
        .route("/api/focus", get(handlers::current_focus).post(handlers::set_focus))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_mcp_auth,
        ));

    Router::new()
        .route("/api/health", get(health_check))
        .merge(guarded)
        // Middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "command-center",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Custom error type for API handlers
pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_msg = self.error.to_string();
        let details = self
            .error
            .chain()
            .skip(1)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");

        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }

        let response = if details.is_empty() {
            ErrorResponse::new(error_msg)
        } else {
            ErrorResponse::with_details(error_msg, details)
        };

        (self.status, Json(response)).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        let status = match error.downcast_ref::<StoreError>() {
            Some(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(StoreError::Invalid(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
