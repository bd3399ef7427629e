use crate::config::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use command_center_mcp::protocol::ServerDescriptor;
use std::sync::Arc;

/// Server name, version and tool catalog for discovery
pub async fn describe(State(state): State<Arc<AppState>>) -> Json<ServerDescriptor> {
    Json(state.mcp.describe())
}

/// One JSON-RPC exchange. The body is read raw so malformed JSON still gets
/// a JSON-RPC parse error instead of an HTTP rejection.
pub async fn handle(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.mcp.handle_bytes(&body).await {
        Some(response) => Json(response).into_response(),
        // Notifications are acknowledged with an empty body
        None => StatusCode::OK.into_response(),
    }
}
