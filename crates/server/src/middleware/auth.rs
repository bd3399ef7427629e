use crate::config::AppState;
use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

/// `?key=` fallback for clients that cannot set headers
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// Check a request's credentials against the shared secret.
///
/// A matching bearer token wins; otherwise the `key` query parameter is
/// tried. An unset or empty secret matches nothing.
pub fn verify_mcp_auth(headers: &HeaderMap, query_key: Option<&str>, secret: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return false;
    };

    if bearer_token(headers) == Some(secret) {
        return true;
    }

    query_key == Some(secret)
}

/// Reject requests without the shared secret before any handler runs
pub async fn require_mcp_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let query = Query::<KeyQuery>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();

    if !verify_mcp_auth(req.headers(), query.key.as_deref(), state.mcp_secret()) {
        tracing::debug!(path = %req.uri().path(), "Rejecting unauthenticated request");
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "Unauthorized" })),
        )
            .into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with("Bearer token123")), Some("token123"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcg==")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_verify_header() {
        assert!(verify_mcp_auth(&headers_with("Bearer s3cret"), None, Some("s3cret")));
        assert!(!verify_mcp_auth(&headers_with("Bearer wrong"), None, Some("s3cret")));
        assert!(!verify_mcp_auth(&headers_with("s3cret"), None, Some("s3cret")));
    }

    #[test]
    fn test_verify_query_fallback() {
        assert!(verify_mcp_auth(&HeaderMap::new(), Some("s3cret"), Some("s3cret")));
        // A wrong header does not block a valid key
        assert!(verify_mcp_auth(&headers_with("Bearer wrong"), Some("s3cret"), Some("s3cret")));
        assert!(!verify_mcp_auth(&HeaderMap::new(), Some("nope"), Some("s3cret")));
        assert!(!verify_mcp_auth(&HeaderMap::new(), None, Some("s3cret")));
    }

    #[test]
    fn test_empty_secret_never_matches() {
        assert!(!verify_mcp_auth(&headers_with("Bearer "), Some(""), Some("")));
        assert!(!verify_mcp_auth(&HeaderMap::new(), Some(""), None));
    }
}
