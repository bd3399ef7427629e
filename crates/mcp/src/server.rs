// MCP request dispatcher: one JSON-RPC exchange in, one response out

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerDescriptor,
    ServerInfo, ToolContent, PROTOCOL_VERSION,
};
use crate::tools::{ToolExecutor, ToolRegistry};
use command_center_core::{BackgroundTasks, Notifier, Store};
use serde_json::Value;
use std::sync::Arc;

pub const SERVER_NAME: &str = "command-center";
pub const SERVER_DESCRIPTION: &str = "Personal command center dashboard";

/// Stateless between requests: holds only the static registry and handles
/// to the store and notifier.
#[derive(Clone)]
pub struct McpServer {
    info: ServerInfo,
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    store: Arc<dyn Store>,
    background: BackgroundTasks,
}

impl McpServer {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            registry: Arc::new(ToolRegistry::new()),
            executor: ToolExecutor::new(store.clone(), notifier, background.clone()),
            store,
            background,
        }
    }

    /// Discovery document for plain `GET` requests
    pub fn describe(&self) -> ServerDescriptor {
        ServerDescriptor {
            info: self.info.clone(),
            description: SERVER_DESCRIPTION.to_string(),
            tools: self.registry.list_schemas().to_vec(),
        }
    }

    /// Decode a raw body and dispatch it. Only input that is not JSON at
    /// all gets a parse error with a null id; anything else echoes the
    /// caller's id.
    pub async fn handle_bytes(&self, body: &[u8]) -> Option<JsonRpcResponse> {
        match serde_json::from_slice::<Value>(body) {
            Ok(message) => self.handle_value(message).await,
            Err(e) => {
                tracing::debug!("Rejecting malformed MCP request: {}", e);
                Some(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(e.to_string()),
                ))
            }
        }
    }

    /// Dispatch an already parsed JSON message
    pub async fn handle_value(&self, message: Value) -> Option<JsonRpcResponse> {
        let id = message.get("id").cloned().unwrap_or(Value::Null);

        let method = match message.get("method") {
            Some(Value::String(_)) => None,
            Some(other) => Some(other.to_string()),
            None => Some("undefined".to_string()),
        };
        if let Some(method) = method {
            tracing::debug!("MCP request without a method name: {}", method);
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&method),
            ));
        }

        match serde_json::from_value::<JsonRpcRequest>(message) {
            Ok(request) => self.handle(request).await,
            Err(e) => Some(JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request(e.to_string()),
            )),
        }
    }

    /// Dispatch one request. Returns `None` for notifications, which get no
    /// response body.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!("Received notification {}", request.method);
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);

        let response = match request.method.as_str() {
            "initialize" => self.initialize(id, request.params),
            "tools/list" => JsonRpcResponse::success(
                id,
                ListToolsResult {
                    tools: self.registry.list_schemas().to_vec(),
                },
            ),
            "tools/call" => self.call_tool(id, request.params).await,
            "ping" => JsonRpcResponse::success(id, serde_json::json!({})),
            other => {
                tracing::debug!("Unknown MCP method {}", other);
                JsonRpcResponse::error(id, JsonRpcError::method_not_found(other))
            }
        };

        Some(response)
    }

    fn initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();
        if let Some(client) = params.client_info {
            tracing::info!(
                "MCP client connected: {} {} (protocol {})",
                client.name,
                client.version,
                params.protocol_version.as_deref().unwrap_or("unspecified")
            );
        }

        JsonRpcResponse::success(
            id,
            InitializeResult {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ServerCapabilities::default(),
                server_info: self.info.clone(),
            },
        )
    }

    async fn call_tool(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: CallToolParams = match params.map(serde_json::from_value) {
            Some(Ok(params)) => params,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e)),
                )
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    JsonRpcError::invalid_params("Missing tools/call params"),
                )
            }
        };

        // Any tool call counts as agent activity, including reads and calls
        // that go on to fail
        let store = self.store.clone();
        self.background
            .spawn("heartbeat", async move { store.record_agent_heartbeat().await });

        match self.executor.call(&params.name, params.arguments).await {
            Ok(result) => match serde_json::to_string_pretty(&result) {
                Ok(text) => JsonRpcResponse::success(
                    id,
                    CallToolResult {
                        content: vec![ToolContent::text(text)],
                        is_error: None,
                    },
                ),
                Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
            },
            Err(e) => {
                tracing::warn!(tool = %params.name, "Tool call failed: {}", e);
                JsonRpcResponse::error(id, e.to_rpc_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::executor::tests::{harness, Harness};
    use crate::tools::ToolName;
    use command_center_core::NotificationKind;
    use serde_json::json;

    fn server(h: &Harness) -> McpServer {
        McpServer::new(h.store.clone(), h.notifier.clone(), h.background.clone())
    }

    async fn send(server: &McpServer, request: Value) -> Value {
        let request: JsonRpcRequest = serde_json::from_value(request).unwrap();
        let response = server.handle(request).await.expect("expected a response");
        serde_json::to_value(response).unwrap()
    }

    fn tool_text(response: &Value) -> Value {
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let h = harness();
        let server = server(&h);

        let response = send(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "agent", "version": "1"}}
            }),
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], "command-center");
        assert_eq!(response["result"]["capabilities"], json!({"tools": {}}));
    }

    #[tokio::test]
    async fn test_tools_list_matches_registry() {
        let h = harness();
        let server = server(&h);

        let response = send(&server, json!({"id": "list", "method": "tools/list"})).await;
        let names: Vec<&str> = response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        let expected: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();

        assert_eq!(response["id"], "list");
        assert_eq!(names, expected);
        assert!(response["result"]["tools"][0]["inputSchema"]["properties"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let h = harness();
        let response = send(&server(&h), json!({"jsonrpc": "2.0", "id": 9, "method": "ping"})).await;
        assert_eq!(response, json!({"jsonrpc": "2.0", "id": 9, "result": {}}));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let h = harness();
        let server = server(&h);

        for method in ["initialized", "notifications/initialized"] {
            let request: JsonRpcRequest =
                serde_json::from_value(json!({"jsonrpc": "2.0", "method": method})).unwrap();
            assert!(server.handle(request).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_unknown_methods() {
        let h = harness();
        let server = server(&h);

        for method in ["resources/list", "prompts/get", "tools/delete", "", "PING"] {
            let response = send(&server, json!({"id": 3, "method": method})).await;
            assert_eq!(response["id"], 3);
            assert_eq!(response["error"]["code"], -32601, "method {:?}", method);
            assert!(response.get("result").is_none());
        }
    }

    #[tokio::test]
    async fn test_unknown_tools() {
        let h = harness();
        let server = server(&h);

        for name in ["delete_task", "get_summary ", "CREATE_TASK", "list_tasks"] {
            let response = send(
                &server,
                json!({"id": "u", "method": "tools/call", "params": {"name": name, "arguments": {}}}),
            )
            .await;
            assert_eq!(response["id"], "u");
            assert_eq!(response["error"]["code"], -32000);
            let message = response["error"]["message"].as_str().unwrap();
            assert!(message.contains(name), "{} missing from {}", name, message);
        }
    }

    #[tokio::test]
    async fn test_create_task_end_to_end() {
        let h = harness();
        let server = server(&h);

        let response = send(
            &server,
            json!({
                "jsonrpc": "2.0",
                "id": 42,
                "method": "tools/call",
                "params": {"name": "create_task", "arguments": {"title": "Ship release", "priority": "urgent"}}
            }),
        )
        .await;
        h.background.drain().await;

        assert_eq!(response["id"], 42);
        assert_eq!(response["result"]["content"][0]["type"], "text");
        let body = tool_text(&response);
        assert_eq!(body["ok"], true);
        assert_eq!(body["task"]["title"], "Ship release");
        assert_eq!(body["task"]["priority"], "urgent");
        assert_eq!(body["task"]["status"], "open");

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::TaskUrgent);
        assert_eq!(sent[0].title, "Ship release");
    }

    #[tokio::test]
    async fn test_tool_call_records_heartbeat() {
        let h = harness();
        let server = server(&h);

        assert!(!h.store.agent_active().await.unwrap());

        // Even a failing call marks the agent active
        let response = send(
            &server,
            json!({"id": 1, "method": "tools/call", "params": {"name": "complete_task", "arguments": {"id": 77}}}),
        )
        .await;
        h.background.drain().await;

        assert_eq!(response["error"]["message"], "task 77 not found");
        assert!(h.store.agent_active().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_summary_reports_activity() {
        let h = harness();
        let server = server(&h);

        send(
            &server,
            json!({"id": 1, "method": "tools/call", "params": {"name": "push_inbox", "arguments": {"title": "hi"}}}),
        )
        .await;
        h.background.drain().await;

        let response = send(
            &server,
            json!({"id": 2, "method": "tools/call", "params": {"name": "get_summary"}}),
        )
        .await;
        let summary = tool_text(&response);
        assert_eq!(summary["counts"]["unreadInbox"], 1);
        assert_eq!(summary["agentActive"], true);
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let h = harness();
        let server = server(&h);

        let response = send(
            &server,
            json!({"id": 5, "method": "tools/call", "params": {"name": "create_task", "arguments": {"priority": "urgent"}}}),
        )
        .await;

        assert_eq!(response["error"]["code"], -32000);
        let message = response["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid arguments for create_task"), "{}", message);
        assert!(h.store.list_tasks(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_params() {
        let h = harness();
        let response = send(&server(&h), json!({"id": 6, "method": "tools/call"})).await;
        assert_eq!(response["id"], 6);
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let h = harness();
        let response = server(&h).handle_bytes(b"{not json").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, -32700);
    }

    #[tokio::test]
    async fn test_bad_envelope_echoes_id() {
        let h = harness();
        let server = server(&h);

        let bodies: [&[u8]; 3] = [
            br#"{"id":5}"#,
            br#"{"id":5,"method":7}"#,
            br#"{"id":5,"method":null}"#,
        ];
        for body in bodies {
            let response = server.handle_bytes(body).await.unwrap();
            assert_eq!(response.id, json!(5));
            assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
        }

        let response = server.handle_bytes(br#"{"id":5}"#).await.unwrap();
        assert_eq!(response.error.unwrap().message, "Unknown method: undefined");

        let response = server
            .handle_bytes(br#"{"jsonrpc":2,"id":"a","method":"ping"}"#)
            .await
            .unwrap();
        assert_eq!(response.id, json!("a"));
        assert_eq!(response.error.unwrap().code, JsonRpcError::INVALID_REQUEST);

        // Valid JSON that is not an object has no id to echo
        let response = server.handle_bytes(b"[1, 2]").await.unwrap();
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_id_echoes_null() {
        let h = harness();
        let response = send(&server(&h), json!({"method": "ping"})).await;
        assert!(response["id"].is_null());
        assert_eq!(response["result"], json!({}));
    }
}
