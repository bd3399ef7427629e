use crate::protocol::JsonRpcError;
use command_center_core::StoreError;

/// Failure of a single `tools/call`. Every variant is reported to the caller
/// as JSON-RPC error `-32000` carrying the display text.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ToolError {
    pub fn invalid(tool: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            tool,
            message: message.into(),
        }
    }

    pub fn to_rpc_error(&self) -> JsonRpcError {
        JsonRpcError::custom(JsonRpcError::TOOL_FAILURE, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_message_passes_through() {
        let err = ToolError::from(StoreError::not_found("task", 12u64));
        let rpc = err.to_rpc_error();
        assert_eq!(rpc.code, -32000);
        assert_eq!(rpc.message, "task 12 not found");
    }
}
