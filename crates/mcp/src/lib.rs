// MCP (Model Context Protocol) gateway for the Command Center dashboard.
// Exposes dashboard operations as tools to agent clients over JSON-RPC.

pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use error::ToolError;
pub use server::McpServer;
