pub mod args;
pub mod executor;
mod registry;

pub use args::ToolCall;
pub use executor::ToolExecutor;
pub use registry::{
    json_schema_enum, json_schema_number, json_schema_object, json_schema_string, ToolName,
    ToolRegistry,
};
