// Static catalog of the tools exposed to agents

use crate::protocol::ToolSchema;

/// Every tool the gateway knows about. The registry and the executor both
/// match on this enum exhaustively, so a new tool must be wired into both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    CreateTask,
    UpdateTask,
    CompleteTask,
    CreateEvent,
    CreateProject,
    UpdateProject,
    PushInbox,
    SetFocus,
    GetSummary,
}

const TASK_PRIORITIES: &[&str] = &["urgent", "high", "normal", "low"];

impl ToolName {
    pub const ALL: [ToolName; 9] = [
        ToolName::CreateTask,
        ToolName::UpdateTask,
        ToolName::CompleteTask,
        ToolName::CreateEvent,
        ToolName::CreateProject,
        ToolName::UpdateProject,
        ToolName::PushInbox,
        ToolName::SetFocus,
        ToolName::GetSummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::CreateTask => "create_task",
            ToolName::UpdateTask => "update_task",
            ToolName::CompleteTask => "complete_task",
            ToolName::CreateEvent => "create_event",
            ToolName::CreateProject => "create_project",
            ToolName::UpdateProject => "update_project",
            ToolName::PushInbox => "push_inbox",
            ToolName::SetFocus => "set_focus",
            ToolName::GetSummary => "get_summary",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    /// Get the tool schema for MCP
    pub fn schema(self) -> ToolSchema {
        let (description, input_schema) = match self {
            ToolName::CreateTask => (
                "Create a new task on the dashboard",
                json_schema_object(
                    serde_json::json!({
                        "title": json_schema_string("Task title"),
                        "description": json_schema_string("Task details"),
                        "priority": json_schema_enum(TASK_PRIORITIES, "Task priority level"),
                        "due_date": json_schema_string("Due date in YYYY-MM-DD format"),
                        "category": json_schema_string("Task category tag"),
                    }),
                    vec!["title"],
                ),
            ),
            ToolName::UpdateTask => (
                "Update an existing task",
                json_schema_object(
                    serde_json::json!({
                        "id": json_schema_number("Task ID"),
                        "title": json_schema_string("Task title"),
                        "description": json_schema_string("Task details"),
                        "priority": json_schema_enum(TASK_PRIORITIES, "Task priority level"),
                        "status": json_schema_enum(&["open", "done"], "Task status"),
                        "due_date": json_schema_string("Due date in YYYY-MM-DD format"),
                        "category": json_schema_string("Task category tag"),
                    }),
                    vec!["id"],
                ),
            ),
            ToolName::CompleteTask => (
                "Mark a task as done",
                json_schema_object(
                    serde_json::json!({
                        "id": json_schema_number("Task ID to complete"),
                    }),
                    vec!["id"],
                ),
            ),
            ToolName::CreateEvent => (
                "Add a calendar event (meeting, deadline, milestone)",
                json_schema_object(
                    serde_json::json!({
                        "title": json_schema_string("Event title"),
                        "event_date": json_schema_string("Date in YYYY-MM-DD format"),
                        "event_time": json_schema_string("Time in HH:MM format"),
                        "duration_min": json_schema_number("Duration in minutes"),
                        "type": json_schema_enum(&["meeting", "deadline", "milestone"], "Event type"),
                        "description": json_schema_string("Event details"),
                    }),
                    vec!["title", "event_date"],
                ),
            ),
            ToolName::CreateProject => (
                "Create a new project",
                json_schema_object(
                    serde_json::json!({
                        "name": json_schema_string("Project name"),
                        "description": json_schema_string("Project description"),
                        "status": json_schema_enum(&["active", "planning", "paused"], "Project status"),
                    }),
                    vec!["name"],
                ),
            ),
            ToolName::UpdateProject => (
                "Update a project's status or progress",
                json_schema_object(
                    serde_json::json!({
                        "id": json_schema_number("Project ID"),
                        "name": json_schema_string("Project name"),
                        "description": json_schema_string("Project description"),
                        "status": json_schema_enum(
                            &["active", "planning", "paused", "done"],
                            "Project status"
                        ),
                        "progress": json_schema_number("Progress percentage (0-100)"),
                    }),
                    vec!["id"],
                ),
            ),
            ToolName::PushInbox => (
                "Push a notification to the user's inbox",
                json_schema_object(
                    serde_json::json!({
                        "title": json_schema_string("Inbox item title"),
                        "description": json_schema_string("Details"),
                        "source": json_schema_enum(&["agent", "system"], "Source of the item"),
                    }),
                    vec!["title"],
                ),
            ),
            ToolName::SetFocus => (
                "Set the daily focus message shown at the top of the dashboard",
                json_schema_object(
                    serde_json::json!({
                        "content": json_schema_string("Focus message for the day"),
                    }),
                    vec!["content"],
                ),
            ),
            ToolName::GetSummary => (
                "Get the current dashboard state (tasks, events, projects, inbox)",
                json_schema_object(serde_json::json!({}), vec![]),
            ),
        };

        ToolSchema {
            name: self.as_str().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only list of tool schemas, in a stable order
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSchema>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: ToolName::ALL.into_iter().map(ToolName::schema).collect(),
        }
    }

    /// Get a tool schema by name
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&ToolSchema> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> &[ToolSchema] {
        &self.tools
    }

    /// Check if a tool exists
    #[cfg(test)]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    let mut schema = serde_json::json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = serde_json::json!(required);
    }
    schema
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "description": description
    })
}
