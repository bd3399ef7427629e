// Typed tool arguments, validated at the gateway boundary

use crate::error::ToolError;
use crate::tools::registry::ToolName;
use chrono::{NaiveDate, NaiveTime};
use command_center_core::types::{optional_date, time_of_day};
use command_center_core::{
    Creator, EventType, InboxSource, NewEvent, NewInboxItem, NewProject, NewTask, Priority,
    ProjectId, ProjectStatus, ProjectUpdate, TaskId, TaskStatus, TaskUpdate,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateTaskArgs {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateTaskArgs {
    #[serde(deserialize_with = "whole_number::deserialize")]
    pub id: TaskId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompleteTaskArgs {
    #[serde(deserialize_with = "whole_number::deserialize")]
    pub id: TaskId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateEventArgs {
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default, with = "time_of_day")]
    pub event_time: Option<NaiveTime>,
    #[serde(default, deserialize_with = "whole_number::optional")]
    pub duration_min: Option<u32>,
    #[serde(default, rename = "type")]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateProjectArgs {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateProjectArgs {
    #[serde(deserialize_with = "whole_number::deserialize")]
    pub id: ProjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "whole_number::optional")]
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PushInboxArgs {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<InboxSource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SetFocusArgs {
    pub content: String,
}

/// Ids and counts are advertised as JSON numbers, so integral floats such
/// as `3.0` are accepted. Fractional and negative values are not.
mod whole_number {
    use serde::{Deserialize, Deserializer};
    use serde_json::Number;

    fn to_u64<E: serde::de::Error>(n: &Number) -> Result<u64, E> {
        if let Some(u) = n.as_u64() {
            return Ok(u);
        }
        match n.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
            _ => Err(E::custom(format!("expected a non-negative whole number, found {}", n))),
        }
    }

    fn narrow<T: TryFrom<u64>, E: serde::de::Error>(n: &Number) -> Result<T, E> {
        let value = to_u64(n)?;
        T::try_from(value).map_err(|_| E::custom(format!("{} is out of range", n)))
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        narrow(&Number::deserialize(deserializer)?)
    }

    pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        match Option::<Number>::deserialize(deserializer)? {
            Some(n) => narrow(&n).map(Some),
            None => Ok(None),
        }
    }
}

/// A parsed `tools/call`: one variant per tool, each with its own fields
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    CreateTask(CreateTaskArgs),
    UpdateTask(UpdateTaskArgs),
    CompleteTask(CompleteTaskArgs),
    CreateEvent(CreateEventArgs),
    CreateProject(CreateProjectArgs),
    UpdateProject(UpdateProjectArgs),
    PushInbox(PushInboxArgs),
    SetFocus(SetFocusArgs),
    GetSummary,
}

impl ToolCall {
    /// Resolve `name` and decode `arguments` into the matching variant.
    ///
    /// Missing required fields, wrong types and values outside a tool's
    /// declared enum or range fail here, before the store is touched.
    pub fn parse(name: &str, arguments: serde_json::Value) -> Result<Self, ToolError> {
        let tool = ToolName::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        // Clients may omit `arguments` entirely for parameterless tools
        let arguments = match arguments {
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };

        let call = match tool {
            ToolName::CreateTask => ToolCall::CreateTask(decode(tool, arguments)?),
            ToolName::UpdateTask => ToolCall::UpdateTask(decode(tool, arguments)?),
            ToolName::CompleteTask => ToolCall::CompleteTask(decode(tool, arguments)?),
            ToolName::CreateEvent => ToolCall::CreateEvent(decode(tool, arguments)?),
            ToolName::CreateProject => {
                let args: CreateProjectArgs = decode(tool, arguments)?;
                if args.status == Some(ProjectStatus::Done) {
                    return Err(ToolError::invalid(
                        tool.as_str(),
                        "status must be one of active, planning, paused",
                    ));
                }
                ToolCall::CreateProject(args)
            }
            ToolName::UpdateProject => {
                let args: UpdateProjectArgs = decode(tool, arguments)?;
                if args.progress.is_some_and(|p| p > 100) {
                    return Err(ToolError::invalid(
                        tool.as_str(),
                        "progress must be between 0 and 100",
                    ));
                }
                ToolCall::UpdateProject(args)
            }
            ToolName::PushInbox => ToolCall::PushInbox(decode(tool, arguments)?),
            ToolName::SetFocus => ToolCall::SetFocus(decode(tool, arguments)?),
            ToolName::GetSummary => {
                if !arguments.is_object() {
                    return Err(ToolError::invalid(tool.as_str(), "arguments must be an object"));
                }
                ToolCall::GetSummary
            }
        };

        Ok(call)
    }

    pub fn name(&self) -> ToolName {
        match self {
            ToolCall::CreateTask(_) => ToolName::CreateTask,
            ToolCall::UpdateTask(_) => ToolName::UpdateTask,
            ToolCall::CompleteTask(_) => ToolName::CompleteTask,
            ToolCall::CreateEvent(_) => ToolName::CreateEvent,
            ToolCall::CreateProject(_) => ToolName::CreateProject,
            ToolCall::UpdateProject(_) => ToolName::UpdateProject,
            ToolCall::PushInbox(_) => ToolName::PushInbox,
            ToolCall::SetFocus(_) => ToolName::SetFocus,
            ToolCall::GetSummary => ToolName::GetSummary,
        }
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, arguments: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid(tool.as_str(), e.to_string()))
}

impl From<CreateTaskArgs> for NewTask {
    fn from(args: CreateTaskArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            priority: args.priority,
            due_date: args.due_date,
            category: args.category,
            created_by: Creator::Agent,
        }
    }
}

impl UpdateTaskArgs {
    pub fn into_update(self) -> (TaskId, TaskUpdate) {
        (
            self.id,
            TaskUpdate {
                title: self.title,
                description: self.description,
                priority: self.priority,
                status: self.status,
                due_date: self.due_date,
                category: self.category,
            },
        )
    }
}

impl From<CreateEventArgs> for NewEvent {
    fn from(args: CreateEventArgs) -> Self {
        Self {
            title: args.title,
            event_date: args.event_date,
            event_time: args.event_time,
            duration_min: args.duration_min,
            event_type: args.event_type,
            description: args.description,
        }
    }
}

impl From<CreateProjectArgs> for NewProject {
    fn from(args: CreateProjectArgs) -> Self {
        Self {
            name: args.name,
            description: args.description,
            status: args.status,
        }
    }
}

impl UpdateProjectArgs {
    pub fn into_update(self) -> (ProjectId, ProjectUpdate) {
        (
            self.id,
            ProjectUpdate {
                name: self.name,
                description: self.description,
                status: self.status,
                progress: self.progress,
            },
        )
    }
}

impl From<PushInboxArgs> for NewInboxItem {
    fn from(args: PushInboxArgs) -> Self {
        Self {
            title: args.title,
            description: args.description,
            source: args.source,
        }
    }
}
