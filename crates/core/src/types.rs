use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a task
    TaskId
);
entity_id!(
    /// Unique identifier for a calendar event
    EventId
);
entity_id!(
    /// Unique identifier for a project
    ProjectId
);
entity_id!(
    /// Unique identifier for an inbox item
    InboxItemId
);
entity_id!(
    /// Unique identifier for a focus record
    FocusId
);

/// Task priority, most pressing first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// Sort rank used by the dashboard (urgent = 0)
    pub fn rank(self) -> u8 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    Done,
}

/// Who created a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Creator {
    #[default]
    Agent,
    User,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    Meeting,
    Deadline,
    Milestone,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Planning,
    Paused,
    Done,
}

impl ProjectStatus {
    /// Projects shown on the dashboard
    pub fn is_active(self) -> bool {
        matches!(self, ProjectStatus::Active | ProjectStatus::Planning)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxSource {
    #[default]
    Agent,
    System,
}

/// A to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub created_by: Creator,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A calendar entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: Option<String>,
    pub event_date: NaiveDate,
    #[serde(default, with = "time_of_day")]
    pub event_time: Option<NaiveTime>,
    pub duration_min: Option<u32>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Completion percentage, 0-100
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxItem {
    pub id: InboxItemId,
    pub title: String,
    pub description: Option<String>,
    pub source: InboxSource,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// The focus banner shown at the top of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Focus {
    pub id: FocusId,
    pub content: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Singleton liveness record for the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub active: bool,
    pub last_active: DateTime<Utc>,
}

/// Fields accepted when creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "optional_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_by: Creator,
}

/// Partial task update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    #[serde(deserialize_with = "optional_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
}

impl TaskUpdate {
    pub fn complete() -> Self {
        Self {
            status: Some(TaskStatus::Done),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default, with = "time_of_day")]
    pub event_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_min: Option<u32>,
    #[serde(default, rename = "type")]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub progress: Option<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInboxItem {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<InboxSource>,
}

/// Aggregate view returned by the dashboard and the `get_summary` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub tasks: Vec<Task>,
    pub today_events: Vec<Event>,
    pub upcoming_events: Vec<Event>,
    pub projects: Vec<Project>,
    pub inbox: Vec<InboxItem>,
    pub focus: Option<Focus>,
    pub agent_active: bool,
    pub counts: SummaryCounts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCounts {
    pub open_tasks: usize,
    pub due_today: usize,
    pub today_events: usize,
    pub active_projects: usize,
    pub unread_inbox: usize,
}

impl DashboardSummary {
    /// Assemble the summary from already filtered and ordered collections.
    ///
    /// `open_tasks` must contain only open tasks and `upcoming_events` only
    /// events on or after `today`; the today-only views and counts are
    /// derived here.
    pub fn build(
        open_tasks: Vec<Task>,
        upcoming_events: Vec<Event>,
        projects: Vec<Project>,
        unread_inbox: Vec<InboxItem>,
        focus: Option<Focus>,
        agent_active: bool,
        today: NaiveDate,
    ) -> Self {
        let today_events: Vec<Event> = upcoming_events
            .iter()
            .filter(|e| e.event_date == today)
            .cloned()
            .collect();

        let counts = SummaryCounts {
            open_tasks: open_tasks.len(),
            due_today: open_tasks
                .iter()
                .filter(|t| t.due_date == Some(today))
                .count(),
            today_events: today_events.len(),
            active_projects: projects.len(),
            unread_inbox: unread_inbox.len(),
        };

        Self {
            tasks: open_tasks,
            today_events,
            upcoming_events,
            projects,
            inbox: unread_inbox,
            focus,
            agent_active,
            counts,
        }
    }
}

/// `HH:MM` serde format for optional times of day. Seconds are accepted on
/// input and dropped on output.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(s, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid time '{}', expected HH:MM", s))
            }),
        }
    }
}

/// Optional `YYYY-MM-DD` date where a blank string means absent
pub mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Some).map_err(|_| {
                serde::de::Error::custom(format!("invalid date '{}', expected YYYY-MM-DD", s))
            }),
        }
    }
}
