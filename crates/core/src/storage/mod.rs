pub mod redb_store;

pub use redb_store::RedbStore;

use crate::types::{
    DashboardSummary, Event, EventId, Focus, InboxItem, InboxItemId, NewEvent, NewInboxItem,
    NewProject, NewTask, Project, ProjectId, ProjectUpdate, Task, TaskId, TaskStatus, TaskUpdate,
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a [`Store`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// Constraint violation on caller-supplied data
    #[error("{0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<u64>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

macro_rules! backend_error {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for StoreError {
                fn from(err: $source) -> Self {
                    Self::Backend(err.to_string())
                }
            }
        )*
    };
}

backend_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
    std::io::Error,
);

/// Persistence for dashboard entities.
///
/// Every method is a single atomic operation: it either applies fully or
/// fails with a [`StoreError`].
#[async_trait]
pub trait Store: Send + Sync {
    // Tasks
    async fn create_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn update_task(&self, id: TaskId, update: TaskUpdate) -> StoreResult<Task>;
    async fn complete_task(&self, id: TaskId) -> StoreResult<Task> {
        self.update_task(id, TaskUpdate::complete()).await
    }
    async fn delete_task(&self, id: TaskId) -> StoreResult<()>;
    /// Open tasks, most pressing first
    async fn open_tasks(&self) -> StoreResult<Vec<Task>>;
    /// Tasks with the given status (or all), newest first
    async fn list_tasks(&self, status: Option<TaskStatus>) -> StoreResult<Vec<Task>>;

    // Events
    async fn create_event(&self, event: NewEvent) -> StoreResult<Event>;
    async fn delete_event(&self, id: EventId) -> StoreResult<()>;
    /// Events on or after `from`, in calendar order. Defaults to today.
    async fn upcoming_events(&self, from: Option<NaiveDate>) -> StoreResult<Vec<Event>>;
    async fn events_in_month(&self, year: i32, month: u32) -> StoreResult<Vec<Event>>;

    // Projects
    async fn create_project(&self, project: NewProject) -> StoreResult<Project>;
    async fn update_project(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<Project>;
    /// Active and planning projects, most recently updated first
    async fn active_projects(&self) -> StoreResult<Vec<Project>>;
    async fn all_projects(&self) -> StoreResult<Vec<Project>>;

    // Inbox
    async fn push_inbox(&self, item: NewInboxItem) -> StoreResult<InboxItem>;
    async fn mark_inbox_read(&self, id: InboxItemId) -> StoreResult<InboxItem>;
    async fn unread_inbox(&self) -> StoreResult<Vec<InboxItem>>;
    async fn all_inbox(&self) -> StoreResult<Vec<InboxItem>>;

    // Focus
    /// Replace the current focus; all earlier records become inactive
    async fn set_focus(&self, content: String) -> StoreResult<Focus>;
    async fn current_focus(&self) -> StoreResult<Option<Focus>>;

    // Agent liveness
    async fn record_agent_heartbeat(&self) -> StoreResult<()>;
    async fn agent_active(&self) -> StoreResult<bool>;

    async fn dashboard_summary(&self) -> StoreResult<DashboardSummary>;
}
