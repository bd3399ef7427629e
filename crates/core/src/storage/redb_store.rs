use super::{Store, StoreError, StoreResult};
use crate::clock::{Clock, SystemClock};
use crate::types::{
    AgentStatus, DashboardSummary, Event, EventId, Focus, FocusId, InboxItem, InboxItemId,
    NewEvent, NewInboxItem, NewProject, NewTask, Project, ProjectId, ProjectUpdate, Task, TaskId,
    TaskStatus, TaskUpdate,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

type Rows = TableDefinition<'static, u64, &'static [u8]>;

const TASKS_TABLE: Rows = TableDefinition::new("tasks");
const EVENTS_TABLE: Rows = TableDefinition::new("events");
const PROJECTS_TABLE: Rows = TableDefinition::new("projects");
const INBOX_TABLE: Rows = TableDefinition::new("inbox");
const FOCUS_TABLE: Rows = TableDefinition::new("focus");
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");
const AGENT_STATUS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("agent_status");

const AGENT_STATUS_KEY: &str = "agent";

/// Heartbeats older than this mark the agent inactive
pub const DEFAULT_HEARTBEAT_WINDOW_SECS: i64 = 30;

/// Dashboard store backed by an embedded redb database.
///
/// Rows are JSON-encoded and keyed by a per-table sequence kept in the
/// `counters` table, so ids are assigned inside the same write transaction
/// that inserts the row.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    heartbeat_window: Duration,
}

impl RedbStore {
    pub fn new(path: PathBuf) -> StoreResult<Self> {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: PathBuf, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path)?;

        // Initialize tables so read transactions never see a missing table
        let write_txn = db.begin_write()?;
        {
            for table in [
                TASKS_TABLE,
                EVENTS_TABLE,
                PROJECTS_TABLE,
                INBOX_TABLE,
                FOCUS_TABLE,
            ] {
                write_txn.open_table(table)?;
            }
            write_txn.open_table(COUNTERS_TABLE)?;
            write_txn.open_table(AGENT_STATUS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db: Arc::new(db),
            clock,
            heartbeat_window: Duration::seconds(DEFAULT_HEARTBEAT_WINDOW_SECS),
        })
    }

    pub fn with_heartbeat_window(mut self, window: Duration) -> Self {
        self.heartbeat_window = window;
        self
    }

    fn read_all<T: DeserializeOwned>(&self, def: Rows) -> StoreResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(def)?;
        decode_all(&table)
    }

    fn insert_new<T, F>(&self, def: Rows, sequence: &str, build: F) -> StoreResult<T>
    where
        T: Serialize,
        F: FnOnce(u64) -> T,
    {
        let write_txn = self.db.begin_write()?;
        let row = {
            let id = next_id(&write_txn, sequence)?;
            let row = build(id);
            let mut table = write_txn.open_table(def)?;
            table.insert(id, serde_json::to_vec(&row)?.as_slice())?;
            row
        };
        write_txn.commit()?;
        Ok(row)
    }

    fn modify<T, F>(&self, def: Rows, entity: &'static str, id: u64, apply: F) -> StoreResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> StoreResult<()>,
    {
        let write_txn = self.db.begin_write()?;
        let row = {
            let mut table = write_txn.open_table(def)?;
            let mut row: T =
                decode_one(&table, id)?.ok_or_else(|| StoreError::not_found(entity, id))?;
            apply(&mut row)?;
            table.insert(id, serde_json::to_vec(&row)?.as_slice())?;
            row
        };
        write_txn.commit()?;
        Ok(row)
    }

    fn remove(&self, def: Rows, entity: &'static str, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(def)?;
            if table.remove(id)?.is_none() {
                return Err(StoreError::not_found(entity, id));
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn agent_status(&self) -> StoreResult<Option<AgentStatus>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AGENT_STATUS_TABLE)?;
        let value = table.get(AGENT_STATUS_KEY)?;
        let status = match value {
            Some(guard) => Some(serde_json::from_slice(guard.value())?),
            None => None,
        };
        Ok(status)
    }

    fn is_fresh(&self, status: Option<AgentStatus>) -> bool {
        match status {
            Some(status) => {
                status.active && self.clock.now() - status.last_active <= self.heartbeat_window
            }
            None => false,
        }
    }
}

fn next_id(txn: &WriteTransaction, sequence: &str) -> StoreResult<u64> {
    let mut counters = txn.open_table(COUNTERS_TABLE)?;
    let next = counters.get(sequence)?.map(|guard| guard.value()).unwrap_or(0) + 1;
    counters.insert(sequence, next)?;
    Ok(next)
}

fn decode_one<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> StoreResult<Option<T>> {
    match table.get(id)? {
        Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
        None => Ok(None),
    }
}

fn decode_all<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
) -> StoreResult<Vec<T>> {
    let mut rows = Vec::new();
    for item in table.iter()? {
        let (_id, value) = item?;
        rows.push(serde_json::from_slice(value.value())?);
    }
    Ok(rows)
}

fn required(value: String, field: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text is stored as absent
fn optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn check_progress(progress: u8) -> StoreResult<u8> {
    if progress > 100 {
        return Err(StoreError::invalid("progress must be between 0 and 100"));
    }
    Ok(progress)
}

fn open_tasks_ordered(tasks: Vec<Task>) -> Vec<Task> {
    let mut open: Vec<Task> = tasks
        .into_iter()
        .filter(|t| t.status == TaskStatus::Open)
        .collect();
    // Priority first, then due date with undated tasks last
    open.sort_by_key(|t| (t.priority.rank(), t.due_date.is_none(), t.due_date));
    open
}

fn events_between(events: Vec<Event>, from: NaiveDate, until: Option<NaiveDate>) -> Vec<Event> {
    let mut events: Vec<Event> = events
        .into_iter()
        .filter(|e| e.event_date >= from && until.map_or(true, |end| e.event_date < end))
        .collect();
    events.sort_by_key(|e| (e.event_date, e.event_time.is_none(), e.event_time));
    events
}

fn recently_updated(mut projects: Vec<Project>, all: bool) -> Vec<Project> {
    if !all {
        projects.retain(|p| p.status.is_active());
    }
    projects.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
    projects
}

fn newest_inbox(mut items: Vec<InboxItem>, all: bool) -> Vec<InboxItem> {
    if !all {
        items.retain(|i| !i.read);
    }
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    items
}

fn active_focus(records: Vec<Focus>) -> Option<Focus> {
    records
        .into_iter()
        .filter(|f| f.active)
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
}

#[async_trait]
impl Store for RedbStore {
    async fn create_task(&self, task: NewTask) -> StoreResult<Task> {
        let title = required(task.title, "title")?;
        let now = self.clock.now();

        let task = self.insert_new(TASKS_TABLE, "tasks", |id| Task {
            id: TaskId(id),
            title,
            description: optional(task.description),
            priority: task.priority.unwrap_or_default(),
            status: TaskStatus::Open,
            due_date: task.due_date,
            category: optional(task.category),
            created_by: task.created_by,
            created_at: now,
            completed_at: None,
            updated_at: now,
        })?;

        tracing::debug!("Created task {} ({:?})", task.id, task.priority);
        Ok(task)
    }

    async fn update_task(&self, id: TaskId, update: TaskUpdate) -> StoreResult<Task> {
        let now = self.clock.now();
        self.modify(TASKS_TABLE, "task", id.0, |task: &mut Task| {
            if let Some(title) = update.title {
                task.title = required(title, "title")?;
            }
            if update.description.is_some() {
                task.description = optional(update.description);
            }
            if let Some(priority) = update.priority {
                task.priority = priority;
            }
            if update.due_date.is_some() {
                task.due_date = update.due_date;
            }
            if update.category.is_some() {
                task.category = optional(update.category);
            }
            if let Some(status) = update.status {
                task.status = status;
                task.completed_at = match status {
                    TaskStatus::Done => Some(now),
                    TaskStatus::Open => None,
                };
            }
            task.updated_at = now;
            Ok(())
        })
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<()> {
        self.remove(TASKS_TABLE, "task", id.0)
    }

    async fn open_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(open_tasks_ordered(self.read_all(TASKS_TABLE)?))
    }

    async fn list_tasks(&self, status: Option<TaskStatus>) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self.read_all(TASKS_TABLE)?;
        if let Some(status) = status {
            tasks.retain(|t| t.status == status);
        }
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn create_event(&self, event: NewEvent) -> StoreResult<Event> {
        let title = required(event.title, "title")?;
        let now = self.clock.now();

        self.insert_new(EVENTS_TABLE, "events", |id| Event {
            id: EventId(id),
            title,
            description: optional(event.description),
            event_date: event.event_date,
            event_time: event.event_time,
            duration_min: event.duration_min,
            event_type: event.event_type.unwrap_or_default(),
            created_at: now,
        })
    }

    async fn delete_event(&self, id: EventId) -> StoreResult<()> {
        self.remove(EVENTS_TABLE, "event", id.0)
    }

    async fn upcoming_events(&self, from: Option<NaiveDate>) -> StoreResult<Vec<Event>> {
        let from = from.unwrap_or_else(|| self.clock.today());
        Ok(events_between(self.read_all(EVENTS_TABLE)?, from, None))
    }

    async fn events_in_month(&self, year: i32, month: u32) -> StoreResult<Vec<Event>> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| StoreError::invalid(format!("invalid month {}-{}", year, month)))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| StoreError::invalid(format!("invalid month {}-{}", year, month)))?;

        Ok(events_between(self.read_all(EVENTS_TABLE)?, start, Some(end)))
    }

    async fn create_project(&self, project: NewProject) -> StoreResult<Project> {
        let name = required(project.name, "name")?;
        let now = self.clock.now();

        self.insert_new(PROJECTS_TABLE, "projects", |id| Project {
            id: ProjectId(id),
            name,
            description: optional(project.description),
            status: project.status.unwrap_or_default(),
            progress: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update_project(&self, id: ProjectId, update: ProjectUpdate) -> StoreResult<Project> {
        let now = self.clock.now();
        self.modify(PROJECTS_TABLE, "project", id.0, |project: &mut Project| {
            if let Some(name) = update.name {
                project.name = required(name, "name")?;
            }
            if update.description.is_some() {
                project.description = optional(update.description);
            }
            if let Some(status) = update.status {
                project.status = status;
            }
            if let Some(progress) = update.progress {
                project.progress = check_progress(progress)?;
            }
            project.updated_at = now;
            Ok(())
        })
    }

    async fn active_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(recently_updated(self.read_all(PROJECTS_TABLE)?, false))
    }

    async fn all_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(recently_updated(self.read_all(PROJECTS_TABLE)?, true))
    }

    async fn push_inbox(&self, item: NewInboxItem) -> StoreResult<InboxItem> {
        let title = required(item.title, "title")?;
        let now = self.clock.now();

        self.insert_new(INBOX_TABLE, "inbox", |id| InboxItem {
            id: InboxItemId(id),
            title,
            description: optional(item.description),
            source: item.source.unwrap_or_default(),
            read: false,
            created_at: now,
        })
    }

    async fn mark_inbox_read(&self, id: InboxItemId) -> StoreResult<InboxItem> {
        self.modify(INBOX_TABLE, "inbox item", id.0, |item: &mut InboxItem| {
            item.read = true;
            Ok(())
        })
    }

    async fn unread_inbox(&self) -> StoreResult<Vec<InboxItem>> {
        Ok(newest_inbox(self.read_all(INBOX_TABLE)?, false))
    }

    async fn all_inbox(&self) -> StoreResult<Vec<InboxItem>> {
        Ok(newest_inbox(self.read_all(INBOX_TABLE)?, true))
    }

    async fn set_focus(&self, content: String) -> StoreResult<Focus> {
        let content = required(content, "content")?;
        let now = self.clock.now();

        let write_txn = self.db.begin_write()?;
        let focus = {
            let id = next_id(&write_txn, "focus")?;
            let mut table = write_txn.open_table(FOCUS_TABLE)?;

            let previous: Vec<Focus> = decode_all(&table)?;
            for mut old in previous.into_iter().filter(|f| f.active) {
                old.active = false;
                table.insert(old.id.0, serde_json::to_vec(&old)?.as_slice())?;
            }

            let focus = Focus {
                id: FocusId(id),
                content,
                active: true,
                created_at: now,
            };
            table.insert(id, serde_json::to_vec(&focus)?.as_slice())?;
            focus
        };
        write_txn.commit()?;

        Ok(focus)
    }

    async fn current_focus(&self) -> StoreResult<Option<Focus>> {
        Ok(active_focus(self.read_all(FOCUS_TABLE)?))
    }

    async fn record_agent_heartbeat(&self) -> StoreResult<()> {
        let status = AgentStatus {
            active: true,
            last_active: self.clock.now(),
        };

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AGENT_STATUS_TABLE)?;
            table.insert(AGENT_STATUS_KEY, serde_json::to_vec(&status)?.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn agent_active(&self) -> StoreResult<bool> {
        Ok(self.is_fresh(self.agent_status()?))
    }

    async fn dashboard_summary(&self) -> StoreResult<DashboardSummary> {
        let today = self.clock.today();

        // One read transaction so every section reflects the same snapshot
        let read_txn = self.db.begin_read()?;
        let tasks = decode_all(&read_txn.open_table(TASKS_TABLE)?)?;
        let events = decode_all(&read_txn.open_table(EVENTS_TABLE)?)?;
        let projects = decode_all(&read_txn.open_table(PROJECTS_TABLE)?)?;
        let inbox = decode_all(&read_txn.open_table(INBOX_TABLE)?)?;
        let focus = decode_all(&read_txn.open_table(FOCUS_TABLE)?)?;
        let status = {
            let table = read_txn.open_table(AGENT_STATUS_TABLE)?;
            let guard = table.get(AGENT_STATUS_KEY)?;
            match guard {
                Some(guard) => Some(serde_json::from_slice::<AgentStatus>(guard.value())?),
                None => None,
            }
        };

        Ok(DashboardSummary::build(
            open_tasks_ordered(tasks),
            events_between(events, today, None),
            recently_updated(projects, false),
            newest_inbox(inbox, false),
            active_focus(focus),
            self.is_fresh(status),
            today,
        ))
    }
}
