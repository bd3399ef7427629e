use super::ApiResult;
use crate::config::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use command_center_core::{
    DashboardSummary, Event, EventId, Focus, InboxItem, InboxItemId, NewEvent, NewInboxItem,
    NewProject, NewTask, Notification, Project, ProjectId, ProjectUpdate, Task, TaskId, TaskStatus,
    TaskUpdate,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

const OK: Json<OkResponse> = Json(OkResponse { ok: true });

/// Full dashboard state
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardSummary>> {
    Ok(Json(state.store.dashboard_summary().await?))
}

// Tasks

#[derive(Debug, Default, Deserialize)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
}

/// Open tasks by default, or every task with `?status=`
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TaskQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let tasks = match query.status {
        Some(status) => state.store.list_tasks(Some(status)).await?,
        None => state.store.open_tasks().await?,
    };
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.store.create_task(req).await?;
    if let Some(notification) = Notification::for_new_task(&task) {
        state.background.notify(state.notifier.clone(), notification);
    }
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(update): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.store.update_task(TaskId(id), update).await?))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<OkResponse>> {
    state.store.delete_task(TaskId(id)).await?;
    Ok(OK)
}

// Events

#[derive(Debug, Default, Deserialize)]
pub struct EventQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub from: Option<NaiveDate>,
}

/// One calendar month with `?year=&month=`, otherwise everything from
/// `?from=` (default today) onwards
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
) -> ApiResult<Json<Vec<Event>>> {
    let events = match (query.year, query.month) {
        (Some(year), Some(month)) => state.store.events_in_month(year, month).await?,
        _ => state.store.upcoming_events(query.from).await?,
    };
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewEvent>,
) -> ApiResult<(StatusCode, Json<Event>)> {
    let event = state.store.create_event(req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<OkResponse>> {
    state.store.delete_event(EventId(id)).await?;
    Ok(OK)
}

// Projects

/// `?all` switches from the default filtered view to every record
#[derive(Debug, Default, Deserialize)]
pub struct AllQuery {
    pub all: Option<String>,
}

impl AllQuery {
    fn all(&self) -> bool {
        self.all.as_deref().is_some_and(|v| !v.is_empty())
    }
}

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AllQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = if query.all() {
        state.store.all_projects().await?
    } else {
        state.store.active_projects().await?
    };
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.store.create_project(req).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.store.update_project(ProjectId(id), update).await?))
}

// Inbox

pub async fn list_inbox(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AllQuery>,
) -> ApiResult<Json<Vec<InboxItem>>> {
    let items = if query.all() {
        state.store.all_inbox().await?
    } else {
        state.store.unread_inbox().await?
    };
    Ok(Json(items))
}

pub async fn push_inbox(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewInboxItem>,
) -> ApiResult<(StatusCode, Json<InboxItem>)> {
    let item = state.store.push_inbox(req).await?;
    if let Some(notification) = Notification::for_inbox_item(&item) {
        state.background.notify(state.notifier.clone(), notification);
    }
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn mark_inbox_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<InboxItem>> {
    Ok(Json(state.store.mark_inbox_read(InboxItemId(id)).await?))
}

// Focus

pub async fn current_focus(State(state): State<Arc<AppState>>) -> ApiResult<Json<Option<Focus>>> {
    Ok(Json(state.store.current_focus().await?))
}

#[derive(Debug, Deserialize)]
pub struct SetFocusRequest {
    pub content: String,
}

pub async fn set_focus(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SetFocusRequest>,
) -> ApiResult<(StatusCode, Json<Focus>)> {
    let focus = state.store.set_focus(req.content).await?;
    Ok((StatusCode::CREATED, Json(focus)))
}
