// Runs parsed tool calls against the store

use crate::error::ToolError;
use crate::tools::args::ToolCall;
use command_center_core::{BackgroundTasks, Notification, Notifier, Store};
use serde::Serialize;
use std::sync::Arc;

/// Executes tool calls. Store mutations are awaited; notifications are
/// handed to [`BackgroundTasks`] and never affect the result.
#[derive(Clone)]
pub struct ToolExecutor {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    background: BackgroundTasks,
}

impl ToolExecutor {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        background: BackgroundTasks,
    ) -> Self {
        Self {
            store,
            notifier,
            background,
        }
    }

    /// Parse and execute a call by tool name
    pub async fn call(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        let call = ToolCall::parse(name, arguments)?;
        self.execute(call).await
    }

    pub async fn execute(&self, call: ToolCall) -> Result<serde_json::Value, ToolError> {
        tracing::info!(tool = %call.name(), "Executing tool");

        match call {
            ToolCall::CreateTask(args) => {
                let task = self.store.create_task(args.into()).await?;
                if let Some(notification) = Notification::for_new_task(&task) {
                    self.background.notify(self.notifier.clone(), notification);
                }
                created("task", &task)
            }
            ToolCall::UpdateTask(args) => {
                let (id, update) = args.into_update();
                let task = self.store.update_task(id, update).await?;
                created("task", &task)
            }
            ToolCall::CompleteTask(args) => {
                let task = self.store.complete_task(args.id).await?;
                created("task", &task)
            }
            ToolCall::CreateEvent(args) => {
                let event = self.store.create_event(args.into()).await?;
                created("event", &event)
            }
            ToolCall::CreateProject(args) => {
                let project = self.store.create_project(args.into()).await?;
                created("project", &project)
            }
            ToolCall::UpdateProject(args) => {
                let (id, update) = args.into_update();
                let project = self.store.update_project(id, update).await?;
                created("project", &project)
            }
            ToolCall::PushInbox(args) => {
                let item = self.store.push_inbox(args.into()).await?;
                if let Some(notification) = Notification::for_inbox_item(&item) {
                    self.background.notify(self.notifier.clone(), notification);
                }
                created("item", &item)
            }
            ToolCall::SetFocus(args) => {
                let focus = self.store.set_focus(args.content).await?;
                created("focus", &focus)
            }
            // Returned as-is, without the `ok` envelope
            ToolCall::GetSummary => Ok(serde_json::to_value(self.store.dashboard_summary().await?)?),
        }
    }
}

/// `{ "ok": true, <key>: <record> }`
fn created(key: &str, record: &impl Serialize) -> Result<serde_json::Value, ToolError> {
    let mut body = serde_json::Map::new();
    body.insert("ok".to_string(), serde_json::Value::Bool(true));
    body.insert(key.to_string(), serde_json::to_value(record)?);
    Ok(serde_json::Value::Object(body))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tools::registry::{ToolName, ToolRegistry};
    use command_center_core::{
        FixedClock, NotificationKind, NotifyError, RedbStore, TaskStatus,
    };
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Notifier double that records every call
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification);
            if self.fail {
                return Err(NotifyError::Status(503));
            }
            Ok(())
        }
    }

    pub(crate) struct Harness {
        pub _dir: TempDir,
        pub store: Arc<RedbStore>,
        pub notifier: Arc<RecordingNotifier>,
        pub background: BackgroundTasks,
        pub executor: ToolExecutor,
    }

    pub(crate) fn harness_with(notifier: RecordingNotifier) -> Harness {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(FixedClock::new(
            chrono::DateTime::parse_from_rfc3339("2026-03-14T09:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
        ));
        let store = Arc::new(RedbStore::with_clock(dir.path().join("cc.redb"), clock).unwrap());
        let notifier = Arc::new(notifier);
        let background = BackgroundTasks::new();
        let executor = ToolExecutor::new(store.clone(), notifier.clone(), background.clone());
        Harness {
            _dir: dir,
            store,
            notifier,
            background,
            executor,
        }
    }

    pub(crate) fn harness() -> Harness {
        harness_with(RecordingNotifier::default())
    }

    #[tokio::test]
    async fn test_registry_executor_parity() {
        let h = harness();
        let registry = ToolRegistry::new();

        let listed: HashSet<String> = registry.list_schemas().iter().map(|t| t.name.clone()).collect();
        let handled: HashSet<String> = ToolName::ALL.iter().map(|t| t.as_str().to_string()).collect();
        assert_eq!(listed, handled);

        // Every listed tool resolves to a handler (never "Unknown tool")
        for name in &listed {
            let result = h.executor.call(name, json!({})).await;
            assert!(
                !matches!(result, Err(ToolError::UnknownTool(_))),
                "{} is listed but not handled",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_create_urgent_task_notifies_once() {
        let h = harness();

        let result = h
            .executor
            .call("create_task", json!({"title": "Ship release", "priority": "urgent"}))
            .await
            .unwrap();
        h.background.drain().await;

        assert_eq!(result["ok"], true);
        assert_eq!(result["task"]["title"], "Ship release");
        assert_eq!(result["task"]["priority"], "urgent");
        assert_eq!(result["task"]["status"], "open");
        assert_eq!(result["task"]["createdBy"], "agent");

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::TaskUrgent);
        assert_eq!(sent[0].title, "Ship release");
    }

    #[tokio::test]
    async fn test_non_urgent_task_is_quiet() {
        let h = harness();

        for priority in [Some("high"), Some("normal"), Some("low"), None] {
            let mut args = json!({"title": "quiet"});
            if let Some(p) = priority {
                args["priority"] = json!(p);
            }
            h.executor.call("create_task", args).await.unwrap();
        }
        h.background.drain().await;

        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_push_inbox_notification_policy() {
        let h = harness();

        h.executor
            .call("push_inbox", json!({"title": "explicit", "source": "agent"}))
            .await
            .unwrap();
        h.executor.call("push_inbox", json!({"title": "default"})).await.unwrap();
        let system = h
            .executor
            .call("push_inbox", json!({"title": "system", "source": "system"}))
            .await
            .unwrap();
        h.background.drain().await;

        assert_eq!(system["item"]["source"], "system");
        assert_eq!(system["item"]["read"], false);

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|n| n.kind == NotificationKind::InboxNew));
        assert_eq!(sent[0].title, "explicit");
        assert_eq!(sent[1].title, "default");
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_call() {
        let h = harness_with(RecordingNotifier::failing());

        let result = h
            .executor
            .call("create_task", json!({"title": "Fire", "priority": "urgent"}))
            .await
            .unwrap();
        h.background.drain().await;

        assert_eq!(result["ok"], true);
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_complete_equals_update_done() {
        let h = harness();

        let a = h.executor.call("create_task", json!({"title": "a"})).await.unwrap();
        let b = h.executor.call("create_task", json!({"title": "b"})).await.unwrap();

        let completed = h
            .executor
            .call("complete_task", json!({"id": a["task"]["id"]}))
            .await
            .unwrap();
        let updated = h
            .executor
            .call("update_task", json!({"id": b["task"]["id"], "status": "done"}))
            .await
            .unwrap();

        assert_eq!(completed["task"]["status"], "done");
        assert_eq!(updated["task"]["status"], "done");
        assert_eq!(h.store.list_tasks(Some(TaskStatus::Done)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_message() {
        let h = harness();

        let err = h.executor.call("complete_task", json!({"id": 404})).await.unwrap_err();
        assert_eq!(err.to_string(), "task 404 not found");

        let err = h.executor.call("set_focus", json!({"content": "   "})).await.unwrap_err();
        assert_eq!(err.to_string(), "content is required");
    }

    #[tokio::test]
    async fn test_set_focus_twice() {
        let h = harness();

        h.executor.call("set_focus", json!({"content": "first"})).await.unwrap();
        let second = h
            .executor
            .call("set_focus", json!({"content": "Finish Q3 report"}))
            .await
            .unwrap();

        assert_eq!(second["focus"]["active"], true);
        let current = h.store.current_focus().await.unwrap().unwrap();
        assert_eq!(current.content, "Finish Q3 report");
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let h = harness();

        let created = h
            .executor
            .call("create_project", json!({"name": "Launch", "status": "planning"}))
            .await
            .unwrap();
        assert_eq!(created["project"]["status"], "planning");
        assert_eq!(created["project"]["progress"], 0);

        let updated = h
            .executor
            .call(
                "update_project",
                json!({"id": created["project"]["id"], "progress": 60, "status": "active"}),
            )
            .await
            .unwrap();
        assert_eq!(updated["project"]["progress"], 60);
        assert_eq!(updated["project"]["status"], "active");
    }

    #[tokio::test]
    async fn test_create_event_defaults() {
        let h = harness();

        let result = h
            .executor
            .call(
                "create_event",
                json!({"title": "Launch review", "event_date": "2026-03-20", "event_time": "14:00", "duration_min": 45}),
            )
            .await
            .unwrap();

        assert_eq!(result["event"]["type"], "meeting");
        assert_eq!(result["event"]["eventDate"], "2026-03-20");
        assert_eq!(result["event"]["eventTime"], "14:00");
        assert_eq!(result["event"]["durationMin"], 45);
    }

    #[tokio::test]
    async fn test_get_summary_is_unwrapped() {
        let h = harness();

        h.executor
            .call("create_task", json!({"title": "today", "due_date": "2026-03-14"}))
            .await
            .unwrap();
        h.executor
            .call("create_task", json!({"title": "later", "due_date": "2026-03-30"}))
            .await
            .unwrap();
        h.executor.call("push_inbox", json!({"title": "unread"})).await.unwrap();

        let summary = h.executor.call("get_summary", json!({})).await.unwrap();

        assert!(summary.get("ok").is_none());
        assert_eq!(summary["counts"]["openTasks"], 2);
        assert_eq!(summary["counts"]["dueToday"], 1);
        assert_eq!(summary["counts"]["unreadInbox"], 1);
        assert_eq!(summary["agentActive"], false);
    }
}
