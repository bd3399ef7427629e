// Outbound webhook notifications

use crate::types::{InboxItem, InboxSource, Priority, Task};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskUrgent,
    InboxNew,
}

/// Payload describing a newly created record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Notification {
    /// Urgent tasks are pushed; everything else stays quiet
    pub fn for_new_task(task: &Task) -> Option<Self> {
        (task.priority == Priority::Urgent).then(|| Self {
            kind: NotificationKind::TaskUrgent,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: Some(task.priority),
        })
    }

    /// Only items the agent pushed are announced
    pub fn for_inbox_item(item: &InboxItem) -> Option<Self> {
        (item.source == InboxSource::Agent).then(|| Self {
            kind: NotificationKind::InboxNew,
            title: item.title.clone(),
            description: item.description.clone(),
            priority: None,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(u16),
}

/// Best-effort push channel. Callers never wait on or surface the outcome.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Used when no webhook is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        tracing::debug!("No webhook configured, dropping {:?} notification", notification.kind);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    notification: &'a Notification,
    timestamp: DateTime<Utc>,
    dashboard_url: &'a str,
}

/// POSTs notifications as JSON to a webhook URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    dashboard_url: String,
}

impl WebhookNotifier {
    pub fn new(
        url: impl Into<String>,
        dashboard_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            dashboard_url: dashboard_url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            notification: &notification,
            timestamp: Utc::now(),
            dashboard_url: &self.dashboard_url,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }

        tracing::debug!("Delivered {:?} notification: {}", notification.kind, notification.title);
        Ok(())
    }
}
