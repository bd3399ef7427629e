// Detached side effects (heartbeats, notifications)

use crate::notify::{Notification, Notifier};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

/// Tracks fire-and-forget tasks so their failures reach the log and
/// shutdown (or a test) can wait for them to settle.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task` without awaiting it. Errors are logged, never returned.
    pub fn spawn<F, E>(&self, label: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.tracker.spawn(async move {
            if let Err(e) = task.await {
                tracing::warn!(task = label, error = %e, "Background task failed");
            }
        });
    }

    pub fn notify(&self, notifier: Arc<dyn Notifier>, notification: Notification) {
        self.spawn("notify", async move { notifier.notify(notification).await });
    }

    /// Number of tasks still running
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every task spawned so far, then accept new ones again
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let tasks = BackgroundTasks::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = ran.clone();
        tasks.spawn("fails", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("boom")
        });
        let counter = ran.clone();
        tasks.spawn("succeeds", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), String>(())
        });

        tasks.drain().await;
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(tasks.pending(), 0);

        // Still usable after draining
        let counter = ran.clone();
        tasks.spawn("again", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), String>(())
        });
        tasks.drain().await;
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }
}
