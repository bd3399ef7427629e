// Domain model, storage and notification plumbing for the Command Center dashboard

pub mod background;
pub mod clock;
pub mod notify;
pub mod storage;
pub mod types;

pub use background::BackgroundTasks;
pub use clock::{Clock, FixedClock, SystemClock};
pub use notify::{NoopNotifier, Notification, NotificationKind, Notifier, NotifyError, WebhookNotifier};
pub use storage::{RedbStore, Store, StoreError, StoreResult};
pub use types::*;
