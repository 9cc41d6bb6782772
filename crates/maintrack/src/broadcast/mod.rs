//! Store and broadcasting modules.
//!
//! The job store persists records; the change bus and watcher keep every
//! execution context's views in step with it; the notification broadcaster
//! carries simulated technician notices.

pub mod change_bus;
pub mod change_watcher;
pub mod job_store;
pub mod notifications;

pub use change_bus::{ChangeBus, ChangeScope, JobChange, SubscriptionHandle};
pub use change_watcher::{BackgroundChangeWatcher, ChangeWatcher, DEFAULT_CHANGE_LOG_RETENTION};
pub use job_store::JobStore;
pub use notifications::{
    Notification, NotificationBroadcaster, NotificationChannel, NotificationKind,
};
