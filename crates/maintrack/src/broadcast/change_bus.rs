//! Change bus: tells every interested view that a job changed.
//!
//! Two domains are served. In-context observers are called synchronously
//! (or receive from a tokio broadcast channel). Other execution contexts
//! sharing the same database learn about changes from the `job_changes`
//! log, which [`ChangeWatcher`](super::change_watcher::ChangeWatcher) polls.
//!
//! Events never carry job state. Observers must re-read the store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::db::{change_repo, Database, DatabaseError};

/// Where a change was first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeScope {
    /// Written by this execution context.
    Local,
    /// Written by another context and picked up from the change log.
    Remote,
}

/// "Job `job_id` changed, re-read it."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobChange {
    pub job_id: String,
    /// Execution context that wrote the change.
    pub origin: String,
    /// Position in the change log.
    pub seq: i64,
    pub scope: ChangeScope,
}

/// Handle returned by [`ChangeBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

type ChangeHandler = Arc<dyn Fn(&JobChange) + Send + Sync>;

/// Per-context change bus.
pub struct ChangeBus {
    db: Database,
    /// Unique id of this execution context.
    origin: String,
    handlers: RwLock<BTreeMap<SubscriptionHandle, ChangeHandler>>,
    next_handle: AtomicU64,
    sender: broadcast::Sender<JobChange>,
}

impl ChangeBus {
    /// Creates a bus for a new execution context over `db`.
    pub fn new(db: Database, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            db,
            origin: uuid::Uuid::new_v4().to_string(),
            handlers: RwLock::new(BTreeMap::new()),
            next_handle: AtomicU64::new(1),
            sender,
        }
    }

    /// Returns the id identifying this execution context in the change log.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Registers a synchronous observer.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&JobChange) + Send + Sync + 'static,
    {
        let handle = SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        let mut handlers = match self.handlers.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Change bus handler lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        handlers.insert(handle, Arc::new(handler));
        handle
    }

    /// Removes an observer. Returns false if the handle was unknown.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut handlers = match self.handlers.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Change bus handler lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        handlers.remove(&handle).is_some()
    }

    /// Creates a channel receiver for async consumers.
    pub fn subscribe_channel(&self) -> broadcast::Receiver<JobChange> {
        self.sender.subscribe()
    }

    /// Number of registered synchronous observers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or_else(|poisoned| {
            log::warn!("Change bus handler lock was poisoned, recovering");
            poisoned.into_inner().len()
        })
    }

    /// Signals that `job_id` changed, in this context and all others.
    ///
    /// The change is appended to the shared log first; in-context observers
    /// only run once that append is durable.
    pub fn notify(&self, job_id: &str) -> Result<JobChange, DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let seq = self
            .db
            .with_conn(|conn| change_repo::append_in(conn, job_id, &self.origin, &now))?;
        let change = JobChange {
            job_id: job_id.to_string(),
            origin: self.origin.clone(),
            seq,
            scope: ChangeScope::Local,
        };
        self.dispatch(change.clone());
        Ok(change)
    }

    /// Delivers an already-logged change to this context's observers.
    pub fn dispatch(&self, change: JobChange) {
        // Snapshot so observers may (un)subscribe while being called.
        let handlers: Vec<ChangeHandler> = match self.handlers.read() {
            Ok(g) => g.values().cloned().collect(),
            Err(poisoned) => {
                log::warn!("Change bus handler lock was poisoned, recovering");
                poisoned.into_inner().values().cloned().collect()
            }
        };

        log::debug!(
            "Dispatching {:?} change for job {} to {} observer(s)",
            change.scope,
            change.job_id,
            handlers.len()
        );

        for handler in handlers {
            handler(&change);
        }

        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn bus() -> ChangeBus {
        ChangeBus::new(Database::open_in_memory().unwrap(), 16)
    }

    #[test]
    fn test_origin_is_unique_per_bus() {
        let db = Database::open_in_memory().unwrap();
        let a = ChangeBus::new(db.clone(), 4);
        let b = ChangeBus::new(db, 4);
        assert_ne!(a.origin(), b.origin());
    }

    #[test]
    fn test_notify_reaches_handler_and_channel() {
        let bus = bus();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        bus.subscribe(move |change| seen_clone.lock().unwrap().push(change.job_id.clone()));
        let mut rx = bus.subscribe_channel();

        let change = bus.notify("job-1").unwrap();

        assert_eq!(change.scope, ChangeScope::Local);
        assert_eq!(change.origin, bus.origin());
        assert_eq!(*seen.lock().unwrap(), vec!["job-1".to_string()]);
        assert_eq!(rx.try_recv().unwrap().job_id, "job-1");
    }

    #[test]
    fn test_notify_appends_to_change_log() {
        let bus = bus();
        let change = bus.notify("job-9").unwrap();

        let rows = change_repo::since(bus.database(), 0, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].seq, change.seq);
        assert_eq!(rows[0].origin, bus.origin());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = bus();
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = Arc::clone(&count);
        let handle = bus.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        bus.notify("a").unwrap();
        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));
        bus.notify("b").unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Arc::new(bus());
        let slot: Arc<Mutex<Option<SubscriptionHandle>>> = Arc::new(Mutex::new(None));

        let bus_clone = Arc::clone(&bus);
        let slot_clone = Arc::clone(&slot);
        let handle = bus.subscribe(move |_| {
            if let Some(h) = slot_clone.lock().unwrap().take() {
                bus_clone.unsubscribe(h);
            }
        });
        *slot.lock().unwrap() = Some(handle);

        bus.notify("job-1").unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_notify_without_observers() {
        let bus = bus();
        assert!(bus.notify("nobody-listens").is_ok());
    }
}
