//! Job lists that follow the store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::broadcast::{JobStore, SubscriptionHandle};
use crate::db::DatabaseError;
use crate::job::Job;

use super::priority_queue::PriorityQueueView;

/// Which jobs a view shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewFilter {
    All,
    AssignedTo(String),
    Unassigned,
    /// Jobs whose status name matches, e.g. `"in_progress"`.
    Status(String),
}

impl ViewFilter {
    pub fn matches(&self, job: &Job) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::AssignedTo(id) => job.assigned_to() == Some(id.as_str()),
            ViewFilter::Unassigned => job.status.is_unassigned(),
            ViewFilter::Status(name) => job.status.name() == name,
        }
    }
}

/// A priority-ordered job list for one screen of one execution context.
///
/// Any change signal marks the list stale. The next [`jobs`](Self::jobs)
/// call re-reads the store; event payloads are never trusted.
pub struct LiveJobList {
    store: Arc<JobStore>,
    filter: ViewFilter,
    stale: Arc<AtomicBool>,
    cached: Mutex<Vec<Job>>,
    subscription: SubscriptionHandle,
}

impl LiveJobList {
    pub fn new(store: Arc<JobStore>, filter: ViewFilter) -> Self {
        let stale = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&stale);
        let subscription = store.bus().subscribe(move |_| {
            flag.store(true, Ordering::SeqCst);
        });

        Self {
            store,
            filter,
            stale,
            cached: Mutex::new(Vec::new()),
            subscription,
        }
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// True when a change arrived since the last read.
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Returns the current list, re-reading the store if anything changed.
    pub fn jobs(&self) -> Result<Vec<Job>, DatabaseError> {
        let mut cached = self.cached.lock().unwrap_or_else(|poisoned| {
            log::warn!("Live job list cache lock was poisoned, recovering");
            poisoned.into_inner()
        });

        if self.stale.swap(false, Ordering::SeqCst) {
            match self.store.list(|job| self.filter.matches(job)) {
                Ok(jobs) => *cached = PriorityQueueView::ordered(jobs),
                Err(e) => {
                    self.stale.store(true, Ordering::SeqCst);
                    return Err(e);
                }
            }
        }

        Ok(cached.clone())
    }
}

impl Drop for LiveJobList {
    fn drop(&mut self) {
        self.store.bus().unsubscribe(self.subscription);
    }
}
