//! Cross-context change watcher.
//!
//! Polls the shared `job_changes` log and replays entries written by other
//! execution contexts into the local [`ChangeBus`] as remote changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::db::{change_repo, DatabaseError};

use super::change_bus::{ChangeBus, ChangeScope, JobChange};

/// Maximum number of log entries read per query.
const POLL_BATCH: u32 = 256;

/// Log entries kept when no retention is configured.
pub const DEFAULT_CHANGE_LOG_RETENTION: u64 = 10_000;

/// The log is pruned once every this many polls.
const PRUNE_EVERY_POLLS: u64 = 100;

/// Watches the change log on behalf of one execution context.
pub struct ChangeWatcher {
    bus: Arc<ChangeBus>,
    /// Highest log sequence already processed.
    last_seen: Mutex<i64>,
    interval: Duration,
    /// Number of newest log entries left in place when pruning.
    retention: u64,
    /// Shutdown flag.
    shutdown: Arc<AtomicBool>,
}

impl ChangeWatcher {
    /// Creates a watcher positioned at the current head of the log, so only
    /// changes written after this call are replayed.
    pub fn new(bus: Arc<ChangeBus>, interval: Duration) -> Result<Self, DatabaseError> {
        let head = change_repo::head(bus.database())?;
        Ok(Self {
            bus,
            last_seen: Mutex::new(head),
            interval,
            retention: DEFAULT_CHANGE_LOG_RETENTION,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_retention(mut self, retention: u64) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn retention(&self) -> u64 {
        self.retention
    }

    /// Trims the shared log to the newest `retention` entries.
    pub fn prune(&self) -> Result<usize, DatabaseError> {
        change_repo::prune(self.bus.database(), self.retention)
    }

    /// Reads any new log entries and dispatches those from other contexts.
    /// Returns the number of changes dispatched.
    pub fn poll_once(&self) -> Result<usize, DatabaseError> {
        let mut last_seen = self.last_seen.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        let mut dispatched = 0;

        loop {
            let rows = change_repo::since(self.bus.database(), *last_seen, POLL_BATCH)?;
            let exhausted = rows.len() < POLL_BATCH as usize;

            for row in rows {
                *last_seen = row.seq;
                if row.origin == self.bus.origin() {
                    continue;
                }
                self.bus.dispatch(JobChange {
                    job_id: row.job_id,
                    origin: row.origin,
                    seq: row.seq,
                    scope: ChangeScope::Remote,
                });
                dispatched += 1;
            }

            if exhausted {
                break;
            }
        }

        Ok(dispatched)
    }

    /// Polls until [`stop`](Self::stop) is called.
    ///
    /// This function blocks. Poll errors are logged and retried on the next tick.
    /// The log is pruned periodically along the way.
    pub fn watch(&self) {
        log::info!(
            "Started watching change log every {}ms",
            self.interval.as_millis()
        );

        let mut polls: u64 = 0;
        while !self.shutdown.load(Ordering::Relaxed) {
            match self.poll_once() {
                Ok(0) => {}
                Ok(n) => log::debug!("Replayed {} remote change(s)", n),
                Err(e) => log::error!("Change log poll failed: {}", e),
            }

            polls = polls.wrapping_add(1);
            if polls % PRUNE_EVERY_POLLS == 0 {
                match self.prune() {
                    Ok(0) => {}
                    Ok(n) => log::debug!("Pruned {} change log entries", n),
                    Err(e) => log::warn!("Change log prune failed: {}", e),
                }
            }
            std::thread::sleep(self.interval);
        }

        log::info!("Stopped watching change log");
    }

    /// Signals the watcher to stop.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Returns whether the watcher has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Runs a [`ChangeWatcher`] on a background thread.
pub struct BackgroundChangeWatcher {
    watcher: Arc<ChangeWatcher>,
    watch_handle: Option<std::thread::JoinHandle<()>>,
}

impl BackgroundChangeWatcher {
    pub fn new(bus: Arc<ChangeBus>, interval: Duration) -> Result<Self, DatabaseError> {
        Ok(Self::from_watcher(ChangeWatcher::new(bus, interval)?))
    }

    pub fn from_watcher(watcher: ChangeWatcher) -> Self {
        Self {
            watcher: Arc::new(watcher),
            watch_handle: None,
        }
    }

    /// Starts polling in a background thread. Calling twice is a no-op.
    pub fn start(&mut self) {
        if self.watch_handle.is_some() {
            return;
        }

        let watcher = Arc::clone(&self.watcher);
        self.watch_handle = Some(std::thread::spawn(move || watcher.watch()));
    }

    pub fn is_running(&self) -> bool {
        self.watch_handle.is_some()
    }

    /// Stops the watcher and waits for the thread to exit.
    pub fn stop(&mut self) {
        self.watcher.stop();
        if let Some(handle) = self.watch_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BackgroundChangeWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
