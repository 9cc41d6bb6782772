//! Wiring for one execution context.

use std::path::Path;
use std::sync::Arc;

use crate::broadcast::{
    BackgroundChangeWatcher, ChangeBus, ChangeWatcher, JobStore, NotificationBroadcaster,
};
use crate::config::EngineConfig;
use crate::db::{Database, DatabaseError};
use crate::error::{ConfigError, Result};
use crate::job::TechnicianRegistry;
use crate::lifecycle::JobLifecycle;
use crate::view::{LiveJobList, ViewFilter};

/// One independently running view of the shared store, such as a reporter
/// station or an admin dashboard.
///
/// Each context has its own connection, change bus and watcher. Contexts
/// never call into each other; they only meet in the database.
pub struct ExecutionContext {
    lifecycle: JobLifecycle,
    technicians: TechnicianRegistry,
    watcher: BackgroundChangeWatcher,
}

impl ExecutionContext {
    /// Opens the configured database and starts watching for changes made
    /// by other contexts.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let path = config
            .resolved_database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "No databasePath configured and no home directory found".to_string(),
            })?;
        Self::open_at(&path, config)
    }

    /// Like [`open`](Self::open) with an explicit database file.
    pub fn open_at(path: &Path, config: &EngineConfig) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self::with_database(db, config)?)
    }

    fn with_database(
        db: Database,
        config: &EngineConfig,
    ) -> std::result::Result<Self, DatabaseError> {
        let bus = Arc::new(ChangeBus::new(db.clone(), config.notification_capacity));
        let store = Arc::new(JobStore::new(Arc::clone(&bus)));
        let technicians = TechnicianRegistry::new(db);
        let lifecycle = JobLifecycle::new(
            store,
            Arc::new(technicians.clone()),
            NotificationBroadcaster::new(config.notification_capacity),
        )
        .with_due_offset(config.due_offset());

        let mut watcher = BackgroundChangeWatcher::from_watcher(
            ChangeWatcher::new(bus, config.change_poll_interval())?
                .with_retention(config.change_log_retention),
        );
        watcher.start();

        log::info!("Execution context {} ready", lifecycle.store().bus().origin());
        Ok(Self {
            lifecycle,
            technicians,
            watcher,
        })
    }

    pub fn lifecycle(&self) -> &JobLifecycle {
        &self.lifecycle
    }

    pub fn store(&self) -> &Arc<JobStore> {
        self.lifecycle.store()
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        self.store().bus()
    }

    pub fn technicians(&self) -> &TechnicianRegistry {
        &self.technicians
    }

    pub fn notifications(&self) -> &NotificationBroadcaster {
        self.lifecycle.notifications()
    }

    /// Creates a list that refreshes on local and remote changes.
    pub fn live_list(&self, filter: ViewFilter) -> LiveJobList {
        LiveJobList::new(Arc::clone(self.store()), filter)
    }

    /// Stops picking up changes from other contexts.
    pub fn shutdown(&mut self) {
        self.watcher.stop();
    }
}
