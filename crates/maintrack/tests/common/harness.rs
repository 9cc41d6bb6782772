//! Test harness for isolated multi-context execution.
//!
//! Every harness owns a temporary directory with one SQLite file. Each call
//! to [`TestHarness::context`] opens an independent execution context on that
//! file, the way a reporter station and an admin dashboard would.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use maintrack::{EngineConfig, ExecutionContext};

use super::builders::{contractor, in_house};

pub struct TestHarness {
    /// Keeps the database directory alive for the harness lifetime.
    temp_dir: TempDir,
    pub db_path: PathBuf,
    pub config: EngineConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("maintrack.db");
        let config = EngineConfig {
            database_path: Some(db_path.clone()),
            change_poll_interval_ms: 5,
            ..Default::default()
        };

        Self {
            temp_dir,
            db_path,
            config,
        }
    }

    /// Opens a new execution context on the shared database.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::open(&self.config).expect("Failed to open execution context")
    }

    /// Opens a context and registers the standard technician fixtures.
    pub fn context_with_technicians(&self) -> ExecutionContext {
        let ctx = self.context();
        ctx.technicians()
            .register(&contractor())
            .expect("Failed to register contractor");
        ctx.technicians()
            .register(&in_house())
            .expect("Failed to register in-house technician");
        ctx
    }
}

/// Polls `condition` until it holds or two seconds pass.
pub fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
