use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::broadcast::DEFAULT_CHANGE_LOG_RETENTION;
use crate::db::default_database_path;
use crate::lifecycle::DEFAULT_DUE_OFFSET_HOURS;

/// Engine settings shared by every execution context on one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub version: String,

    /// Falls back to `~/.maintrack/data/maintrack.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    #[serde(default = "default_due_offset_hours")]
    pub due_offset_hours: u64,

    #[serde(default = "default_change_poll_interval_ms")]
    pub change_poll_interval_ms: u64,

    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Newest change log entries kept in the shared database.
    #[serde(default = "default_change_log_retention")]
    pub change_log_retention: u64,
}

fn default_due_offset_hours() -> u64 {
    DEFAULT_DUE_OFFSET_HOURS as u64
}

fn default_change_poll_interval_ms() -> u64 {
    250
}

fn default_notification_capacity() -> usize {
    100
}

fn default_change_log_retention() -> u64 {
    DEFAULT_CHANGE_LOG_RETENTION
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            due_offset_hours: default_due_offset_hours(),
            change_poll_interval_ms: default_change_poll_interval_ms(),
            notification_capacity: default_notification_capacity(),
            change_log_retention: default_change_log_retention(),
        }
    }
}

impl EngineConfig {
    /// Configured database path, or the per-user default.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(default_database_path)
    }

    /// Report-to-due offset. Out-of-range values fall back to the default.
    pub fn due_offset(&self) -> chrono::Duration {
        i64::try_from(self.due_offset_hours)
            .ok()
            .and_then(chrono::Duration::try_hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_DUE_OFFSET_HOURS))
    }

    pub fn change_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.change_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.due_offset(), chrono::Duration::hours(168));
        assert_eq!(
            config.change_poll_interval(),
            std::time::Duration::from_millis(250)
        );
        assert_eq!(config.notification_capacity, 100);
        assert_eq!(config.change_log_retention, 10_000);
        assert!(config
            .resolved_database_path()
            .unwrap()
            .ends_with("maintrack.db"));
    }

    #[test]
    fn test_explicit_database_path_wins() {
        let config = EngineConfig {
            database_path: Some(PathBuf::from("/tmp/jobs.db")),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_database_path(),
            Some(PathBuf::from("/tmp/jobs.db"))
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(EngineConfig::default()).unwrap();
        assert_eq!(json["dueOffsetHours"], 168);
        assert_eq!(json["changePollIntervalMs"], 250);
        assert!(json.get("databasePath").is_none());
    }
}
