//! Process-wide tracing setup.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_directive: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plain,
            default_directive: "info".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("A global tracing subscriber is already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("A global logger is already installed: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// Installs the global subscriber and routes `log` records into it.
///
/// Can succeed once per process.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json()),
        )?,
        LogFormat::Plain => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer()),
        )?,
    }

    tracing_log::LogTracer::init()?;
    Ok(())
}
