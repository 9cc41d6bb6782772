//! Global subscriber installation.

use maintrack::telemetry::{init, LogFormat, TelemetryConfig};
use serial_test::serial;

#[test]
#[serial]
fn test_init_succeeds_once() {
    let config = TelemetryConfig {
        format: LogFormat::Json,
        default_directive: "maintrack=debug".to_string(),
    };

    init(&config).unwrap();
    log::info!("routed through the log bridge");
    tracing::info!("emitted directly");

    assert!(init(&TelemetryConfig::default()).is_err());
}
