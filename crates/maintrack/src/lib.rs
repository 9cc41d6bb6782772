pub mod archive;
pub mod broadcast;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod job;
pub mod lifecycle;
pub mod telemetry;
pub mod view;

pub use archive::{export_completed, import_completed, ArchiveError, ImportSummary};
pub use broadcast::{
    BackgroundChangeWatcher, ChangeBus, ChangeScope, ChangeWatcher, JobChange, JobStore,
    Notification, NotificationBroadcaster, NotificationChannel, NotificationKind,
};
pub use config::{load_config, EngineConfig};
pub use context::ExecutionContext;
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, MaintrackError, Result};
pub use job::{
    Actor, Capability, Job, JobStatus, NewJob, PhotoSlot, Priority, Technician,
    TechnicianDirectory, TechnicianRegistry, TechnicianRole,
};
pub use lifecycle::{
    AcceptOutcome, AssignmentRouter, GateDecision, JobLifecycle, LifecycleError, PhotoGate,
    PhotoUpdate,
};
pub use telemetry::{LogFormat, TelemetryConfig, TelemetryError};
pub use view::{LiveJobList, PriorityQueueView, ViewFilter};
