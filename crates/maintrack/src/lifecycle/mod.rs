//! Job lifecycle: the state machine plus its completion gate and
//! assignment routing.

pub mod engine;
pub mod error;
pub mod photo_gate;
pub mod router;

pub use engine::{AcceptOutcome, JobLifecycle, PhotoUpdate, RestoredJob, DEFAULT_DUE_OFFSET_HOURS};
pub use error::LifecycleError;
pub use photo_gate::{DenyReason, GateDecision, PhotoGate};
pub use router::{AssignmentRouter, RoutingDecision};
