//! Completion gate on photographic evidence.

use crate::job::{Actor, Job};

use super::error::LifecycleError;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    AfterPhotoRequired,
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    /// Converts a denial into the matching lifecycle error.
    pub fn into_result(self, job_id: &str) -> Result<(), LifecycleError> {
        match self {
            GateDecision::Allow => Ok(()),
            GateDecision::Deny(DenyReason::AfterPhotoRequired) => {
                Err(LifecycleError::AfterPhotoRequired {
                    job_id: job_id.to_string(),
                })
            }
        }
    }
}

/// Decides whether a job may move into Completed.
///
/// Evaluated only at the moment of the transition. The decision is never
/// stored on the job.
pub struct PhotoGate;

impl PhotoGate {
    pub fn allow_complete(job: &Job, actor: &Actor) -> GateDecision {
        if job.photos.after().is_some() || actor.can_override_photo_gate() {
            GateDecision::Allow
        } else {
            GateDecision::Deny(DenyReason::AfterPhotoRequired)
        }
    }
}
