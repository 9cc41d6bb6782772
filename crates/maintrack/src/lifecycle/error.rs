use thiserror::Error;

use crate::db::DatabaseError;

/// Errors returned by lifecycle operations.
///
/// A failed operation never writes to the store.
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Job '{job_id}' not found")]
    NotFound { job_id: String },

    #[error("Cannot {action} job '{job_id}' while it is {from}")]
    InvalidTransition {
        job_id: String,
        from: String,
        action: &'static str,
    },

    #[error("Job '{job_id}' needs an after photo before it can be completed")]
    AfterPhotoRequired { job_id: String },

    #[error("Invalid state for job '{job_id}': {reason}")]
    InvalidState { job_id: String, reason: String },

    #[error("Technician '{technician_id}' is not registered")]
    UnknownTechnician { technician_id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] DatabaseError),
}

impl LifecycleError {
    /// True when the caller can correct the request and try again.
    /// Persistence failures are left for the user to retry by hand.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, LifecycleError::Persistence(_))
    }

    /// True for a completion gate denial.
    pub fn needs_after_photo(&self) -> bool {
        matches!(self, LifecycleError::AfterPhotoRequired { .. })
    }
}
