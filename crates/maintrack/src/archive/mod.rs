//! Bulk export of completed jobs and the inverse import.

pub mod csv;
pub mod export;
pub mod import;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::lifecycle::LifecycleError;

pub use export::export_completed;
pub use import::{import_completed, ImportSummary};

/// Column header shared by export and import.
pub const HEADER: [&str; 10] = [
    "ID",
    "Title",
    "Location",
    "Priority",
    "Status",
    "AssignedTo",
    "DueDate",
    "CompletionDate",
    "HasBeforePhoto",
    "HasAfterPhoto",
];

/// Image reference stored in a photo slot for imported rows marked `Yes`.
/// It stands for "a photo existed" and never points at real image data.
pub const IMPORTED_PHOTO_PLACEHOLDER: &str = "imported-placeholder";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Invalid archive header: expected {expected}, found {found}")]
    InvalidHeader { expected: String, found: String },

    #[error("Malformed archive at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Import failed: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Archive read failed: {0}")]
    Persistence(#[from] DatabaseError),
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}
