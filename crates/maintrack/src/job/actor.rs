//! The party performing a lifecycle operation.

use serde::{Deserialize, Serialize};

/// What an actor is permitted to bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Standard,
    /// May complete a job without an after-photo.
    AdminOverride,
}

/// Identity plus capability of whoever triggers an operation.
///
/// The capability is only consulted at the moment of a transition and is
/// never persisted on the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub capability: Capability,
}

impl Actor {
    pub fn standard(id: &str) -> Self {
        Self {
            id: id.to_string(),
            capability: Capability::Standard,
        }
    }

    pub fn admin(id: &str) -> Self {
        Self {
            id: id.to_string(),
            capability: Capability::AdminOverride,
        }
    }

    /// Actor used when archived rows are re-imported.
    pub fn system_import() -> Self {
        Self::admin("system:import")
    }

    pub fn can_override_photo_gate(&self) -> bool {
        self.capability == Capability::AdminOverride
    }
}
