//! Technicians and the registry used to resolve them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::technician_repo::{self, TechnicianRow};
use crate::db::{Database, DatabaseError};

/// Whether a technician is in-house or an outside contractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicianRole {
    MaintenanceTech,
    Contractor,
}

impl TechnicianRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicianRole::MaintenanceTech => "maintenance_tech",
            TechnicianRole::Contractor => "contractor",
        }
    }
}

impl std::fmt::Display for TechnicianRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechnicianRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maintenance_tech" => Ok(TechnicianRole::MaintenanceTech),
            "contractor" => Ok(TechnicianRole::Contractor),
            other => Err(format!("unknown technician role '{}'", other)),
        }
    }
}

/// A person jobs can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technician {
    pub id: String,
    pub name: String,
    pub role: TechnicianRole,
}

impl Technician {
    pub fn new(id: &str, name: &str, role: TechnicianRole) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role,
        }
    }

    fn from_row(row: &TechnicianRow) -> Result<Self, DatabaseError> {
        let role = row
            .role
            .parse()
            .map_err(|reason| DatabaseError::CorruptRecord {
                id: row.id.clone(),
                reason,
            })?;
        Ok(Self {
            id: row.id.clone(),
            name: row.name.clone(),
            role,
        })
    }
}

/// Read-only lookup of technicians by id.
pub trait TechnicianDirectory: Send + Sync {
    fn lookup(&self, technician_id: &str) -> Result<Option<Technician>, DatabaseError>;
}

/// Technician registry backed by the `technicians` table.
///
/// The engine only reads from it; registration is the job of whichever
/// collaborator manages staff records.
#[derive(Clone)]
pub struct TechnicianRegistry {
    db: Database,
}

impl TechnicianRegistry {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Inserts or replaces a technician record.
    pub fn register(&self, technician: &Technician) -> Result<(), DatabaseError> {
        technician_repo::upsert(
            &self.db,
            &TechnicianRow {
                id: technician.id.clone(),
                name: technician.name.clone(),
                role: technician.role.as_str().to_string(),
            },
        )
    }

    /// Returns every registered technician ordered by name.
    pub fn list(&self) -> Result<Vec<Technician>, DatabaseError> {
        technician_repo::list(&self.db)?
            .iter()
            .map(Technician::from_row)
            .collect()
    }
}

impl TechnicianDirectory for TechnicianRegistry {
    fn lookup(&self, technician_id: &str) -> Result<Option<Technician>, DatabaseError> {
        technician_repo::find_by_id(&self.db, technician_id)?
            .as_ref()
            .map(Technician::from_row)
            .transpose()
    }
}
