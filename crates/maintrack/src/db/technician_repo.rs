//! Technician repository: reads and writes the `technicians` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw technician row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnicianRow {
    pub id: String,
    pub name: String,
    pub role: String,
}

impl TechnicianRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            role: row.get("role")?,
        })
    }
}

/// Inserts or replaces a technician.
pub fn upsert(db: &Database, technician: &TechnicianRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO technicians (id, name, role) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, role = excluded.role",
            params![technician.id, technician.name, technician.role],
        )?;
        Ok(())
    })
}

/// Finds a technician by id.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<TechnicianRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM technicians WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], TechnicianRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all technicians ordered by name.
pub fn list(db: &Database) -> Result<Vec<TechnicianRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM technicians ORDER BY name ASC, id ASC")?;
        let rows = stmt
            .query_map([], TechnicianRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
