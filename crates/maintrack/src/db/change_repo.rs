//! Change log repository: the append-only `job_changes` table.
//!
//! Every committed job write appends one row here. Other execution contexts
//! sharing the database poll this table to learn that something changed.
//! Only the newest entries are retained; see [`prune`].

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// One entry in the change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRow {
    pub seq: i64,
    pub job_id: String,
    /// Identifier of the execution context that wrote the change.
    pub origin: String,
    pub changed_at: String,
}

impl ChangeRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            seq: row.get("seq")?,
            job_id: row.get("job_id")?,
            origin: row.get("origin")?,
            changed_at: row.get("changed_at")?,
        })
    }
}

/// Appends a change entry and returns its sequence number.
pub fn append_in(
    conn: &Connection,
    job_id: &str,
    origin: &str,
    changed_at: &str,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO job_changes (job_id, origin, changed_at) VALUES (?1, ?2, ?3)",
        params![job_id, origin, changed_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Returns the highest sequence number written so far, or 0.
pub fn head(db: &Database) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM job_changes",
            [],
            |r| r.get(0),
        )?;
        Ok(seq)
    })
}

/// Returns up to `limit` entries with `seq` strictly greater than `after`.
pub fn since(db: &Database, after: i64, limit: u32) -> Result<Vec<ChangeRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM job_changes WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![after, limit], ChangeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Deletes every entry except the newest `keep`. Returns the number deleted.
///
/// `seq` is `AUTOINCREMENT`, so pruning never causes a sequence number to be
/// reused. A reader lagging more than `keep` entries behind skips the gap.
pub fn prune(db: &Database, keep: u64) -> Result<usize, DatabaseError> {
    let keep = i64::try_from(keep.max(1)).unwrap_or(i64::MAX);
    db.with_conn(|conn| {
        let deleted = conn.execute(
            "DELETE FROM job_changes WHERE seq <= (SELECT COALESCE(MAX(seq), 0) FROM job_changes) - ?1",
            params![keep],
        )?;
        Ok(deleted)
    })
}
