//! Job repository: CRUD operations for the `jobs` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// A raw job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub priority: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub assigned_role: Option<String>,
    pub email_sent: bool,
    pub accepted: bool,
    pub paused_at: Option<String>,
    pub paused_reason: Option<String>,
    pub completed_at: Option<String>,
    /// JSON array of comments.
    pub comments: String,
    pub photo_reporter: Option<String>,
    pub photo_before: Option<String>,
    pub photo_after: Option<String>,
    pub report_date: String,
    pub due_date: String,
    pub updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            location: row.get("location")?,
            priority: row.get("priority")?,
            status: row.get("status")?,
            assigned_to: row.get("assigned_to")?,
            assigned_role: row.get("assigned_role")?,
            email_sent: row.get("email_sent")?,
            accepted: row.get("accepted")?,
            paused_at: row.get("paused_at")?,
            paused_reason: row.get("paused_reason")?,
            completed_at: row.get("completed_at")?,
            comments: row.get("comments")?,
            photo_reporter: row.get("photo_reporter")?,
            photo_before: row.get("photo_before")?,
            photo_after: row.get("photo_after")?,
            report_date: row.get("report_date")?,
            due_date: row.get("due_date")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new job row on an open connection or transaction.
pub fn insert_in(conn: &Connection, job: &JobRow) -> Result<(), DatabaseError> {
    if exists_in(conn, &job.id)? {
        return Err(DatabaseError::Duplicate(job.id.clone()));
    }
    conn.execute(
        "INSERT INTO jobs (id, title, description, location, priority, status, assigned_to,
         assigned_role, email_sent, accepted, paused_at, paused_reason, completed_at, comments,
         photo_reporter, photo_before, photo_after, report_date, due_date, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
         ?18, ?19, ?20)",
        params![
            job.id,
            job.title,
            job.description,
            job.location,
            job.priority,
            job.status,
            job.assigned_to,
            job.assigned_role,
            job.email_sent,
            job.accepted,
            job.paused_at,
            job.paused_reason,
            job.completed_at,
            job.comments,
            job.photo_reporter,
            job.photo_before,
            job.photo_after,
            job.report_date,
            job.due_date,
            job.updated_at,
        ],
    )?;
    Ok(())
}

/// Writes the whole row, inserting it if missing. Every column except `id`
/// is overwritten; there is no field-level merge.
pub fn upsert_in(conn: &Connection, job: &JobRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO jobs (id, title, description, location, priority, status, assigned_to,
         assigned_role, email_sent, accepted, paused_at, paused_reason, completed_at, comments,
         photo_reporter, photo_before, photo_after, report_date, due_date, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
         ?18, ?19, ?20)
         ON CONFLICT(id) DO UPDATE SET
           title=excluded.title, description=excluded.description,
           location=excluded.location, priority=excluded.priority, status=excluded.status,
           assigned_to=excluded.assigned_to, assigned_role=excluded.assigned_role,
           email_sent=excluded.email_sent, accepted=excluded.accepted,
           paused_at=excluded.paused_at, paused_reason=excluded.paused_reason,
           completed_at=excluded.completed_at, comments=excluded.comments,
           photo_reporter=excluded.photo_reporter, photo_before=excluded.photo_before,
           photo_after=excluded.photo_after, report_date=excluded.report_date,
           due_date=excluded.due_date, updated_at=excluded.updated_at",
        params![
            job.id,
            job.title,
            job.description,
            job.location,
            job.priority,
            job.status,
            job.assigned_to,
            job.assigned_role,
            job.email_sent,
            job.accepted,
            job.paused_at,
            job.paused_reason,
            job.completed_at,
            job.comments,
            job.photo_reporter,
            job.photo_before,
            job.photo_after,
            job.report_date,
            job.due_date,
            job.updated_at,
        ],
    )?;
    Ok(())
}

/// Returns true if a job with `id` exists.
pub fn exists_in(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM jobs WHERE id = ?1", params![id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns every job, oldest report first.
pub fn list_all(db: &Database) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM jobs ORDER BY report_date ASC, id ASC")?;
        let rows = stmt
            .query_map([], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Counts jobs with the given status.
pub fn count_by_status(db: &Database, status: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE status = ?1",
            params![status],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
