//! Job store with persistent database storage.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::broadcast::change_bus::{ChangeBus, ChangeScope, JobChange};
use crate::db::job_repo::{self, JobRow};
use crate::db::{change_repo, Database, DatabaseError};
use crate::job::{Assignment, Comment, Job, JobStatus, Photos, Priority, TechnicianRole};

// ─── Helpers ────────────────────────────────────────────────────────────────

const STATUS_NAMES: &[&str] = &[
    "unassigned",
    "assigned",
    "in_progress",
    "paused",
    "on_hold",
    "completed",
];

fn corrupt(id: &str, reason: impl Into<String>) -> DatabaseError {
    DatabaseError::CorruptRecord {
        id: id.to_string(),
        reason: reason.into(),
    }
}

fn parse_timestamp(s: &str, job_id: &str, field: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(job_id, format!("invalid {} '{}': {}", field, s, e)))
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_status(row: &JobRow) -> Result<JobStatus, DatabaseError> {
    let status = match row.status.as_str() {
        "unassigned" => JobStatus::Unassigned,
        "assigned" => JobStatus::Assigned,
        "in_progress" => JobStatus::InProgress,
        "on_hold" => JobStatus::OnHold,
        "paused" => {
            let (Some(at), Some(reason)) = (&row.paused_at, &row.paused_reason) else {
                return Err(corrupt(&row.id, "paused job without pause timestamp or reason"));
            };
            JobStatus::Paused {
                at: parse_timestamp(at, &row.id, "paused_at")?,
                reason: reason.clone(),
            }
        }
        "completed" => {
            let Some(at) = &row.completed_at else {
                return Err(corrupt(&row.id, "completed job without completion timestamp"));
            };
            JobStatus::Completed {
                at: parse_timestamp(at, &row.id, "completed_at")?,
            }
        }
        other => return Err(corrupt(&row.id, format!("unknown status '{}'", other))),
    };
    Ok(status)
}

fn parse_assignment(row: &JobRow) -> Result<Option<Assignment>, DatabaseError> {
    let Some(technician_id) = &row.assigned_to else {
        return Ok(None);
    };
    let role: TechnicianRole = row
        .assigned_role
        .as_deref()
        .ok_or_else(|| corrupt(&row.id, "assignee without role"))?
        .parse()
        .map_err(|reason: String| corrupt(&row.id, reason))?;
    Ok(Some(Assignment {
        technician_id: technician_id.clone(),
        role,
        email_sent: row.email_sent,
        accepted: row.accepted,
    }))
}

/// Decodes a row into a job, rejecting anything that breaks an invariant.
fn job_from_row(row: &JobRow) -> Result<Job, DatabaseError> {
    let priority: Priority = row
        .priority
        .parse()
        .map_err(|reason: String| corrupt(&row.id, reason))?;
    let comments: Vec<Comment> = serde_json::from_str(&row.comments)
        .map_err(|e| corrupt(&row.id, format!("invalid comments: {}", e)))?;

    let job = Job {
        id: row.id.clone(),
        title: row.title.clone(),
        description: row.description.clone(),
        location: row.location.clone(),
        priority,
        status: parse_status(row)?,
        assignment: parse_assignment(row)?,
        photos: Photos::from_parts(
            row.photo_reporter.clone(),
            row.photo_before.clone(),
            row.photo_after.clone(),
        ),
        comments,
        report_date: parse_timestamp(&row.report_date, &row.id, "report_date")?,
        due_date: parse_timestamp(&row.due_date, &row.id, "due_date")?,
    };

    job.check_invariants().map_err(|reason| corrupt(&row.id, reason))?;
    Ok(job)
}

fn job_to_row(job: &Job, updated_at: DateTime<Utc>) -> Result<JobRow, DatabaseError> {
    job.check_invariants()
        .map_err(|reason| DatabaseError::InvariantViolation {
            id: job.id.clone(),
            reason,
        })?;

    Ok(JobRow {
        id: job.id.clone(),
        title: job.title.clone(),
        description: job.description.clone(),
        location: job.location.clone(),
        priority: job.priority.as_str().to_string(),
        status: job.status.name().to_string(),
        assigned_to: job.assigned_to().map(str::to_string),
        assigned_role: job.assigned_role().map(|r| r.as_str().to_string()),
        email_sent: job.email_sent(),
        accepted: job.accepted(),
        paused_at: job.paused_at().map(format_timestamp),
        paused_reason: job.paused_reason().map(str::to_string),
        completed_at: job.completed_at().map(format_timestamp),
        comments: serde_json::to_string(&job.comments)?,
        photo_reporter: job.photos.reporter().map(str::to_string),
        photo_before: job.photos.before().map(str::to_string),
        photo_after: job.photos.after().map(str::to_string),
        report_date: format_timestamp(job.report_date),
        due_date: format_timestamp(job.due_date),
        updated_at: format_timestamp(updated_at),
    })
}

// ─── JobStore ───────────────────────────────────────────────────────────────

/// Canonical job collection for one execution context.
///
/// Every write replaces the whole record and appends to the change log in
/// the same transaction. Only after the commit are in-context observers
/// told. There is no version check: concurrent writers from different
/// contexts resolve as last-writer-wins on the whole record.
pub struct JobStore {
    db: Database,
    bus: Arc<ChangeBus>,
}

impl JobStore {
    /// Creates a store that signals through `bus`. Both share `bus`'s database.
    pub fn new(bus: Arc<ChangeBus>) -> Self {
        Self {
            db: bus.database().clone(),
            bus,
        }
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns a job by id, or `None` if it does not exist.
    pub fn get(&self, job_id: &str) -> Result<Option<Job>, DatabaseError> {
        job_repo::find_by_id(&self.db, job_id)?
            .as_ref()
            .map(job_from_row)
            .transpose()
    }

    /// Returns all jobs matching `predicate`, oldest report first.
    pub fn list<P>(&self, predicate: P) -> Result<Vec<Job>, DatabaseError>
    where
        P: Fn(&Job) -> bool,
    {
        let mut jobs = Vec::new();
        for row in job_repo::list_all(&self.db)? {
            let job = job_from_row(&row)?;
            if predicate(&job) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// Returns every job.
    pub fn list_all(&self) -> Result<Vec<Job>, DatabaseError> {
        self.list(|_| true)
    }

    /// Writes the whole record, then signals the change.
    pub fn put(&self, job: &Job) -> Result<JobChange, DatabaseError> {
        self.write(job, job_repo::upsert_in)
    }

    /// Inserts a record that must not already exist, then signals the change.
    pub fn insert_new(&self, job: &Job) -> Result<JobChange, DatabaseError> {
        self.write(job, job_repo::insert_in)
    }

    fn write<W>(&self, job: &Job, write_row: W) -> Result<JobChange, DatabaseError>
    where
        W: FnOnce(&rusqlite::Connection, &JobRow) -> Result<(), DatabaseError>,
    {
        let now = Utc::now();
        let row = job_to_row(job, now)?;
        let changed_at = format_timestamp(now);
        let origin = self.bus.origin();

        let seq = self.db.with_transaction(|conn| {
            write_row(conn, &row)?;
            change_repo::append_in(conn, &row.id, origin, &changed_at)
        })?;

        log::debug!(
            "Stored job {} as {} (change #{})",
            job.id,
            job.status.name(),
            seq
        );

        let change = JobChange {
            job_id: job.id.clone(),
            origin: origin.to_string(),
            seq,
            scope: ChangeScope::Local,
        };
        self.bus.dispatch(change.clone());
        Ok(change)
    }

    /// Returns the number of jobs in every status.
    pub fn counts(&self) -> Result<BTreeMap<&'static str, u64>, DatabaseError> {
        let mut counts = BTreeMap::new();
        for name in STATUS_NAMES {
            counts.insert(*name, job_repo::count_by_status(&self.db, name)?);
        }
        Ok(counts)
    }
}
