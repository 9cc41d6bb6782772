use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::job::{Actor, JobStatus, Priority};
use crate::lifecycle::{JobLifecycle, RestoredJob};

use super::{csv, ArchiveError, HEADER, IMPORTED_PHOTO_PLACEHOLDER};

/// Counts of what an import did with each row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Unknown ids recreated as completed jobs.
    pub created: usize,
    /// Known jobs moved to Completed.
    pub updated: usize,
    /// Known jobs that were already Completed.
    pub unchanged: usize,
    /// Rows that could not be applied.
    pub skipped: usize,
}

struct ImportRow {
    line: usize,
    id: String,
    title: String,
    location: String,
    priority: String,
    assigned_to: String,
    due_date: String,
    completion_date: String,
    has_before: bool,
    has_after: bool,
}

/// Imports an archive produced by [`export_completed`](super::export_completed).
///
/// Known ids only have their status set to Completed, through the regular
/// lifecycle path with the import actor. Unknown ids become new Completed
/// jobs whose photo slots hold a placeholder when the archive says `Yes`.
/// Photos are never reconstructed.
///
/// The whole archive is parsed before anything is written.
pub fn import_completed(
    lifecycle: &JobLifecycle,
    input: &str,
) -> Result<ImportSummary, ArchiveError> {
    let rows = parse_rows(input)?;
    let actor = Actor::system_import();
    let mut summary = ImportSummary::default();

    for row in rows {
        if row.id.is_empty() {
            log::warn!("Skipping archive line {}: empty ID", row.line);
            summary.skipped += 1;
            continue;
        }

        match lifecycle.store().get(&row.id)? {
            Some(job) => match job.status {
                JobStatus::Completed { .. } => summary.unchanged += 1,
                JobStatus::Unassigned => {
                    log::warn!(
                        "Skipping archive line {}: job {} is unassigned",
                        row.line,
                        row.id
                    );
                    summary.skipped += 1;
                }
                _ => {
                    lifecycle.complete(&row.id, &actor)?;
                    summary.updated += 1;
                }
            },
            None => {
                if row.assigned_to.is_empty() {
                    log::warn!(
                        "Skipping archive line {}: job {} has no assignee",
                        row.line,
                        row.id
                    );
                    summary.skipped += 1;
                    continue;
                }
                lifecycle.restore_completed(restored(row)?)?;
                summary.created += 1;
            }
        }
    }

    log::info!(
        "Archive import: {} created, {} updated, {} unchanged, {} skipped",
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.skipped
    );
    Ok(summary)
}

fn parse_rows(input: &str) -> Result<Vec<ImportRow>, ArchiveError> {
    let mut records = csv::parse(input)?.into_iter();

    let header = records.next().map(|r| r.fields).unwrap_or_default();
    let matches = header.len() == HEADER.len()
        && header.iter().zip(HEADER).all(|(found, want)| found.trim() == want);
    if !matches {
        return Err(ArchiveError::InvalidHeader {
            expected: HEADER.join(","),
            found: header.join(","),
        });
    }

    let mut rows = Vec::new();
    for record in records {
        let line = record.line;
        let Ok(fields) = <[String; 10]>::try_from(record.fields) else {
            return Err(ArchiveError::Malformed {
                line,
                reason: format!("expected {} fields", HEADER.len()),
            });
        };
        let [id, title, location, priority, _status, assigned_to, due_date, completion_date, before, after] =
            fields;

        rows.push(ImportRow {
            line,
            id: id.trim().to_string(),
            title,
            location,
            priority,
            assigned_to: assigned_to.trim().to_string(),
            due_date,
            completion_date,
            has_before: parse_yes_no(&before, line)?,
            has_after: parse_yes_no(&after, line)?,
        });
    }

    // Validate the fields a new record would need before anything is written.
    for row in &rows {
        if !row.id.is_empty() && !row.assigned_to.is_empty() {
            row.priority
                .parse::<Priority>()
                .map_err(|reason| ArchiveError::Malformed {
                    line: row.line,
                    reason,
                })?;
            parse_timestamp(&row.due_date, row.line, "DueDate")?;
            if !row.completion_date.trim().is_empty() {
                parse_timestamp(&row.completion_date, row.line, "CompletionDate")?;
            }
        }
    }

    Ok(rows)
}

fn restored(row: ImportRow) -> Result<RestoredJob, ArchiveError> {
    let priority = row
        .priority
        .parse::<Priority>()
        .map_err(|reason| ArchiveError::Malformed {
            line: row.line,
            reason,
        })?;
    let due_date = parse_timestamp(&row.due_date, row.line, "DueDate")?;
    let completed_at = if row.completion_date.trim().is_empty() {
        Utc::now()
    } else {
        parse_timestamp(&row.completion_date, row.line, "CompletionDate")?
    };
    let placeholder = |present: bool| present.then(|| IMPORTED_PHOTO_PLACEHOLDER.to_string());

    Ok(RestoredJob {
        id: row.id,
        title: row.title,
        location: row.location,
        priority,
        technician_id: row.assigned_to,
        due_date,
        completed_at,
        before_photo: placeholder(row.has_before),
        after_photo: placeholder(row.has_after),
    })
}

fn parse_yes_no(value: &str, line: usize) -> Result<bool, ArchiveError> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("yes") => Ok(true),
        v if v.eq_ignore_ascii_case("no") || v.is_empty() => Ok(false),
        other => Err(ArchiveError::Malformed {
            line,
            reason: format!("expected Yes or No, found '{}'", other),
        }),
    }
}

fn parse_timestamp(value: &str, line: usize, column: &str) -> Result<DateTime<Utc>, ArchiveError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ArchiveError::Malformed {
            line,
            reason: format!("invalid {} '{}': {}", column, value, e),
        })
}
