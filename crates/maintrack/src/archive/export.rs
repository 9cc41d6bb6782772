use crate::broadcast::JobStore;
use crate::job::Job;

use super::{csv, yes_no, ArchiveError, HEADER};

/// Flattens every completed job into CSV. Reads only.
pub fn export_completed(store: &JobStore) -> Result<String, ArchiveError> {
    let jobs = store.list(Job::is_completed)?;

    let mut out = csv::write_record(&HEADER);
    out.push('\n');
    for job in &jobs {
        out.push_str(&csv::write_record(&row(job)));
        out.push('\n');
    }

    log::info!("Exported {} completed job(s)", jobs.len());
    Ok(out)
}

fn row(job: &Job) -> [String; 10] {
    [
        job.id.clone(),
        job.title.clone(),
        job.location.clone(),
        job.priority.to_string(),
        job.status.to_string(),
        job.assigned_to().unwrap_or_default().to_string(),
        job.due_date.to_rfc3339(),
        job.completed_at()
            .map(|at| at.to_rfc3339())
            .unwrap_or_default(),
        yes_no(job.photos.before().is_some()).to_string(),
        yes_no(job.photos.after().is_some()).to_string(),
    ]
}
