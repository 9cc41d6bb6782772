//! Work-queue ordering.

use std::cmp::Ordering;

use crate::job::{Job, JobStatus, Priority};

/// Derives the display order of a work queue. Mutates no job.
///
/// Ordering, most significant first:
/// 1. priority (high, medium, low)
/// 2. status (in progress, then everything else, then completed)
/// 3. unaccepted before accepted, between high-priority jobs only
/// 4. earliest due date
///
/// Jobs with equal keys keep their input order.
pub struct PriorityQueueView;

impl PriorityQueueView {
    pub fn status_rank(status: &JobStatus) -> u8 {
        match status {
            JobStatus::InProgress => 0,
            JobStatus::Completed { .. } => 2,
            _ => 1,
        }
    }

    /// Acceptance only separates high-priority jobs. A job downgraded after
    /// acceptance keeps its flag but sorts by due date.
    fn acceptance_rank(job: &Job) -> bool {
        job.priority == Priority::High && job.accepted()
    }

    pub fn compare(a: &Job, b: &Job) -> Ordering {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| Self::status_rank(&a.status).cmp(&Self::status_rank(&b.status)))
            .then_with(|| Self::acceptance_rank(a).cmp(&Self::acceptance_rank(b)))
            .then_with(|| a.due_date.cmp(&b.due_date))
    }

    /// Sorts in place. `sort_by` is stable.
    pub fn sort(jobs: &mut [Job]) {
        jobs.sort_by(Self::compare);
    }

    pub fn ordered(mut jobs: Vec<Job>) -> Vec<Job> {
        Self::sort(&mut jobs);
        jobs
    }
}
