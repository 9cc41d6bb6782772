//! Job lifecycle state machine.
//!
//! ```text
//! Unassigned ─assign─▶ Assigned ─start─▶ InProgress ⇄ Paused
//!                                            │  ▲
//!                                       hold │  │ start
//!                                            ▼  │
//!                                          OnHold
//!
//! Assigned | InProgress | Paused | OnHold ─complete (gated)─▶ Completed
//! ```
//!
//! Every operation re-reads the job, validates against its current state,
//! mutates a copy and writes the whole record back. Nothing is written when
//! an operation fails.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info_span;

use crate::broadcast::{JobStore, Notification, NotificationBroadcaster, NotificationKind};
use crate::job::{
    Actor, Assignment, Comment, Job, JobStatus, NewJob, PhotoSlot, Photos, Priority, Technician,
    TechnicianDirectory, TechnicianRole,
};

use super::error::LifecycleError;
use super::photo_gate::PhotoGate;
use super::router::AssignmentRouter;

/// Default offset from report time to the derived due date.
pub const DEFAULT_DUE_OFFSET_HOURS: i64 = 168;

/// Result of [`JobLifecycle::accept`].
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    /// The acceptance flag was set and stored.
    Accepted(Job),
    /// Nothing to do; nothing was written.
    Unchanged(Job),
}

impl AcceptOutcome {
    pub fn job(&self) -> &Job {
        match self {
            AcceptOutcome::Accepted(job) | AcceptOutcome::Unchanged(job) => job,
        }
    }

    pub fn into_job(self) -> Job {
        match self {
            AcceptOutcome::Accepted(job) | AcceptOutcome::Unchanged(job) => job,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, AcceptOutcome::Accepted(_))
    }
}

/// Result of [`JobLifecycle::update_photo`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpdate {
    pub job: Job,
    /// Advisory: an after photo just landed on an in-progress job.
    pub ready_to_complete: bool,
}

/// A completed job restored from an archive.
#[derive(Debug, Clone)]
pub struct RestoredJob {
    pub id: String,
    pub title: String,
    pub location: String,
    pub priority: Priority,
    pub technician_id: String,
    pub due_date: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub before_photo: Option<String>,
    pub after_photo: Option<String>,
}

/// Applies every job mutation.
pub struct JobLifecycle {
    store: Arc<JobStore>,
    directory: Arc<dyn TechnicianDirectory>,
    notifications: NotificationBroadcaster,
    due_offset: Duration,
}

impl JobLifecycle {
    pub fn new(
        store: Arc<JobStore>,
        directory: Arc<dyn TechnicianDirectory>,
        notifications: NotificationBroadcaster,
    ) -> Self {
        Self {
            store,
            directory,
            notifications,
            due_offset: Duration::hours(DEFAULT_DUE_OFFSET_HOURS),
        }
    }

    /// Overrides the report-to-due offset used by [`report`](Self::report).
    pub fn with_due_offset(mut self, due_offset: Duration) -> Self {
        self.due_offset = due_offset;
        self
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn notifications(&self) -> &NotificationBroadcaster {
        &self.notifications
    }

    pub fn due_offset(&self) -> Duration {
        self.due_offset
    }

    // ─── Creation ───────────────────────────────────────────────────────────

    /// Opens a new unassigned job on behalf of a reporter.
    pub fn report(&self, request: NewJob) -> Result<Job, LifecycleError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(LifecycleError::Validation("job title is empty".to_string()));
        }

        let report_date = request.report_date.unwrap_or_else(Utc::now);
        let due_date = request
            .due_date
            .unwrap_or_else(|| report_date + self.due_offset);

        let job = Job {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: request.description,
            location: request.location,
            priority: request.priority.unwrap_or(Priority::Medium),
            status: JobStatus::Unassigned,
            assignment: None,
            photos: Photos::new(request.reporter_photo.filter(|r| !r.trim().is_empty())),
            comments: Vec::new(),
            report_date,
            due_date,
        };

        let _span = info_span!("lifecycle.report", job_id = %job.id).entered();
        self.store.insert_new(&job)?;
        log::info!("Reported job {} '{}'", job.id, job.title);
        Ok(job)
    }

    // ─── Transitions ────────────────────────────────────────────────────────

    /// Assigns an unassigned job and announces it on the routed channel.
    pub fn assign(
        &self,
        job_id: &str,
        technician_id: &str,
        priority: Priority,
    ) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.assign", job_id = %job_id, technician_id = %technician_id)
            .entered();

        let mut job = self.load(job_id)?;
        if !job.status.is_unassigned() {
            return Err(invalid_transition(&job, "assign"));
        }
        let technician = self.technician(technician_id)?;
        let route = AssignmentRouter::route(&job, &technician);

        job.priority = priority;
        job.assignment = Some(Assignment {
            technician_id: technician.id.clone(),
            role: technician.role,
            email_sent: route.initial_email_sent,
            accepted: false,
        });
        job.status = JobStatus::Assigned;
        let job = self.commit(job)?;

        self.notifications.send(Notification::new(
            &job.id,
            &technician.id,
            route.channel,
            NotificationKind::Assigned,
        ));
        log::info!(
            "Assigned job {} to {} ({}) at {} priority",
            job.id,
            technician.id,
            technician.role,
            job.priority
        );
        Ok(job)
    }

    /// Records the assignee's acceptance of a high-priority job.
    ///
    /// Anything else is a no-op: not high priority, already accepted,
    /// unassigned or completed.
    pub fn accept(&self, job_id: &str) -> Result<AcceptOutcome, LifecycleError> {
        let _span = info_span!("lifecycle.accept", job_id = %job_id).entered();

        let mut job = self.load(job_id)?;
        if job.priority != Priority::High || job.is_completed() {
            return Ok(AcceptOutcome::Unchanged(job));
        }
        if job.assignment.as_ref().map_or(true, |a| a.accepted) {
            return Ok(AcceptOutcome::Unchanged(job));
        }
        if let Some(assignment) = job.assignment.as_mut() {
            assignment.accepted = true;
        }

        let job = self.commit(job)?;
        log::info!("Job {} accepted by assignee", job.id);
        Ok(AcceptOutcome::Accepted(job))
    }

    /// Starts assigned work or resumes paused or held work.
    pub fn start(&self, job_id: &str) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.start", job_id = %job_id).entered();

        let mut job = self.load(job_id)?;
        match job.status {
            JobStatus::Assigned | JobStatus::Paused { .. } | JobStatus::OnHold => {}
            _ => return Err(invalid_transition(&job, "start")),
        }
        let resumed = !matches!(job.status, JobStatus::Assigned);

        job.status = JobStatus::InProgress;
        let job = self.commit(job)?;
        if resumed {
            log::info!("Resumed job {}", job.id);
        } else {
            log::info!("Started job {}", job.id);
        }
        Ok(job)
    }

    /// Pauses in-progress work. The reason must not be blank.
    pub fn pause(&self, job_id: &str, reason: &str) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.pause", job_id = %job_id).entered();

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::Validation(
                "pause reason is empty".to_string(),
            ));
        }
        let mut job = self.load(job_id)?;
        if job.status != JobStatus::InProgress {
            return Err(invalid_transition(&job, "pause"));
        }

        job.status = JobStatus::Paused {
            at: Utc::now(),
            reason: reason.to_string(),
        };
        let job = self.commit(job)?;
        log::info!("Paused job {}: {}", job.id, reason);
        Ok(job)
    }

    /// Puts in-progress work on hold.
    pub fn hold(&self, job_id: &str) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.hold", job_id = %job_id).entered();

        let mut job = self.load(job_id)?;
        if job.status != JobStatus::InProgress {
            return Err(invalid_transition(&job, "hold"));
        }

        job.status = JobStatus::OnHold;
        let job = self.commit(job)?;
        log::info!("Put job {} on hold", job.id);
        Ok(job)
    }

    /// Completes an assigned job, subject to the photo gate.
    pub fn complete(&self, job_id: &str, actor: &Actor) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.complete", job_id = %job_id, actor = %actor.id).entered();

        let mut job = self.load(job_id)?;
        if job.status.is_unassigned() || job.is_completed() {
            return Err(invalid_transition(&job, "complete"));
        }
        if let Err(e) = PhotoGate::allow_complete(&job, actor).into_result(&job.id) {
            log::info!("Completion of job {} blocked: no after photo", job.id);
            return Err(e);
        }
        let overridden = job.photos.after().is_none();

        job.status = JobStatus::Completed { at: Utc::now() };
        let job = self.commit(job)?;
        if overridden {
            log::warn!(
                "Job {} completed without after photo under override by {}",
                job.id,
                actor.id
            );
        } else {
            log::info!("Completed job {}", job.id);
        }
        Ok(job)
    }

    // ─── Field updates ──────────────────────────────────────────────────────

    /// Changes the priority of any non-completed job.
    pub fn set_priority(&self, job_id: &str, priority: Priority) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.set_priority", job_id = %job_id).entered();

        let mut job = self.load(job_id)?;
        if job.is_completed() {
            return Err(invalid_transition(&job, "reprioritize"));
        }

        job.priority = priority;
        let job = self.commit(job)?;
        log::debug!("Job {} priority set to {}", job.id, priority);
        Ok(job)
    }

    /// Overrides the due date of any non-completed job.
    pub fn set_due_date(&self, job_id: &str, due: DateTime<Utc>) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.set_due_date", job_id = %job_id).entered();

        let mut job = self.load(job_id)?;
        if job.is_completed() {
            return Err(invalid_transition(&job, "reschedule"));
        }

        job.due_date = due;
        let job = self.commit(job)?;
        log::debug!("Job {} due at {}", job.id, due.to_rfc3339());
        Ok(job)
    }

    /// Appends a comment. Allowed in every state.
    pub fn add_comment(&self, job_id: &str, text: &str) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.add_comment", job_id = %job_id).entered();

        let text = text.trim();
        if text.is_empty() {
            return Err(LifecycleError::Validation("comment is empty".to_string()));
        }
        let mut job = self.load(job_id)?;

        job.comments.push(Comment {
            text: text.to_string(),
            added_at: Utc::now(),
        });
        let job = self.commit(job)?;
        log::debug!("Job {} now has {} comment(s)", job.id, job.comments.len());
        Ok(job)
    }

    /// Replaces the before or after photo. Allowed in every state.
    pub fn update_photo(
        &self,
        job_id: &str,
        slot: PhotoSlot,
        image_ref: &str,
    ) -> Result<PhotoUpdate, LifecycleError> {
        let _span = info_span!("lifecycle.update_photo", job_id = %job_id, slot = %slot).entered();

        if image_ref.trim().is_empty() {
            return Err(LifecycleError::Validation(
                "image reference is empty".to_string(),
            ));
        }
        let mut job = self.load(job_id)?;

        job.photos.set(slot, image_ref);
        let job = self.commit(job)?;
        let ready_to_complete = slot == PhotoSlot::After && job.status == JobStatus::InProgress;
        if ready_to_complete {
            log::info!("Job {} has an after photo and can now be completed", job.id);
        }
        Ok(PhotoUpdate {
            job,
            ready_to_complete,
        })
    }

    /// Resends the assignment email to a contractor.
    pub fn resend_assignment_email(&self, job_id: &str) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.resend", job_id = %job_id).entered();

        let mut job = self.load(job_id)?;
        AssignmentRouter::resend(&mut job)?;
        let job = self.commit(job)?;

        if let Some(technician_id) = job.assigned_to() {
            self.notifications.send(Notification::new(
                &job.id,
                technician_id,
                crate::broadcast::NotificationChannel::Email,
                NotificationKind::Resent,
            ));
        }
        Ok(job)
    }

    // ─── Archive restore ────────────────────────────────────────────────────

    /// Inserts a completed job that is not yet in the store.
    ///
    /// No notification is sent. An unregistered assignee is recorded as an
    /// in-house technician.
    pub fn restore_completed(&self, restored: RestoredJob) -> Result<Job, LifecycleError> {
        let _span = info_span!("lifecycle.restore", job_id = %restored.id).entered();

        if restored.id.trim().is_empty() {
            return Err(LifecycleError::Validation("job id is empty".to_string()));
        }
        if restored.technician_id.trim().is_empty() {
            return Err(LifecycleError::Validation(format!(
                "job '{}' has no assignee",
                restored.id
            )));
        }

        let technician = self
            .directory
            .lookup(&restored.technician_id)?
            .unwrap_or_else(|| {
                Technician::new(
                    &restored.technician_id,
                    &restored.technician_id,
                    TechnicianRole::MaintenanceTech,
                )
            });
        let route = AssignmentRouter::route_for(&technician);

        let job = Job {
            id: restored.id,
            title: restored.title,
            description: String::new(),
            location: restored.location,
            priority: restored.priority,
            status: JobStatus::Completed {
                at: restored.completed_at,
            },
            assignment: Some(Assignment {
                technician_id: technician.id,
                role: technician.role,
                email_sent: route.initial_email_sent,
                accepted: false,
            }),
            photos: Photos::from_parts(None, restored.before_photo, restored.after_photo),
            comments: Vec::new(),
            report_date: restored.completed_at,
            due_date: restored.due_date,
        };

        self.store.insert_new(&job)?;
        log::info!("Restored completed job {} from archive", job.id);
        Ok(job)
    }

    // ─── Helpers ────────────────────────────────────────────────────────────

    fn load(&self, job_id: &str) -> Result<Job, LifecycleError> {
        self.store
            .get(job_id)?
            .ok_or_else(|| LifecycleError::NotFound {
                job_id: job_id.to_string(),
            })
    }

    fn technician(&self, technician_id: &str) -> Result<Technician, LifecycleError> {
        self.directory
            .lookup(technician_id)?
            .ok_or_else(|| LifecycleError::UnknownTechnician {
                technician_id: technician_id.to_string(),
            })
    }

    fn commit(&self, job: Job) -> Result<Job, LifecycleError> {
        self.store.put(&job)?;
        Ok(job)
    }
}

fn invalid_transition(job: &Job, action: &'static str) -> LifecycleError {
    LifecycleError::InvalidTransition {
        job_id: job.id.clone(),
        from: job.status.to_string(),
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{ChangeBus, NotificationChannel};
    use crate::db::{change_repo, Database};
    use crate::job::TechnicianRegistry;

    struct Fixture {
        lifecycle: JobLifecycle,
        db: Database,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let registry = TechnicianRegistry::new(db.clone());
        registry
            .register(&Technician::new("c-1", "Casey", TechnicianRole::Contractor))
            .unwrap();
        registry
            .register(&Technician::new("m-1", "Morgan", TechnicianRole::MaintenanceTech))
            .unwrap();

        let store = Arc::new(JobStore::new(Arc::new(ChangeBus::new(db.clone(), 16))));
        let lifecycle = JobLifecycle::new(store, Arc::new(registry), NotificationBroadcaster::new(16));
        Fixture { lifecycle, db }
    }

    fn report(lifecycle: &JobLifecycle) -> Job {
        lifecycle
            .report(NewJob {
                title: "Broken window".to_string(),
                reporter_photo: Some("reporter.jpg".to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    fn change_count(db: &Database) -> usize {
        change_repo::since(db, 0, 1000).unwrap().len()
    }

    #[test]
    fn test_report_derives_due_date() {
        let f = fixture();
        let job = report(&f.lifecycle);

        assert_eq!(job.status, JobStatus::Unassigned);
        assert_eq!(job.priority, Priority::Medium);
        assert_eq!(job.due_date - job.report_date, Duration::hours(168));
        assert_eq!(job.photos.reporter(), Some("reporter.jpg"));
        assert_eq!(f.lifecycle.store().get(&job.id).unwrap(), Some(job));
    }

    #[test]
    fn test_report_respects_configured_offset_and_explicit_due() {
        let f = fixture();
        let lifecycle = f.lifecycle.with_due_offset(Duration::hours(24));
        let derived = report(&lifecycle);
        assert_eq!(derived.due_date - derived.report_date, Duration::hours(24));

        let due = Utc::now() + Duration::days(2);
        let explicit = lifecycle
            .report(NewJob {
                title: "Gutter".to_string(),
                due_date: Some(due),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(explicit.due_date, due);
    }

    #[test]
    fn test_report_rejects_blank_title() {
        let f = fixture();
        let err = f
            .lifecycle
            .report(NewJob {
                title: "   ".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(change_count(&f.db), 0);
    }

    #[test]
    fn test_assign_contractor_routes_email() {
        let f = fixture();
        let mut rx = f.lifecycle.notifications().subscribe();
        let job = report(&f.lifecycle);

        let job = f.lifecycle.assign(&job.id, "c-1", Priority::High).unwrap();
        assert_eq!(job.status, JobStatus::Assigned);
        assert_eq!(job.assigned_role(), Some(TechnicianRole::Contractor));
        assert!(!job.email_sent());
        assert_eq!(job.priority, Priority::High);

        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.channel, NotificationChannel::Email);
        assert_eq!(notice.technician_id, "c-1");
    }

    #[test]
    fn test_assign_in_house_marks_delivered() {
        let f = fixture();
        let job = report(&f.lifecycle);
        let job = f.lifecycle.assign(&job.id, "m-1", Priority::High).unwrap();
        assert_eq!(job.assigned_role(), Some(TechnicianRole::MaintenanceTech));
        assert!(job.email_sent());
    }

    #[test]
    fn test_assign_twice_is_invalid() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Low).unwrap();
        let err = f.lifecycle.assign(&job.id, "c-1", Priority::Low).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn test_assign_unknown_technician() {
        let f = fixture();
        let job = report(&f.lifecycle);
        let before = change_count(&f.db);

        let err = f.lifecycle.assign(&job.id, "ghost", Priority::Low).unwrap_err();
        assert!(matches!(err, LifecycleError::UnknownTechnician { .. }));
        assert_eq!(change_count(&f.db), before);
    }

    #[test]
    fn test_unknown_job_is_not_found() {
        let f = fixture();
        let err = f.lifecycle.start("missing").unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_accept_is_idempotent() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "c-1", Priority::High).unwrap();

        let first = f.lifecycle.accept(&job.id).unwrap();
        assert!(first.changed());
        assert!(first.job().accepted());
        let after_first = change_count(&f.db);

        let second = f.lifecycle.accept(&job.id).unwrap();
        assert!(!second.changed());
        assert!(second.into_job().accepted());
        assert_eq!(change_count(&f.db), after_first);
    }

    #[test]
    fn test_accept_ignores_non_high_priority() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "c-1", Priority::Medium).unwrap();

        let outcome = f.lifecycle.accept(&job.id).unwrap();
        assert!(!outcome.changed());
        assert!(!outcome.job().accepted());
    }

    #[test]
    fn test_accepted_survives_priority_downgrade() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "c-1", Priority::High).unwrap();
        f.lifecycle.accept(&job.id).unwrap();

        let job = f.lifecycle.set_priority(&job.id, Priority::Low).unwrap();
        assert!(job.accepted());
    }

    #[test]
    fn test_start_pause_resume() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();

        let job = f.lifecycle.start(&job.id).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);

        let job = f.lifecycle.pause(&job.id, "Waiting for glazier").unwrap();
        assert_eq!(job.paused_reason(), Some("Waiting for glazier"));
        assert!(job.paused_at().is_some());

        let job = f.lifecycle.start(&job.id).unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
        assert!(job.paused_reason().is_none());
    }

    #[test]
    fn test_pause_requires_reason() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();
        f.lifecycle.start(&job.id).unwrap();

        let err = f.lifecycle.pause(&job.id, "  ").unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(
            f.lifecycle.store().get(&job.id).unwrap().unwrap().status,
            JobStatus::InProgress
        );
    }

    #[test]
    fn test_hold_is_distinct_from_pause() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();
        f.lifecycle.start(&job.id).unwrap();

        let job = f.lifecycle.hold(&job.id).unwrap();
        assert_eq!(job.status, JobStatus::OnHold);
        assert!(job.paused_reason().is_none());

        // Only in-progress work can be paused or held.
        assert!(f.lifecycle.pause(&job.id, "parts").is_err());
        assert!(f.lifecycle.hold(&job.id).is_err());
        assert_eq!(f.lifecycle.start(&job.id).unwrap().status, JobStatus::InProgress);
    }

    #[test]
    fn test_start_from_unassigned_is_invalid() {
        let f = fixture();
        let job = report(&f.lifecycle);
        let err = f.lifecycle.start(&job.id).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition { action: "start", .. }
        ));
    }

    #[test]
    fn test_complete_gate_and_override() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();
        f.lifecycle.start(&job.id).unwrap();
        let before = change_count(&f.db);

        let err = f
            .lifecycle
            .complete(&job.id, &Actor::standard("m-1"))
            .unwrap_err();
        assert!(err.needs_after_photo());
        assert_eq!(change_count(&f.db), before);
        assert_eq!(
            f.lifecycle.store().get(&job.id).unwrap().unwrap().status,
            JobStatus::InProgress
        );

        let job = f.lifecycle.complete(&job.id, &Actor::admin("boss")).unwrap();
        assert!(job.is_completed());
        assert!(job.completed_at().is_some());
    }

    #[test]
    fn test_complete_clears_pause_and_blocks_further_transitions() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();
        f.lifecycle.start(&job.id).unwrap();
        f.lifecycle.pause(&job.id, "Rain").unwrap();
        f.lifecycle
            .update_photo(&job.id, PhotoSlot::After, "after.jpg")
            .unwrap();

        let job = f.lifecycle.complete(&job.id, &Actor::standard("m-1")).unwrap();
        assert!(job.paused_reason().is_none());

        assert!(f.lifecycle.start(&job.id).is_err());
        assert!(f.lifecycle.complete(&job.id, &Actor::admin("boss")).is_err());
        assert!(f.lifecycle.set_priority(&job.id, Priority::High).is_err());
        assert!(f.lifecycle.set_due_date(&job.id, Utc::now()).is_err());
    }

    #[test]
    fn test_complete_unassigned_is_invalid_even_for_admin() {
        let f = fixture();
        let job = report(&f.lifecycle);
        let err = f.lifecycle.complete(&job.id, &Actor::admin("boss")).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn test_comments_allowed_after_completion() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();
        f.lifecycle.add_comment(&job.id, "Started late").unwrap();
        f.lifecycle.complete(&job.id, &Actor::admin("boss")).unwrap();

        let job = f.lifecycle.add_comment(&job.id, "Invoice sent").unwrap();
        let texts: Vec<&str> = job.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Started late", "Invoice sent"]);

        assert!(f.lifecycle.add_comment(&job.id, "").is_err());
    }

    #[test]
    fn test_update_photo_signals_ready_only_when_in_progress() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();

        let update = f
            .lifecycle
            .update_photo(&job.id, PhotoSlot::After, "early.jpg")
            .unwrap();
        assert!(!update.ready_to_complete);

        f.lifecycle.start(&job.id).unwrap();
        let update = f
            .lifecycle
            .update_photo(&job.id, PhotoSlot::Before, "before.jpg")
            .unwrap();
        assert!(!update.ready_to_complete);

        let update = f
            .lifecycle
            .update_photo(&job.id, PhotoSlot::After, "after.jpg")
            .unwrap();
        assert!(update.ready_to_complete);
        assert_eq!(update.job.photos.after(), Some("after.jpg"));
        assert_eq!(update.job.photos.reporter(), Some("reporter.jpg"));
    }

    #[test]
    fn test_photos_survive_transitions() {
        let f = fixture();
        let job = report(&f.lifecycle);
        f.lifecycle.assign(&job.id, "m-1", Priority::Medium).unwrap();
        f.lifecycle
            .update_photo(&job.id, PhotoSlot::Before, "before.jpg")
            .unwrap();
        f.lifecycle.start(&job.id).unwrap();
        f.lifecycle.hold(&job.id).unwrap();
        let job = f.lifecycle.complete(&job.id, &Actor::admin("boss")).unwrap();
        assert_eq!(job.photos.before(), Some("before.jpg"));
    }

    #[test]
    fn test_resend_assignment_email() {
        let f = fixture();
        let mut rx = f.lifecycle.notifications().subscribe();
        let contractor_job = report(&f.lifecycle);
        f.lifecycle
            .assign(&contractor_job.id, "c-1", Priority::Low)
            .unwrap();
        rx.try_recv().unwrap();

        let job = f.lifecycle.resend_assignment_email(&contractor_job.id).unwrap();
        assert!(job.email_sent());
        assert_eq!(rx.try_recv().unwrap().kind, NotificationKind::Resent);

        let in_house_job = report(&f.lifecycle);
        f.lifecycle
            .assign(&in_house_job.id, "m-1", Priority::Low)
            .unwrap();
        let err = f
            .lifecycle
            .resend_assignment_email(&in_house_job.id)
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidState { .. }));
    }

    #[test]
    fn test_restore_completed_uses_registry_role() {
        let f = fixture();
        let now = Utc::now();
        let restored = |id: &str, tech: &str| RestoredJob {
            id: id.to_string(),
            title: "Old job".to_string(),
            location: "Block C".to_string(),
            priority: Priority::Low,
            technician_id: tech.to_string(),
            due_date: now,
            completed_at: now,
            before_photo: None,
            after_photo: Some("placeholder".to_string()),
        };

        let job = f.lifecycle.restore_completed(restored("old-1", "c-1")).unwrap();
        assert_eq!(job.assigned_role(), Some(TechnicianRole::Contractor));
        assert!(job.is_completed());

        let job = f.lifecycle.restore_completed(restored("old-2", "retired")).unwrap();
        assert_eq!(job.assigned_role(), Some(TechnicianRole::MaintenanceTech));

        let err = f.lifecycle.restore_completed(restored("old-1", "c-1")).unwrap_err();
        assert!(!err.is_recoverable());
        assert!(f.lifecycle.restore_completed(restored("old-3", "")).is_err());
    }
}
