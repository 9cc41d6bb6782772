//! Maintenance job records.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::technician::TechnicianRole;

// ─── Priority ───────────────────────────────────────────────────────────────

/// Urgency of a job. Orthogonal to its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Work-queue rank, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

// ─── Status ─────────────────────────────────────────────────────────────────

/// Lifecycle state of a job.
///
/// State-dependent data lives in the variant that owns it, so a paused job
/// always has a reason and timestamp and nothing else does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Unassigned,
    Assigned,
    InProgress,
    Paused { at: DateTime<Utc>, reason: String },
    OnHold,
    Completed { at: DateTime<Utc> },
}

impl JobStatus {
    /// Stable lowercase name, used for persistence and filtering.
    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Unassigned => "unassigned",
            JobStatus::Assigned => "assigned",
            JobStatus::InProgress => "in_progress",
            JobStatus::Paused { .. } => "paused",
            JobStatus::OnHold => "on_hold",
            JobStatus::Completed { .. } => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. })
    }

    pub fn is_unassigned(&self) -> bool {
        matches!(self, JobStatus::Unassigned)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Unassigned => write!(f, "Unassigned"),
            JobStatus::Assigned => write!(f, "Assigned"),
            JobStatus::InProgress => write!(f, "In Progress"),
            JobStatus::Paused { .. } => write!(f, "Paused"),
            JobStatus::OnHold => write!(f, "On Hold"),
            JobStatus::Completed { .. } => write!(f, "Completed"),
        }
    }
}

// ─── Assignment ─────────────────────────────────────────────────────────────

/// Who a job is assigned to and how they were told about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub technician_id: String,
    /// Resolved once at assignment time; never re-derived.
    pub role: TechnicianRole,
    /// Only tracked for contractors. Always true for in-house technicians.
    pub email_sent: bool,
    /// Only discriminating for high-priority jobs.
    pub accepted: bool,
}

// ─── Photos ─────────────────────────────────────────────────────────────────

/// Photo slots that the workflow may overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSlot {
    Before,
    After,
}

impl std::fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoSlot::Before => write!(f, "before"),
            PhotoSlot::After => write!(f, "after"),
        }
    }
}

/// Opaque image references attached to a job.
///
/// The reporter photo is fixed at creation. Before/after photos can be
/// replaced but are never cleared by a status transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photos {
    reporter: Option<String>,
    before: Option<String>,
    after: Option<String>,
}

impl Photos {
    pub fn new(reporter: Option<String>) -> Self {
        Self {
            reporter,
            before: None,
            after: None,
        }
    }

    /// Rebuilds all three slots, e.g. from a persisted row.
    pub fn from_parts(
        reporter: Option<String>,
        before: Option<String>,
        after: Option<String>,
    ) -> Self {
        Self {
            reporter,
            before,
            after,
        }
    }

    pub fn reporter(&self) -> Option<&str> {
        self.reporter.as_deref()
    }

    pub fn before(&self) -> Option<&str> {
        self.before.as_deref()
    }

    pub fn after(&self) -> Option<&str> {
        self.after.as_deref()
    }

    pub fn get(&self, slot: PhotoSlot) -> Option<&str> {
        match slot {
            PhotoSlot::Before => self.before(),
            PhotoSlot::After => self.after(),
        }
    }

    /// Replaces the image in `slot`.
    pub fn set(&mut self, slot: PhotoSlot, image_ref: impl Into<String>) {
        let image_ref = Some(image_ref.into());
        match slot {
            PhotoSlot::Before => self.before = image_ref,
            PhotoSlot::After => self.after = image_ref,
        }
    }
}

// ─── Comments ───────────────────────────────────────────────────────────────

/// A free-text note. Comments are only ever appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub text: String,
    pub added_at: DateTime<Utc>,
}

// ─── Job ────────────────────────────────────────────────────────────────────

/// A maintenance job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job identifier. Never changes.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Property or location the job concerns.
    pub location: String,
    pub priority: Priority,
    pub status: JobStatus,
    /// Present exactly when the status is not `Unassigned`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment: Option<Assignment>,
    pub photos: Photos,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
    pub report_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

impl Job {
    pub fn assigned_to(&self) -> Option<&str> {
        self.assignment.as_ref().map(|a| a.technician_id.as_str())
    }

    pub fn assigned_role(&self) -> Option<TechnicianRole> {
        self.assignment.as_ref().map(|a| a.role)
    }

    pub fn email_sent(&self) -> bool {
        self.assignment.as_ref().is_some_and(|a| a.email_sent)
    }

    pub fn accepted(&self) -> bool {
        self.assignment.as_ref().is_some_and(|a| a.accepted)
    }

    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            JobStatus::Paused { at, .. } => Some(*at),
            _ => None,
        }
    }

    pub fn paused_reason(&self) -> Option<&str> {
        match &self.status {
            JobStatus::Paused { reason, .. } => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            JobStatus::Completed { at } => Some(*at),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    /// True for an assigned high-priority job its assignee has not yet accepted.
    pub fn awaiting_acceptance(&self) -> bool {
        self.priority == Priority::High && self.assignment.is_some() && !self.accepted()
    }

    /// Checks the structural invariants every stored job must satisfy.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("job id is empty".to_string());
        }
        match (&self.status, &self.assignment) {
            (JobStatus::Unassigned, Some(a)) => {
                return Err(format!(
                    "unassigned job carries an assignee '{}'",
                    a.technician_id
                ));
            }
            (status, None) if !status.is_unassigned() => {
                return Err(format!("{} job has no assignee", status.name()));
            }
            _ => {}
        }
        if let JobStatus::Paused { reason, .. } = &self.status {
            if reason.trim().is_empty() {
                return Err("paused job has an empty reason".to_string());
            }
        }
        Ok(())
    }
}

/// Request from the reporting collaborator to open a new job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub reporter_photo: Option<String>,
    #[serde(default)]
    pub report_date: Option<DateTime<Utc>>,
    /// Overrides the derived due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_job() -> Job {
        let now = Utc::now();
        Job {
            id: "job-1".to_string(),
            title: "Leaking tap".to_string(),
            description: String::new(),
            location: "Unit 4".to_string(),
            priority: Priority::Medium,
            status: JobStatus::Unassigned,
            assignment: None,
            photos: Photos::new(Some("reporter.jpg".to_string())),
            comments: vec![],
            report_date: now,
            due_date: now,
        }
    }

    fn assignment() -> Assignment {
        Assignment {
            technician_id: "tech-1".to_string(),
            role: TechnicianRole::MaintenanceTech,
            email_sent: true,
            accepted: false,
        }
    }

    #[test]
    fn test_priority_parse_and_rank() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" low ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("urgent".parse::<Priority>().is_err());
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn test_status_names() {
        assert_eq!(JobStatus::InProgress.name(), "in_progress");
        assert_eq!(JobStatus::OnHold.name(), "on_hold");
        assert_eq!(
            JobStatus::Completed { at: Utc::now() }.name(),
            "completed"
        );
        assert!(JobStatus::Completed { at: Utc::now() }.is_terminal());
        assert!(!JobStatus::OnHold.is_terminal());
    }

    #[test]
    fn test_status_serialization_is_tagged() {
        let json = serde_json::to_string(&JobStatus::InProgress).unwrap();
        assert_eq!(json, r#"{"state":"in_progress"}"#);
    }

    #[test]
    fn test_photos_keep_reporter_on_set() {
        let mut photos = Photos::new(Some("reporter.jpg".to_string()));
        photos.set(PhotoSlot::Before, "before-1.jpg");
        photos.set(PhotoSlot::Before, "before-2.jpg");
        photos.set(PhotoSlot::After, "after.jpg");

        assert_eq!(photos.reporter(), Some("reporter.jpg"));
        assert_eq!(photos.before(), Some("before-2.jpg"));
        assert_eq!(photos.get(PhotoSlot::After), Some("after.jpg"));
    }

    #[test]
    fn test_invariants_hold_for_fresh_job() {
        assert!(base_job().check_invariants().is_ok());
    }

    #[test]
    fn test_invariant_unassigned_with_assignee() {
        let mut job = base_job();
        job.assignment = Some(assignment());
        assert!(job.check_invariants().is_err());
    }

    #[test]
    fn test_invariant_assigned_without_assignee() {
        let mut job = base_job();
        job.status = JobStatus::InProgress;
        assert!(job.check_invariants().is_err());
    }

    #[test]
    fn test_invariant_paused_needs_reason() {
        let mut job = base_job();
        job.assignment = Some(assignment());
        job.status = JobStatus::Paused {
            at: Utc::now(),
            reason: "  ".to_string(),
        };
        assert!(job.check_invariants().is_err());
    }

    #[test]
    fn test_awaiting_acceptance() {
        let mut job = base_job();
        job.priority = Priority::High;
        assert!(!job.awaiting_acceptance());

        job.status = JobStatus::Assigned;
        job.assignment = Some(assignment());
        assert!(job.awaiting_acceptance());

        job.assignment.as_mut().unwrap().accepted = true;
        assert!(!job.awaiting_acceptance());
    }

    #[test]
    fn test_pause_accessors() {
        let mut job = base_job();
        assert!(job.paused_at().is_none());
        let at = Utc::now();
        job.assignment = Some(assignment());
        job.status = JobStatus::Paused {
            at,
            reason: "Waiting on tenant".to_string(),
        };
        assert_eq!(job.paused_at(), Some(at));
        assert_eq!(job.paused_reason(), Some("Waiting on tenant"));
    }
}
