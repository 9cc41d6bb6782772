//! Assignment notification routing.

use crate::broadcast::NotificationChannel;
use crate::job::{Job, Technician, TechnicianRole};

use super::error::LifecycleError;

/// How a new assignment is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingDecision {
    pub channel: NotificationChannel,
    /// Initial `email_sent` value for the assignment.
    pub initial_email_sent: bool,
}

/// Routes assignment notices by technician role.
///
/// Contractors get an email that is tracked and can be resent. In-house
/// technicians get an in-app notice that counts as delivered at once.
pub struct AssignmentRouter;

impl AssignmentRouter {
    pub fn route(_job: &Job, technician: &Technician) -> RoutingDecision {
        Self::route_for(technician)
    }

    /// Routing by role alone, for records that are not announced.
    pub fn route_for(technician: &Technician) -> RoutingDecision {
        match technician.role {
            TechnicianRole::Contractor => RoutingDecision {
                channel: NotificationChannel::Email,
                initial_email_sent: false,
            },
            TechnicianRole::MaintenanceTech => RoutingDecision {
                channel: NotificationChannel::AppNotification,
                initial_email_sent: true,
            },
        }
    }

    /// Marks the assignment email as sent again. Only contractor
    /// assignments carry a resendable email.
    pub fn resend(job: &mut Job) -> Result<(), LifecycleError> {
        let Some(assignment) = job.assignment.as_mut() else {
            return Err(LifecycleError::InvalidState {
                job_id: job.id.clone(),
                reason: "job has no assignee".to_string(),
            });
        };
        if assignment.role != TechnicianRole::Contractor {
            return Err(LifecycleError::InvalidState {
                job_id: job.id.clone(),
                reason: format!(
                    "assignee '{}' is a {} and gets no email",
                    assignment.technician_id, assignment.role
                ),
            });
        }
        assignment.email_sent = true;
        Ok(())
    }
}
