//! Builders and fixtures for test data.

#![allow(dead_code)]

use chrono::{DateTime, Utc};

use maintrack::{NewJob, Priority, Technician, TechnicianRole};

pub const CONTRACTOR_ID: &str = "c-1";
pub const IN_HOUSE_ID: &str = "m-1";

pub fn contractor() -> Technician {
    Technician::new(CONTRACTOR_ID, "Casey Contractor", TechnicianRole::Contractor)
}

pub fn in_house() -> Technician {
    Technician::new(IN_HOUSE_ID, "Morgan Maintenance", TechnicianRole::MaintenanceTech)
}

/// Builder for `NewJob` requests.
pub struct NewJobBuilder {
    request: NewJob,
}

impl NewJobBuilder {
    pub fn new() -> Self {
        Self {
            request: NewJob {
                title: "Leaking radiator".to_string(),
                description: "Water pooling under the hallway radiator".to_string(),
                location: "12 Oak Road, Flat 3".to_string(),
                reporter_photo: Some("reporter-radiator.jpg".to_string()),
                ..Default::default()
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.request.title = title.to_string();
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.request.location = location.to_string();
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.request.priority = Some(priority);
        self
    }

    pub fn reporter_photo(mut self, image_ref: Option<&str>) -> Self {
        self.request.reporter_photo = image_ref.map(str::to_string);
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.request.due_date = Some(due);
        self
    }

    pub fn build(self) -> NewJob {
        self.request
    }
}

impl Default for NewJobBuilder {
    fn default() -> Self {
        Self::new()
    }
}
