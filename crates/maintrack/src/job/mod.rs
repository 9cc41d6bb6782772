//! Job domain model: jobs, technicians and actors.

pub mod actor;
pub mod model;
pub mod technician;

pub use actor::{Actor, Capability};
pub use model::{Assignment, Comment, Job, JobStatus, NewJob, PhotoSlot, Photos, Priority};
pub use technician::{Technician, TechnicianDirectory, TechnicianRegistry, TechnicianRole};
