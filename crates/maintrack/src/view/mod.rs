//! Derived job views. Nothing here writes to the store.

pub mod live_list;
pub mod priority_queue;

pub use live_list::{LiveJobList, ViewFilter};
pub use priority_queue::PriorityQueueView;
