//! Shared test utilities for maintrack integration tests.
//!
//! This module provides:
//! - `TestHarness` for execution contexts sharing one temporary database
//! - Builders for job requests and technician fixtures

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
