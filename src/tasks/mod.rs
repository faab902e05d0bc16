//! Background Tasks Module
//!
//! Contains background tasks driven by the binary.
//!
//! # Tasks
//! - Workload: Exercises both caches from concurrent workers

mod workload;

pub use workload::{expected_value, spawn_workload, WorkloadReport};
