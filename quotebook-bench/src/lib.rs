//! # quotebook Bench
//!
//! Workload generation and throughput helpers for quotebook benchmarks.

pub mod throughput;
pub mod workload;

pub use throughput::{ThroughputResult, replay_updates};
pub use workload::{Workload, WorkloadConfig};
