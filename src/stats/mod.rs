//! Process-wide activity statistics.
//!
//! Counters cover the lifetime of the running process only. Nothing is
//! written to disk; a new process starts from zero.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, ActivityLog, ActivityStats, SharedActivityLog};
