//! Activity counters shared between the engine driver and front ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counters for the current process.
#[derive(Debug)]
pub struct ActivityLog {
    /// Activity triggers handled
    triggers: AtomicU64,
    /// Decay ticks fired
    decay_ticks: AtomicU64,
    /// Snapshots handed to the renderer
    snapshots_rendered: AtomicU64,
    /// Sessions started
    sessions_started: AtomicU64,
    /// Sessions ended
    sessions_ended: AtomicU64,
    /// When the log was created
    started_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self {
            triggers: AtomicU64::new(0),
            decay_ticks: AtomicU64::new(0),
            snapshots_rendered: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            sessions_ended: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_trigger(&self) {
        self.triggers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decay_tick(&self) {
        self.decay_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_snapshot_rendered(&self) {
        self.snapshots_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_ended(&self) {
        self.sessions_ended.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            triggers: self.triggers.load(Ordering::Relaxed),
            decay_ticks: self.decay_ticks.load(Ordering::Relaxed),
            snapshots_rendered: self.snapshots_rendered.load(Ordering::Relaxed),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_ended: self.sessions_ended.load(Ordering::Relaxed),
            started_at: self.started_at,
            uptime_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Activity Statistics:\n\
             - Activity triggers: {}\n\
             - Decay ticks: {}\n\
             - Snapshots rendered: {}\n\
             - Sessions: {} started, {} ended\n\
             - Uptime: {} seconds\n\
             \n\
             All readings are simulated and were discarded at session end.",
            stats.triggers,
            stats.decay_ticks,
            stats.snapshots_rendered,
            stats.sessions_started,
            stats.sessions_ended,
            stats.uptime_secs
        )
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityStats {
    pub triggers: u64,
    pub decay_ticks: u64,
    pub snapshots_rendered: u64,
    pub sessions_started: u64,
    pub sessions_ended: u64,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log.
pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_log_counting() {
        let log = ActivityLog::new();

        log.record_trigger();
        log.record_trigger();
        log.record_decay_tick();
        log.record_session_started();

        let stats = log.stats();
        assert_eq!(stats.triggers, 2);
        assert_eq!(stats.decay_ticks, 1);
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.sessions_ended, 0);
    }

    #[test]
    fn test_summary_format() {
        let summary = ActivityLog::new().summary();

        assert!(summary.contains("Activity triggers"));
        assert!(summary.contains("Decay ticks"));
        assert!(summary.contains("simulated"));
    }
}
