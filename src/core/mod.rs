//! Core simulation engine.
//!
//! This module contains:
//! - Sliding windows for the hourly series
//! - The single-slot timer used by the activity clock
//! - The activity state machine that drives steps and heart rate
//! - The nightly sleep profile generator
//! - Telemetry snapshots and the summary projection

pub mod clock;
pub mod sleep;
pub mod telemetry;
pub mod timer;
pub mod window;

// Re-export commonly used types
pub use clock::{
    ActivityClock, ActivityState, ClockEvent, ClockSettings, Increment, LiveSeries, Metrics,
    MAX_HEART_RATE, MAX_STEPS, RESTING_HEART_RATE,
};
pub use sleep::{SleepProfile, SleepProfileGenerator};
pub use telemetry::{format_grouped, SeriesKind, Summary, TelemetrySnapshot};
pub use timer::{Millis, TimerHandle, TimerKind, TimerSlot};
pub use window::{TimeSeriesWindow, WindowStats, DEFAULT_SERIES_LENGTH};
