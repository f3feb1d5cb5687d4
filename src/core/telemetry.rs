//! Read-only telemetry views handed to renderers and the summary display.
//!
//! A `TelemetrySnapshot` is built after every series mutation. It carries
//! label-aligned copies of the three series, so consumers never hold a
//! reference into the session.

use crate::core::clock::{ActivityState, MAX_STEPS};
use crate::core::timer::{Millis, TimerKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder shown when no heart rate is available.
pub const HEART_RATE_PLACEHOLDER: &str = "--";

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Session this snapshot belongs to
    pub session_id: Uuid,
    /// Monotonic counter within the session
    pub sequence: u64,
    /// Session time of the mutation (ms since start)
    pub at_ms: Millis,
    /// Clock state after the mutation
    pub state: ActivityState,
    /// Timer armed after the mutation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub armed_timer: Option<TimerKind>,
    pub total_steps: u32,
    pub current_heart_rate: u32,
    pub total_sleep_hours: f64,
    /// Hour labels shared by all three series
    pub labels: Vec<String>,
    pub steps: Vec<Option<u32>>,
    pub heart_rate: Vec<Option<u32>>,
    pub sleep: Vec<Option<f64>>,
}

impl TelemetrySnapshot {
    /// Summary projection for the display collaborator.
    pub fn summary(&self) -> Summary {
        Summary::new(
            self.total_steps,
            Some(self.current_heart_rate),
            self.total_sleep_hours,
        )
    }
}

/// The three headline figures, formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Grouped integer, e.g. "1,250"
    pub total_steps: String,
    /// BPM, or the placeholder
    pub heart_rate: String,
    /// One decimal, e.g. "7.9"
    pub sleep_hours: String,
}

impl Summary {
    pub fn new(total_steps: u32, heart_rate: Option<u32>, sleep_hours: f64) -> Self {
        Self {
            total_steps: format_grouped(total_steps),
            heart_rate: heart_rate
                .filter(|bpm| *bpm > 0)
                .map(|bpm| bpm.to_string())
                .unwrap_or_else(|| HEART_RATE_PLACEHOLDER.to_string()),
            sleep_hours: format!("{sleep_hours:.1}"),
        }
    }

    /// Summary shown when no session is running.
    pub fn placeholder() -> Self {
        Self::new(0, None, 0.0)
    }
}

/// Format an integer with comma thousands separators.
pub fn format_grouped(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}

/// The dashboard's three plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Steps,
    HeartRate,
    Sleep,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 3] = [SeriesKind::Steps, SeriesKind::HeartRate, SeriesKind::Sleep];

    /// Legend label.
    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::Steps => "Steps",
            SeriesKind::HeartRate => "Heart Rate (BPM)",
            SeriesKind::Sleep => "Sleep (hrs)",
        }
    }

    /// Fixed axis range used by the chart.
    pub fn axis_range(&self) -> (f64, f64) {
        match self {
            SeriesKind::Steps => (0.0, MAX_STEPS as f64),
            SeriesKind::HeartRate => (50.0, 130.0),
            SeriesKind::Sleep => (0.0, 8.0),
        }
    }

    /// Tooltip text for one point.
    pub fn tooltip(&self, value: f64) -> String {
        match self {
            SeriesKind::Steps => format!("Steps: {value}"),
            SeriesKind::HeartRate => format!("Heart Rate: {value} BPM"),
            SeriesKind::Sleep => format!("Sleep: {value:.2} hrs"),
        }
    }

    /// The snapshot's values for this series, as floats.
    pub fn values(&self, snapshot: &TelemetrySnapshot) -> Vec<Option<f64>> {
        match self {
            SeriesKind::Steps => snapshot.steps.iter().map(|v| v.map(f64::from)).collect(),
            SeriesKind::HeartRate => snapshot
                .heart_rate
                .iter()
                .map(|v| v.map(f64::from))
                .collect(),
            SeriesKind::Sleep => snapshot.sleep.clone(),
        }
    }
}
