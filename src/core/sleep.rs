//! Nightly sleep profile, drawn once at session start.

use crate::core::window::{slot_hour, TimeSeriesWindow};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum total sleep for a generated night.
pub const BASE_SLEEP_HOURS: f64 = 7.5;

/// Number of night hours the total is spread across.
const NIGHT_HOURS: f64 = 9.0;

/// Half-width of the per-slot jitter.
const SLOT_JITTER: f64 = 0.05;

/// First hour of the night band (inclusive).
const NIGHT_START_HOUR: u32 = 22;

/// Hour the night band ends (exclusive).
const NIGHT_END_HOUR: u32 = 7;

/// Whether `hour` lies in the night band [22:00, 07:00).
pub fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// The static sleep baseline for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepProfile {
    /// Total sleep hours, in [7.5, 8.5)
    pub total_sleep_hours: f64,
    /// Per-hour sleep, zero outside the night band
    pub series: TimeSeriesWindow<f64>,
}

/// Generates the nightly profile from an injected random source.
pub struct SleepProfileGenerator {
    series_length: usize,
}

impl SleepProfileGenerator {
    pub fn new(series_length: usize) -> Self {
        Self { series_length }
    }

    /// Draw the total, then one jittered value per night slot.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> SleepProfile {
        let total_sleep_hours = BASE_SLEEP_HOURS + rng.random::<f64>();
        let per_hour = total_sleep_hours / NIGHT_HOURS;

        let values = (0..self.series_length)
            .map(|i| {
                if is_night_hour(slot_hour(i)) {
                    let jitter = rng.random_range(-SLOT_JITTER..SLOT_JITTER);
                    Some(round2(per_hour + jitter))
                } else {
                    Some(0.0)
                }
            })
            .collect();

        SleepProfile {
            total_sleep_hours,
            series: TimeSeriesWindow::from_values(values),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
