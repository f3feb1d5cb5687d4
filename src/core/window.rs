//! Fixed-capacity sliding windows of hourly values.
//!
//! Every series on the dashboard is a window of `N` slots (default 24).
//! Pushing a value appends it at the tail and evicts the oldest slot, so
//! the length never changes. Slots may be unset, which renderers draw as
//! gaps.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

/// Default number of hourly slots per series.
pub const DEFAULT_SERIES_LENGTH: usize = 24;

/// Label for slot `index`: slot i represents hour `(i + 1) mod 24`.
pub fn hour_label(index: usize) -> String {
    format!("{}:00", slot_hour(index))
}

/// Hour of day represented by slot `index`.
pub fn slot_hour(index: usize) -> u32 {
    ((index + 1) % 24) as u32
}

/// Build the label sequence for a window of `capacity` slots.
pub fn hour_labels(capacity: usize) -> Vec<String> {
    (0..capacity).map(hour_label).collect()
}

/// A sliding window with FIFO eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesWindow<V> {
    /// Slot values, oldest first
    values: VecDeque<Option<V>>,
    /// Hour-of-day labels, fixed at creation
    labels: Vec<String>,
}

impl<V: Clone> TimeSeriesWindow<V> {
    /// Create a window with every slot set to `fill`.
    pub fn new(capacity: usize, fill: Option<V>) -> Self {
        Self {
            values: std::iter::repeat(fill).take(capacity).collect(),
            labels: hour_labels(capacity),
        }
    }

    /// Create a window from explicit slot values.
    pub fn from_values(values: Vec<Option<V>>) -> Self {
        let labels = hour_labels(values.len());
        Self {
            values: values.into(),
            labels,
        }
    }

    /// Append `value` at the tail and evict the head.
    pub fn push(&mut self, value: V) {
        self.push_slot(Some(value));
    }

    /// Append a possibly-unset slot at the tail and evict the head.
    pub fn push_slot(&mut self, slot: Option<V>) {
        if self.values.is_empty() {
            return;
        }
        self.values.pop_front();
        self.values.push_back(slot);
    }

    /// Number of slots (constant for the window's lifetime).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the window has zero capacity.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The most recently pushed slot.
    pub fn latest(&self) -> Option<&V> {
        self.values.back().and_then(Option::as_ref)
    }

    /// Slot values, oldest first.
    pub fn values(&self) -> impl Iterator<Item = &Option<V>> {
        self.values.iter()
    }

    /// Hour labels aligned with `values()`.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Copy the slots out for consumers.
    pub fn to_vec(&self) -> Vec<Option<V>> {
        self.values.iter().cloned().collect()
    }
}

/// Summary statistics over the set slots of a numeric window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl<V: Clone + Into<f64>> TimeSeriesWindow<V> {
    /// Statistics over set slots, or `None` if every slot is unset.
    pub fn stats(&self) -> Option<WindowStats> {
        let set: Vec<f64> = self
            .values
            .iter()
            .filter_map(|v| v.clone().map(Into::into))
            .collect();

        if set.is_empty() {
            return None;
        }

        Some(WindowStats {
            count: set.len(),
            mean: Statistics::mean(set.iter()),
            min: Statistics::min(set.iter()),
            max: Statistics::max(set.iter()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_creation() {
        let window: TimeSeriesWindow<u32> = TimeSeriesWindow::new(DEFAULT_SERIES_LENGTH, Some(0));
        assert_eq!(window.len(), 24);
        assert!(window.values().all(|v| *v == Some(0)));

        let unset: TimeSeriesWindow<u32> = TimeSeriesWindow::new(24, None);
        assert!(unset.values().all(Option::is_none));
        assert!(unset.latest().is_none());
    }

    #[test]
    fn test_labels_wrap_at_midnight() {
        let window: TimeSeriesWindow<u32> = TimeSeriesWindow::new(24, None);
        let labels = window.labels();
        assert_eq!(labels[0], "1:00");
        assert_eq!(labels[21], "22:00");
        assert_eq!(labels[22], "23:00");
        assert_eq!(labels[23], "0:00");
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut window = TimeSeriesWindow::from_values(vec![Some(1u32), Some(2), Some(3)]);
        window.push(4);
        assert_eq!(window.to_vec(), vec![Some(2), Some(3), Some(4)]);
        assert_eq!(window.latest(), Some(&4));
        // Labels do not move with the data
        assert_eq!(window.labels(), &["1:00", "2:00", "3:00"]);
    }

    #[test]
    fn test_length_is_constant() {
        let mut window: TimeSeriesWindow<u32> = TimeSeriesWindow::new(24, None);
        for i in 0..100 {
            window.push(i);
            assert_eq!(window.len(), 24);
        }
        assert_eq!(window.to_vec()[0], Some(76));
    }

    #[test]
    fn test_zero_capacity_ignores_push() {
        let mut window: TimeSeriesWindow<u32> = TimeSeriesWindow::new(0, Some(0));
        window.push(5);
        assert!(window.is_empty());
        assert!(window.latest().is_none());
    }

    #[test]
    fn test_stats_skip_unset_slots() {
        let window = TimeSeriesWindow::from_values(vec![None, Some(60u32), Some(70), None]);
        let stats = window.stats().unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 65.0).abs() < 1e-9);
        assert_eq!(stats.min, 60.0);
        assert_eq!(stats.max, 70.0);

        let empty: TimeSeriesWindow<u32> = TimeSeriesWindow::new(4, None);
        assert!(empty.stats().is_none());
    }
}
