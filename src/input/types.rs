//! Input event types for the activity simulation.
//!
//! Only the designated activity keys matter; everything else is ignored.

use crate::core::clock::Increment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Keys that count as physical activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKey {
    ArrowUp,
    ArrowDown,
    Space,
}

impl ActivityKey {
    /// Classify a key by its browser-style name.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name {
            "ArrowUp" => Some(ActivityKey::ArrowUp),
            "ArrowDown" => Some(ActivityKey::ArrowDown),
            " " | "Spacebar" => Some(ActivityKey::Space),
            _ => None,
        }
    }
}

/// A single activity signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySignal {
    /// When the signal was received
    pub timestamp: DateTime<Utc>,
    /// The key that produced it, if any
    pub key: Option<ActivityKey>,
    /// Steps override for this trigger
    pub steps: Option<u32>,
    /// Heart-rate override for this trigger
    pub heart: Option<u32>,
}

impl ActivitySignal {
    pub fn from_key(key: ActivityKey) -> Self {
        Self {
            timestamp: Utc::now(),
            key: Some(key),
            steps: None,
            heart: None,
        }
    }

    /// A signal with explicit increment overrides.
    pub fn with_overrides(steps: Option<u32>, heart: Option<u32>) -> Self {
        Self {
            timestamp: Utc::now(),
            key: None,
            steps,
            heart,
        }
    }

    /// Resolve the increment against the session default.
    pub fn increment(&self, default: Increment) -> Increment {
        default.with_overrides(self.steps, self.heart)
    }
}

/// Events delivered by an input collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputEvent {
    Activity(ActivitySignal),
    /// The user asked to leave the dashboard
    EndSession,
}
