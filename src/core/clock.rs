//! Activity clock: the state machine behind the live steps/heart series.
//!
//! ```text
//!           trigger                 grace expires            hr == 60
//!   Idle ───────────▶ Active ─────────────────▶ Decaying ─────────────▶ Idle
//!                      ▲  │ trigger (re-arm)        │
//!                      └──┘◀────────── trigger ─────┘
//! ```
//!
//! The clock owns one `TimerSlot`. While `Active` it holds the single-shot
//! grace timer, while `Decaying` the repeating decay timer, and while
//! `Idle` nothing.

use crate::core::timer::{Millis, TimerKind, TimerSlot};
use crate::core::window::TimeSeriesWindow;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Upper bound for the step counter.
pub const MAX_STEPS: u32 = 4000;

/// Resting heart rate and the floor of the decay.
pub const RESTING_HEART_RATE: u32 = 60;

/// Upper bound for the heart rate.
pub const MAX_HEART_RATE: u32 = 130;

pub const DEFAULT_STEP_INCREMENT: u32 = 50;
pub const DEFAULT_HEART_INCREMENT: u32 = 5;
pub const DEFAULT_GRACE_PERIOD_MS: Millis = 2000;
pub const DEFAULT_DECAY_INTERVAL_MS: Millis = 1000;

/// Clock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    #[default]
    Idle,
    Active,
    Decaying,
}

/// Current step count and heart rate. Always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_steps: u32,
    pub current_heart_rate: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            total_steps: 0,
            current_heart_rate: RESTING_HEART_RATE,
        }
    }
}

impl Metrics {
    fn add_steps(&mut self, steps: u32) -> u32 {
        self.total_steps = self.total_steps.saturating_add(steps).min(MAX_STEPS);
        self.total_steps
    }

    fn raise_heart_rate(&mut self, bpm: u32) -> u32 {
        self.current_heart_rate = self
            .current_heart_rate
            .saturating_add(bpm)
            .clamp(RESTING_HEART_RATE, MAX_HEART_RATE);
        self.current_heart_rate
    }

    fn decay_heart_rate(&mut self) -> u32 {
        self.current_heart_rate = self
            .current_heart_rate
            .saturating_sub(1)
            .clamp(RESTING_HEART_RATE, MAX_HEART_RATE);
        self.current_heart_rate
    }
}

/// Per-trigger step and heart-rate increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Increment {
    pub steps: u32,
    pub heart: u32,
}

impl Default for Increment {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEP_INCREMENT,
            heart: DEFAULT_HEART_INCREMENT,
        }
    }
}

impl Increment {
    /// Replace either field where an override is given.
    pub fn with_overrides(self, steps: Option<u32>, heart: Option<u32>) -> Self {
        Self {
            steps: steps.unwrap_or(self.steps),
            heart: heart.unwrap_or(self.heart),
        }
    }
}

/// The live series mutated by the clock.
#[derive(Debug, Clone)]
pub struct LiveSeries {
    pub metrics: Metrics,
    pub steps: TimeSeriesWindow<u32>,
    pub heart: TimeSeriesWindow<u32>,
}

impl LiveSeries {
    /// Steps start at zero, heart rate slots start unset.
    pub fn new(length: usize) -> Self {
        Self {
            metrics: Metrics::default(),
            steps: TimeSeriesWindow::new(length, Some(0)),
            heart: TimeSeriesWindow::new(length, None),
        }
    }
}

/// Timing and increment settings for the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    pub increment: Increment,
    pub grace_period: Millis,
    pub decay_interval: Millis,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            increment: Increment::default(),
            grace_period: DEFAULT_GRACE_PERIOD_MS,
            decay_interval: DEFAULT_DECAY_INTERVAL_MS,
        }
    }
}

/// Something the clock did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// Activity registered; steps and heart rate pushed
    Triggered { at: Millis },
    /// Grace window ran out; decay timer armed
    GraceExpired { at: Millis },
    /// Heart rate decayed one step; `settled` when it reached resting
    DecayTick { at: Millis, settled: bool },
}

impl ClockEvent {
    /// Whether the event changed any series.
    pub fn mutated_series(&self) -> bool {
        !matches!(self, ClockEvent::GraceExpired { .. })
    }

    pub fn at(&self) -> Millis {
        match *self {
            ClockEvent::Triggered { at }
            | ClockEvent::GraceExpired { at }
            | ClockEvent::DecayTick { at, .. } => at,
        }
    }
}

/// The activity state machine.
#[derive(Debug)]
pub struct ActivityClock {
    state: ActivityState,
    timer: TimerSlot,
    settings: ClockSettings,
}

impl ActivityClock {
    pub fn new(settings: ClockSettings) -> Self {
        Self {
            state: ActivityState::Idle,
            timer: TimerSlot::new(),
            settings,
        }
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn settings(&self) -> &ClockSettings {
        &self.settings
    }

    /// Kind of the armed timer, if any.
    pub fn armed_timer(&self) -> Option<TimerKind> {
        self.timer.armed()
    }

    /// When the armed timer is due.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timer.next_deadline()
    }

    /// Register one burst of activity at `now`.
    ///
    /// Cancels whichever timer is armed, bumps both counters (clamped), and
    /// restarts the grace window.
    pub fn trigger_activity(
        &mut self,
        series: &mut LiveSeries,
        now: Millis,
        increment: Increment,
    ) -> ClockEvent {
        if let Some(cancelled) = self.timer.cancel() {
            trace!(timer = ?cancelled.kind(), at = now, "Cancelled timer on trigger");
        }

        let steps = series.metrics.add_steps(increment.steps);
        series.steps.push(steps);

        let heart = series.metrics.raise_heart_rate(increment.heart);
        series.heart.push(heart);

        if self.state != ActivityState::Active {
            debug!(from = ?self.state, at = now, "Activity state -> Active");
        }
        self.state = ActivityState::Active;
        self.timer
            .arm_once(TimerKind::Grace, now, self.settings.grace_period);

        ClockEvent::Triggered { at: now }
    }

    /// Fire every timer due at or before `now`, in deadline order.
    pub fn advance_to(&mut self, series: &mut LiveSeries, now: Millis) -> Vec<ClockEvent> {
        let mut events = Vec::new();

        while let Some(fired) = self.timer.pop_due(now) {
            match (fired.handle.kind(), self.state) {
                (TimerKind::Grace, ActivityState::Active) => {
                    debug!(at = fired.at, "Activity state -> Decaying");
                    self.state = ActivityState::Decaying;
                    self.timer
                        .arm_repeating(TimerKind::Decay, fired.at, self.settings.decay_interval);
                    events.push(ClockEvent::GraceExpired { at: fired.at });
                }
                (TimerKind::Decay, ActivityState::Decaying) => {
                    let heart = series.metrics.decay_heart_rate();
                    series.heart.push(heart);

                    let settled = heart <= RESTING_HEART_RATE;
                    if settled {
                        self.timer.cancel_handle(fired.handle);
                        self.state = ActivityState::Idle;
                        debug!(at = fired.at, "Activity state -> Idle");
                    } else {
                        trace!(at = fired.at, heart, "Decay tick");
                    }
                    events.push(ClockEvent::DecayTick {
                        at: fired.at,
                        settled,
                    });
                }
                (kind, state) => {
                    // Each state arms only its own timer kind
                    warn!(?kind, ?state, "Timer fired in unexpected state; cancelling");
                    self.timer.cancel();
                }
            }
        }

        events
    }

    /// Cancel any armed timer and return to `Idle`.
    pub fn cancel_all(&mut self) {
        self.timer.cancel();
        self.state = ActivityState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ActivityClock, LiveSeries) {
        (
            ActivityClock::new(ClockSettings::default()),
            LiveSeries::new(24),
        )
    }

    #[test]
    fn test_trigger_from_idle() {
        let (mut clock, mut series) = setup();
        assert_eq!(clock.state(), ActivityState::Idle);
        assert!(clock.armed_timer().is_none());

        let event = clock.trigger_activity(&mut series, 0, Increment::default());
        assert_eq!(event, ClockEvent::Triggered { at: 0 });
        assert_eq!(series.metrics.total_steps, 50);
        assert_eq!(series.metrics.current_heart_rate, 65);
        assert_eq!(series.steps.latest(), Some(&50));
        assert_eq!(series.heart.latest(), Some(&65));
        assert_eq!(clock.state(), ActivityState::Active);
        assert_eq!(clock.armed_timer(), Some(TimerKind::Grace));
        assert_eq!(clock.next_deadline(), Some(2000));
    }

    #[test]
    fn test_retrigger_restarts_grace_window() {
        let (mut clock, mut series) = setup();
        clock.trigger_activity(&mut series, 0, Increment::default());
        clock.trigger_activity(&mut series, 1500, Increment::default());

        assert_eq!(series.metrics.total_steps, 100);
        assert_eq!(series.metrics.current_heart_rate, 70);
        assert_eq!(clock.next_deadline(), Some(3500));

        // The first grace deadline passes without effect
        assert!(clock.advance_to(&mut series, 3499).is_empty());
        assert_eq!(clock.state(), ActivityState::Active);
    }

    #[test]
    fn test_counters_saturate() {
        let (mut clock, mut series) = setup();
        series.metrics = Metrics {
            total_steps: 3990,
            current_heart_rate: 128,
        };
        clock.trigger_activity(&mut series, 0, Increment::default());
        assert_eq!(series.metrics.total_steps, MAX_STEPS);
        assert_eq!(series.metrics.current_heart_rate, MAX_HEART_RATE);

        clock.trigger_activity(&mut series, 10, Increment::default());
        assert_eq!(series.metrics.total_steps, MAX_STEPS);
        assert_eq!(series.metrics.current_heart_rate, MAX_HEART_RATE);

        let huge = Increment {
            steps: u32::MAX,
            heart: u32::MAX,
        };
        clock.trigger_activity(&mut series, 20, huge);
        assert_eq!(series.metrics.total_steps, MAX_STEPS);
        assert_eq!(series.metrics.current_heart_rate, MAX_HEART_RATE);
    }

    #[test]
    fn test_grace_expiry_starts_decay() {
        let (mut clock, mut series) = setup();
        clock.trigger_activity(&mut series, 0, Increment::default());

        let events = clock.advance_to(&mut series, 2000);
        assert_eq!(events, vec![ClockEvent::GraceExpired { at: 2000 }]);
        assert_eq!(clock.state(), ActivityState::Decaying);
        assert_eq!(clock.armed_timer(), Some(TimerKind::Decay));
        assert_eq!(clock.next_deadline(), Some(3000));

        let events = clock.advance_to(&mut series, 3000);
        assert_eq!(
            events,
            vec![ClockEvent::DecayTick {
                at: 3000,
                settled: false
            }]
        );
        assert_eq!(series.metrics.current_heart_rate, 64);
    }

    #[test]
    fn test_decay_settles_at_resting() {
        let (mut clock, mut series) = setup();
        clock.trigger_activity(&mut series, 0, Increment::default());

        // Grace at 2000, five ticks at 3000..=7000
        let events = clock.advance_to(&mut series, 100_000);
        assert_eq!(events.len(), 6);
        assert_eq!(
            events.last(),
            Some(&ClockEvent::DecayTick {
                at: 7000,
                settled: true
            })
        );
        assert_eq!(series.metrics.current_heart_rate, RESTING_HEART_RATE);
        assert_eq!(clock.state(), ActivityState::Idle);
        assert!(clock.armed_timer().is_none());
        assert!(clock.advance_to(&mut series, 200_000).is_empty());
    }

    #[test]
    fn test_trigger_during_decay_cancels_tick() {
        let (mut clock, mut series) = setup();
        clock.trigger_activity(&mut series, 0, Increment::default());
        clock.advance_to(&mut series, 3000);
        assert_eq!(series.metrics.current_heart_rate, 64);

        // Trigger lands on the instant the next tick was due
        clock.trigger_activity(&mut series, 4000, Increment::default());
        assert_eq!(clock.armed_timer(), Some(TimerKind::Grace));
        assert!(clock.advance_to(&mut series, 4000).is_empty());
        assert_eq!(series.metrics.current_heart_rate, 69);
        assert_eq!(clock.next_deadline(), Some(6000));
    }

    #[test]
    fn test_zero_heart_increment_still_settles() {
        let (mut clock, mut series) = setup();
        let steps_only = Increment::default().with_overrides(None, Some(0));
        clock.trigger_activity(&mut series, 0, steps_only);
        assert_eq!(series.metrics.current_heart_rate, RESTING_HEART_RATE);

        let events = clock.advance_to(&mut series, 3000);
        assert_eq!(
            events.last(),
            Some(&ClockEvent::DecayTick {
                at: 3000,
                settled: true
            })
        );
        assert_eq!(clock.state(), ActivityState::Idle);
    }

    #[test]
    fn test_cancel_all() {
        let (mut clock, mut series) = setup();
        clock.trigger_activity(&mut series, 0, Increment::default());
        clock.cancel_all();
        assert_eq!(clock.state(), ActivityState::Idle);
        assert!(clock.advance_to(&mut series, 10_000).is_empty());
    }
}
