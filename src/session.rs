//! Session: one login's worth of simulation state.
//!
//! A `Session` exclusively owns the live series, the sleep profile, and the
//! activity clock with its timer. Time is supplied by the caller as
//! milliseconds since the session started. Ending the session, explicitly
//! or by dropping it, cancels whatever timer is armed.

use crate::config::SimulationConfig;
use crate::core::clock::{
    ActivityClock, ActivityState, ClockEvent, Increment, LiveSeries, Metrics,
};
use crate::core::sleep::{SleepProfile, SleepProfileGenerator};
use crate::core::telemetry::{Summary, TelemetrySnapshot};
use crate::core::timer::{Millis, TimerKind};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// What a session did, reported when it ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// Activity triggers handled
    pub triggers: u64,
    /// Decay ticks fired
    pub decay_ticks: u64,
    /// Step count before the reset
    pub final_steps: u32,
    /// Mean of the set heart-rate slots, if any were set
    pub mean_heart_rate: Option<f64>,
}

/// Snapshots produced by one activity trigger.
#[derive(Debug, Clone)]
pub struct TriggerOutcome {
    /// Timers that fell due strictly before the trigger, in order
    pub overdue: Vec<TelemetrySnapshot>,
    /// State right after the trigger
    pub snapshot: TelemetrySnapshot,
}

impl TriggerOutcome {
    /// All snapshots in emission order.
    pub fn into_snapshots(self) -> Vec<TelemetrySnapshot> {
        let mut snapshots = self.overdue;
        snapshots.push(self.snapshot);
        snapshots
    }
}

/// A running simulation session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    clock: ActivityClock,
    live: LiveSeries,
    sleep: SleepProfile,
    /// Snapshots emitted so far
    sequence: u64,
    /// Latest time seen; the timeline never runs backwards
    last_at: Millis,
    triggers: u64,
    decay_ticks: u64,
    ended: bool,
}

impl Session {
    /// Start a session seeded from `config.seed`, or from the OS if unset.
    pub fn start(config: &SimulationConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::start_with_rng(config, &mut rng)
    }

    /// Start a session drawing the sleep profile from `rng`.
    pub fn start_with_rng<R: Rng>(config: &SimulationConfig, rng: &mut R) -> Self {
        let sleep = SleepProfileGenerator::new(config.series_length).generate(rng);
        let session = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock: ActivityClock::new(config.clock_settings()),
            live: LiveSeries::new(config.series_length),
            sleep,
            sequence: 0,
            last_at: 0,
            triggers: 0,
            decay_ticks: 0,
            ended: false,
        };

        info!(
            session_id = %session.id,
            total_sleep_hours = session.sleep.total_sleep_hours,
            "Session started"
        );
        session
    }

    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> ActivityState {
        self.clock.state()
    }

    pub fn metrics(&self) -> Metrics {
        self.live.metrics
    }

    /// Kind of the armed timer, if any.
    pub fn armed_timer(&self) -> Option<TimerKind> {
        self.clock.armed_timer()
    }

    /// When the driver should next call `advance_to`.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.clock.next_deadline()
    }

    pub fn sleep_profile(&self) -> &SleepProfile {
        &self.sleep
    }

    pub fn live_series(&self) -> &LiveSeries {
        &self.live
    }

    /// The configured per-trigger increment.
    pub fn default_increment(&self) -> Increment {
        self.clock.settings().increment
    }

    /// Register activity at `now` with the configured increment.
    pub fn trigger_activity(&mut self, now: Millis) -> TriggerOutcome {
        let increment = self.default_increment();
        self.trigger_activity_with(now, increment)
    }

    /// Register activity at `now` with an explicit increment.
    ///
    /// Timers due strictly before `now` fire first. A timer due exactly at
    /// `now` is cancelled by the trigger and never fires.
    pub fn trigger_activity_with(&mut self, now: Millis, increment: Increment) -> TriggerOutcome {
        let now = self.observe(now);
        let overdue = self.fire_due(now.saturating_sub(1));

        let event = self.clock.trigger_activity(&mut self.live, now, increment);
        self.triggers += 1;
        TriggerOutcome {
            overdue,
            snapshot: self.emit(event),
        }
    }

    /// Fire every timer due by `now`; one snapshot per series mutation.
    pub fn advance_to(&mut self, now: Millis) -> Vec<TelemetrySnapshot> {
        let now = self.observe(now);
        self.fire_due(now)
    }

    fn fire_due(&mut self, now: Millis) -> Vec<TelemetrySnapshot> {
        let events = self.clock.advance_to(&mut self.live, now);

        let mut snapshots = Vec::new();
        for event in events {
            if let ClockEvent::DecayTick { .. } = event {
                self.decay_ticks += 1;
            }
            if event.mutated_series() {
                snapshots.push(self.emit(event));
            }
        }
        snapshots
    }

    /// Current state as a snapshot, without advancing the sequence.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.build_snapshot(self.last_at)
    }

    /// Current summary projection.
    pub fn summary(&self) -> Summary {
        Summary::new(
            self.live.metrics.total_steps,
            Some(self.live.metrics.current_heart_rate),
            self.sleep.total_sleep_hours,
        )
    }

    /// End the session: cancel timers, reset metrics, discard the series.
    pub fn end(mut self) -> SessionReport {
        let report = SessionReport {
            session_id: self.id,
            started_at: self.started_at,
            ended_at: Utc::now(),
            triggers: self.triggers,
            decay_ticks: self.decay_ticks,
            final_steps: self.live.metrics.total_steps,
            mean_heart_rate: self.live.heart.stats().map(|s| s.mean),
        };
        self.teardown();
        report
    }

    fn teardown(&mut self) {
        if self.ended {
            return;
        }
        self.clock.cancel_all();
        self.live = LiveSeries::new(0);
        self.ended = true;
        info!(session_id = %self.id, "Session ended");
    }

    fn observe(&mut self, now: Millis) -> Millis {
        self.last_at = self.last_at.max(now);
        self.last_at
    }

    fn emit(&mut self, event: ClockEvent) -> TelemetrySnapshot {
        self.sequence += 1;
        debug!(sequence = self.sequence, ?event, "Snapshot");
        self.build_snapshot(event.at())
    }

    fn build_snapshot(&self, at_ms: Millis) -> TelemetrySnapshot {
        TelemetrySnapshot {
            session_id: self.id,
            sequence: self.sequence,
            at_ms,
            state: self.clock.state(),
            armed_timer: self.clock.armed_timer(),
            total_steps: self.live.metrics.total_steps,
            current_heart_rate: self.live.metrics.current_heart_rate,
            total_sleep_hours: self.sleep.total_sleep_hours,
            labels: self.live.steps.labels().to_vec(),
            steps: self.live.steps.to_vec(),
            heart_rate: self.live.heart.to_vec(),
            sleep: self.sleep.series.to_vec(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.ended {
            debug!(session_id = %self.id, "Session dropped without end()");
            self.teardown();
        }
    }
}
