//! Dashboard: connects input, the session, and the output collaborators.
//!
//! Whatever gates access (a login form, an HTTP call) calls `start` and
//! `end`. In between, activity and timer progress go through the
//! dashboard, which forwards every snapshot to the renderer and every
//! summary to the display.

use crate::config::SimulationConfig;
use crate::core::clock::Increment;
use crate::core::telemetry::{Summary, TelemetrySnapshot};
use crate::core::timer::Millis;
use crate::display::{Renderer, SummaryDisplay};
use crate::input::InputEvent;
use crate::session::{Session, SessionReport};
use crate::stats::SharedActivityLog;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Errors from gated dashboard operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    /// No session is running
    NoSession,
    /// A session is already running
    AlreadyRunning,
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::NoSession => write!(f, "No session is running"),
            DashboardError::AlreadyRunning => write!(f, "A session is already running"),
        }
    }
}

impl std::error::Error for DashboardError {}

/// A running session plus the wall-clock instant its timeline starts at.
struct ActiveSession {
    session: Session,
    epoch: Instant,
}

impl ActiveSession {
    fn elapsed(&self) -> Millis {
        self.epoch.elapsed().as_millis() as Millis
    }
}

/// The dashboard front end for one user at a time.
pub struct Dashboard {
    config: SimulationConfig,
    active: Option<ActiveSession>,
    renderer: Box<dyn Renderer>,
    display: Box<dyn SummaryDisplay>,
    log: SharedActivityLog,
}

impl Dashboard {
    pub fn new(
        config: SimulationConfig,
        renderer: Box<dyn Renderer>,
        display: Box<dyn SummaryDisplay>,
        log: SharedActivityLog,
    ) -> Self {
        Self {
            config,
            active: None,
            renderer,
            display,
            log,
        }
    }

    /// Start a session and show its initial summary.
    pub fn start(&mut self) -> Result<Uuid, DashboardError> {
        if self.active.is_some() {
            return Err(DashboardError::AlreadyRunning);
        }

        let session = Session::start(&self.config);
        let id = session.id();
        self.display.display(&session.summary());
        self.log.record_session_started();
        self.active = Some(ActiveSession {
            session,
            epoch: Instant::now(),
        });
        Ok(id)
    }

    /// End the running session.
    pub fn end(&mut self) -> Result<SessionReport, DashboardError> {
        let active = self.active.take().ok_or(DashboardError::NoSession)?;
        let report = active.session.end();
        self.log.record_session_ended();
        self.display.display(&Summary::placeholder());
        Ok(report)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// Milliseconds on the running session's timeline.
    pub fn elapsed(&self) -> Option<Millis> {
        self.active.as_ref().map(ActiveSession::elapsed)
    }

    /// Session-timeline deadline of the armed timer.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.session().and_then(Session::next_deadline)
    }

    /// Wall-clock instant of the armed timer's deadline.
    pub fn next_deadline_instant(&self) -> Option<Instant> {
        let active = self.active.as_ref()?;
        let deadline = active.session.next_deadline()?;
        Some(active.epoch + Duration::from_millis(deadline))
    }

    /// Handle one input event at session time `now`.
    ///
    /// Returns the snapshot produced by an activity signal, or `None` if
    /// the event ended the session.
    pub fn handle_input(
        &mut self,
        event: InputEvent,
        now: Millis,
    ) -> Result<Option<TelemetrySnapshot>, DashboardError> {
        match event {
            InputEvent::Activity(signal) => {
                let default = self
                    .session()
                    .ok_or(DashboardError::NoSession)?
                    .default_increment();
                self.trigger_activity_with(now, signal.increment(default))
                    .map(Some)
            }
            InputEvent::EndSession => self.end().map(|_| None),
        }
    }

    /// Trigger activity with the configured increment.
    pub fn trigger_activity(&mut self, now: Millis) -> Result<TelemetrySnapshot, DashboardError> {
        let increment = self
            .session()
            .ok_or(DashboardError::NoSession)?
            .default_increment();
        self.trigger_activity_with(now, increment)
    }

    /// Trigger activity with an explicit increment.
    pub fn trigger_activity_with(
        &mut self,
        now: Millis,
        increment: Increment,
    ) -> Result<TelemetrySnapshot, DashboardError> {
        let active = self.active.as_mut().ok_or(DashboardError::NoSession)?;
        let outcome = active.session.trigger_activity_with(now, increment);

        for snapshot in &outcome.overdue {
            self.log.record_decay_tick();
            self.publish(snapshot);
        }
        self.log.record_trigger();
        self.publish(&outcome.snapshot);
        Ok(outcome.snapshot)
    }

    /// Trigger activity at the current wall-clock session time.
    pub fn trigger_activity_now(
        &mut self,
        increment: Option<Increment>,
    ) -> Result<TelemetrySnapshot, DashboardError> {
        let active = self.active.as_ref().ok_or(DashboardError::NoSession)?;
        let now = active.elapsed();
        let increment = increment.unwrap_or_else(|| active.session.default_increment());
        self.trigger_activity_with(now, increment)
    }

    /// Fire due timers at session time `now`; returns snapshots published.
    pub fn advance_to(&mut self, now: Millis) -> usize {
        let Some(active) = self.active.as_mut() else {
            return 0;
        };

        let snapshots = active.session.advance_to(now);
        for snapshot in &snapshots {
            self.log.record_decay_tick();
            self.publish(snapshot);
        }
        snapshots.len()
    }

    /// Fire timers due by the current wall-clock session time.
    pub fn advance_now(&mut self) -> usize {
        match self.elapsed() {
            Some(now) => self.advance_to(now),
            None => 0,
        }
    }

    /// Current snapshot of the running session.
    pub fn snapshot(&self) -> Result<TelemetrySnapshot, DashboardError> {
        self.session()
            .map(Session::snapshot)
            .ok_or(DashboardError::NoSession)
    }

    /// Current summary, or the placeholder if no session is running.
    pub fn summary(&self) -> Summary {
        self.session()
            .map(Session::summary)
            .unwrap_or_else(Summary::placeholder)
    }

    fn publish(&mut self, snapshot: &TelemetrySnapshot) {
        self.renderer.render(snapshot);
        self.display.display(&snapshot.summary());
        self.log.record_snapshot_rendered();
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        if self.active.is_some() {
            let _ = self.end();
        }
    }
}
