//! Single-slot timer scheduling on a virtual millisecond timeline.
//!
//! The activity clock owns exactly one `TimerSlot`. Arming a timer replaces
//! whatever was armed before, so the grace timer and the decay timer can
//! never be armed at the same time.

use serde::{Deserialize, Serialize};

/// Milliseconds since session start.
pub type Millis = u64;

/// The two kinds of timer the activity clock uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Single-shot Active -> Decaying transition
    Grace,
    /// Repeating heart-rate decay tick
    Decay,
}

/// Identifies one arming of the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    id: u64,
    kind: TimerKind,
}

impl TimerHandle {
    pub fn kind(&self) -> TimerKind {
        self.kind
    }
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    /// The deadline the timer was scheduled for
    pub at: Millis,
}

#[derive(Debug, Clone, Copy)]
struct ArmedTimer {
    handle: TimerHandle,
    deadline: Millis,
    /// Re-arm period for repeating timers
    period: Option<Millis>,
}

/// Holds at most one armed timer.
#[derive(Debug, Default)]
pub struct TimerSlot {
    armed: Option<ArmedTimer>,
    next_id: u64,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a single-shot timer, cancelling whatever was armed.
    pub fn arm_once(&mut self, kind: TimerKind, now: Millis, delay: Millis) -> TimerHandle {
        self.arm(kind, now.saturating_add(delay), None)
    }

    /// Arm a repeating timer, cancelling whatever was armed. The first
    /// firing is one `period` after `now`.
    pub fn arm_repeating(&mut self, kind: TimerKind, now: Millis, period: Millis) -> TimerHandle {
        // A zero period would fire forever within one advance
        let period = period.max(1);
        self.arm(kind, now.saturating_add(period), Some(period))
    }

    fn arm(&mut self, kind: TimerKind, deadline: Millis, period: Option<Millis>) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle {
            id: self.next_id,
            kind,
        };
        self.armed = Some(ArmedTimer {
            handle,
            deadline,
            period,
        });
        handle
    }

    /// Cancel the armed timer, if any.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take().map(|t| t.handle)
    }

    /// Cancel only if `handle` is still the armed timer.
    pub fn cancel_handle(&mut self, handle: TimerHandle) -> bool {
        if self.is_current(handle) {
            self.armed = None;
            true
        } else {
            false
        }
    }

    /// Whether `handle` is the currently armed timer.
    pub fn is_current(&self, handle: TimerHandle) -> bool {
        self.armed.map(|t| t.handle) == Some(handle)
    }

    /// Kind of the armed timer.
    pub fn armed(&self) -> Option<TimerKind> {
        self.armed.map(|t| t.handle.kind)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Deadline of the armed timer.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.armed.map(|t| t.deadline)
    }

    /// Take the armed timer if it is due at `now`.
    ///
    /// Single-shot timers are disarmed; repeating timers are re-armed one
    /// period after their previous deadline.
    pub fn pop_due(&mut self, now: Millis) -> Option<FiredTimer> {
        let timer = self.armed?;
        if timer.deadline > now {
            return None;
        }

        let fired = FiredTimer {
            handle: timer.handle,
            at: timer.deadline,
        };

        self.armed = timer.period.map(|period| ArmedTimer {
            deadline: timer.deadline.saturating_add(period),
            ..timer
        });

        Some(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arming_replaces_previous_timer() {
        let mut slot = TimerSlot::new();
        let grace = slot.arm_once(TimerKind::Grace, 0, 2000);
        let decay = slot.arm_repeating(TimerKind::Decay, 500, 1000);

        assert_eq!(slot.armed(), Some(TimerKind::Decay));
        assert!(!slot.is_current(grace));
        assert!(slot.is_current(decay));
        assert_eq!(slot.next_deadline(), Some(1500));
    }

    #[test]
    fn test_single_shot_fires_once() {
        let mut slot = TimerSlot::new();
        let handle = slot.arm_once(TimerKind::Grace, 100, 2000);

        assert!(slot.pop_due(2099).is_none());
        let fired = slot.pop_due(2100).unwrap();
        assert_eq!(fired.handle, handle);
        assert_eq!(fired.at, 2100);
        assert!(!slot.is_armed());
        assert!(slot.pop_due(10_000).is_none());
    }

    #[test]
    fn test_repeating_rearms_from_deadline() {
        let mut slot = TimerSlot::new();
        slot.arm_repeating(TimerKind::Decay, 0, 1000);

        // Late wake-up catches up one period at a time
        assert_eq!(slot.pop_due(3500).unwrap().at, 1000);
        assert_eq!(slot.pop_due(3500).unwrap().at, 2000);
        assert_eq!(slot.pop_due(3500).unwrap().at, 3000);
        assert!(slot.pop_due(3500).is_none());
        assert_eq!(slot.next_deadline(), Some(4000));
    }

    #[test]
    fn test_stale_handle_cannot_cancel() {
        let mut slot = TimerSlot::new();
        let old = slot.arm_once(TimerKind::Grace, 0, 2000);
        let new = slot.arm_once(TimerKind::Grace, 100, 2000);

        assert!(!slot.cancel_handle(old));
        assert!(slot.is_armed());
        assert!(slot.cancel_handle(new));
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let mut slot = TimerSlot::new();
        slot.arm_repeating(TimerKind::Decay, 0, 1000);
        assert_eq!(slot.cancel().map(|h| h.kind()), Some(TimerKind::Decay));
        assert!(slot.pop_due(1000).is_none());
    }
}
