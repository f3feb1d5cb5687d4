//! Integration tests for the session lifecycle and the activity clock.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use synheart_activity_sim::core::window::slot_hour;
use synheart_activity_sim::core::{MAX_HEART_RATE, MAX_STEPS, RESTING_HEART_RATE};
use synheart_activity_sim::{ActivityState, Increment, Session, SimulationConfig, TimerKind};

fn config() -> SimulationConfig {
    SimulationConfig {
        seed: Some(2024),
        ..SimulationConfig::default()
    }
}

#[test]
fn scenario_a_first_trigger() {
    let mut session = Session::start(&config());
    assert_eq!(session.metrics().total_steps, 0);
    assert_eq!(session.metrics().current_heart_rate, 60);

    let snapshot = session.trigger_activity(0).snapshot;
    assert_eq!(snapshot.total_steps, 50);
    assert_eq!(snapshot.current_heart_rate, 65);
    assert_eq!(snapshot.armed_timer, Some(TimerKind::Grace));
    assert_eq!(session.next_deadline(), Some(2000));
}

#[test]
fn scenario_b_immediate_retrigger() {
    let mut session = Session::start(&config());
    session.trigger_activity(0);
    let snapshot = session.trigger_activity(0).snapshot;
    assert_eq!(snapshot.total_steps, 100);
    assert_eq!(snapshot.current_heart_rate, 70);

    // No decay tick until the grace window (from the second call) has passed
    assert!(session.advance_to(2999).is_empty());
    assert_eq!(session.state(), ActivityState::Decaying);
    let ticks = session.advance_to(3000);
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].current_heart_rate, 69);
}

#[test]
fn scenario_c_saturation() {
    let mut session = Session::start(&config());
    let big = Increment {
        steps: 1000,
        heart: 30,
    };
    for i in 0..5 {
        session.trigger_activity_with(i, big);
    }
    assert_eq!(session.metrics().current_heart_rate, MAX_HEART_RATE);
    assert_eq!(session.metrics().total_steps, MAX_STEPS);

    let snapshot = session.trigger_activity(10).snapshot;
    assert_eq!(snapshot.current_heart_rate, 130);
    assert_eq!(snapshot.total_steps, 4000);
}

#[test]
fn scenario_d_decay_to_idle() {
    let mut session = Session::start(&config());
    session.trigger_activity(0);

    assert!(session.advance_to(2000).is_empty());
    assert_eq!(session.state(), ActivityState::Decaying);
    assert_eq!(session.armed_timer(), Some(TimerKind::Decay));

    let ticks = session.advance_to(3000);
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].current_heart_rate, 64);

    let ticks = session.advance_to(7000);
    assert_eq!(ticks.len(), 4);
    assert_eq!(session.metrics().current_heart_rate, RESTING_HEART_RATE);
    assert_eq!(session.state(), ActivityState::Idle);
    assert!(session.armed_timer().is_none());

    // Decay termination: nothing fires until the next trigger
    assert!(session.advance_to(1_000_000).is_empty());
}

#[test]
fn retrigger_law_holds_at_any_point_in_grace() {
    for offset in [1u64, 500, 1999] {
        let mut session = Session::start(&config());
        session.trigger_activity(0);
        session.trigger_activity(offset);

        let ticks = session.advance_to(offset + 2000 + 999);
        assert!(ticks.is_empty(), "tick before t+2000+period at offset {offset}");
        let ticks = session.advance_to(offset + 3000);
        assert_eq!(ticks.len(), 1);
    }
}

#[test]
fn trigger_wins_over_tick_at_same_instant() {
    let mut session = Session::start(&config());
    session.trigger_activity(0);
    session.advance_to(3000);
    assert_eq!(session.next_deadline(), Some(4000));

    // Input first, then the driver wakes for the old deadline
    assert!(session.trigger_activity(4000).overdue.is_empty());
    assert!(session.advance_to(4000).is_empty());
    assert_eq!(session.state(), ActivityState::Active);
    assert_eq!(session.next_deadline(), Some(6000));
}

#[test]
fn late_trigger_matches_explicit_advance() {
    let mut late = Session::start(&config());
    late.trigger_activity(0);
    let outcome = late.trigger_activity(4500);

    let mut driven = Session::start(&config());
    driven.trigger_activity(0);
    let ticks = driven.advance_to(4499);
    let snapshot = driven.trigger_activity(4500).snapshot;

    assert_eq!(outcome.overdue.len(), ticks.len());
    assert_eq!(outcome.snapshot.current_heart_rate, 68);
    assert_eq!(outcome.snapshot.current_heart_rate, snapshot.current_heart_rate);
    assert_eq!(outcome.snapshot.heart_rate, snapshot.heart_rate);
    assert_eq!(late.next_deadline(), Some(6500));
}

/// Drive random operation sequences and check every invariant after each step.
#[test]
fn invariants_hold_for_random_sequences() {
    let mut ops = StdRng::seed_from_u64(99);

    for run in 0..50 {
        let mut session = Session::start(&SimulationConfig {
            seed: Some(run),
            ..SimulationConfig::default()
        });
        let mut now = 0u64;

        for _ in 0..200 {
            now += ops.random_range(0..2500);
            let snapshots = if ops.random_bool(0.4) {
                session.trigger_activity(now).into_snapshots()
            } else {
                session.advance_to(now)
            };

            let metrics = session.metrics();
            assert!(metrics.total_steps <= MAX_STEPS);
            assert!((RESTING_HEART_RATE..=MAX_HEART_RATE).contains(&metrics.current_heart_rate));

            // The armed timer always matches the state
            match session.state() {
                ActivityState::Idle => assert!(session.armed_timer().is_none()),
                ActivityState::Active => assert_eq!(session.armed_timer(), Some(TimerKind::Grace)),
                ActivityState::Decaying => {
                    assert_eq!(session.armed_timer(), Some(TimerKind::Decay))
                }
            }

            for snapshot in snapshots {
                assert_eq!(snapshot.steps.len(), 24);
                assert_eq!(snapshot.heart_rate.len(), 24);
                assert_eq!(snapshot.sleep.len(), 24);
                assert_eq!(snapshot.labels.len(), 24);
            }
        }
    }
}

#[test]
fn sleep_profile_law() {
    for seed in 0..20 {
        let session = Session::start(&SimulationConfig {
            seed: Some(seed),
            ..SimulationConfig::default()
        });
        let profile = session.sleep_profile();
        assert!((7.5..8.5).contains(&profile.total_sleep_hours));

        for (i, slot) in profile.series.values().enumerate() {
            let hour = slot_hour(i);
            let value = slot.unwrap_or_default();
            assert_eq!(value != 0.0, hour >= 22 || hour < 7);
        }
    }
}

#[test]
fn injected_rng_controls_sleep_profile() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = Session::start_with_rng(&SimulationConfig::default(), &mut rng);
    let mut rng = StdRng::seed_from_u64(11);
    let b = Session::start_with_rng(&SimulationConfig::default(), &mut rng);
    assert_eq!(a.snapshot().sleep, b.snapshot().sleep);

    let mut other = StdRng::seed_from_u64(12);
    let c = Session::start_with_rng(&SimulationConfig::default(), &mut other);
    assert_ne!(
        a.sleep_profile().total_sleep_hours,
        c.sleep_profile().total_sleep_hours
    );
}

#[test]
fn end_mid_grace_releases_timer() {
    let mut session = Session::start(&config());
    session.trigger_activity(0);
    assert_eq!(session.armed_timer(), Some(TimerKind::Grace));

    let report = session.end();
    assert_eq!(report.triggers, 1);
    assert_eq!(report.decay_ticks, 0);
}
