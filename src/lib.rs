//! Synheart Activity Sim - session-scoped activity simulation for the
//! health dashboard demo.
//!
//! The engine keeps three hourly series (steps, heart rate, sleep) as
//! fixed-length sliding windows. Activity signals bump steps and heart
//! rate; once activity stops, a grace timer hands over to a decay timer
//! that walks the heart rate back to resting.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Synheart Activity Sim                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │    Input    │──▶│  Activity   │──▶│  Telemetry  │       │
//! │  │ (keys/HTTP) │   │   Clock     │   │  Snapshot   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                      │    ▲                  │              │
//! │                      ▼    │                  ▼              │
//! │               ┌─────────────┐        ┌─────────────┐       │
//! │               │ Timer Slot  │        │  Renderer / │       │
//! │               │ (one armed) │        │   Summary   │       │
//! │               └─────────────┘        └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use synheart_activity_sim::{config::SimulationConfig, Session};
//!
//! let config = SimulationConfig { seed: Some(7), ..SimulationConfig::default() };
//! let mut session = Session::start(&config);
//!
//! let snapshot = session.trigger_activity(0).snapshot;
//! assert_eq!(snapshot.total_steps, 50);
//! assert_eq!(snapshot.current_heart_rate, 65);
//!
//! // Grace window ends at 2000ms, first decay tick at 3000ms
//! let ticks = session.advance_to(3000);
//! assert_eq!(ticks[0].current_heart_rate, 64);
//!
//! session.end();
//! ```

pub mod config;
pub mod core;
pub mod dashboard;
pub mod display;
pub mod input;
pub mod session;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, OutputFormat, SimulationConfig};
pub use core::{
    ActivityClock, ActivityState, Increment, Metrics, SleepProfile, Summary, TelemetrySnapshot,
    TimeSeriesWindow, TimerKind,
};
pub use dashboard::{Dashboard, DashboardError};
pub use display::{ConsoleRenderer, ConsoleSummary, JsonLinesRenderer, Renderer, SummaryDisplay};
pub use input::{ActivityKey, ActivitySignal, InputEvent, TerminalCollector};
pub use session::{Session, SessionReport, TriggerOutcome};
pub use stats::{ActivityLog, ActivityStats, SharedActivityLog};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Notice that can be displayed to users.
pub const SIMULATION_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║            SYNHEART ACTIVITY SIM - SIMULATION NOTICE             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  Every reading on this dashboard is simulated.                   ║
║                                                                  ║
║  ✓ HOW IT WORKS:                                                 ║
║    • Arrow Up / Arrow Down / Space count as activity             ║
║    • Each activity adds steps and raises heart rate              ║
║    • After 2s without activity, heart rate decays to 60 BPM      ║
║    • Sleep hours are drawn once when the session starts          ║
║                                                                  ║
║  ✗ WHAT IT IS NOT:                                               ║
║    • Not connected to any sensor or wearable                     ║
║    • Not stored: all data is discarded when the session ends     ║
║    • Not medical advice                                          ║
║                                                                  ║
║  Press q or Esc to end the session.                              ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_notice_contents() {
        assert!(SIMULATION_NOTICE.contains("SIMULATION NOTICE"));
        assert!(SIMULATION_NOTICE.contains("simulated"));
        assert!(SIMULATION_NOTICE.contains("discarded"));
    }
}
