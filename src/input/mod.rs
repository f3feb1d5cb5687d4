//! Input collection for the activity simulation.
//!
//! Activity signals come from a designated key set (arrow up/down, space).
//! The terminal collector reads them from the controlling TTY; other
//! front ends (the HTTP server, scripted runs) construct `InputEvent`s
//! directly.

pub mod terminal;
pub mod types;

// Re-export commonly used types
pub use terminal::{map_key_event, InputError, TerminalCollector};
pub use types::{ActivityKey, ActivitySignal, InputEvent};
