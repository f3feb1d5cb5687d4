//! Terminal key collector built on crossterm.
//!
//! A background thread polls the terminal for key events and forwards
//! activity keys over a bounded channel. The terminal is switched to raw
//! mode while the collector runs and restored when it stops or is dropped.

use crate::input::types::{ActivityKey, ActivitySignal, InputEvent};
use crossbeam_channel::{bounded, Receiver, Sender};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the reader thread blocks before re-checking `running`.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors that can occur during input collection.
#[derive(Debug)]
pub enum InputError {
    AlreadyRunning,
    Terminal(String),
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::AlreadyRunning => write!(f, "Input collector is already running"),
            InputError::Terminal(e) => write!(f, "Terminal error: {e}"),
        }
    }
}

impl std::error::Error for InputError {}

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self, InputError> {
        terminal::enable_raw_mode().map_err(|e| InputError::Terminal(e.to_string()))?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Map a terminal key press to an input event.
pub fn map_key_event(key: &KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Up => Some(InputEvent::Activity(ActivitySignal::from_key(
            ActivityKey::ArrowUp,
        ))),
        KeyCode::Down => Some(InputEvent::Activity(ActivitySignal::from_key(
            ActivityKey::ArrowDown,
        ))),
        KeyCode::Char(' ') => Some(InputEvent::Activity(ActivitySignal::from_key(
            ActivityKey::Space,
        ))),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::EndSession)
        }
        KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::EndSession),
        _ => None,
    }
}

/// Collects activity keys from the controlling terminal.
pub struct TerminalCollector {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    raw_mode: Option<RawModeGuard>,
}

impl TerminalCollector {
    /// Create a new terminal collector.
    pub fn new() -> Self {
        let (sender, receiver) = bounded(1024);
        Self {
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            raw_mode: None,
        }
    }

    /// Enter raw mode and start reading keys in a background thread.
    pub fn start(&mut self) -> Result<(), InputError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(InputError::AlreadyRunning);
        }

        self.raw_mode = Some(RawModeGuard::enable()?);
        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = read_keys(&sender, &running) {
                tracing::error!("Key reader error: {e}");
                let _ = sender.try_send(InputEvent::EndSession);
            }
            running.store(false, Ordering::SeqCst);
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    /// Stop reading keys and restore the terminal.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.raw_mode = None;
    }

    /// Check if the collector is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for input events.
    pub fn receiver(&self) -> &Receiver<InputEvent> {
        &self.receiver
    }
}

impl Default for TerminalCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TerminalCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_keys(sender: &Sender<InputEvent>, running: &AtomicBool) -> std::io::Result<()> {
    while running.load(Ordering::SeqCst) {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if let Some(input) = map_key_event(&key) {
                // Drop input rather than block when the engine is behind
                let _ = sender.try_send(input);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_activity_keys_map_to_triggers() {
        for code in [KeyCode::Up, KeyCode::Down, KeyCode::Char(' ')] {
            assert!(matches!(
                map_key_event(&press(code)),
                Some(InputEvent::Activity(_))
            ));
        }
    }

    #[test]
    fn test_exit_keys() {
        assert!(matches!(
            map_key_event(&press(KeyCode::Char('q'))),
            Some(InputEvent::EndSession)
        ));
        assert!(matches!(
            map_key_event(&press(KeyCode::Esc)),
            Some(InputEvent::EndSession)
        ));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(
            map_key_event(&ctrl_c),
            Some(InputEvent::EndSession)
        ));
    }

    #[test]
    fn test_other_keys_ignored() {
        assert!(map_key_event(&press(KeyCode::Left)).is_none());
        assert!(map_key_event(&press(KeyCode::Char('c'))).is_none());

        let mut release = press(KeyCode::Up);
        release.kind = KeyEventKind::Release;
        assert!(map_key_event(&release).is_none());
    }
}
