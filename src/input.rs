//! Key reading for the end-of-timer prompt.
//!
//! The arbiter runs on its own thread for one wait phase, ignores everything
//! except `q` and `r`, and publishes a single [`Decision`].

use crossbeam_channel::Sender;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::log_debug;
use crate::terminal_restore::RawModeGuard;

/// Upper bound on one blocking read, so the reader notices shutdown promptly.
pub const INPUT_POLL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Repeat,
    Quit,
}

impl Decision {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'r' => Some(Decision::Repeat),
            'q' => Some(Decision::Quit),
            _ => None,
        }
    }
}

/// One character at a time; `Ok(None)` when nothing arrived within `timeout`.
pub trait KeySource: Send + 'static {
    fn read_key(&mut self, timeout: Duration) -> io::Result<Option<char>>;
}

/// Opens a fresh [`KeySource`] for each wait phase.
pub trait Keyboard {
    type Source: KeySource;

    fn open(&mut self) -> io::Result<Self::Source>;
}

/// Keyboard backed by crossterm events on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalKeyboard;

impl Keyboard for TerminalKeyboard {
    type Source = TerminalKeys;

    fn open(&mut self) -> io::Result<TerminalKeys> {
        Ok(TerminalKeys {
            _raw: RawModeGuard::enable()?,
        })
    }
}

/// Raw-mode key reader; raw mode ends when the reader is dropped.
pub struct TerminalKeys {
    _raw: RawModeGuard,
}

impl KeySource for TerminalKeys {
    fn read_key(&mut self, timeout: Duration) -> io::Result<Option<char>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(None);
        };
        if key.kind == KeyEventKind::Release {
            return Ok(None);
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Ok(interrupt_from_raw_mode())
            }
            KeyCode::Char(ch) => Ok(Some(ch)),
            _ => Ok(None),
        }
    }
}

/// Raw mode swallows Ctrl+C, so hand it back to the signal cleanup path.
#[cfg(unix)]
fn interrupt_from_raw_mode() -> Option<char> {
    unsafe {
        // SAFETY: raising SIGINT on our own process only runs the registered handler.
        libc::raise(libc::SIGINT);
    }
    None
}

#[cfg(not(unix))]
fn interrupt_from_raw_mode() -> Option<char> {
    Some('q')
}

/// Background reader for one wait phase. Dropping it stops and joins the thread.
pub struct InputArbiter {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl InputArbiter {
    pub fn spawn<K: KeySource>(source: K, tx: Sender<Decision>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            if let Some(decision) = read_decision(source, &thread_stop) {
                // Single-slot channel: the loop takes exactly this one value.
                let _ = tx.send(decision);
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log_debug("input reader thread panicked");
            }
        }
    }
}

impl Drop for InputArbiter {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

/// Read until `q` or `r` (or until told to stop). Read errors are logged and
/// retried after one poll interval.
pub fn read_decision<K: KeySource>(mut source: K, stop: &AtomicBool) -> Option<Decision> {
    let poll = Duration::from_millis(INPUT_POLL_MS);
    while !stop.load(Ordering::SeqCst) {
        match source.read_key(poll) {
            Ok(Some(key)) => {
                if let Some(decision) = Decision::from_key(key) {
                    return Some(decision);
                }
            }
            Ok(None) => {}
            Err(err) => {
                log_debug(&format!("Error reading key: {err}"));
                thread::sleep(poll);
            }
        }
    }
    None
}
