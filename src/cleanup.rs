//! Session teardown shared by a normal quit and SIGINT/SIGTERM.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::log_debug;
use crate::screen::SharedOutput;
use crate::sounds::TempSoundFile;
use crate::terminal_restore::restore_terminal;

/// Cursor restore, final clear, terminal modes off, temp sound removed.
/// Runs at most once no matter how many paths reach it.
pub struct SessionCleanup {
    output: SharedOutput,
    sound_file: Arc<TempSoundFile>,
    done: AtomicBool,
}

impl SessionCleanup {
    pub fn new(output: SharedOutput, sound_file: Arc<TempSoundFile>) -> Self {
        Self {
            output,
            sound_file,
            done: AtomicBool::new(false),
        }
    }

    pub fn run(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        // Closing under the output lock waits out any in-flight frame and
        // blocks every later one.
        if let Err(err) = self.output.close() {
            log_debug(&format!("final screen clear failed: {err}"));
        }
        restore_terminal();
        self.sound_file.remove();
        log_debug("session cleanup complete");
    }

    pub fn has_run(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Route SIGINT and SIGTERM through `cleanup`, then exit with `128 + signal`.
/// Call once at startup.
#[cfg(unix)]
pub fn install_signal_cleanup(cleanup: Arc<SessionCleanup>) -> Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            log_debug(&format!("received signal {signal}; cleaning up"));
            cleanup.run();
            if signal == SIGINT {
                eprintln!("\nReceived Ctrl+C, exiting...");
            }
            std::process::exit(128 + signal);
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn install_signal_cleanup(_cleanup: Arc<SessionCleanup>) -> Result<()> {
    log_debug("signal cleanup is only installed on unix");
    Ok(())
}
