//! Terminal timer entrypoint.
//!
//! Parses flags, runs a one-shot command when one was requested, and otherwise
//! takes over the terminal for a full-screen countdown that ends in an alert
//! and a quit/repeat prompt.

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use terminal_timer::alert::{AlertDispatcher, SystemAlerts};
use terminal_timer::cleanup::{install_signal_cleanup, SessionCleanup};
use terminal_timer::config::{AppConfig, UserSettings};
use terminal_timer::input::TerminalKeyboard;
use terminal_timer::render_loop::{RenderLoop, RenderSettings};
use terminal_timer::screen::{SharedOutput, TerminalScreen};
use terminal_timer::sounds::TempSoundFile;
use terminal_timer::terminal_restore::TerminalRestoreGuard;
use terminal_timer::{init_logging, log_debug, log_file_path, trace_log_path};

use crate::commands::{run_command, screen_size};

fn main() -> Result<()> {
    let config = AppConfig::parse();
    init_logging(&config);
    if config.logging_enabled() {
        log_debug(&format!(
            "=== timer started (log: {}, trace: {}) ===",
            log_file_path().display(),
            trace_log_path().display()
        ));
    }

    if let Some(command) = config.requested_command() {
        let store = config.settings_store()?;
        let mut stdout = io::stdout();
        return run_command(command, &store, &SystemAlerts, screen_size(), &mut stdout);
    }

    // Bad timer input is reported before the terminal is touched.
    let spec = config.timer_spec()?;
    let total = spec.total_duration(chrono::Local::now().naive_local());
    let settings = load_settings(&config);
    log_debug(&format!(
        "starting {}s timer (font: {}, sound: {})",
        total.as_secs(),
        settings.font,
        settings.sound
    ));

    run_session(total, settings, config.reminder_message())
}

/// A broken or unreadable settings file never stops a timer.
fn load_settings(config: &AppConfig) -> UserSettings {
    config
        .settings_store()
        .and_then(|store| store.load_or_create())
        .unwrap_or_else(|err| {
            log_debug(&format!("using default settings: {err:#}"));
            UserSettings::default()
        })
}

fn run_session(total: Duration, settings: UserSettings, reminder: &str) -> Result<()> {
    let output = SharedOutput::stdout();
    let sound_file = Arc::new(TempSoundFile::for_session());
    let cleanup = Arc::new(SessionCleanup::new(
        output.clone(),
        Arc::clone(&sound_file),
    ));
    install_signal_cleanup(Arc::clone(&cleanup))?;

    let terminal_guard = TerminalRestoreGuard::new();
    terminal_guard
        .enter_alt_screen(&mut io::stdout())
        .context("failed to enter alternate screen")?;

    let alerts = AlertDispatcher::new(Arc::new(SystemAlerts), sound_file, &settings.sound, reminder);
    let render_settings = RenderSettings {
        font: settings.font,
        reminder: reminder.to_string(),
    };
    let result = RenderLoop::new(
        TerminalScreen::new(output),
        TerminalKeyboard,
        render_settings,
        alerts,
    )
    .run(total);

    cleanup.run();
    drop(terminal_guard);
    result
}
