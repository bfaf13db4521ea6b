//! Command-line parsing, timer input parsing, and persisted user settings.

mod settings;
mod timer_spec;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

pub use settings::{SettingsStore, UserSettings, SETTINGS_DIR, SETTINGS_FILE};
pub use timer_spec::{parse_alarm, parse_duration, TimerSpec, DEFAULT_TIMER};

/// Body of the notification and the end screen when no reminder is given.
pub const DEFAULT_REMINDER: &str = "Time is Up!";

/// CLI options for the terminal timer.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "timer",
    about = "Full-screen countdown timer and alarm for the terminal",
    author,
    version
)]
pub struct AppConfig {
    /// Timer duration as HH:MM (same as --timer)
    #[arg(value_name = "DURATION")]
    pub duration: Option<String>,

    /// Timer duration as HH:MM
    #[arg(short = 't', long = "timer", value_name = "HH:MM")]
    pub timer: Option<String>,

    /// Alarm time in 24-hour HH:MM
    #[arg(short = 'a', long = "alarm", value_name = "HH:MM")]
    pub alarm: Option<String>,

    /// Reminder shown when the timer ends
    #[arg(short = 'r', long = "reminder", default_value = DEFAULT_REMINDER)]
    pub reminder: String,

    /// Save a new default font and exit
    #[arg(short = 'f', long = "set-font", value_name = "FONT")]
    pub set_font: Option<String>,

    /// Render sample text in a font and exit
    #[arg(long = "preview-font", value_name = "FONT")]
    pub preview_font: Option<String>,

    /// List available fonts and exit
    #[arg(long = "list-fonts", default_value_t = false)]
    pub list_fonts: bool,

    /// Save a new default sound and exit
    #[arg(short = 's', long = "set-sound", value_name = "SOUND")]
    pub set_sound: Option<String>,

    /// Play a sound and exit
    #[arg(long = "preview-sound", value_name = "SOUND")]
    pub preview_sound: Option<String>,

    /// List available sounds and exit
    #[arg(long = "list-sounds", default_value_t = false)]
    pub list_sounds: bool,

    /// Show the current font and sound and exit
    #[arg(short = 'c', long = "show-config", default_value_t = false)]
    pub show_config: bool,

    /// Enable file logging (debug)
    #[arg(long = "log", env = "TIMER_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --log and TIMER_LOGS)
    #[arg(long = "no-logs", env = "TIMER_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,

    /// Settings file to use instead of the per-user default
    #[arg(long = "config", env = "TIMER_CONFIG", value_name = "PATH")]
    pub config_path: Option<PathBuf>,
}

/// One-shot actions that run instead of a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetFont(String),
    SetSound(String),
    ListFonts,
    ListSounds,
    PreviewFont(String),
    PreviewSound(String),
    ShowConfig,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }

    pub fn reminder_message(&self) -> &str {
        if self.reminder.is_empty() {
            DEFAULT_REMINDER
        } else {
            &self.reminder
        }
    }

    /// The first requested one-shot action. When several are given, only the
    /// highest-priority one runs.
    pub fn requested_command(&self) -> Option<Command> {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        if let Some(font) = non_empty(&self.set_font) {
            return Some(Command::SetFont(font));
        }
        if let Some(sound) = non_empty(&self.set_sound) {
            return Some(Command::SetSound(sound));
        }
        if self.list_fonts {
            return Some(Command::ListFonts);
        }
        if self.list_sounds {
            return Some(Command::ListSounds);
        }
        if let Some(font) = non_empty(&self.preview_font) {
            return Some(Command::PreviewFont(font));
        }
        if let Some(sound) = non_empty(&self.preview_sound) {
            return Some(Command::PreviewSound(sound));
        }
        if self.show_config {
            return Some(Command::ShowConfig);
        }
        None
    }

    /// `--timer` wins over `--alarm`, which wins over the positional duration.
    pub fn timer_spec(&self) -> Result<TimerSpec> {
        TimerSpec::from_inputs(
            self.timer.as_deref(),
            self.alarm.as_deref(),
            self.duration.as_deref(),
        )
    }

    pub fn settings_store(&self) -> Result<SettingsStore> {
        match &self.config_path {
            Some(path) => Ok(SettingsStore::new(path.clone())),
            None => SettingsStore::default_location(),
        }
    }
}
