//! Persisted font and sound preferences.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::art::{is_known_font, DEFAULT_FONT};
use crate::log_debug;
use crate::sounds::{is_known_sound, DEFAULT_SOUND};

pub const SETTINGS_DIR: &str = "timer";
pub const SETTINGS_FILE: &str = "timer-config.yaml";

/// Key-value settings file. Unknown keys are ignored and missing keys take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub font: String,
    pub sound: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT.to_string(),
            sound: DEFAULT_SOUND.to_string(),
        }
    }
}

/// Reads and writes [`UserSettings`] at one path.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config_local_dir>/timer/timer-config.yaml`
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_local_dir()
            .ok_or_else(|| anyhow!("could not determine the user config directory"))?;
        Ok(Self::new(dir.join(SETTINGS_DIR).join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the settings, writing a default file first if none exists.
    pub fn load_or_create(&self) -> Result<UserSettings> {
        if !self.path.exists() {
            let settings = UserSettings::default();
            self.save(&settings)?;
            log_debug(&format!("created settings file {}", self.path.display()));
            return Ok(settings);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if text.trim().is_empty() {
            return Ok(UserSettings::default());
        }
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))
    }

    pub fn save(&self, settings: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let text = serde_yaml::to_string(settings).context("failed to encode settings")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }

    /// Validate `font` against the built-in fonts, then persist it.
    pub fn set_font(&self, font: &str) -> Result<UserSettings> {
        if !is_known_font(font) {
            bail!("unknown font {font:?}; use --list-fonts to see the choices");
        }
        self.update(|settings| settings.font = font.trim().to_ascii_lowercase())
    }

    /// Validate `sound` against the built-in sounds, then persist it.
    pub fn set_sound(&self, sound: &str) -> Result<UserSettings> {
        if !is_known_sound(sound) {
            bail!("unknown sound {sound:?}; use --list-sounds to see the choices");
        }
        self.update(|settings| settings.sound = sound.trim().to_string())
    }

    fn update(&self, change: impl FnOnce(&mut UserSettings)) -> Result<UserSettings> {
        let mut settings = self.load_or_create()?;
        change(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}
