//! One-shot actions: listing, previews, settings changes.

use anyhow::{Context, Result};
use crossterm::terminal::size as terminal_size;
use std::io::Write;
use terminal_timer::alert::AlertSink;
use terminal_timer::art::{self, font_names, PREVIEW_TEXT};
use terminal_timer::config::{Command, SettingsStore, UserSettings};
use terminal_timer::frame::{Frame, GRID_COLUMN_GAP};
use terminal_timer::log_debug;
use terminal_timer::sounds::{sound_names, TempSoundFile};

/// Used when stdout is not a terminal.
const FALLBACK_SIZE: (usize, usize) = (80, 24);

pub(crate) fn screen_size() -> (usize, usize) {
    match terminal_size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => (cols as usize, rows as usize),
        Ok(_) => FALLBACK_SIZE,
        Err(err) => {
            log_debug(&format!("Error getting terminal size: {err}"));
            FALLBACK_SIZE
        }
    }
}

pub(crate) fn run_command(
    command: Command,
    store: &SettingsStore,
    sink: &dyn AlertSink,
    size: (usize, usize),
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::SetFont(font) => {
            writeln!(out, "Setting new font to: {font}")?;
            store.set_font(&font)?;
            writeln!(out, "font configuration updated successfully.")?;
        }
        Command::SetSound(sound) => {
            writeln!(out, "Setting new sound to: {sound}")?;
            store.set_sound(&sound)?;
            writeln!(out, "sound configuration updated successfully.")?;
        }
        Command::ListFonts => {
            writeln!(out, "Listing all valid fonts...")?;
            writeln!(out, "{}", render_listing(&font_names(), size))?;
        }
        Command::ListSounds => {
            writeln!(out, "Listing all valid sounds...")?;
            writeln!(out, "{}", render_listing(&sound_names(), size))?;
        }
        Command::PreviewFont(font) => {
            writeln!(out, "{}", render_font_preview(&font, size))?;
        }
        Command::PreviewSound(sound) => {
            preview_sound(&sound, &TempSoundFile::for_session(), sink)?;
        }
        Command::ShowConfig => {
            let settings = store.load_or_create()?;
            write!(out, "{}", describe_settings(&settings, store))?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Columns that fit `width` when every cell is the widest item plus the gap.
pub(crate) fn grid_columns<S: AsRef<str>>(items: &[S], width: usize) -> usize {
    let widest = items
        .iter()
        .map(|item| item.as_ref().chars().count())
        .max()
        .unwrap_or(0);
    (width / (widest + GRID_COLUMN_GAP)).max(1)
}

pub(crate) fn render_listing<S: AsRef<str>>(items: &[S], size: (usize, usize)) -> String {
    let (width, height) = size;
    let mut frame = Frame::new(width, height);
    frame.place_grid(items, grid_columns(items, width));
    frame.serialize()
}

pub(crate) fn render_font_preview(font: &str, size: (usize, usize)) -> String {
    let (width, height) = size;
    let mut frame = Frame::new(width, height);
    let lines = art::render(PREVIEW_TEXT, font);
    frame.place_centered_art(&lines, &[PREVIEW_TEXT]);
    frame.serialize()
}

/// Play through `file`, removing it again whether or not playback worked.
fn preview_sound(sound: &str, file: &TempSoundFile, sink: &dyn AlertSink) -> Result<()> {
    let played = file
        .prepare(sound)
        .context("Error preparing sound file")
        .and_then(|path| sink.play_sound(&path).context("Error playing sound"));
    file.remove();
    played
}

pub(crate) fn describe_settings(settings: &UserSettings, store: &SettingsStore) -> String {
    format!(
        "Current Configuration:\nFont: {}\nSound: {}\nFile: {}\n",
        settings.font,
        settings.sound,
        store.path().display()
    )
}
