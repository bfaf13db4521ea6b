//! Built-in alert sounds.
//!
//! Each catalog entry is a short tone sequence synthesized to a 16-bit mono
//! PCM WAV. Playback itself is left to the platform player (see `alert`), so
//! the sound is written to a per-session temp file first.

use anyhow::{anyhow, Context, Result};
use std::f32::consts::PI;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{lock_or_recover, log_debug};

pub const DEFAULT_SOUND: &str = "Beeper.wav";

const SAMPLE_RATE: u32 = 22_050;
const AMPLITUDE: f32 = 0.6;
const EDGE_MS: u32 = 5;

/// `(frequency Hz, length ms)`; a zero frequency is a rest.
type Note = (f32, u32);

struct SoundRecipe {
    name: &'static str,
    notes: &'static [Note],
    repeats: usize,
}

const CATALOG: &[SoundRecipe] = &[
    SoundRecipe {
        name: "Beeper.wav",
        notes: &[(880.0, 120), (0.0, 80)],
        repeats: 4,
    },
    SoundRecipe {
        name: "Chime.wav",
        notes: &[(659.3, 220), (523.3, 220), (392.0, 420)],
        repeats: 1,
    },
    SoundRecipe {
        name: "Alarm.wav",
        notes: &[(1046.5, 90), (0.0, 40), (1046.5, 90), (0.0, 300)],
        repeats: 4,
    },
    SoundRecipe {
        name: "Bell.wav",
        notes: &[(1318.5, 600), (0.0, 150), (1318.5, 600)],
        repeats: 1,
    },
    SoundRecipe {
        name: "Ping.wav",
        notes: &[(1760.0, 150)],
        repeats: 1,
    },
    SoundRecipe {
        name: "Siren.wav",
        notes: &[(600.0, 250), (900.0, 250)],
        repeats: 4,
    },
    SoundRecipe {
        name: "Pulse.wav",
        notes: &[(440.0, 60), (0.0, 60)],
        repeats: 8,
    },
];

pub fn sound_names() -> Vec<&'static str> {
    CATALOG.iter().map(|sound| sound.name).collect()
}

pub fn is_known_sound(name: &str) -> bool {
    find_sound(name).is_some()
}

fn find_sound(name: &str) -> Option<&'static SoundRecipe> {
    CATALOG.iter().find(|sound| sound.name == name.trim())
}

/// Synthesize the named catalog sound as WAV bytes.
pub fn render_wav(name: &str) -> Result<Vec<u8>> {
    let recipe = find_sound(name).ok_or_else(|| anyhow!("unknown sound '{name}'"))?;
    let mut samples = Vec::new();
    for _ in 0..recipe.repeats {
        for &(freq, ms) in recipe.notes {
            push_note(&mut samples, freq, ms);
        }
    }
    Ok(encode_wav(&samples))
}

fn push_note(samples: &mut Vec<i16>, freq: f32, ms: u32) {
    let count = (SAMPLE_RATE * ms / 1000) as usize;
    let edge = (SAMPLE_RATE * EDGE_MS / 1000) as usize;
    for i in 0..count {
        if freq <= 0.0 {
            samples.push(0);
            continue;
        }
        let envelope = if i < edge {
            i as f32 / edge as f32
        } else if count - i < edge {
            (count - i) as f32 / edge as f32
        } else {
            1.0
        };
        let phase = 2.0 * PI * freq * i as f32 / SAMPLE_RATE as f32;
        let value = phase.sin() * AMPLITUDE * envelope;
        samples.push((value * i16::MAX as f32) as i16);
    }
}

fn encode_wav(samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// The session's sound file on disk. Shared through an `Arc` between the
/// alert threads and the cleanup path; removed by `remove()` and on drop.
#[derive(Debug)]
pub struct TempSoundFile {
    path: PathBuf,
    prepared: Mutex<Option<String>>,
}

impl TempSoundFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            prepared: Mutex::new(None),
        }
    }

    /// `$TMPDIR/timer-sound-<YYYYmmdd-HHMMSS>-<pid>.wav`
    pub fn for_session() -> Self {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let name = format!("timer-sound-{stamp}-{}.wav", std::process::id());
        Self::new(std::env::temp_dir().join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the named sound unless it is already on disk, returning the path
    /// to hand to the player.
    pub fn prepare(&self, name: &str) -> Result<PathBuf> {
        let mut prepared = lock_or_recover(&self.prepared, "TempSoundFile::prepare");
        if prepared.as_deref() == Some(name) && self.path.exists() {
            return Ok(self.path.clone());
        }
        let bytes = render_wav(name)?;
        fs::write(&self.path, bytes)
            .with_context(|| format!("failed to write sound file {}", self.path.display()))?;
        *prepared = Some(name.to_string());
        Ok(self.path.clone())
    }

    /// Best-effort delete; a file that is already gone is not an error.
    pub fn remove(&self) {
        let mut prepared = lock_or_recover(&self.prepared, "TempSoundFile::remove");
        *prepared = None;
        match fs::remove_file(&self.path) {
            Ok(()) => log_debug(&format!("removed sound file {}", self.path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => log_debug(&format!(
                "failed to delete temporary file {}: {err}",
                self.path.display()
            )),
        }
    }
}

impl Drop for TempSoundFile {
    fn drop(&mut self) {
        self.remove();
    }
}
