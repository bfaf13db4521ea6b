//! End-of-timer alert: sound playback plus a desktop notification.
//!
//! Both halves run on their own detached thread. Errors are logged, never
//! returned to the render loop, and nothing waits for the threads to finish.

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use crate::log_debug;
use crate::sounds::TempSoundFile;

/// Title of the desktop notification.
pub const ALERT_TITLE: &str = "Timer Completed";

/// Side effects fired when a countdown expires.
pub trait AlertSink: Send + Sync + 'static {
    fn play_sound(&self, path: &Path) -> Result<()>;
    fn show_notification(&self, title: &str, message: &str) -> Result<()>;
}

/// Shells out to the platform's audio player and notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAlerts;

impl AlertSink for SystemAlerts {
    fn play_sound(&self, path: &Path) -> Result<()> {
        let mut command = sound_command(path)?;
        run_quietly(&mut command)
    }

    fn show_notification(&self, title: &str, message: &str) -> Result<()> {
        let mut command = notification_command(title, message)?;
        run_quietly(&mut command)
    }
}

/// Child output is discarded so a chatty player cannot scribble over the frame.
fn run_quietly(command: &mut Command) -> Result<()> {
    let program = command.get_program().to_string_lossy().to_string();
    let status = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("failed to spawn {program}"))?;
    if status.success() {
        Ok(())
    } else {
        let code = status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(anyhow!("{program} exited with code {code}"))
    }
}

/// True when `program` resolves to a file on `PATH`.
pub fn command_exists(program: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return true;
        }
        cfg!(windows) && dir.join(format!("{program}.exe")).is_file()
    })
}

/// Linux players in preference order.
const LINUX_PLAYERS: &[(&str, &[&str])] = &[
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
    ("mpg123", &["-q"]),
    ("paplay", &[]),
    ("aplay", &["-q"]),
];

fn sound_command(path: &Path) -> Result<Command> {
    if cfg!(target_os = "macos") {
        if command_exists("afplay") {
            let mut command = Command::new("afplay");
            command.arg(path);
            return Ok(command);
        }
        bail!("no compatible media player found");
    }
    if cfg!(target_os = "windows") {
        if command_exists("powershell") {
            let script = format!(
                "$player = New-Object System.Media.SoundPlayer; \
                 $player.SoundLocation = '{}'; $player.PlaySync();",
                powershell_quote(&path.to_string_lossy())
            );
            let mut command = Command::new("powershell");
            command.args(["-NoProfile", "-Command", &script]);
            return Ok(command);
        }
        bail!("no compatible media player found");
    }
    if cfg!(unix) {
        for (program, args) in LINUX_PLAYERS {
            if command_exists(program) {
                let mut command = Command::new(program);
                command.args(*args).arg(path);
                return Ok(command);
            }
        }
        bail!("no compatible media player found");
    }
    bail!("unsupported platform")
}

fn notification_command(title: &str, message: &str) -> Result<Command> {
    if cfg!(target_os = "macos") {
        let script = format!(
            "display notification \"{}\" with title \"{}\"",
            applescript_quote(message),
            applescript_quote(title)
        );
        let mut command = Command::new("osascript");
        command.args(["-e", &script]);
        return Ok(command);
    }
    if cfg!(target_os = "windows") {
        let script = format!(
            "[void][System.Reflection.Assembly]::LoadWithPartialName('System.Windows.Forms'); \
             $n = New-Object System.Windows.Forms.NotifyIcon; \
             $n.Icon = [System.Drawing.SystemIcons]::Information; $n.Visible = $true; \
             $n.ShowBalloonTip(5000, '{}', '{}', 'Info'); Start-Sleep -Seconds 5; $n.Dispose();",
            powershell_quote(title),
            powershell_quote(message)
        );
        let mut command = Command::new("powershell");
        command.args(["-NoProfile", "-Command", &script]);
        return Ok(command);
    }
    if command_exists("notify-send") {
        let mut command = Command::new("notify-send");
        command.args(notify_send_args(title, message));
        return Ok(command);
    }
    bail!("notify-send not found")
}

/// No icon file ships with the crate; `alarm-clock` is the freedesktop
/// themed icon name.
fn notify_send_args<'a>(title: &'a str, message: &'a str) -> [&'a str; 4] {
    ["--app-name=timer", "--icon=alarm-clock", title, message]
}

fn applescript_quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn powershell_quote(text: &str) -> String {
    text.replace('\'', "''")
}

/// Join handles for one dispatch. Dropping them detaches the threads.
pub struct AlertHandles {
    pub sound: thread::JoinHandle<()>,
    pub notification: thread::JoinHandle<()>,
}

/// Everything needed to fire the end-of-timer alert, threaded in from `main`
/// rather than read from globals.
#[derive(Clone)]
pub struct AlertDispatcher {
    sink: Arc<dyn AlertSink>,
    sound_file: Arc<TempSoundFile>,
    sound_name: String,
    message: String,
}

impl AlertDispatcher {
    pub fn new(
        sink: Arc<dyn AlertSink>,
        sound_file: Arc<TempSoundFile>,
        sound_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            sound_file,
            sound_name: sound_name.into(),
            message: message.into(),
        }
    }

    /// Start the sound and the notification concurrently and return at once.
    pub fn fire(&self) -> AlertHandles {
        let sink = Arc::clone(&self.sink);
        let sound_file = Arc::clone(&self.sound_file);
        let sound_name = self.sound_name.clone();
        let sound = thread::spawn(move || {
            let path = match sound_file.prepare(&sound_name) {
                Ok(path) => path,
                Err(err) => {
                    log_debug(&format!("Error preparing sound file: {err:#}"));
                    return;
                }
            };
            if let Err(err) = sink.play_sound(&path) {
                log_debug(&format!("Error playing sound: {err:#}"));
            }
        });

        let sink = Arc::clone(&self.sink);
        let message = self.message.clone();
        let notification = thread::spawn(move || {
            if let Err(err) = sink.show_notification(ALERT_TITLE, &message) {
                log_debug(&format!("Error showing notification: {err:#}"));
            }
        });

        tracing::info!(sound = %self.sound_name, "alert dispatched");
        AlertHandles {
            sound,
            notification,
        }
    }
}
