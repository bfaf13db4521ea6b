//! File logging for a process that owns the whole terminal.
//!
//! Everything goes through `tracing`. With `--log` one subscriber writes
//! readable lines to `terminal_timer.log` and JSON events to
//! `terminal_timer_trace.jsonl`; without it no subscriber is installed and
//! events are dropped. Panics go to a separate crash log.

use crate::config::AppConfig;
use std::{
    env,
    fs::{self, File, OpenOptions},
    io::{self, Write},
    panic,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, OnceLock,
    },
};
use tracing::Subscriber;
use tracing_subscriber::{filter::LevelFilter, fmt, fmt::time::UtcTime, prelude::*};

const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
const CRASH_LOG_MAX_BYTES: u64 = 256 * 1024;
static CRASH_LOG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOGGING_INIT: OnceLock<()> = OnceLock::new();

pub fn log_file_path() -> PathBuf {
    env::temp_dir().join("terminal_timer.log")
}

/// `TIMER_TRACE_LOG` overrides the default location.
pub fn trace_log_path() -> PathBuf {
    env::var("TIMER_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("terminal_timer_trace.jsonl"))
}

pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("terminal_timer_crash.log")
}

/// Install the session subscriber when `--log` (or `TIMER_LOGS`) is on and
/// `--no-logs` is not. Later calls are no-ops.
pub fn init_logging(config: &AppConfig) {
    if !config.logging_enabled() {
        return;
    }
    LOGGING_INIT.get_or_init(|| {
        CRASH_LOG_ENABLED.store(true, Ordering::Relaxed);
        match session_subscriber(&log_file_path(), &trace_log_path()) {
            Ok(subscriber) => {
                let _ = tracing::subscriber::set_global_default(subscriber);
            }
            // The terminal is still ours to print on at this point.
            Err(err) => eprintln!("timer: file logging disabled: {err}"),
        }
    });
}

/// Open for appending, starting the file over once it is past `max_bytes`.
fn open_log(path: &Path, max_bytes: u64) -> io::Result<File> {
    let oversized = fs::metadata(path)
        .map(|meta| meta.len() > max_bytes)
        .unwrap_or(false);
    OpenOptions::new()
        .create(true)
        .write(true)
        .append(!oversized)
        .truncate(oversized)
        .open(path)
}

/// Text layer for `log_debug` lines plus a JSON layer for timer events
/// (`run`, `total_secs`, `decision`, ...).
pub(crate) fn session_subscriber(
    log_path: &Path,
    trace_path: &Path,
) -> io::Result<impl Subscriber + Send + Sync> {
    let text = open_log(log_path, LOG_MAX_BYTES)?;
    let json = open_log(trace_path, LOG_MAX_BYTES)?;
    Ok(tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(Mutex::new(text))
                .with_ansi(false)
                .with_target(false)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(json))
                .with_timer(UtcTime::rfc_3339())
                .with_current_span(false)
                .with_span_list(false),
        )
        .with(LevelFilter::DEBUG))
}

/// Free-form diagnostic line. Dropped unless logging is on.
pub fn log_debug(msg: &str) {
    tracing::debug!("{msg}");
}

/// Append one line per panic to the crash log, keeping it under its budget.
pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !CRASH_LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());
    let payload = if let Some(text) = info.payload().downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = info.payload().downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    };
    let line = format!(
        "[{}] timer v{} panicked at {location}: {payload}\n",
        chrono::Utc::now().to_rfc3339(),
        env!("CARGO_PKG_VERSION")
    );
    if let Ok(mut file) = open_log(&crash_log_path(), CRASH_LOG_MAX_BYTES) {
        let _ = file.write_all(line.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_subscriber_writes_text_and_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("timer.log");
        let trace = dir.path().join("timer.jsonl");
        let subscriber = session_subscriber(&log, &trace).expect("subscriber");

        tracing::subscriber::with_default(subscriber, || {
            log_debug("frame flush failed: broken pipe");
            tracing::info!(run = 2, total_secs = 90, "countdown armed");
        });

        let text = fs::read_to_string(&log).expect("text log");
        assert!(text.contains("frame flush failed: broken pipe"));
        assert!(text.contains("countdown armed"));

        let json = fs::read_to_string(&trace).expect("trace log");
        let armed = json
            .lines()
            .find(|line| line.contains("countdown armed"))
            .expect("armed event");
        assert!(armed.contains("\"run\":2"));
        assert!(armed.contains("\"total_secs\":90"));
    }

    #[test]
    fn log_debug_without_subscriber_is_silent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("timer.log");
        let trace = dir.path().join("timer.jsonl");
        let subscriber = session_subscriber(&log, &trace).expect("subscriber");
        tracing::subscriber::with_default(subscriber, || log_debug("kept"));

        log_debug("dropped");
        let text = fs::read_to_string(&log).expect("text log");
        assert!(text.contains("kept"));
        assert!(!text.contains("dropped"));
    }

    #[test]
    fn oversized_log_starts_over() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.log");
        fs::write(&path, "0123456789abcdefghij").expect("seed");

        let mut file = open_log(&path, 16).expect("open");
        file.write_all(b"fresh\n").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "fresh\n");

        let mut file = open_log(&path, 16).expect("reopen");
        file.write_all(b"more\n").expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "fresh\nmore\n");
    }
}
