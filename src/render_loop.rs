//! Countdown render loop.
//!
//! `Counting -> Expired -> WaitingForInput -> Counting | Terminated`
//!
//! The loop owns the [`Frame`] and is the only writer to the screen while it
//! runs. Counting redraws once per second; waiting redraws every 100 ms while
//! the [`InputArbiter`] listens for `q`/`r` on its own thread.

use anyhow::{bail, Context, Result};
use crossbeam_channel::{bounded, tick, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::alert::AlertDispatcher;
use crate::art;
use crate::countdown::{display_remaining, format_hms, CountdownTarget, Tick};
use crate::frame::Frame;
use crate::input::{Decision, InputArbiter, Keyboard};
use crate::log_debug;
use crate::screen::Screen;

pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);
pub const WAIT_REDRAW: Duration = Duration::from_millis(100);
pub const END_HINT: &str = "Press 'q' to quit or 'r' to repeat.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Counting,
    Expired,
    WaitingForInput,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTiming {
    pub countdown_tick: Duration,
    pub wait_redraw: Duration,
}

impl Default for LoopTiming {
    fn default() -> Self {
        Self {
            countdown_tick: COUNTDOWN_TICK,
            wait_redraw: WAIT_REDRAW,
        }
    }
}

/// What to draw: font name for the art generator and the end-of-timer text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub font: String,
    pub reminder: String,
}

pub struct RenderLoop<S: Screen, K: Keyboard> {
    screen: S,
    keyboard: K,
    frame: Frame,
    settings: RenderSettings,
    alerts: AlertDispatcher,
    timing: LoopTiming,
    phase: Phase,
}

impl<S: Screen, K: Keyboard> RenderLoop<S, K> {
    pub fn new(screen: S, keyboard: K, settings: RenderSettings, alerts: AlertDispatcher) -> Self {
        Self {
            screen,
            keyboard,
            frame: Frame::new(0, 0),
            settings,
            alerts,
            timing: LoopTiming::default(),
            phase: Phase::Counting,
        }
    }

    pub fn with_timing(mut self, timing: LoopTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run timers of `total` length until the user quits. Every repeat starts
    /// a fresh countdown of the full `total`.
    pub fn run(&mut self, total: Duration) -> Result<()> {
        let mut run: u32 = 0;
        loop {
            run += 1;
            let target = CountdownTarget::starting_at(Instant::now(), total)?;
            tracing::info!(run, total_secs = total.as_secs(), "countdown armed");
            self.count_down(target);

            self.phase = Phase::Expired;
            tracing::info!(run, phase = ?self.phase, "timer expired; dispatching alert");
            // Detached: the alert threads are never joined.
            drop(self.alerts.fire());

            let decision = self.wait_for_decision()?;
            tracing::info!(run, ?decision, "decision received");
            if decision == Decision::Quit {
                self.phase = Phase::Terminated;
                return Ok(());
            }
        }
    }

    /// Draw immediately, then once per tick until the target expires.
    pub fn count_down(&mut self, target: CountdownTarget) {
        self.phase = Phase::Counting;
        let ticker = tick(self.timing.countdown_tick);
        loop {
            match target.tick(Instant::now()) {
                Tick::Expired => break,
                Tick::Running(remaining) => self.draw_countdown(remaining),
            }
            if ticker.recv().is_err() {
                break;
            }
        }
    }

    /// Redraw the end message every `wait_redraw` until a decision arrives.
    pub fn wait_for_decision(&mut self) -> Result<Decision> {
        self.phase = Phase::WaitingForInput;
        let source = self
            .keyboard
            .open()
            .context("failed to open terminal for key input")?;
        let (tx, rx) = bounded(1);
        let arbiter = InputArbiter::spawn(source, tx);
        loop {
            self.draw_end_message();
            match rx.recv_timeout(self.timing.wait_redraw) {
                Ok(decision) => {
                    arbiter.shutdown();
                    return Ok(decision);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    arbiter.shutdown();
                    bail!("key reader stopped without a decision");
                }
            }
        }
    }

    /// Query the terminal and start a blank frame of its size. A failed query
    /// skips this frame.
    fn refresh_frame(&mut self) -> bool {
        match self.screen.size() {
            Ok((cols, rows)) => {
                self.frame.resize(cols as usize, rows as usize);
                // A 0x0 terminal has nothing to draw on.
                !self.frame.is_empty()
            }
            Err(err) => {
                log_debug(&format!("Error getting terminal size: {err}"));
                false
            }
        }
    }

    fn present(&mut self) {
        if let Err(err) = self.screen.present(&self.frame) {
            log_debug(&format!("frame flush failed: {err}"));
        }
    }

    fn draw_countdown(&mut self, remaining: Duration) {
        if !self.refresh_frame() {
            return;
        }
        let text = format_hms(display_remaining(remaining));
        let lines = art::render(&text, &self.settings.font);
        self.frame.place_centered_art(&lines, &[text.as_str()]);
        self.present();
    }

    fn draw_end_message(&mut self) {
        if !self.refresh_frame() {
            return;
        }
        compose_end_message(&mut self.frame, &self.settings);
        self.present();
    }
}

/// Reminder art in the middle, key hint in the bottom-left corner.
pub fn compose_end_message(frame: &mut Frame, settings: &RenderSettings) {
    let lines = art::render(&settings.reminder, &settings.font);
    let fallback: Vec<&str> = settings.reminder.lines().collect();
    frame.place_centered_art(&lines, &fallback);
    frame.place_bottom_left(&[END_HINT]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::test_support::RecordingAlerts;
    use crate::input::test_support::{ScriptedKeyboard, ScriptedKeys};
    use crate::screen::test_support::{Presented, RecordingScreen};
    use crate::sounds::{TempSoundFile, DEFAULT_SOUND};
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn settings() -> RenderSettings {
        RenderSettings {
            font: "hash".to_string(),
            reminder: "Done".to_string(),
        }
    }

    fn alerts(sink: Arc<RecordingAlerts>, dir: &tempfile::TempDir) -> AlertDispatcher {
        let file = Arc::new(TempSoundFile::new(dir.path().join("loop.wav")));
        AlertDispatcher::new(sink, file, DEFAULT_SOUND, "Done")
    }

    fn fast_timing() -> LoopTiming {
        LoopTiming {
            countdown_tick: Duration::from_millis(20),
            wait_redraw: Duration::from_millis(10),
        }
    }

    fn wait_for_counts(sink: &RecordingAlerts, expected: (usize, usize)) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.counts() != expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn frame_texts(frames: &Arc<Mutex<Vec<Presented>>>) -> Vec<String> {
        frames
            .lock()
            .expect("frames")
            .iter()
            .map(|p| p.frame.serialize())
            .collect()
    }

    fn countdown_frame(cols: usize, rows: usize, text: &str, font: &str) -> String {
        let mut frame = Frame::new(cols, rows);
        frame.place_centered_art(&art::render(text, font), &[text]);
        frame.serialize()
    }

    #[test]
    fn two_second_countdown_draws_distinct_frames_then_alerts_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::failing());
        let screen = RecordingScreen::fixed(60, 12);
        let frames = Arc::clone(&screen.frames);
        let keyboard = ScriptedKeyboard::new(vec![ScriptedKeys::new("q")]);
        let mut render_loop = RenderLoop::new(
            screen,
            keyboard,
            settings(),
            alerts(Arc::clone(&sink), &dir),
        );

        render_loop.run(Duration::from_secs(2)).expect("run");
        assert_eq!(render_loop.phase(), Phase::Terminated);

        let texts = frame_texts(&frames);
        let two = countdown_frame(60, 12, "00:00:02", "hash");
        let one = countdown_frame(60, 12, "00:00:01", "hash");
        assert!(texts.contains(&two));
        assert!(texts.contains(&one));
        let countdown_frames = texts.iter().filter(|t| **t == two || **t == one).count();
        assert!(countdown_frames >= 2);

        wait_for_counts(&sink, (1, 1));
        assert_eq!(sink.counts(), (1, 1));
    }

    #[test]
    fn overlong_total_fails_before_drawing_or_alerting() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let screen = RecordingScreen::fixed(60, 12);
        let frames = Arc::clone(&screen.frames);
        let mut render_loop = RenderLoop::new(
            screen,
            ScriptedKeyboard::new(vec![ScriptedKeys::new("q")]),
            settings(),
            alerts(Arc::clone(&sink), &dir),
        );

        let total = Duration::from_secs(4_000_000_000_000_000 * 3600);
        assert!(render_loop.run(total).is_err());
        assert!(frame_texts(&frames).is_empty());
        assert_eq!(sink.counts(), (0, 0));
    }

    #[test]
    fn first_frame_is_drawn_without_waiting_for_a_tick() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let screen = RecordingScreen::fixed(60, 12);
        let frames = Arc::clone(&screen.frames);
        let mut render_loop = RenderLoop::new(
            screen,
            ScriptedKeyboard::new(Vec::new()),
            settings(),
            alerts(sink, &dir),
        )
        .with_timing(LoopTiming {
            countdown_tick: Duration::from_secs(60),
            wait_redraw: WAIT_REDRAW,
        });

        // an already-expired target draws nothing at all
        render_loop.count_down(
            CountdownTarget::starting_at(Instant::now(), Duration::ZERO).expect("target"),
        );
        assert!(frame_texts(&frames).is_empty());

        // with a one-minute tick, only the immediate first draw can land in time
        let started = Instant::now();
        let target = CountdownTarget::starting_at(started, Duration::from_secs(5)).expect("target");
        let _detached = thread::spawn(move || render_loop.count_down(target));
        let deadline = started + Duration::from_secs(2);
        while frame_texts(&frames).is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(
            frame_texts(&frames),
            vec![countdown_frame(60, 12, "00:00:05", "hash")]
        );
    }

    #[test]
    fn repeat_restarts_full_countdown_and_alerts_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let screen = RecordingScreen::fixed(60, 12);
        let frames = Arc::clone(&screen.frames);
        let keyboard = ScriptedKeyboard::new(vec![
            ScriptedKeys::after(Duration::from_millis(150), "r"),
            ScriptedKeys::new("q"),
        ]);
        let mut render_loop = RenderLoop::new(
            screen,
            keyboard,
            settings(),
            alerts(Arc::clone(&sink), &dir),
        )
        .with_timing(fast_timing());

        render_loop.run(Duration::from_secs(1)).expect("run");

        let one = countdown_frame(60, 12, "00:00:01", "hash");
        let full_countdowns = frame_texts(&frames).iter().filter(|t| **t == one).count();
        assert!(full_countdowns >= 2, "second run must start from 00:00:01");
        wait_for_counts(&sink, (2, 2));
        assert_eq!(sink.counts(), (2, 2));
    }

    #[test]
    fn waiting_redraws_follow_terminal_resize() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let screen = RecordingScreen::scripted(vec![
            Some((50, 10)),
            Some((50, 10)),
            Some((70, 14)),
            Some((40, 9)),
        ]);
        let frames = Arc::clone(&screen.frames);
        let keyboard =
            ScriptedKeyboard::new(vec![ScriptedKeys::after(Duration::from_millis(200), "q")]);
        let mut render_loop = RenderLoop::new(
            screen,
            keyboard,
            settings(),
            alerts(sink, &dir),
        )
        .with_timing(fast_timing());

        let decision = render_loop.wait_for_decision().expect("decision");
        assert_eq!(decision, Decision::Quit);

        let presented = frames.lock().expect("frames").clone();
        assert!(presented.len() >= 4);
        let sizes: Vec<(u16, u16)> = presented.iter().map(|p| p.size).collect();
        assert_eq!(&sizes[..4], &[(50, 10), (50, 10), (70, 14), (40, 9)]);
        for p in &presented {
            let (cols, rows) = (p.size.0 as usize, p.size.1 as usize);
            assert_eq!(p.frame.width(), cols);
            assert_eq!(p.frame.height(), rows);
            let mut expected = Frame::new(cols, rows);
            compose_end_message(&mut expected, &settings());
            assert_eq!(p.frame, expected, "stale content after resize to {cols}x{rows}");
        }
    }

    #[test]
    fn size_errors_and_zero_sizes_skip_frames_without_stopping() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let screen = RecordingScreen::scripted(vec![None, Some((0, 0)), None, Some((40, 8))]);
        let frames = Arc::clone(&screen.frames);
        let keyboard =
            ScriptedKeyboard::new(vec![ScriptedKeys::after(Duration::from_millis(100), "q")]);
        let mut render_loop = RenderLoop::new(
            screen,
            keyboard,
            settings(),
            alerts(sink, &dir),
        )
        .with_timing(fast_timing());

        assert_eq!(render_loop.wait_for_decision().expect("decision"), Decision::Quit);
        let presented = frames.lock().expect("frames").clone();
        assert!(!presented.is_empty());
        assert!(presented.iter().all(|p| p.size == (40, 8)));
    }

    #[test]
    fn keyboard_open_failure_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let mut render_loop = RenderLoop::new(
            RecordingScreen::fixed(20, 5),
            ScriptedKeyboard::new(Vec::new()),
            settings(),
            alerts(sink, &dir),
        );
        let err = render_loop.wait_for_decision().unwrap_err();
        assert!(format!("{err:#}").contains("failed to open terminal"));
    }

    #[test]
    fn countdown_falls_back_to_plain_text_on_small_terminal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = Arc::new(RecordingAlerts::default());
        let screen = RecordingScreen::fixed(12, 3);
        let frames = Arc::clone(&screen.frames);
        let mut render_loop = RenderLoop::new(
            screen,
            ScriptedKeyboard::new(Vec::new()),
            settings(),
            alerts(sink, &dir),
        )
        .with_timing(LoopTiming {
            countdown_tick: Duration::from_secs(60),
            wait_redraw: WAIT_REDRAW,
        });
        let target = CountdownTarget::starting_at(Instant::now(), Duration::from_millis(900)).expect("target");
        let _detached = thread::spawn(move || render_loop.count_down(target));
        let deadline = Instant::now() + Duration::from_secs(2);
        while frames.lock().expect("frames").is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        let first = frames.lock().expect("frames")[0].frame.clone();
        assert_eq!(first.row(1).as_deref(), Some("  00:00:01  "));
    }

    #[test]
    fn end_message_places_hint_bottom_left() {
        let mut frame = Frame::new(60, 12);
        compose_end_message(&mut frame, &settings());
        assert_eq!(frame.row(11).as_deref().map(str::trim_end), Some(END_HINT));
        assert!(frame.serialize().contains('#'));
    }
}
