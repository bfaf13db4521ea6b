use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use std::time::Duration;

use crate::countdown::MAX_COUNTDOWN;

/// Countdown used when no timer, alarm or duration is given.
pub const DEFAULT_TIMER: Duration = Duration::from_secs(3);

/// What the user asked to count down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSpec {
    Countdown(Duration),
    /// Next occurrence of a wall-clock time.
    Alarm(NaiveTime),
}

impl TimerSpec {
    pub fn from_inputs(
        timer: Option<&str>,
        alarm: Option<&str>,
        positional: Option<&str>,
    ) -> Result<Self> {
        fn given(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.is_empty())
        }
        if let Some(timer) = given(timer) {
            let total = parse_duration(timer).context("invalid timer duration")?;
            return Ok(TimerSpec::Countdown(total));
        }
        if let Some(alarm) = given(alarm) {
            let at = parse_alarm(alarm).context("invalid alarm time")?;
            return Ok(TimerSpec::Alarm(at));
        }
        if let Some(positional) = given(positional) {
            let total = parse_duration(positional).context("invalid timer duration")?;
            return Ok(TimerSpec::Countdown(total));
        }
        Ok(TimerSpec::Countdown(DEFAULT_TIMER))
    }

    /// Total countdown length as seen from `now`. An alarm time earlier than
    /// `now` refers to the same time tomorrow. Sub-second parts are dropped.
    pub fn total_duration(&self, now: NaiveDateTime) -> Duration {
        match *self {
            TimerSpec::Countdown(total) => total,
            TimerSpec::Alarm(at) => {
                let mut target = now.date().and_time(at);
                if target < now {
                    target += ChronoDuration::hours(24);
                }
                let seconds = (target - now).num_seconds().max(0);
                Duration::from_secs(seconds as u64)
            }
        }
    }
}

/// `"HH:MM"` as a duration. Both parts are non-negative integers; minutes may
/// exceed 59 (`"0:90"` is an hour and a half).
pub fn parse_duration(input: &str) -> Result<Duration> {
    let (hours, minutes) = input
        .trim()
        .split_once(':')
        .ok_or_else(|| anyhow!("expected HH:MM, got {input:?}"))?;
    if minutes.contains(':') {
        bail!("expected HH:MM, got {input:?}");
    }
    let hours = parse_part(hours, "hours")?;
    let minutes = parse_part(minutes, "minutes")?;
    let seconds = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .filter(|&secs| secs <= MAX_COUNTDOWN.as_secs())
        .ok_or_else(|| {
            anyhow!(
                "duration {input:?} is longer than {} hours",
                MAX_COUNTDOWN.as_secs() / 3600
            )
        })?;
    Ok(Duration::from_secs(seconds))
}

fn parse_part(part: &str, label: &str) -> Result<u64> {
    let part = part.trim();
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        bail!("{label} must be a non-negative whole number, got {part:?}");
    }
    part.parse::<u64>()
        .with_context(|| format!("{label} value {part:?} is out of range"))
}

/// 24-hour `"HH:MM"` wall-clock time.
pub fn parse_alarm(input: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M")
        .with_context(|| format!("expected 24-hour HH:MM, got {input:?}"))
}
