//! Remaining-time math and `HH:MM:SS` formatting for the render loop.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

/// Longest countdown accepted anywhere (99 999 hours, about 11 years).
pub const MAX_COUNTDOWN: Duration = Duration::from_secs(99_999 * 3600);

/// End of one timer run. A repeat builds a fresh target from the full
/// total duration instead of re-arming this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTarget {
    end: Instant,
}

impl CountdownTarget {
    /// Fails when `total` is longer than [`MAX_COUNTDOWN`] or the clock
    /// cannot represent the end instant.
    pub fn starting_at(now: Instant, total: Duration) -> Result<Self> {
        if total > MAX_COUNTDOWN {
            return Err(anyhow!(
                "countdown of {}s exceeds the {}h limit",
                total.as_secs(),
                MAX_COUNTDOWN.as_secs() / 3600
            ));
        }
        let end = now
            .checked_add(total)
            .ok_or_else(|| anyhow!("countdown of {}s overflows the clock", total.as_secs()))?;
        Ok(Self { end })
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn tick(&self, now: Instant) -> Tick {
        tick(self.end, now)
    }
}

/// Result of sampling the clock against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Running(Duration),
    Expired,
}

/// Time left until `end`, floored at zero.
pub fn remaining(end: Instant, now: Instant) -> Duration {
    end.saturating_duration_since(now)
}

pub fn tick(end: Instant, now: Instant) -> Tick {
    if now >= end {
        Tick::Expired
    } else {
        Tick::Running(remaining(end, now))
    }
}

/// Round a partial second up, so a fresh 2 second timer shows `00:00:02`
/// rather than `00:00:01` on its first frame.
pub fn display_remaining(remaining: Duration) -> Duration {
    let whole = remaining.as_secs();
    if remaining.subsec_nanos() > 0 {
        Duration::from_secs(whole.saturating_add(1))
    } else {
        Duration::from_secs(whole)
    }
}

/// Hours are not capped or rolled into days: 30 hours prints `30:00:00`.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}
