//! Transport controls over a planning sequence.
//!
//! The controller owns no timer thread. Callers pass the current time from a
//! [`Clock`] into [`PlaybackController::poll`], which runs whatever ticks are
//! due. Tests drive it with a [`VirtualClock`]; the CLI uses a
//! [`MonotonicClock`].

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use claimboard_protocol::{AllianceRoster, ClaimMap, TileId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::planner::Planner;

pub trait Clock {
    /// Time elapsed since the clock's own origin.
    fn now(&self) -> Duration;
}

/// Manually advanced clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VirtualClock {
    elapsed: Duration,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.elapsed
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    #[serde(rename = "0.25x")]
    Quarter,
    #[serde(rename = "0.5x")]
    Half,
    #[default]
    #[serde(rename = "1x")]
    Normal,
    #[serde(rename = "2x")]
    Double,
    #[serde(rename = "4x")]
    Quadruple,
}

impl PlaybackSpeed {
    pub const ALL: [PlaybackSpeed; 5] = [
        Self::Quarter,
        Self::Half,
        Self::Normal,
        Self::Double,
        Self::Quadruple,
    ];

    /// Time between steps.
    pub fn interval(self) -> Duration {
        Duration::from_millis(match self {
            Self::Quarter => 4000,
            Self::Half => 2000,
            Self::Normal => 1000,
            Self::Double => 500,
            Self::Quadruple => 250,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Quarter => "0.25x",
            Self::Half => "0.5x",
            Self::Normal => "1x",
            Self::Double => "2x",
            Self::Quadruple => "4x",
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown playback speed '{0}' (expected 0.25x, 0.5x, 1x, 2x or 4x)")]
pub struct UnknownSpeed(pub String);

impl FromStr for PlaybackSpeed {
    type Err = UnknownSpeed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|speed| speed.label() == trimmed || speed.label() == format!("{trimmed}x"))
            .ok_or_else(|| UnknownSpeed(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Paused,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Timer {
    interval: Duration,
    next_due: Duration,
}

/// Claim map to render for one cursor position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub cursor: Option<usize>,
    pub claims: ClaimMap,
    pub highlight: Option<TileId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaybackController {
    state: PlaybackState,
    cursor: Option<usize>,
    speed: PlaybackSpeed,
    timer: Option<Timer>,
}

impl PlaybackController {
    pub fn new(speed: PlaybackSpeed) -> Self {
        Self {
            speed,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// `None` means not started.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Start advancing. Restarts from the first step when nothing has been
    /// shown yet or the cursor already sits on the last step.
    pub fn play(&mut self, len: usize, now: Duration) {
        if len == 0 {
            return;
        }
        match self.cursor {
            Some(c) if c < len - 1 => {}
            _ => self.cursor = Some(0),
        }
        self.state = PlaybackState::Playing;
        self.arm(now);
    }

    pub fn pause(&mut self) {
        self.timer = None;
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.timer = None;
        self.cursor = None;
        self.state = PlaybackState::Stopped;
    }

    pub fn toggle(&mut self, len: usize, now: Duration) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(len, now);
        }
    }

    pub fn step_forward(&mut self, len: usize) {
        self.step_to(len, |c| c.map_or(0, |c| c + 1));
    }

    pub fn step_backward(&mut self, len: usize) {
        self.step_to(len, |c| c.map_or(0, |c| c.saturating_sub(1)));
    }

    fn step_to(&mut self, len: usize, target: impl FnOnce(Option<usize>) -> usize) {
        if len == 0 {
            return;
        }
        self.timer = None;
        self.cursor = Some(target(self.cursor).min(len - 1));
        self.state = PlaybackState::Paused;
    }

    /// Jump to a normalized position in `[0, 1]`. Keeps playing if playing.
    pub fn seek(&mut self, fraction: f64, len: usize) {
        if len == 0 {
            return;
        }
        let fraction = if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        };
        let index = (fraction * (len - 1) as f64).round() as usize;
        self.cursor = Some(index.min(len - 1));
        if self.state == PlaybackState::Stopped {
            self.state = PlaybackState::Paused;
        }
    }

    /// Change speed; a running timer restarts at the new interval from `now`
    /// with the cursor where it is.
    pub fn set_speed(&mut self, speed: PlaybackSpeed, now: Duration) {
        self.speed = speed;
        if self.is_playing() {
            self.arm(now);
        }
    }

    fn arm(&mut self, now: Duration) {
        let interval = self.speed.interval();
        self.timer = Some(Timer {
            interval,
            next_due: now + interval,
        });
    }

    /// Run every tick due at `now` against a sequence of `len` items and
    /// return how many fired.
    pub fn poll(&mut self, now: Duration, len: usize) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timer {
            if timer.next_due > now {
                break;
            }
            fired += 1;
            self.tick(len);
            if let Some(t) = self.timer.as_mut() {
                t.next_due += t.interval;
            }
        }
        fired
    }

    /// When the next tick is due, if a timer is armed.
    pub fn next_due(&self) -> Option<Duration> {
        self.timer.map(|t| t.next_due)
    }

    fn tick(&mut self, len: usize) {
        if len == 0 {
            debug!("sequence emptied during playback");
            self.stop();
            return;
        }
        let last = len - 1;
        match self.cursor {
            Some(c) if c >= last => {
                self.cursor = Some(last);
                self.pause();
                debug!(cursor = last, "playback reached the end");
            }
            Some(c) => self.cursor = Some(c + 1),
            None => self.cursor = Some(0),
        }
    }

    /// Keep the cursor in range after the sequence changed length.
    pub fn sync_len(&mut self, len: usize) {
        match (self.cursor, len) {
            (Some(_), 0) => self.stop(),
            (Some(c), len) if c >= len => self.cursor = Some(len - 1),
            _ => {}
        }
    }

    /// Position as a fraction of the sequence, for a scrubber.
    pub fn progress(&self, len: usize) -> f64 {
        match self.cursor {
            None => 0.0,
            Some(_) if len <= 1 => 1.0,
            Some(c) => c.min(len - 1) as f64 / (len - 1) as f64,
        }
    }

    pub fn frame(&self, planner: &Planner, baseline: &ClaimMap, roster: &AllianceRoster) -> Frame {
        Frame {
            cursor: self.cursor,
            claims: planner.claims_at(self.cursor, baseline, roster),
            highlight: planner.highlight_at(self.cursor),
        }
    }
}
