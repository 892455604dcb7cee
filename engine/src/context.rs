//! Per-run engine state.

use crate::config::Config;
use std::{
    fmt::Write,
    time::{Duration, Instant},
};

/// Fixed-interval redraw timer.
///
/// Each tick schedules the next one at `now + interval`, so a late tick delays the following
/// ones instead of causing a burst to catch up.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct RedrawSchedule {
    interval: Option<Duration>,
    next: Option<Instant>,
}

impl RedrawSchedule {
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    /// Arm the timer. Returns when the first tick is due, or `None` if the timer is disabled.
    pub fn start(&mut self, now: Instant) -> Option<Instant> {
        self.next = self.interval.map(|interval| now + interval);
        self.next
    }

    /// Reschedule after a tick fires at `now`.
    pub fn tick(&mut self, now: Instant) -> Option<Instant> {
        self.start(now)
    }

    #[inline]
    #[must_use]
    pub fn next(&self) -> Option<Instant> {
        self.next
    }
}

/// Counts presented frames and reports the rate once per second.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[must_use]
pub struct FrameCounter {
    frames: usize,
    window_start: Instant,
}

impl FrameCounter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            window_start: now,
        }
    }

    /// Record a frame. Returns the frame count for the last second once a second has elapsed.
    pub fn frame(&mut self, now: Instant) -> Option<usize> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }
        let fps = self.frames;
        self.frames = 0;
        self.window_start += Self::WINDOW;
        if now.saturating_duration_since(self.window_start) >= Self::WINDOW {
            self.window_start = now;
        }
        Some(fps)
    }
}

#[derive(Debug)]
#[must_use]
pub(crate) struct Context {
    pub(crate) title: String,
    window_title: String,
    pub(crate) schedule: RedrawSchedule,
    pub(crate) frames: FrameCounter,
    pub(crate) suspended: bool,
    pub(crate) config: Config,
}

impl Context {
    pub(crate) fn new(title: impl Into<String>, config: Config, now: Instant) -> Self {
        Self {
            title: title.into(),
            window_title: String::new(),
            schedule: RedrawSchedule::new(config.redraw_interval),
            frames: FrameCounter::new(now),
            suspended: false,
            config,
        }
    }

    #[must_use]
    pub(crate) fn is_running(&self) -> bool {
        !self.suspended
    }

    /// Count a presented frame, returning an updated window title once per second.
    pub(crate) fn frame_presented(&mut self, now: Instant) -> Option<&str> {
        let fps = self.frames.frame(now)?;
        if !self.config.show_fps {
            return None;
        }
        self.window_title.clear();
        let _ = write!(self.window_title, "{} - FPS: {fps}", self.title);
        Some(&self.window_title)
    }
}
