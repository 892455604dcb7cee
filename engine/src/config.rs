//! Engine configuration.

use std::{env, path::PathBuf, time::Duration};

/// Default time between redraws, roughly 60 frames per second.
pub const DEFAULT_REDRAW_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Config {
    /// Time between timer-driven redraws. `None` redraws only when the window system asks.
    pub(crate) redraw_interval: Option<Duration>,
    pub(crate) shader_dir: Option<PathBuf>,
    pub(crate) vsync: bool,
    pub(crate) show_fps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a `Config` from a variable lookup such as [`std::env::var`].
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            redraw_interval: var("REDRAW_INTERVAL_MS")
                .and_then(|interval| interval.parse::<u64>().ok())
                .map_or(Some(DEFAULT_REDRAW_INTERVAL), |millis| {
                    (millis > 0).then(|| Duration::from_millis(millis))
                }),
            shader_dir: var("SHADER_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            vsync: var("VSYNC").is_some(),
            show_fps: var("SHOW_FPS").map_or(true, |show| show != "0"),
        }
    }

    pub fn redraw_interval(mut self, interval: impl Into<Option<Duration>>) -> Self {
        self.redraw_interval = interval.into();
        self
    }

    pub fn shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = Some(dir.into());
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn show_fps(mut self, show_fps: bool) -> Self {
        self.show_fps = show_fps;
        self
    }

    /// Directory to load shader files from, if not using the embedded shaders.
    #[inline]
    #[must_use]
    pub fn shader_directory(&self) -> Option<&PathBuf> {
        self.shader_dir.as_ref()
    }
}
