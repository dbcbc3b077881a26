// config.rs - Studio configuration with defaults and validation

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::DEFAULT_FADE_DURATION;
use crate::error::ConfigError;
use crate::rules::RuleSet;
use crate::session::DEFAULT_SESSION_FRAMES;
use crate::stability::{DEFAULT_DELAY, DEFAULT_WINDOW};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub enabled: bool,
    /// Consecutive repeating ticks before the run is stopped.
    pub delay: u32,
    /// Grids remembered for cycle detection.
    pub window: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delay: DEFAULT_DELAY,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Settings for one studio session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub rows: usize,
    pub cols: usize,
    /// Pixel size of one cell on screen.
    pub cell_size: u32,
    /// Generations per second.
    pub speed: f64,
    pub rules: String,
    pub fade_duration: u32,
    pub random_density: f64,
    pub stability: StabilityConfig,
    /// Frames kept for stepping back through the live run.
    pub session_history: usize,
    /// Where the desktop studio keeps saved recordings.
    pub recordings_dir: String,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            rows: 60,
            cols: 80,
            cell_size: 10,
            speed: 10.0,
            rules: RuleSet::CONWAY.to_string(),
            fade_duration: DEFAULT_FADE_DURATION,
            random_density: 0.3,
            stability: StabilityConfig::default(),
            session_history: DEFAULT_SESSION_FRAMES,
            recordings_dir: "recordings".to_string(),
        }
    }
}

impl StudioConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::Invalid("rows and cols must be positive"));
        }
        if self.cell_size == 0 {
            return Err(ConfigError::Invalid("cell_size must be positive"));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(ConfigError::Invalid("speed must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.random_density) {
            return Err(ConfigError::Invalid("random_density must be between 0.0 and 1.0"));
        }
        if self.stability.delay == 0 || self.stability.window == 0 {
            return Err(ConfigError::Invalid("stability delay and window must be positive"));
        }
        if self.session_history == 0 {
            return Err(ConfigError::Invalid("session_history must be positive"));
        }
        self.rule_set()?;
        Ok(())
    }

    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        Ok(self.rules.parse()?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_json_str(&raw),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}
