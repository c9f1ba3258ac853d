use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LoopError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub game_loop: LoopConfig,
    pub demo: DemoConfig,
}

/// Timing and fault-handling settings for a game loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Period between ticks in milliseconds; fractions are kept (16.667 for 60 Hz)
    pub interval_ms: f64,
    /// Ticks per second; takes precedence over `interval_ms` when set
    pub tick_rate_hz: Option<f64>,
    /// Catch and log callback panics instead of terminating the loop
    pub recover_panics: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            interval_ms: 50.0,
            tick_rate_hz: None,
            recover_panics: false,
        }
    }
}

impl LoopConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_secs_f64() * 1000.0;
        self.tick_rate_hz = None;
        self
    }

    pub fn with_tick_rate(mut self, hz: f64) -> Self {
        self.tick_rate_hz = Some(hz);
        self
    }

    pub fn with_panic_recovery(mut self, recover: bool) -> Self {
        self.recover_panics = recover;
        self
    }

    /// Resolve the tick period, rejecting zero intervals and unusable rates.
    pub fn interval(&self) -> Result<Duration> {
        match self.tick_rate_hz {
            Some(hz) => interval_from_hz(hz),
            None => interval_from_ms(self.interval_ms),
        }
    }
}

/// Convert a period in (possibly fractional) milliseconds to a duration.
pub fn interval_from_ms(ms: f64) -> Result<Duration> {
    if !ms.is_finite() || ms <= 0.0 {
        return Err(LoopError::InvalidInterval(format!("interval_ms must be > 0, got {}", ms)));
    }
    let period = Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|e| LoopError::InvalidInterval(format!("interval_ms {} out of range: {}", ms, e)))?;
    if period.is_zero() {
        return Err(LoopError::InvalidInterval(format!("interval_ms {} rounds to a zero period", ms)));
    }
    Ok(period)
}

/// Convert a tick rate to the matching period.
pub fn interval_from_hz(hz: f64) -> Result<Duration> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(LoopError::InvalidInterval(format!(
            "tick rate must be a positive number, got {}",
            hz
        )));
    }
    let period = Duration::try_from_secs_f64(1.0 / hz)
        .map_err(|e| LoopError::InvalidInterval(format!("tick rate {} out of range: {}", hz, e)))?;
    if period.is_zero() {
        return Err(LoopError::InvalidInterval(format!("tick rate {} rounds to a zero period", hz)));
    }
    Ok(period)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// How long the demo runs before stopping the loop
    pub duration_ms: u64,
    /// Pause the loop this long after starting (no pause when unset)
    pub pause_after_ms: Option<u64>,
    /// How long the loop stays paused
    pub pause_for_ms: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            pause_after_ms: None,
            pause_for_ms: 500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            game_loop: LoopConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let project_name = env!("CARGO_PKG_NAME");

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
