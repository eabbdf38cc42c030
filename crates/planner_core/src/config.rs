//! Planner configuration.
//!
//! # Responsibility
//! - Hold expansion caps, reminder thresholds and polling cadence.
//! - Load optional overrides from a JSON file.
//!
//! # Invariants
//! - `PlannerConfig::default()` reproduces the built-in planner behavior.
//! - Every loaded config passes `validate()` before it is returned.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

/// Hard ceiling on recurrence iterations per task.
pub const DEFAULT_ITERATION_CEILING: u32 = 260;
pub const DEFAULT_DAILY_CAP: u32 = 90;
pub const DEFAULT_WEEKLY_CAP: u32 = 52;
pub const DEFAULT_MONTHLY_CAP: u32 = 24;

pub const DEFAULT_WARMUP_MS: u64 = 2_000;
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_PRE_WINDOW_MINUTES: f64 = 15.0;
pub const DEFAULT_START_GRACE_MINUTES: f64 = 5.0;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration load or validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Look-ahead policy for recurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpansionPolicy {
    /// Iterations never exceed this count, whatever the end date says.
    /// Values above [`DEFAULT_ITERATION_CEILING`] are rejected.
    pub iteration_ceiling: u32,
    /// Last index emitted for open-ended daily rules.
    pub daily_cap: u32,
    /// Last index emitted for open-ended weekly rules.
    pub weekly_cap: u32,
    /// Last index emitted for open-ended monthly rules.
    pub monthly_cap: u32,
}

impl Default for ExpansionPolicy {
    fn default() -> Self {
        Self {
            iteration_ceiling: DEFAULT_ITERATION_CEILING,
            daily_cap: DEFAULT_DAILY_CAP,
            weekly_cap: DEFAULT_WEEKLY_CAP,
            monthly_cap: DEFAULT_MONTHLY_CAP,
        }
    }
}

impl ExpansionPolicy {
    /// Iteration limit actually applied, never above the hard ceiling.
    pub fn effective_ceiling(&self) -> u32 {
        self.iteration_ceiling.min(DEFAULT_ITERATION_CEILING)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.iteration_ceiling == 0 || self.iteration_ceiling > DEFAULT_ITERATION_CEILING {
            return Err(ConfigError::Invalid(format!(
                "expansion.iteration_ceiling ({}) must be in 1..={DEFAULT_ITERATION_CEILING}",
                self.iteration_ceiling
            )));
        }
        for (name, cap) in [
            ("daily_cap", self.daily_cap),
            ("weekly_cap", self.weekly_cap),
            ("monthly_cap", self.monthly_cap),
        ] {
            if cap >= self.iteration_ceiling {
                return Err(ConfigError::Invalid(format!(
                    "expansion.{name} ({cap}) must be below iteration_ceiling ({})",
                    self.iteration_ceiling
                )));
            }
        }
        Ok(())
    }
}

/// Reminder thresholds and polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    /// Delay before the first scan after the loop starts.
    pub warmup_ms: u64,
    /// Fixed cadence between scans.
    pub interval_ms: u64,
    /// `pre` fires when `0 < minutes_to_start <= pre_window_minutes`.
    pub pre_window_minutes: f64,
    /// `start` fires when `-start_grace_minutes < minutes_to_start <= 0`.
    pub start_grace_minutes: f64,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            warmup_ms: DEFAULT_WARMUP_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
            pre_window_minutes: DEFAULT_PRE_WINDOW_MINUTES,
            start_grace_minutes: DEFAULT_START_GRACE_MINUTES,
        }
    }
}

impl ReminderSettings {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "reminders.interval_ms must be > 0".to_string(),
            ));
        }
        if !(self.pre_window_minutes.is_finite() && self.pre_window_minutes > 0.0) {
            return Err(ConfigError::Invalid(
                "reminders.pre_window_minutes must be a positive number".to_string(),
            ));
        }
        if !(self.start_grace_minutes.is_finite() && self.start_grace_minutes > 0.0) {
            return Err(ConfigError::Invalid(
                "reminders.start_grace_minutes must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging overrides. Missing values fall back to build-mode defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub dir: Option<String>,
}

/// Top-level planner configuration.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub expansion: ExpansionPolicy,
    pub reminders: ReminderSettings,
    pub logging: LoggingSettings,
}

impl PlannerConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(raw.as_str())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.expansion.validate()?;
        self.reminders.validate()
    }
}
