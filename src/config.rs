//! Configuration for the activity simulation.

use crate::core::clock::{
    ClockSettings, Increment, DEFAULT_DECAY_INTERVAL_MS, DEFAULT_GRACE_PERIOD_MS,
    DEFAULT_HEART_INCREMENT, DEFAULT_STEP_INCREMENT,
};
use crate::core::window::DEFAULT_SERIES_LENGTH;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine parameters
    pub simulation: SimulationConfig,

    /// How the `run` command renders telemetry
    pub output: OutputFormat,

    /// Port for the HTTP server (0 for random)
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            output: OutputFormat::Console,
            server_port: 8787,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults if absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-activity-sim")
            .join("config.json")
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()
    }
}

/// Parameters of the simulation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of hourly slots per series
    pub series_length: usize,

    /// Steps added per activity trigger
    pub step_increment: u32,

    /// BPM added per activity trigger
    pub heart_increment: u32,

    /// Delay between the last trigger and the start of decay
    #[serde(rename = "grace_period_ms", with = "duration_ms")]
    pub grace_period: Duration,

    /// Period of the heart-rate decay tick
    #[serde(rename = "decay_interval_ms", with = "duration_ms")]
    pub decay_interval: Duration,

    /// Seed for the sleep profile; random when unset
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            series_length: DEFAULT_SERIES_LENGTH,
            step_increment: DEFAULT_STEP_INCREMENT,
            heart_increment: DEFAULT_HEART_INCREMENT,
            grace_period: Duration::from_millis(DEFAULT_GRACE_PERIOD_MS),
            decay_interval: Duration::from_millis(DEFAULT_DECAY_INTERVAL_MS),
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Clock settings derived from this configuration.
    pub fn clock_settings(&self) -> ClockSettings {
        ClockSettings {
            increment: Increment {
                steps: self.step_increment,
                heart: self.heart_increment,
            },
            grace_period: self.grace_period.as_millis() as u64,
            decay_interval: self.decay_interval.as_millis() as u64,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.series_length == 0 {
            return Err(ConfigError::Invalid(
                "series_length must be at least 1".to_string(),
            ));
        }
        if self.grace_period.as_millis() == 0 {
            return Err(ConfigError::Invalid(
                "grace_period_ms must be positive".to_string(),
            ));
        }
        if self.decay_interval.as_millis() == 0 {
            return Err(ConfigError::Invalid(
                "decay_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Telemetry output format for the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    Console,
    /// One JSON snapshot per line
    Jsonl,
}

impl OutputFormat {
    /// Parse an output format name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "console" | "text" => Some(OutputFormat::Console),
            "jsonl" | "json" => Some(OutputFormat::Jsonl),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
