// config.rs

use log::{debug, info};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const TICKS_PER_BEAT: u64 = 24;
pub const SESSION_COUNT: u8 = 32;
pub const DEBOUNCE_WINDOW_US: u64 = 30_000;
pub const HOLD_TIMEOUT_US: u64 = 2_000_000;
pub const MIN_BPM: u32 = 40;
pub const MAX_BPM: u32 = 240;
pub const DEFAULT_BPM: u32 = 120;
pub const PROGRAM_CHANNEL: u8 = 15; // 0xCF on the wire
pub const TX_BUFFER_CAPACITY: usize = 256;
pub const RECONNECT_INTERVAL_US: u64 = 1_000_000;

const ENV_PREFIX: &str = "PEDALSYNC";
const MICROS_PER_MINUTE: u64 = 60_000_000;

/// Engine tuning values. Every field defaults to the matching constant above.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub debounce_window_us: u64,
    pub hold_timeout_us: u64,
    pub min_bpm: u32,
    pub max_bpm: u32,
    pub default_bpm: u32,
    pub ticks_per_beat: u64,
    pub session_count: u8,
    pub program_channel: u8,
    pub tx_buffer_capacity: usize,
    pub reconnect_interval_us: u64,
    pub auxiliary_indicator: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_window_us: DEBOUNCE_WINDOW_US,
            hold_timeout_us: HOLD_TIMEOUT_US,
            min_bpm: MIN_BPM,
            max_bpm: MAX_BPM,
            default_bpm: DEFAULT_BPM,
            ticks_per_beat: TICKS_PER_BEAT,
            session_count: SESSION_COUNT,
            program_channel: PROGRAM_CHANNEL,
            tx_buffer_capacity: TX_BUFFER_CAPACITY,
            reconnect_interval_us: RECONNECT_INTERVAL_US,
            auxiliary_indicator: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// The config file or environment could not be read or deserialized
    Load(String),
    /// A value was read but makes no sense for the engine
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "configuration load error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<::config::ConfigError> for ConfigError {
    fn from(e: ::config::ConfigError) -> Self {
        ConfigError::Load(e.to_string())
    }
}

impl EngineConfig {
    /// Layers compiled defaults, an optional file and `PEDALSYNC_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: EngineConfig = settings.try_deserialize()?;
        config.validate()?;
        debug!("Effective engine configuration: {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bpm == 0 || self.min_bpm >= self.max_bpm {
            return Err(ConfigError::Invalid(format!(
                "tempo bounds {}..{} BPM are empty",
                self.min_bpm, self.max_bpm
            )));
        }
        if !(self.min_bpm..=self.max_bpm).contains(&self.default_bpm) {
            return Err(ConfigError::Invalid(format!(
                "default tempo {} BPM lies outside {}..{} BPM",
                self.default_bpm, self.min_bpm, self.max_bpm
            )));
        }
        if self.ticks_per_beat == 0 {
            return Err(ConfigError::Invalid("ticks_per_beat must be positive".into()));
        }
        if self.session_count == 0 || self.session_count > 128 {
            return Err(ConfigError::Invalid(format!(
                "session_count {} must be within 1..=128",
                self.session_count
            )));
        }
        if self.program_channel > 15 {
            return Err(ConfigError::Invalid(format!(
                "program_channel {} must be within 0..=15",
                self.program_channel
            )));
        }
        if self.tx_buffer_capacity < 4 {
            return Err(ConfigError::Invalid(
                "tx_buffer_capacity must hold at least one session change".into(),
            ));
        }
        Ok(())
    }

    /// Shortest accepted tick interval, rounded up so `max_bpm` itself stays reachable.
    pub fn fastest_tick_interval_us(&self) -> u64 {
        (MICROS_PER_MINUTE / u64::from(self.max_bpm)).div_ceil(self.ticks_per_beat)
    }

    pub fn slowest_tick_interval_us(&self) -> u64 {
        MICROS_PER_MINUTE / u64::from(self.min_bpm) / self.ticks_per_beat
    }

    pub fn default_tick_interval_us(&self) -> u64 {
        MICROS_PER_MINUTE / u64::from(self.default_bpm) / self.ticks_per_beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tick_intervals() {
        let config = EngineConfig::default();
        assert_eq!(config.fastest_tick_interval_us(), 10_417);
        assert_eq!(config.slowest_tick_interval_us(), 62_500);
        assert_eq!(config.default_tick_interval_us(), 20_833);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = EngineConfig {
            min_bpm: 200,
            max_bpm: 100,
            default_bpm: 150,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_channel_out_of_range_rejected() {
        let config = EngineConfig {
            program_channel: 16,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = EngineConfig::load(None).unwrap();
        assert_eq!(config.session_count, SESSION_COUNT);
        assert_eq!(config.debounce_window_us, DEBOUNCE_WINDOW_US);
    }
}
