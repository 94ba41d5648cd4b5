//! Configuration loading using Figment.
//!
//! Configuration is loaded from (in order of precedence, highest first):
//! 1. Environment variables prefixed with `SGSDAQ_`
//! 2. A TOML file (default: `config/sgs.toml`)
//!
//! ```toml
//! [application]
//! name = "COLD lab microwave sources"
//! log_level = "info"
//!
//! [[instruments]]
//! id = "mw_source"
//! type = "SGS100A"
//! address = "192.168.1.50:5025"
//! timeout_ms = 5000
//! sensor = 1
//! set_ack = "none"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! SGSDAQ_APPLICATION__LOG_LEVEL=debug
//! SGSDAQ_APPLICATION__NAME="Bench 2"
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::facade::SetAck;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/sgs.toml";

/// Instrument types this crate has a command table for.
pub const SUPPORTED_TYPES: &[&str] = &["SGS100A"];

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file or environment could not be read or deserialized.
    #[error("Configuration load error: {0}")]
    LoadError(#[from] Box<figment::Error>),
    /// A value was read but is not acceptable.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgsConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Instrument definitions
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// One signal generator connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Unique instrument identifier
    pub id: String,
    /// Instrument type (currently only `SGS100A`)
    pub r#type: String,
    /// Whether this instrument is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Raw-socket address, `host:port` (SCPI raw socket is usually port 5025)
    pub address: String,
    /// Per-operation reply deadline in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Line terminator appended to commands and stripped from replies
    #[serde(default = "default_terminator")]
    pub terminator: String,
    /// NRP power sensor channel substituted into `SENS<n>` commands
    #[serde(default = "default_channel")]
    pub sensor: u8,
    /// Modulation path substituted into `SOUR:AM<n>`, `FM<n>`, `PM<n>` commands
    #[serde(default = "default_channel")]
    pub path: u8,
    /// Whether set commands wait for an `*OPC?` acknowledgment
    #[serde(default)]
    pub set_ack: SetAck,
}

impl InstrumentConfig {
    /// An enabled SGS100A at `address` with every other field defaulted.
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            r#type: SUPPORTED_TYPES[0].to_string(),
            enabled: default_enabled(),
            address: address.into(),
            timeout_ms: default_timeout_ms(),
            terminator: default_terminator(),
            sensor: default_channel(),
            path: default_channel(),
            set_ack: SetAck::default(),
        }
    }

    /// Per-operation deadline.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_terminator() -> String {
    "\n".to_string()
}

fn default_channel() -> u8 {
    1
}

impl SgsConfig {
    /// Load configuration from the default path and environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path, then validate it.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SGSDAQ_").split("__"))
            .extract()
            .map_err(|e| ConfigError::LoadError(Box::new(e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Instrument IDs are unique and types are supported
    /// - Address and terminator are non-empty, timeout is positive
    /// - Sensor channel is 1-4 and modulation path is 1-2
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.application.log_level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                valid_levels.join(", ")
            )));
        }

        let mut ids = HashSet::new();
        for instrument in &self.instruments {
            if !ids.insert(&instrument.id) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate instrument ID: '{}'",
                    instrument.id
                )));
            }
            Self::validate_instrument(instrument)?;
        }

        Ok(())
    }

    fn validate_instrument(instrument: &InstrumentConfig) -> Result<(), ConfigError> {
        let fail = |msg: String| {
            Err(ConfigError::ValidationError(format!(
                "Instrument '{}': {}",
                instrument.id, msg
            )))
        };

        if !SUPPORTED_TYPES.contains(&instrument.r#type.as_str()) {
            return fail(format!(
                "invalid type '{}'. Must be one of: {}",
                instrument.r#type,
                SUPPORTED_TYPES.join(", ")
            ));
        }
        if instrument.address.is_empty() {
            return fail("'address' cannot be empty".to_string());
        }
        if instrument.terminator.is_empty() {
            return fail("'terminator' cannot be empty".to_string());
        }
        if instrument.timeout_ms == 0 {
            return fail("'timeout_ms' must be > 0".to_string());
        }
        if !(1..=4).contains(&instrument.sensor) {
            return fail(format!("'sensor' must be 1-4, got {}", instrument.sensor));
        }
        if !(1..=2).contains(&instrument.path) {
            return fail(format!("'path' must be 1-2, got {}", instrument.path));
        }
        Ok(())
    }

    /// Get all enabled instruments
    pub fn enabled_instruments(&self) -> Vec<&InstrumentConfig> {
        self.instruments.iter().filter(|inst| inst.enabled).collect()
    }

    /// Look up an instrument by id.
    pub fn instrument(&self, id: &str) -> Option<&InstrumentConfig> {
        self.instruments.iter().find(|inst| inst.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn instrument(id: &str) -> InstrumentConfig {
        InstrumentConfig::new(id, "192.168.1.50:5025")
    }

    fn config(instruments: Vec<InstrumentConfig>) -> SgsConfig {
        SgsConfig {
            application: ApplicationConfig {
                name: "Test".to_string(),
                log_level: "info".to_string(),
            },
            instruments,
        }
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(config(vec![instrument("mw1"), instrument("mw2")])
            .validate()
            .is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut cfg = config(vec![]);
        cfg.application.log_level = "loud".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log_level"));
    }

    #[test]
    fn test_duplicate_instrument_ids() {
        let err = config(vec![instrument("mw1"), instrument("mw1")])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate instrument ID"));
    }

    #[test]
    fn test_invalid_instrument_type() {
        let mut inst = instrument("mw1");
        inst.r#type = "SMA100B".to_string();
        let err = config(vec![inst]).validate().unwrap_err();
        assert!(err.to_string().contains("invalid type 'SMA100B'"));
    }

    #[test]
    fn test_channel_bounds() {
        let mut inst = instrument("mw1");
        inst.sensor = 5;
        assert!(config(vec![inst]).validate().is_err());

        let mut inst = instrument("mw1");
        inst.path = 0;
        assert!(config(vec![inst]).validate().is_err());
    }

    #[test]
    fn test_empty_address_and_zero_timeout() {
        let mut inst = instrument("mw1");
        inst.address.clear();
        assert!(config(vec![inst]).validate().is_err());

        let mut inst = instrument("mw1");
        inst.timeout_ms = 0;
        assert!(config(vec![inst]).validate().is_err());
    }

    #[test]
    fn test_enabled_instruments_filter() {
        let mut disabled = instrument("mw2");
        disabled.enabled = false;
        let cfg = config(vec![instrument("mw1"), disabled]);

        let enabled = cfg.enabled_instruments();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].id, "mw1");
        assert!(cfg.instrument("mw2").is_some());
        assert!(cfg.instrument("mw3").is_none());
    }

    #[test]
    fn test_load_from_toml_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[application]
name = "Bench"

[[instruments]]
id = "mw_source"
type = "SGS100A"
address = "10.0.0.7:5025"
set_ack = "opc"
"#
        )
        .unwrap();

        let cfg = SgsConfig::load_from(file.path()).unwrap();
        assert_eq!(cfg.application.log_level, "info");
        let inst = cfg.instrument("mw_source").unwrap();
        assert_eq!(inst.timeout(), Duration::from_secs(5));
        assert_eq!(inst.terminator, "\n");
        assert_eq!(inst.sensor, 1);
        assert_eq!(inst.set_ack, SetAck::Opc);
    }
}
