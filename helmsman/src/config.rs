//! Configuration loading from TOML
//!
//! # Configuration file format
//!
//! ```toml
//! [otto]
//! port = "/dev/ttyAMA0"
//! baud = 9600
//! read_timeout_s = 10
//!
//! [gps]
//! port = "/dev/ttyUSB0"
//! baud = 4800
//!
//! [mission]
//! file = "mission.toml"
//! ```
//!
//! Every field except the serial device paths has a default. Validation
//! happens inside [`Config::load`] so a bad file fails at startup rather
//! than mid-voyage.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Serial link to the low-level controller.
#[derive(Debug, Clone, Deserialize)]
pub struct OttoConfig {
    /// Device path, e.g. "/dev/ttyAMA0".
    pub port: String,

    /// Line rate of the controller UART.
    #[serde(default = "default_otto_baud")]
    pub baud: u32,

    /// Seconds of silence on the link before the controller is considered
    /// unresponsive.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_s: u64,
}

/// Serial link to the GPS receiver.
#[derive(Debug, Clone, Deserialize)]
pub struct GpsConfig {
    /// Device path, e.g. "/dev/ttyUSB0".
    pub port: String,

    /// NMEA receivers almost always talk 4800 baud.
    #[serde(default = "default_gps_baud")]
    pub baud: u32,
}

/// Mission source.
#[derive(Debug, Clone, Deserialize)]
pub struct MissionConfig {
    /// Path of the mission file loaded at startup.
    #[serde(default = "default_mission_file")]
    pub file: String,
}

impl Default for MissionConfig {
    fn default() -> Self {
        MissionConfig {
            file: default_mission_file(),
        }
    }
}

fn default_otto_baud() -> u32 {
    9600
}

fn default_gps_baud() -> u32 {
    4800
}

fn default_read_timeout() -> u64 {
    10
}

fn default_mission_file() -> String {
    "mission.toml".to_string()
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub otto: OttoConfig,
    pub gps: GpsConfig,
    #[serde(default)]
    pub mission: MissionConfig,
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.otto.port.is_empty() {
            return Err(Error::Config("otto.port must not be empty".to_string()));
        }
        if self.gps.port.is_empty() {
            return Err(Error::Config("gps.port must not be empty".to_string()));
        }
        if self.otto.baud == 0 || self.gps.baud == 0 {
            return Err(Error::Config("baud rates must be non-zero".to_string()));
        }
        if !(1..=120).contains(&self.otto.read_timeout_s) {
            return Err(Error::Config(format!(
                "otto.read_timeout_s must be between 1 and 120 (got {})",
                self.otto.read_timeout_s
            )));
        }
        Ok(())
    }
}
