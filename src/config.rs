//! Configuration for the axle console
//!
//! Loads configuration from a TOML file. Every section has defaults matching
//! the reference rig (UNO on `/dev/ttyACM*`, Nano on `/dev/ttyUSB*`), so a
//! partial file only needs to name what differs.

use crate::core::types::Thresholds;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Longest reader poll interval that still feels responsive on the console
pub const MAX_POLL_INTERVAL_MS: u64 = 50;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub counter: ChannelConfig,
    pub sensor: ChannelConfig,
    pub serial: SerialConfig,
    pub thresholds: Thresholds,
    pub logging: LoggingConfig,
}

/// Port candidates for one controller, tried in order
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub ports: Vec<String>,
}

impl ChannelConfig {
    /// Put an explicitly requested port ahead of the configured list
    pub fn prefer(&mut self, port: &str) {
        self.ports.retain(|p| p != port);
        self.ports.insert(0, port.to_string());
    }
}

/// Serial link parameters shared by both channels
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Line rate of both controllers
    pub baud_rate: u32,
    /// Delay after opening a port while the controller resets
    pub settle_ms: u64,
    /// Reader sleep when no bytes are pending (1..=50)
    pub poll_interval_ms: u64,
    /// Longest accepted line; longer lines are discarded as noise
    pub max_line_len: usize,
    /// Consecutive read faults before a channel is treated as dropped
    pub max_consecutive_faults: u32,
}

impl SerialConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Blocking read bound; reads only happen once bytes are pending
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1) * 10)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            settle_ms: 2000,
            poll_interval_ms: 10,
            max_line_len: 256,
            max_consecutive_faults: 100,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use axle_console::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("axle-console.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(contents)?;
        config.fill_default_ports();
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use the rig defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config {} not found, using defaults", path.display());
            Ok(Self::rig_defaults())
        }
    }

    /// Default configuration for the reference rig
    pub fn rig_defaults() -> Self {
        let mut config = Self::default();
        config.fill_default_ports();
        config
    }

    fn fill_default_ports(&mut self) {
        if self.counter.ports.is_empty() {
            self.counter.ports = vec!["/dev/ttyACM0".to_string(), "/dev/ttyACM1".to_string()];
        }
        if self.sensor.ports.is_empty() {
            self.sensor.ports = vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()];
        }
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<()> {
        if self.serial.baud_rate == 0 {
            return Err(Error::Config("serial.baud_rate must be non-zero".to_string()));
        }
        if !(1..=MAX_POLL_INTERVAL_MS).contains(&self.serial.poll_interval_ms) {
            return Err(Error::Config(format!(
                "serial.poll_interval_ms must be 1-{}, got {}",
                MAX_POLL_INTERVAL_MS, self.serial.poll_interval_ms
            )));
        }
        if self.serial.max_line_len == 0 {
            return Err(Error::Config("serial.max_line_len must be non-zero".to_string()));
        }
        if self.serial.max_consecutive_faults == 0 {
            return Err(Error::Config(
                "serial.max_consecutive_faults must be non-zero".to_string(),
            ));
        }
        if self.thresholds.warning_c > self.thresholds.hot_c {
            return Err(Error::Config(format!(
                "thresholds.warning_c ({}) exceeds thresholds.hot_c ({})",
                self.thresholds.warning_c, self.thresholds.hot_c
            )));
        }
        Ok(())
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("serialize: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }
}
