//! Core data types shared by the readers, processors and the console.
//!
//! Key types:
//! - [`ChannelId`]: which of the two controllers a channel talks to
//! - [`Mode`]: counter operating mode requested by the operator
//! - [`ConnectionStatus`]: per-channel connection outcome
//! - [`TemperatureStatus`] / [`CountProgress`]: display classifications derived from a snapshot

use serde::{Deserialize, Serialize};
use std::fmt;

/// Temperatures at or below this value mean the probe is absent or broken
pub const NO_SENSOR_CELSIUS: f32 = -50.0;

/// Largest target count the counter firmware accepts (two display digits)
pub const MAX_TARGET: u8 = 99;

/// Identifies one of the two serial channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelId {
    /// Axle counting controller (UNO): ultrasonic/photo sensor, target comparison
    Counter,
    /// Temperature controller (Nano): axle temperature, hot-axle alert
    Sensor,
}

impl ChannelId {
    /// Short lowercase name used in thread names and log lines
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelId::Counter => "counter",
            ChannelId::Sensor => "sensor",
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Plain counting, no target comparison
    #[default]
    Count,
    /// Count and compare against the operator-set target
    Compare,
}

impl Mode {
    /// Payload used on the wire (`MODE:<payload>`)
    pub fn wire_name(self) -> &'static str {
        match self {
            Mode::Count => "COUNT",
            Mode::Compare => "COMPARE",
        }
    }

    /// The other mode (console toggle button)
    pub fn toggled(self) -> Self {
        match self {
            Mode::Count => Mode::Compare,
            Mode::Compare => Mode::Count,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Per-channel connection outcome
///
/// Set once at startup by the port resolver; the only later transition is
/// `Connected -> Lost` when a reader gives up on a dropped channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// Resolution has not run yet
    #[default]
    Unattempted,
    /// Port opened successfully
    Connected {
        /// Port path that was opened
        port: String,
    },
    /// No candidate could be opened
    Failed(String),
    /// Was connected, then stopped delivering data
    Lost(String),
}

impl ConnectionStatus {
    /// True while the channel can carry frames
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected { .. })
    }
}

/// Temperature display thresholds (°C)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Readings above this are shown as a warning
    pub warning_c: f32,
    /// Readings above this are shown as a hot axle
    pub hot_c: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_c: 60.0,
            hot_c: 80.0,
        }
    }
}

/// Display classification of the latest temperature reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TemperatureStatus {
    /// No TEMP frame received yet
    Awaiting,
    /// Sentinel reading: probe missing or disconnected
    NoSensor,
    /// Reading at or below the warning threshold
    Normal(f32),
    /// Reading above the warning threshold
    Warning(f32),
    /// Reading above the hot threshold
    Hot(f32),
}

impl TemperatureStatus {
    /// Classify a raw reading
    pub fn classify(reading: Option<f32>, thresholds: &Thresholds) -> Self {
        match reading {
            None => TemperatureStatus::Awaiting,
            Some(t) if t <= NO_SENSOR_CELSIUS => TemperatureStatus::NoSensor,
            Some(t) if t > thresholds.hot_c => TemperatureStatus::Hot(t),
            Some(t) if t > thresholds.warning_c => TemperatureStatus::Warning(t),
            Some(t) => TemperatureStatus::Normal(t),
        }
    }

    /// Numeric reading, if this is a real measurement
    pub fn celsius(&self) -> Option<f32> {
        match *self {
            TemperatureStatus::Normal(t)
            | TemperatureStatus::Warning(t)
            | TemperatureStatus::Hot(t) => Some(t),
            TemperatureStatus::Awaiting | TemperatureStatus::NoSensor => None,
        }
    }
}

impl fmt::Display for TemperatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemperatureStatus::Awaiting | TemperatureStatus::NoSensor => write!(f, "--°C"),
            TemperatureStatus::Normal(t)
            | TemperatureStatus::Warning(t)
            | TemperatureStatus::Hot(t) => write!(f, "{:.1}°C", t),
        }
    }
}

/// Local count-versus-target indication for COMPARE mode
///
/// Computed from the displayed numbers only. The device's MATCH frame stays
/// authoritative for the match flag, so the two may briefly disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountProgress {
    /// COUNT mode, or COMPARE without a target
    Idle,
    /// Below target
    Counting,
    /// Equal to target
    Reached,
    /// Past target
    Exceeded,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_classification() {
        let th = Thresholds::default();
        assert_eq!(TemperatureStatus::classify(None, &th), TemperatureStatus::Awaiting);
        assert_eq!(
            TemperatureStatus::classify(Some(-60.0), &th),
            TemperatureStatus::NoSensor
        );
        assert_eq!(
            TemperatureStatus::classify(Some(-50.0), &th),
            TemperatureStatus::NoSensor
        );
        assert_eq!(
            TemperatureStatus::classify(Some(42.5), &th),
            TemperatureStatus::Normal(42.5)
        );
        assert_eq!(
            TemperatureStatus::classify(Some(60.0), &th),
            TemperatureStatus::Normal(60.0)
        );
        assert_eq!(
            TemperatureStatus::classify(Some(70.0), &th),
            TemperatureStatus::Warning(70.0)
        );
        assert_eq!(
            TemperatureStatus::classify(Some(85.0), &th),
            TemperatureStatus::Hot(85.0)
        );
    }

    #[test]
    fn test_temperature_display() {
        let th = Thresholds::default();
        assert_eq!(TemperatureStatus::classify(Some(-60.0), &th).to_string(), "--°C");
        assert_eq!(TemperatureStatus::classify(Some(42.5), &th).to_string(), "42.5°C");
        assert_eq!(TemperatureStatus::classify(Some(42.5), &th).celsius(), Some(42.5));
        assert_eq!(TemperatureStatus::NoSensor.celsius(), None);
    }

    #[test]
    fn test_mode_wire_names() {
        assert_eq!(Mode::Count.wire_name(), "COUNT");
        assert_eq!(Mode::Compare.wire_name(), "COMPARE");
        assert_eq!(Mode::Count.toggled(), Mode::Compare);
        assert_eq!(Mode::default(), Mode::Count);
    }
}
