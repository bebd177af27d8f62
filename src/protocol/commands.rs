//! Outbound commands to the axle counting controller
//!
//! ```text
//! MODE:COUNT\n   MODE:COMPARE\n   TARGET:<0-99>\n   RESET\n
//! ```

use crate::core::types::{MAX_TARGET, Mode};
use std::fmt;
use std::str::FromStr;

/// Why an operator-supplied target was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    /// Entry field was blank
    #[error("please enter a target number")]
    Empty,

    /// Entry contained something other than digits
    #[error("invalid number {0:?}, enter digits only")]
    NotNumeric(String),

    /// Number outside the two-digit display range
    #[error("target must be 0-99, got {0}")]
    OutOfRange(i64),
}

/// Validated target count (0-99)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(u8);

impl Target {
    /// Validate a numeric target
    pub fn new(value: i64) -> Result<Self, TargetError> {
        match u8::try_from(value) {
            Ok(v) if v <= MAX_TARGET => Ok(Self(v)),
            _ => Err(TargetError::OutOfRange(value)),
        }
    }

    /// Raw value
    pub fn get(self) -> u8 {
        self.0
    }
}

impl FromStr for Target {
    type Err = TargetError;

    /// Parse operator text: trimmed, decimal, optional leading sign
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TargetError::Empty);
        }
        let value = text
            .parse::<i64>()
            .map_err(|_| TargetError::NotNumeric(text.to_string()))?;
        Target::new(value)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operator intent destined for the counter controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Switch counting mode
    SetMode(Mode),
    /// Set comparison target
    SetTarget(Target),
    /// Zero the axle count
    Reset,
}

impl Command {
    /// Exact wire text including the terminating newline
    pub fn to_wire(&self) -> String {
        match self {
            Command::SetMode(mode) => format!("MODE:{}\n", mode.wire_name()),
            Command::SetTarget(target) => format!("TARGET:{}\n", target),
            Command::Reset => "RESET\n".to_string(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_wire().trim_end())
    }
}
