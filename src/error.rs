//! Error types for the axle console
//!
//! Parse faults on inbound lines are deliberately not part of this enum: they
//! are [`crate::protocol::FrameError`] values that never leave the processor.

use crate::core::types::ChannelId;
use crate::protocol::TargetError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Axle console error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration is structurally valid but semantically wrong
    #[error("Config error: {0}")]
    Config(String),

    /// No candidate port for a channel could be opened
    #[error("{channel} connection failed after trying {candidates:?}: {last_error}")]
    ConnectionFailure {
        /// Channel that was being resolved
        channel: ChannelId,
        /// Candidates tried, in order
        candidates: Vec<String>,
        /// Error from the last candidate attempted
        last_error: String,
    },

    /// Channel was never opened or has dropped
    #[error("{0} channel not connected")]
    ChannelUnavailable(ChannelId),

    /// Outbound frame could not be written
    #[error("{channel} send error: {reason}")]
    Write {
        /// Channel the write was directed to
        channel: ChannelId,
        /// OS or transport error text
        reason: String,
    },

    /// Operator supplied an unusable target count
    #[error("Invalid target: {0}")]
    InvalidTarget(#[from] TargetError),

    /// Reader thread could not be spawned
    #[error("Failed to spawn thread: {0}")]
    ThreadSpawn(String),

    /// Reader thread panicked before it could be joined
    #[error("Thread panicked")]
    ThreadPanic,
}
