//! Port resolution
//!
//! Tries an ordered list of candidate ports once each. The first port that
//! opens is given a settling delay, because opening the port toggles DTR and
//! resets the Arduino-class controllers behind it.

use super::{SerialTransport, Transport};
use crate::config::SerialConfig;
use crate::core::types::ChannelId;
use crate::error::{Error, Result};
use std::thread;
use std::time::Duration;

/// Open the first candidate that succeeds, using `open` to attempt each one
///
/// Returns the opened port path alongside the handle. Never retries a
/// candidate; if all fail the error carries the last failure.
pub fn resolve_with<T, F>(
    channel: ChannelId,
    candidates: &[String],
    settle: Duration,
    mut open: F,
) -> Result<(String, T)>
where
    F: FnMut(&str) -> Result<T>,
{
    let mut last_error = String::from("no candidate ports configured");

    for path in candidates {
        match open(path) {
            Ok(handle) => {
                if !settle.is_zero() {
                    log::debug!(
                        "{}: waiting {:?} for controller reset on {}",
                        channel,
                        settle,
                        path
                    );
                    thread::sleep(settle);
                }
                return Ok((path.clone(), handle));
            }
            Err(e) => {
                log::warn!("{}: cannot open {}: {}", channel, path, e);
                last_error = e.to_string();
            }
        }
    }

    Err(Error::ConnectionFailure {
        channel,
        candidates: candidates.to_vec(),
        last_error,
    })
}

/// Resolve a channel to an open serial port
pub fn resolve_port(
    channel: ChannelId,
    candidates: &[String],
    serial: &SerialConfig,
) -> Result<Box<dyn Transport>> {
    let (path, transport) = resolve_with(channel, candidates, serial.settle(), |path| {
        SerialTransport::open(path, serial.baud_rate, serial.read_timeout())
    })?;
    log::info!("{} channel connected on {}", channel, path);
    Ok(Box::new(transport))
}
