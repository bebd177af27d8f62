//! Port probe for bench setup
//!
//! Opens each candidate in turn, waits out the controller reset, then listens
//! for a fixed window and records whatever lines arrive. A port that opens
//! and produces at least one line is live.

use super::{SerialTransport, Transport};
use crate::config::SerialConfig;
use crate::devices::LineBuffer;
use crate::error::Result;
use std::thread;
use std::time::{Duration, Instant};

/// Default listening window per port
pub const PROBE_LISTEN: Duration = Duration::from_secs(3);

/// What one candidate port produced
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub port: String,
    /// Lines heard, or the open error
    pub outcome: std::result::Result<Vec<String>, String>,
}

impl ProbeReport {
    /// Port opened and sent at least one line
    pub fn is_live(&self) -> bool {
        matches!(&self.outcome, Ok(lines) if !lines.is_empty())
    }
}

/// Probe candidates using `open` to obtain each transport
pub fn probe_with<F>(
    candidates: &[String],
    settle: Duration,
    listen: Duration,
    serial: &SerialConfig,
    mut open: F,
) -> Vec<ProbeReport>
where
    F: FnMut(&str) -> Result<Box<dyn Transport>>,
{
    candidates
        .iter()
        .map(|port| {
            log::info!("Probing {}...", port);
            let outcome = match open(port) {
                Ok(mut transport) => {
                    if !settle.is_zero() {
                        thread::sleep(settle);
                    }
                    Ok(listen_for(&mut *transport, listen, serial))
                }
                Err(e) => {
                    log::info!("{}: not found ({})", port, e);
                    Err(e.to_string())
                }
            };
            ProbeReport {
                port: port.clone(),
                outcome,
            }
        })
        .collect()
}

/// Probe candidate serial ports with the configured link settings
pub fn probe_ports(candidates: &[String], serial: &SerialConfig) -> Vec<ProbeReport> {
    probe_with(candidates, serial.settle(), PROBE_LISTEN, serial, |path| {
        let transport = SerialTransport::open(path, serial.baud_rate, serial.read_timeout())?;
        Ok(Box::new(transport) as Box<dyn Transport>)
    })
}

fn listen_for(
    transport: &mut dyn Transport,
    window: Duration,
    serial: &SerialConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buffer = LineBuffer::new(serial.max_line_len);
    let mut chunk = [0u8; 256];
    let deadline = Instant::now() + window;

    while Instant::now() < deadline {
        let pending = match transport.available() {
            Ok(n) => n,
            Err(e) => {
                log::warn!("{}: read error: {}", transport.name(), e);
                break;
            }
        };
        if pending == 0 {
            thread::sleep(serial.poll_interval());
            continue;
        }
        let want = pending.min(chunk.len());
        match transport.read(&mut chunk[..want]) {
            Ok(n) => buffer.push(&chunk[..n], |line| {
                log::info!("  {} → {}", transport.name(), line);
                lines.push(line.to_string());
            }),
            Err(e) => {
                log::warn!("{}: read error: {}", transport.name(), e);
                break;
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use std::io;

    fn fast_serial() -> SerialConfig {
        SerialConfig {
            poll_interval_ms: 1,
            ..SerialConfig::default()
        }
    }

    #[test]
    fn test_probe_reports_live_and_missing_ports() {
        let uno = MockTransport::new("/dev/ttyACM0");
        uno.inject_line("UNO_READY");
        uno.inject_line("COUNT:0");

        let candidates = vec!["/dev/ttyUSB0".to_string(), "/dev/ttyACM0".to_string()];
        let reports = probe_with(
            &candidates,
            Duration::ZERO,
            Duration::from_millis(30),
            &fast_serial(),
            |path| {
                if path == "/dev/ttyACM0" {
                    Ok(Box::new(uno.clone()) as Box<dyn Transport>)
                } else {
                    Err(io::Error::new(io::ErrorKind::NotFound, "no such device").into())
                }
            },
        );

        assert_eq!(reports.len(), 2);
        assert!(!reports[0].is_live());
        assert!(reports[0].outcome.is_err());
        assert!(reports[1].is_live());
        assert_eq!(
            reports[1].outcome,
            Ok(vec!["UNO_READY".to_string(), "COUNT:0".to_string()])
        );
    }

    #[test]
    fn test_silent_port_is_not_live() {
        let quiet = MockTransport::new("/dev/ttyUSB1");
        let reports = probe_with(
            &["/dev/ttyUSB1".to_string()],
            Duration::ZERO,
            Duration::from_millis(10),
            &fast_serial(),
            |_| Ok(Box::new(quiet.clone()) as Box<dyn Transport>),
        );
        assert_eq!(reports[0].outcome, Ok(Vec::new()));
        assert!(!reports[0].is_live());
    }
}
