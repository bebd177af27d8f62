//! Command sender for the counter channel
//!
//! Holds the write-side handle of the counter transport behind a single lock.
//! Every clone shares that lock, so two frames can never interleave on the
//! wire. The lock covers writes only; the reader thread has its own handle.

use crate::core::types::ChannelId;
use crate::error::{Error, Result};
use crate::protocol::Command;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::Arc;

/// Serialized writer for outbound frames
#[derive(Clone)]
pub struct CommandSender {
    channel: ChannelId,
    writer: Arc<Mutex<Option<Box<dyn Transport>>>>,
}

impl CommandSender {
    /// Sender writing to `transport`
    pub fn new(channel: ChannelId, transport: Box<dyn Transport>) -> Self {
        Self {
            channel,
            writer: Arc::new(Mutex::new(Some(transport))),
        }
    }

    /// Sender for a channel that never connected; every send reports it
    pub fn unavailable(channel: ChannelId) -> Self {
        Self {
            channel,
            writer: Arc::new(Mutex::new(None)),
        }
    }

    /// True while a write handle is held
    pub fn is_connected(&self) -> bool {
        self.writer.lock().is_some()
    }

    /// Write one command frame
    ///
    /// Failures come back as [`Error::ChannelUnavailable`] or [`Error::Write`];
    /// the sender stays usable either way.
    pub fn send(&self, command: Command) -> Result<()> {
        let wire = command.to_wire();
        let mut guard = self.writer.lock();
        let Some(port) = guard.as_mut() else {
            log::warn!("Not sent to {} (not connected): {}", self.channel, command);
            return Err(Error::ChannelUnavailable(self.channel));
        };

        port.write_all(wire.as_bytes())
            .and_then(|()| port.flush())
            .map_err(|e| {
                log::warn!("{} send error for {}: {}", self.channel, command, e);
                Error::Write {
                    channel: self.channel,
                    reason: e.to_string(),
                }
            })?;

        log::info!("Sent to {}: {}", self.channel, command);
        Ok(())
    }

    /// Drop the write handle; later sends report the channel unavailable
    pub fn close(&self) {
        self.writer.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Mode;
    use crate::protocol::Target;
    use crate::transport::MockTransport;
    use std::thread;

    #[test]
    fn test_send_writes_exact_frames() {
        let mock = MockTransport::new("mock");
        let sender = CommandSender::new(ChannelId::Counter, Box::new(mock.clone()));

        sender.send(Command::SetMode(Mode::Compare)).unwrap();
        sender.send(Command::SetTarget(Target::new(12).unwrap())).unwrap();
        sender.send(Command::Reset).unwrap();

        assert_eq!(
            mock.written_frames(),
            vec!["MODE:COMPARE\n", "TARGET:12\n", "RESET\n"]
        );
    }

    #[test]
    fn test_write_fault_is_reported_and_recoverable() {
        let mock = MockTransport::new("mock");
        let sender = CommandSender::new(ChannelId::Counter, Box::new(mock.clone()));

        mock.set_fail_writes(true);
        assert!(matches!(
            sender.send(Command::Reset),
            Err(Error::Write {
                channel: ChannelId::Counter,
                ..
            })
        ));

        mock.set_fail_writes(false);
        sender.send(Command::Reset).unwrap();
        assert_eq!(mock.written_frames(), vec!["RESET\n"]);
    }

    #[test]
    fn test_unavailable_and_closed() {
        let sender = CommandSender::unavailable(ChannelId::Counter);
        assert!(!sender.is_connected());
        assert!(matches!(
            sender.send(Command::Reset),
            Err(Error::ChannelUnavailable(ChannelId::Counter))
        ));

        let mock = MockTransport::new("mock");
        let sender = CommandSender::new(ChannelId::Counter, Box::new(mock.clone()));
        sender.close();
        assert!(sender.send(Command::Reset).is_err());
        assert!(mock.written().is_empty());
    }

    #[test]
    fn test_concurrent_senders_never_interleave() {
        let mock = MockTransport::new("mock");
        let sender = CommandSender::new(ChannelId::Counter, Box::new(mock.clone()));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sender = sender.clone();
                thread::spawn(move || {
                    for n in 0..50 {
                        let command = if i % 2 == 0 {
                            Command::SetTarget(Target::new(n).unwrap())
                        } else {
                            Command::SetMode(Mode::Compare)
                        };
                        sender.send(command).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let frames = mock.written_frames();
        assert_eq!(frames.len(), 200);
        for frame in frames {
            assert!(
                frame == "MODE:COMPARE\n" || frame.starts_with("TARGET:"),
                "interleaved frame {:?}",
                frame
            );
            assert!(frame.ends_with('\n'));
        }
    }
}
