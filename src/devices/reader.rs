//! Line reader thread, one per channel
//!
//! The reader owns its transport handle outright. Each poll checks how many
//! bytes are pending without blocking; when there are none it sleeps for the
//! configured poll interval (never zero, at most 50ms), otherwise it reads
//! them, splits complete lines and hands each non-empty one to the channel's
//! [`LineHandler`].
//!
//! # Faults
//!
//! A failed poll is logged and the loop carries on. After
//! `max_consecutive_faults` failures in a row the channel is considered
//! dropped: the reader marks it `Lost` in the application state and stops.
//! Nothing a reader does can affect the other channel's reader.

use crate::config::SerialConfig;
use crate::core::state::AppState;
use crate::core::types::{ChannelId, ConnectionStatus};
use crate::error::{Error, Result};
use crate::transport::Transport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Scratch buffer size for a single read
const READ_CHUNK_SIZE: usize = 256;

/// Consumer of decoded lines
pub trait LineHandler: Send {
    /// Handle one trimmed, non-empty line
    fn handle_line(&mut self, line: &str);
}

/// Reader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReaderPhase {
    /// Spawned, loop not entered yet
    Idle = 0,
    /// Polling the channel
    Polling = 1,
    /// Loop exited (shutdown or dropped channel)
    Stopped = 2,
}

impl ReaderPhase {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReaderPhase::Idle,
            1 => ReaderPhase::Polling,
            _ => ReaderPhase::Stopped,
        }
    }
}

/// Reader tuning taken from the serial configuration
#[derive(Debug, Clone, Copy)]
pub struct ReaderSettings {
    pub poll_interval: Duration,
    pub max_line_len: usize,
    pub max_consecutive_faults: u32,
}

impl From<&SerialConfig> for ReaderSettings {
    fn from(serial: &SerialConfig) -> Self {
        Self {
            poll_interval: serial.poll_interval().max(Duration::from_millis(1)),
            max_line_len: serial.max_line_len,
            max_consecutive_faults: serial.max_consecutive_faults,
        }
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self::from(&SerialConfig::default())
    }
}

/// Accumulates bytes and yields complete lines
///
/// Invalid UTF-8 is replaced with U+FFFD rather than failing the line, so a
/// garbled byte inside a payload makes that frame unparsable instead of
/// silently changing its value. Lines longer than `max_len` are discarded up
/// to the next newline.
pub struct LineBuffer {
    buf: Vec<u8>,
    max_len: usize,
    overflowed: bool,
}

impl LineBuffer {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::with_capacity(max_len),
            max_len,
            overflowed: false,
        }
    }

    /// Feed bytes, calling `emit` for every complete non-empty line
    pub fn push(&mut self, bytes: &[u8], mut emit: impl FnMut(&str)) {
        for &b in bytes {
            if b == b'\n' {
                if self.overflowed {
                    log::warn!("Discarded line longer than {} bytes", self.max_len);
                    self.overflowed = false;
                } else {
                    let text = String::from_utf8_lossy(&self.buf);
                    let line = text.trim();
                    if !line.is_empty() {
                        emit(line);
                    }
                }
                self.buf.clear();
            } else if self.overflowed {
                continue;
            } else if self.buf.len() < self.max_len {
                self.buf.push(b);
            } else {
                self.overflowed = true;
                self.buf.clear();
            }
        }
    }

    /// Bytes of the current incomplete line
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Handle to a running reader thread
pub struct LineReader {
    channel: ChannelId,
    phase: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl LineReader {
    /// Spawn the reader thread for `channel`
    pub fn spawn(
        channel: ChannelId,
        transport: Box<dyn Transport>,
        handler: Box<dyn LineHandler>,
        state: Arc<AppState>,
        shutdown: Arc<AtomicBool>,
        settings: ReaderSettings,
    ) -> Result<Self> {
        let phase = Arc::new(AtomicU8::new(ReaderPhase::Idle as u8));
        let thread_phase = Arc::clone(&phase);

        let handle = thread::Builder::new()
            .name(format!("{}-reader", channel))
            .spawn(move || {
                reader_loop(
                    channel,
                    transport,
                    handler,
                    &state,
                    &shutdown,
                    &thread_phase,
                    settings,
                );
            })
            .map_err(|e| Error::ThreadSpawn(format!("{} reader: {}", channel, e)))?;

        Ok(Self {
            channel,
            phase,
            handle: Some(handle),
        })
    }

    /// Channel this reader serves
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> ReaderPhase {
        ReaderPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Wait for the thread to exit; the shutdown flag must already be set
    pub fn join(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| Error::ThreadPanic)?;
        }
        Ok(())
    }
}

/// Poll, decode and dispatch until shutdown or the channel drops
fn reader_loop(
    channel: ChannelId,
    mut transport: Box<dyn Transport>,
    mut handler: Box<dyn LineHandler>,
    state: &AppState,
    shutdown: &AtomicBool,
    phase: &AtomicU8,
    settings: ReaderSettings,
) {
    phase.store(ReaderPhase::Polling as u8, Ordering::Release);
    log::info!("{} reader started on {}", channel, transport.name());

    let mut lines = LineBuffer::new(settings.max_line_len);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut consecutive_faults = 0u32;

    while !shutdown.load(Ordering::Acquire) {
        match poll_once(&mut *transport, &mut lines, &mut chunk, channel, &mut *handler) {
            Ok(n) => {
                consecutive_faults = 0;
                if n == 0 {
                    thread::sleep(settings.poll_interval);
                }
            }
            Err(e) => {
                consecutive_faults += 1;
                log::warn!("{} read error: {}", channel, e);
                if consecutive_faults >= settings.max_consecutive_faults {
                    log::error!(
                        "{} channel dropped after {} consecutive read faults",
                        channel,
                        consecutive_faults
                    );
                    state.set_connection(channel, ConnectionStatus::Lost(e.to_string()));
                    state.post_status(format!("✗ {} connection lost: {}", channel, e));
                    break;
                }
                thread::sleep(settings.poll_interval);
            }
        }
    }

    phase.store(ReaderPhase::Stopped as u8, Ordering::Release);
    log::info!("{} reader exiting", channel);
}

/// One non-blocking poll; returns the number of bytes consumed
fn poll_once(
    transport: &mut dyn Transport,
    lines: &mut LineBuffer,
    chunk: &mut [u8],
    channel: ChannelId,
    handler: &mut dyn LineHandler,
) -> Result<usize> {
    let available = transport.available()?;
    if available == 0 {
        return Ok(0);
    }

    let want = available.min(chunk.len());
    let n = transport.read(&mut chunk[..want])?;
    lines.push(&chunk[..n], |line| {
        log::debug!("{} → {}", channel, line);
        handler.handle_line(line);
    });
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use parking_lot::Mutex;
    use std::time::Instant;

    fn collect(buffer: &mut LineBuffer, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        buffer.push(bytes, |line| out.push(line.to_string()));
        out
    }

    #[test]
    fn test_line_buffer_splits_and_trims() {
        let mut buffer = LineBuffer::new(64);
        let lines = collect(&mut buffer, b"COUNT:1\r\n\r\n  \nUNO_READY\n");
        assert_eq!(lines, vec!["COUNT:1", "UNO_READY"]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_line_buffer_keeps_partial_line() {
        let mut buffer = LineBuffer::new(64);
        assert!(collect(&mut buffer, b"TEMP:4").is_empty());
        assert_eq!(buffer.pending(), 6);
        assert_eq!(collect(&mut buffer, b"2.5\nTE"), vec!["TEMP:42.5"]);
        assert_eq!(buffer.pending(), 2);
    }

    #[test]
    fn test_line_buffer_replaces_invalid_utf8() {
        let mut buffer = LineBuffer::new(64);
        let lines = collect(&mut buffer, b"COUNT:1\xff2\n");
        assert_eq!(lines, vec!["COUNT:1\u{FFFD}2"]);
    }

    #[test]
    fn test_line_buffer_discards_overlong_line() {
        let mut buffer = LineBuffer::new(8);
        let lines = collect(&mut buffer, b"0123456789ABCDEF\nCOUNT:3\n");
        assert_eq!(lines, vec!["COUNT:3"]);
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl LineHandler for Recorder {
        fn handle_line(&mut self, line: &str) {
            self.0.lock().push(line.to_string());
        }
    }

    fn fast_settings() -> ReaderSettings {
        ReaderSettings {
            poll_interval: Duration::from_millis(1),
            max_line_len: 64,
            max_consecutive_faults: 5,
        }
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition()
    }

    #[test]
    fn test_reader_dispatches_lines_in_order() {
        let mock = MockTransport::new("mock-counter");
        let recorder = Recorder::default();
        let state = Arc::new(AppState::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut reader = LineReader::spawn(
            ChannelId::Counter,
            Box::new(mock.clone()),
            Box::new(recorder.clone()),
            Arc::clone(&state),
            Arc::clone(&shutdown),
            fast_settings(),
        )
        .unwrap();

        mock.inject_read(b"COUNT:1\nCOU");
        mock.inject_read(b"NT:2\n\nMATCH:TRUE\n");
        assert!(wait_until(|| recorder.0.lock().len() == 3));
        assert_eq!(reader.phase(), ReaderPhase::Polling);

        shutdown.store(true, Ordering::Release);
        reader.join().unwrap();
        assert_eq!(reader.phase(), ReaderPhase::Stopped);
        assert_eq!(*recorder.0.lock(), vec!["COUNT:1", "COUNT:2", "MATCH:TRUE"]);
    }

    #[test]
    fn test_reader_survives_transient_faults() {
        let mock = MockTransport::new("mock-sensor");
        let recorder = Recorder::default();
        let state = Arc::new(AppState::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        mock.fail_next_reads(3);
        mock.inject_line("TEMP:30.0");

        let mut reader = LineReader::spawn(
            ChannelId::Sensor,
            Box::new(mock.clone()),
            Box::new(recorder.clone()),
            Arc::clone(&state),
            Arc::clone(&shutdown),
            fast_settings(),
        )
        .unwrap();

        assert!(wait_until(|| recorder.0.lock().len() == 1));
        assert_eq!(reader.phase(), ReaderPhase::Polling);

        shutdown.store(true, Ordering::Release);
        reader.join().unwrap();
    }

    #[test]
    fn test_isolated_faults_do_not_drop_idle_channel() {
        let mock = MockTransport::new("mock-counter");
        let recorder = Recorder::default();
        let state = Arc::new(AppState::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut reader = LineReader::spawn(
            ChannelId::Counter,
            Box::new(mock.clone()),
            Box::new(recorder.clone()),
            Arc::clone(&state),
            Arc::clone(&shutdown),
            fast_settings(),
        )
        .unwrap();

        // More single faults than the limit, each followed by idle polls
        for _ in 0..(fast_settings().max_consecutive_faults * 2) {
            mock.fail_next_reads(1);
            thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(reader.phase(), ReaderPhase::Polling);
        assert!(!matches!(
            state.snapshot().counter_connection,
            ConnectionStatus::Lost(_)
        ));

        mock.inject_line("COUNT:7");
        assert!(wait_until(|| recorder.0.lock().len() == 1));

        shutdown.store(true, Ordering::Release);
        reader.join().unwrap();
    }

    #[test]
    fn test_reader_stops_on_dropped_channel() {
        let mock = MockTransport::new("mock-sensor");
        let state = Arc::new(AppState::default());
        let shutdown = Arc::new(AtomicBool::new(false));
        state.set_connection(
            ChannelId::Sensor,
            ConnectionStatus::Connected {
                port: "mock-sensor".to_string(),
            },
        );

        let mut reader = LineReader::spawn(
            ChannelId::Sensor,
            Box::new(mock.clone()),
            Box::new(Recorder::default()),
            Arc::clone(&state),
            Arc::clone(&shutdown),
            fast_settings(),
        )
        .unwrap();

        mock.disconnect();
        assert!(wait_until(|| reader.phase() == ReaderPhase::Stopped));
        reader.join().unwrap();
        assert!(matches!(
            state.snapshot().sensor_connection,
            ConnectionStatus::Lost(_)
        ));
        // Shutdown flag was never set; the reader gave up on its own
        assert!(!shutdown.load(Ordering::Acquire));
    }
}
