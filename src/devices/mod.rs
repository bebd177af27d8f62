//! Axle counting rig: two controllers on two independent serial channels.
//!
//! This module manages:
//! - **Counter** (UNO): axle count, MATCH reports, accepts MODE/TARGET/RESET
//! - **Sensor** (Nano): axle temperature and the hot-axle alert
//!
//! # Thread Model
//!
//! One reader thread per connected channel runs the poll-decode-dispatch loop
//! from the `reader` module, feeding that channel's processor ([`CounterProcessor`] or
//! [`SensorProcessor`]). The two readers share nothing but the
//! [`AppState`]. Operator intents run on the caller's thread and go out
//! through the [`CommandSender`], whose lock guards only the counter write
//! handle.
//!
//! # Shutdown
//!
//! [`Rig::shutdown`] sets the shared flag, joins both readers (each notices
//! within one poll interval) and only then releases the write handle, so no
//! port is closed under a thread that is still using it.

mod counter;
mod reader;
mod sender;
mod sensor;

pub use counter::CounterProcessor;
pub use reader::{LineBuffer, LineHandler, LineReader, ReaderPhase, ReaderSettings};
pub use sender::CommandSender;
pub use sensor::SensorProcessor;

use crate::config::AppConfig;
use crate::core::state::{AppState, Snapshot};
use crate::core::types::{ChannelId, ConnectionStatus, Mode};
use crate::error::{Error, Result};
use crate::protocol::{Command, Target};
use crate::transport::{Transport, resolve_port};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Running rig: readers, command sender and the state they share
pub struct Rig {
    state: Arc<AppState>,
    sender: CommandSender,
    readers: Vec<LineReader>,
    shutdown: Arc<AtomicBool>,
}

impl Rig {
    /// Resolve both channels from configuration and start their readers
    ///
    /// A channel whose ports all fail is recorded as `Failed` and left
    /// unavailable for the rest of the run; the other channel still starts.
    pub fn connect(config: &AppConfig) -> Result<Self> {
        let state = Arc::new(AppState::new(config.thresholds));
        let counter = resolve_port(ChannelId::Counter, &config.counter.ports, &config.serial);
        let sensor = resolve_port(ChannelId::Sensor, &config.sensor.ports, &config.serial);
        Self::start(
            state,
            counter,
            sensor,
            ReaderSettings::from(&config.serial),
        )
    }

    /// Start the rig over already-resolved channels
    pub fn start(
        state: Arc<AppState>,
        counter: Result<Box<dyn Transport>>,
        sensor: Result<Box<dyn Transport>>,
        settings: ReaderSettings,
    ) -> Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut readers = Vec::with_capacity(2);
        let mut sender = CommandSender::unavailable(ChannelId::Counter);

        if let Some(transport) = record_connection(&state, ChannelId::Counter, counter) {
            match transport.try_clone() {
                Ok(writer) => sender = CommandSender::new(ChannelId::Counter, writer),
                Err(e) => {
                    log::error!("counter: cannot open write handle: {}", e);
                    state.post_status(format!("✗ counter commands unavailable: {}", e));
                }
            }
            let processor = CounterProcessor::new(Arc::clone(&state));
            readers.push(LineReader::spawn(
                ChannelId::Counter,
                transport,
                Box::new(processor),
                Arc::clone(&state),
                Arc::clone(&shutdown),
                settings,
            )?);
        }

        if let Some(transport) = record_connection(&state, ChannelId::Sensor, sensor) {
            let processor = SensorProcessor::new(Arc::clone(&state));
            let spawned = LineReader::spawn(
                ChannelId::Sensor,
                transport,
                Box::new(processor),
                Arc::clone(&state),
                Arc::clone(&shutdown),
                settings,
            );
            match spawned {
                Ok(reader) => readers.push(reader),
                Err(e) => {
                    let _ = stop_readers(&shutdown, &mut readers);
                    return Err(e);
                }
            }
        }

        Ok(Self {
            state,
            sender,
            readers,
            shutdown,
        })
    }

    /// Shared application state
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Current state snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> Receiver<Snapshot> {
        self.state.subscribe()
    }

    /// Phase of each running reader
    pub fn reader_phases(&self) -> Vec<(ChannelId, ReaderPhase)> {
        self.readers
            .iter()
            .map(|r| (r.channel(), r.phase()))
            .collect()
    }

    /// Switch counting mode
    ///
    /// The local mode changes before the frame is sent, so MATCH frames that
    /// arrive afterwards are judged against the newly requested mode.
    pub fn request_mode(&self, mode: Mode) -> Result<()> {
        self.state.set_mode(mode);
        let status = match mode {
            Mode::Compare => "Mode: COMPARE - set target and count",
            Mode::Count => "Mode: COUNT ONLY",
        };
        self.dispatch(Command::SetMode(mode), status.to_string())
    }

    /// Flip between COUNT and COMPARE, returning the new mode
    pub fn toggle_mode(&self) -> Result<Mode> {
        let mode = self.state.snapshot().mode.toggled();
        self.request_mode(mode)?;
        Ok(mode)
    }

    /// Set the comparison target; values outside 0-99 are rejected unsent
    pub fn request_target(&self, value: i64) -> Result<()> {
        match Target::new(value) {
            Ok(target) => self.apply_target(target),
            Err(e) => self.reject_target(e.into()),
        }
    }

    /// Set the comparison target from operator text
    pub fn request_target_text(&self, text: &str) -> Result<()> {
        match text.parse::<Target>() {
            Ok(target) => self.apply_target(target),
            Err(e) => self.reject_target(e.into()),
        }
    }

    /// Zero the counter, locally and on the device
    pub fn request_reset(&self) -> Result<()> {
        let result = self.dispatch(Command::Reset, "✓ Count reset to 0".to_string());
        self.state.reset_count();
        result
    }

    fn apply_target(&self, target: Target) -> Result<()> {
        self.state.set_target(target.get());
        self.dispatch(
            Command::SetTarget(target),
            format!("✓ Target set to {}", target),
        )
    }

    fn reject_target(&self, error: Error) -> Result<()> {
        log::info!("Target rejected: {}", error);
        self.state.post_status(format!("⚠ {}", error));
        Err(error)
    }

    /// Send a command and report the outcome on the status line
    fn dispatch(&self, command: Command, success: String) -> Result<()> {
        match self.sender.send(command) {
            Ok(()) => {
                self.state.post_status(success);
                Ok(())
            }
            Err(e) => {
                self.state.post_status(format!("✗ {}", e));
                Err(e)
            }
        }
    }

    /// Stop both readers, then release the channels
    pub fn shutdown(&mut self) -> Result<()> {
        if self.readers.is_empty() && !self.sender.is_connected() {
            return Ok(());
        }
        log::info!("Shutting down rig...");
        let result = stop_readers(&self.shutdown, &mut self.readers);
        self.sender.close();
        log::info!("Rig shutdown complete");
        result
    }
}

impl Drop for Rig {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

/// Record a resolution outcome in the state, passing the transport through
fn record_connection(
    state: &AppState,
    channel: ChannelId,
    resolved: Result<Box<dyn Transport>>,
) -> Option<Box<dyn Transport>> {
    match resolved {
        Ok(transport) => {
            let port = transport.name().to_string();
            state.post_status(format!("✓ {} connected on {}", channel, port));
            state.set_connection(channel, ConnectionStatus::Connected { port });
            Some(transport)
        }
        Err(e) => {
            log::error!("{}", e);
            state.post_status(format!("✗ {} connection failed: {}", channel, e));
            state.set_connection(channel, ConnectionStatus::Failed(e.to_string()));
            None
        }
    }
}

/// Raise the shutdown flag and join every reader
fn stop_readers(shutdown: &AtomicBool, readers: &mut Vec<LineReader>) -> Result<()> {
    shutdown.store(true, Ordering::Release);
    let mut result = Ok(());
    for mut reader in readers.drain(..) {
        if let Err(e) = reader.join() {
            log::error!("{} reader: {}", reader.channel(), e);
            result = Err(e);
        }
    }
    result
}
