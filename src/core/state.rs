//! Application state shared by both channel processors and the console
//!
//! This is the single source of truth for everything the operator sees. Sensed
//! values are written by the two message processors, operator-set values by
//! the intent handlers on [`crate::devices::Rig`]. Mutators are crate-private
//! so nothing else can write.
//!
//! # Consistency
//!
//! Each mutation takes the state lock, changes one logical field, bumps the
//! revision and publishes a [`Snapshot`] to every subscriber while still
//! holding the lock. Subscribers therefore see revisions in order. Reads of
//! different fields are not transactional across mutations: a snapshot may
//! pair a count and a temperature that arrived at slightly different times.

use super::types::{
    ChannelId, ConnectionStatus, CountProgress, Mode, TemperatureStatus, Thresholds,
};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::Mutex;

/// Queue depth per subscriber; a slow subscriber misses notifications, never state
const SUBSCRIBER_QUEUE_DEPTH: usize = 64;

/// Immutable copy of the application state at one revision
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Monotonic mutation counter
    pub revision: u64,
    /// Axles counted by the counter controller
    pub axle_count: u32,
    /// Operator-set target, 0 means no target
    pub target_count: u8,
    /// Latest TEMP reading, `None` before the first frame
    pub temperature: Option<f32>,
    /// Mode last requested by the operator
    pub mode: Mode,
    /// Device-reported equality, only ever true in COMPARE mode
    pub matched: bool,
    /// Sticky hot-axle alert
    pub hot_axle_alert: bool,
    /// Counter controller announced UNO_READY
    pub counter_ready: bool,
    /// Sensor controller announced NANO_READY
    pub sensor_ready: bool,
    /// Counter channel connection outcome
    pub counter_connection: ConnectionStatus,
    /// Sensor channel connection outcome
    pub sensor_connection: ConnectionStatus,
    /// Latest timestamped status line
    pub status: Option<String>,
    /// Thresholds used for temperature classification
    pub thresholds: Thresholds,
}

impl Snapshot {
    /// Target to show, `None` when there is no active target
    pub fn target_display(&self) -> Option<u8> {
        match self.mode {
            Mode::Compare if self.target_count > 0 => Some(self.target_count),
            _ => None,
        }
    }

    /// Two-digit count text as shown on the counter display
    pub fn count_text(&self) -> String {
        format!("{:02}", self.axle_count)
    }

    /// Temperature classification for display
    pub fn temperature_status(&self) -> TemperatureStatus {
        TemperatureStatus::classify(self.temperature, &self.thresholds)
    }

    /// Local count-versus-target indication (colour coding only)
    pub fn count_progress(&self) -> CountProgress {
        let Some(target) = self.target_display() else {
            return CountProgress::Idle;
        };
        let target = u32::from(target);
        match self.axle_count {
            n if n == target => CountProgress::Reached,
            n if n > target => CountProgress::Exceeded,
            _ => CountProgress::Counting,
        }
    }

    /// Connection status of one channel
    pub fn connection(&self, channel: ChannelId) -> &ConnectionStatus {
        match channel {
            ChannelId::Counter => &self.counter_connection,
            ChannelId::Sensor => &self.sensor_connection,
        }
    }
}

#[derive(Debug, Default)]
struct StateInner {
    revision: u64,
    axle_count: u32,
    target_count: u8,
    temperature: Option<f32>,
    mode: Mode,
    device_match: bool,
    hot_axle_alert: bool,
    counter_ready: bool,
    sensor_ready: bool,
    counter_connection: ConnectionStatus,
    sensor_connection: ConnectionStatus,
    status: Option<String>,
}

/// Process-wide application state with change notification
pub struct AppState {
    inner: Mutex<StateInner>,
    subscribers: Mutex<Vec<Sender<Snapshot>>>,
    thresholds: Thresholds,
}

impl AppState {
    /// Create an empty state using the given display thresholds
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            inner: Mutex::new(StateInner::default()),
            subscribers: Mutex::new(Vec::new()),
            thresholds,
        }
    }

    /// Current state
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock();
        self.snapshot_of(&inner)
    }

    /// Register for a snapshot after every mutation
    pub fn subscribe(&self) -> Receiver<Snapshot> {
        let (tx, rx) = bounded(SUBSCRIBER_QUEUE_DEPTH);
        self.subscribers.lock().push(tx);
        rx
    }

    fn snapshot_of(&self, inner: &StateInner) -> Snapshot {
        Snapshot {
            revision: inner.revision,
            axle_count: inner.axle_count,
            target_count: inner.target_count,
            temperature: inner.temperature,
            mode: inner.mode,
            matched: inner.mode == Mode::Compare && inner.device_match,
            hot_axle_alert: inner.hot_axle_alert,
            counter_ready: inner.counter_ready,
            sensor_ready: inner.sensor_ready,
            counter_connection: inner.counter_connection.clone(),
            sensor_connection: inner.sensor_connection.clone(),
            status: inner.status.clone(),
            thresholds: self.thresholds,
        }
    }

    /// Apply one mutation and notify subscribers
    fn update(&self, mutate: impl FnOnce(&mut StateInner)) {
        let mut inner = self.inner.lock();
        mutate(&mut inner);
        inner.revision += 1;
        let snapshot = self.snapshot_of(&inner);

        self.subscribers
            .lock()
            .retain(|tx| match tx.try_send(snapshot.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    pub(crate) fn set_axle_count(&self, count: u32) {
        self.update(|s| s.axle_count = count);
    }

    /// MATCH frames only count while COMPARE is the requested mode
    pub(crate) fn set_device_match(&self, matched: bool) {
        self.update(|s| s.device_match = matched && s.mode == Mode::Compare);
    }

    pub(crate) fn set_temperature(&self, celsius: f32) {
        self.update(|s| s.temperature = Some(celsius));
    }

    /// Latch the hot-axle alert; nothing clears it for the rest of the run
    pub(crate) fn raise_hot_axle_alert(&self) {
        self.update(|s| s.hot_axle_alert = true);
    }

    pub(crate) fn mark_ready(&self, channel: ChannelId) {
        self.update(|s| match channel {
            ChannelId::Counter => s.counter_ready = true,
            ChannelId::Sensor => s.sensor_ready = true,
        });
    }

    pub(crate) fn set_connection(&self, channel: ChannelId, status: ConnectionStatus) {
        self.update(|s| match channel {
            ChannelId::Counter => s.counter_connection = status,
            ChannelId::Sensor => s.sensor_connection = status,
        });
    }

    /// Leaving COMPARE clears the match flag
    pub(crate) fn set_mode(&self, mode: Mode) {
        self.update(|s| {
            s.mode = mode;
            if mode == Mode::Count {
                s.device_match = false;
            }
        });
    }

    pub(crate) fn set_target(&self, target: u8) {
        self.update(|s| s.target_count = target);
    }

    pub(crate) fn reset_count(&self) {
        self.update(|s| {
            s.axle_count = 0;
            s.device_match = false;
        });
    }

    /// Set the status line, prefixed with local wall-clock time
    pub(crate) fn post_status(&self, message: impl AsRef<str>) {
        let line = format!(
            "[{}] {}",
            chrono::Local::now().format("%H:%M:%S"),
            message.as_ref()
        );
        self.update(|s| s.status = Some(line));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Thresholds::default())
    }
}
