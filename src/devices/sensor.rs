//! Message processor for the temperature controller

use super::reader::LineHandler;
use crate::core::state::AppState;
use crate::core::types::ChannelId;
use crate::protocol::{FrameError, SensorFrame};
use std::sync::Arc;

/// Applies sensor-channel frames to the application state
pub struct SensorProcessor {
    state: Arc<AppState>,
}

impl SensorProcessor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Apply one parsed frame
    pub fn apply(&self, frame: SensorFrame) {
        match frame {
            SensorFrame::Temperature(celsius) => self.state.set_temperature(celsius),
            SensorFrame::HotAxleAlert => {
                if !self.state.snapshot().hot_axle_alert {
                    log::warn!("Hot axle alert raised");
                }
                self.state.raise_hot_axle_alert();
            }
            SensorFrame::Ready => {
                log::info!("Sensor controller ready");
                self.state.mark_ready(ChannelId::Sensor);
                self.state.post_status("Sensor ready");
            }
            SensorFrame::Debug(text) => log::trace!("sensor debug: {}", text),
        }
    }
}

impl LineHandler for SensorProcessor {
    fn handle_line(&mut self, line: &str) {
        match line.parse::<SensorFrame>() {
            Ok(frame) => self.apply(frame),
            Err(FrameError::UnknownKeyword(keyword)) => {
                log::debug!("sensor: unknown keyword {:?} in {:?}", keyword, line);
            }
            Err(e) => log::debug!("sensor: dropped {:?}: {}", line, e),
        }
    }
}
