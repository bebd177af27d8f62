//! Message processor for the axle counting controller

use super::reader::LineHandler;
use crate::core::state::AppState;
use crate::core::types::ChannelId;
use crate::protocol::{CounterFrame, FrameError};
use std::sync::Arc;

/// Applies counter-channel frames to the application state
///
/// Unparsable lines are dropped without touching state; under electrical
/// noise that is the expected outcome, so it is logged at debug level only.
pub struct CounterProcessor {
    state: Arc<AppState>,
}

impl CounterProcessor {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Apply one parsed frame
    pub fn apply(&self, frame: CounterFrame) {
        match frame {
            CounterFrame::Count(count) => self.state.set_axle_count(count),
            CounterFrame::Match(matched) => self.state.set_device_match(matched),
            CounterFrame::Ready => {
                log::info!("Counter controller ready");
                self.state.mark_ready(ChannelId::Counter);
                self.state.post_status("Counter ready");
            }
            CounterFrame::Debug(text) => log::trace!("counter debug: {}", text),
        }
    }
}

impl LineHandler for CounterProcessor {
    fn handle_line(&mut self, line: &str) {
        match line.parse::<CounterFrame>() {
            Ok(frame) => self.apply(frame),
            Err(FrameError::UnknownKeyword(keyword)) => {
                log::debug!("counter: unknown keyword {:?} in {:?}", keyword, line);
            }
            Err(e) => log::debug!("counter: dropped {:?}: {}", line, e),
        }
    }
}
