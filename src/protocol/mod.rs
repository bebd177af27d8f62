//! Line protocol spoken by the two controllers

pub mod commands;
pub mod frames;

pub use commands::{Command, Target, TargetError};
pub use frames::{CounterFrame, FrameError, SensorFrame};
