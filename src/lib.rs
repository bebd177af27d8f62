//! Axle console - serial bridge and state layer for a railway axle counting rig
//!
//! The rig has two microcontrollers on separate serial links:
//!
//! - **Counter** (UNO, `/dev/ttyACM*`): counts axles, compares against an
//!   operator-set target, accepts `MODE`, `TARGET` and `RESET` commands
//! - **Sensor** (Nano, `/dev/ttyUSB*`): reports axle temperature and raises
//!   a hot-axle alert
//!
//! [`Rig`] resolves both ports, runs one reader thread per channel and
//! exposes the operator intents. Everything the operator sees is held in
//! [`core::state::AppState`] and published as [`core::state::Snapshot`]s.
//!
//! ```no_run
//! use axle_console::{AppConfig, Rig};
//!
//! let config = AppConfig::rig_defaults();
//! let mut rig = Rig::connect(&config)?;
//! rig.request_target(12)?;
//! println!("count = {}", rig.snapshot().count_text());
//! rig.shutdown()?;
//! # Ok::<(), axle_console::Error>(())
//! ```

pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod protocol;
pub mod signal;
pub mod transport;

pub use config::AppConfig;
pub use devices::Rig;
pub use error::{Error, Result};
