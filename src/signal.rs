//! Signal handling for graceful shutdown.
//!
//! Both SIGINT and SIGTERM clear the running flag, so `kill` and
//! `systemctl stop` go through the same shutdown sequence as Ctrl-C.

use crate::error::{Error, Result};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Install the shutdown handler; the returned flag goes false on SIGINT/SIGTERM
///
/// May be called once per process.
pub fn setup_shutdown_handler() -> Result<Arc<AtomicBool>> {
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| Error::Io(io::Error::other(format!("Error setting signal handler: {}", e))))?;
    Ok(running)
}
