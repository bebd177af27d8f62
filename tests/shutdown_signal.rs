//! Shutdown signal handling
//!
//! Kept in its own test binary: the handler can be installed once per
//! process and the test signals its own pid.
//!
//! Run with: `cargo test --test shutdown_signal`

#![cfg(unix)]

use axle_console::signal::setup_shutdown_handler;
use std::process::Command;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_sigterm_clears_running_flag() {
    let running = setup_shutdown_handler().unwrap();
    assert!(running.load(Ordering::SeqCst));

    // Without a SIGTERM handler this would terminate the test process
    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(2);
    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!running.load(Ordering::SeqCst));
}
