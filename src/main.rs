//! Axle console - headless operator console for the axle counting rig
//!
//! Connects both controllers, logs every state change and takes operator
//! intents from stdin, one per line:
//!
//! ```text
//! count | compare | toggle | target <n> | reset | status | quit
//! ```
//!
//! `--probe` instead listens on every configured port for a few seconds and
//! reports which ones have a controller behind them.

use axle_console::core::bcd::encode_count;
use axle_console::core::state::Snapshot;
use axle_console::core::types::{ChannelId, Mode};
use axle_console::signal::setup_shutdown_handler;
use axle_console::transport::probe_ports;
use axle_console::{AppConfig, Error, Result, Rig};
use clap::Parser;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Intent queue poll period of the main loop
const INTENT_POLL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(author, version, about = "Operator console for the railway axle counting rig")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "/etc/axle-console.toml")]
    config: String,

    /// Counter (UNO) port, tried before the configured candidates
    #[arg(long)]
    counter_port: Option<String>,

    /// Sensor (Nano) port, tried before the configured candidates
    #[arg(long)]
    sensor_port: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Listen on every candidate port and report which are live, then exit
    #[arg(long)]
    probe: bool,
}

/// One line of operator input
#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent {
    SetMode(Mode),
    Toggle,
    Target(String),
    Reset,
    Status,
    Quit,
}

fn parse_intent(line: &str) -> Option<Intent> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    match word.to_ascii_lowercase().as_str() {
        "count" => Some(Intent::SetMode(Mode::Count)),
        "compare" => Some(Intent::SetMode(Mode::Compare)),
        "toggle" => Some(Intent::Toggle),
        "target" => Some(Intent::Target(rest.trim().to_string())),
        "reset" => Some(Intent::Reset),
        "status" => Some(Intent::Status),
        "quit" | "exit" => Some(Intent::Quit),
        _ => None,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = Path::new(&args.config);
    let config_found = config_path.exists();
    let mut config = if config_found {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::rig_defaults()
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::info!("Axle console v{} starting...", env!("CARGO_PKG_VERSION"));
    if config_found {
        log::info!("Using config: {}", args.config);
    } else {
        log::warn!("Config {} not found, using rig defaults", args.config);
    }

    if let Some(port) = &args.counter_port {
        config.counter.prefer(port);
    }
    if let Some(port) = &args.sensor_port {
        config.sensor.prefer(port);
    }

    if args.probe {
        run_probe(&config);
        return Ok(());
    }

    let running = setup_shutdown_handler()?;

    let mut rig = Rig::connect(&config)?;

    let monitor = {
        let updates = rig.subscribe();
        let running = Arc::clone(&running);
        thread::Builder::new()
            .name("console-monitor".to_string())
            .spawn(move || monitor_loop(updates, &running))
            .map_err(|e| Error::ThreadSpawn(format!("console monitor: {}", e)))?
    };

    let (intent_tx, intent_rx) = bounded(16);
    // Blocked on stdin most of the time, so never joined
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || input_loop(intent_tx))
        .map_err(|e| Error::ThreadSpawn(format!("console input: {}", e)))?;

    log::info!("Ready. Commands: count, compare, toggle, target <n>, reset, status, quit");

    while running.load(Ordering::Relaxed) {
        match intent_rx.recv_timeout(INTENT_POLL) {
            Ok(Intent::Quit) => break,
            Ok(intent) => apply_intent(&rig, intent),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    running.store(false, Ordering::Relaxed);
    rig.shutdown()?;
    if monitor.join().is_err() {
        log::error!("Console monitor panicked");
    }
    log::info!("Axle console stopped");
    Ok(())
}

/// Forward stdin lines as intents; end of input quits
fn input_loop(intents: Sender<Intent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_intent(&line) {
            Some(intent) => {
                let quit = intent == Intent::Quit;
                if intents.send(intent).is_err() || quit {
                    return;
                }
            }
            None => log::warn!("Unknown command: {}", line.trim()),
        }
    }
    let _ = intents.send(Intent::Quit);
}

/// Run one intent; outcomes are already on the status line and in the log
fn apply_intent(rig: &Rig, intent: Intent) {
    let result = match intent {
        Intent::SetMode(mode) => rig.request_mode(mode),
        Intent::Toggle => rig.toggle_mode().map(|_| ()),
        Intent::Target(text) => rig.request_target_text(&text),
        Intent::Reset => rig.request_reset(),
        Intent::Status => {
            print_status(&rig.snapshot());
            Ok(())
        }
        Intent::Quit => Ok(()),
    };
    if let Err(e) = result {
        log::debug!("Intent failed: {}", e);
    }
}

fn monitor_loop(updates: Receiver<Snapshot>, running: &AtomicBool) {
    let mut last_status = None;
    while running.load(Ordering::Relaxed) {
        match updates.recv_timeout(INTENT_POLL) {
            Ok(snapshot) => {
                if snapshot.status != last_status {
                    if let Some(status) = &snapshot.status {
                        log::info!("{}", status);
                    }
                    last_status = snapshot.status.clone();
                }
                log::debug!("{}", summary(&snapshot));
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn summary(snapshot: &Snapshot) -> String {
    let target = snapshot
        .target_display()
        .map_or_else(|| "--".to_string(), |t| format!("{:02}", t));
    format!(
        "rev {} | count {} | target {} | {:?} | temp {} ({:?}) | mode {} | match {} | hot-axle {}",
        snapshot.revision,
        snapshot.count_text(),
        target,
        snapshot.count_progress(),
        snapshot.temperature_status(),
        snapshot.temperature_status(),
        snapshot.mode,
        snapshot.matched,
        snapshot.hot_axle_alert,
    )
}

fn print_status(snapshot: &Snapshot) {
    println!("{}", summary(snapshot));
    for channel in [ChannelId::Counter, ChannelId::Sensor] {
        let ready = match channel {
            ChannelId::Counter => snapshot.counter_ready,
            ChannelId::Sensor => snapshot.sensor_ready,
        };
        println!(
            "  {:<8} {:?} ready={}",
            channel,
            snapshot.connection(channel),
            ready
        );
    }
    for (place, digit) in ["tens", "ones"].iter().zip(encode_count(snapshot.axle_count)) {
        println!(
            "  {:<4} {} bcd={} segments={}",
            place,
            digit.digit,
            digit.bcd_bits(),
            digit.lit_segments()
        );
    }
    if let Some(status) = &snapshot.status {
        println!("  {}", status);
    }
}

fn run_probe(config: &AppConfig) {
    for (channel, ports) in [
        (ChannelId::Counter, &config.counter.ports),
        (ChannelId::Sensor, &config.sensor.ports),
    ] {
        println!("=== {} candidates ===", channel);
        for report in probe_ports(ports, &config.serial) {
            match &report.outcome {
                Ok(lines) if !lines.is_empty() => {
                    println!("✓ {} is active ({} lines)", report.port, lines.len());
                    for line in lines {
                        println!("  → {}", line);
                    }
                }
                Ok(_) => println!("- {} opened but stayed silent", report.port),
                Err(e) => println!("✗ {} not found: {}", report.port, e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_intent() {
        assert_eq!(parse_intent("count"), Some(Intent::SetMode(Mode::Count)));
        assert_eq!(parse_intent(" COMPARE "), Some(Intent::SetMode(Mode::Compare)));
        assert_eq!(
            parse_intent("target 12"),
            Some(Intent::Target("12".to_string()))
        );
        assert_eq!(parse_intent("target"), Some(Intent::Target(String::new())));
        assert_eq!(parse_intent("reset"), Some(Intent::Reset));
        assert_eq!(parse_intent("quit"), Some(Intent::Quit));
        assert_eq!(parse_intent("launch"), None);
    }
}
