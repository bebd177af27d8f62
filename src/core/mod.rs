//! Core abstractions shared across the console.
//!
//! - [`types`]: modes, channel identifiers, display classifications
//! - [`state`]: the application state and its snapshots
//! - [`bcd`]: digit encoding for the circuit diagnostics view

pub mod bcd;
pub mod state;
pub mod types;
