//! ra4-touch - Capacitive touch scanning for the Renesas RA4M1
//!
//! This library drives the CTSU (Capacitive Touch Sensing Unit) of the RA4M1
//! in multi-scan mode, as found on the Arduino UNO R4 boards.
//!
//! ## Supported Boards
//! - Arduino UNO R4 Minima (11 touch pins including the LOVE pad)
//! - Arduino UNO R4 WiFi (12 touch pins including the LOVE pad)
//!
//! ## Architecture
//! - **Registry**: configured channels kept in hardware scan order
//! - **Register image**: per-channel control words and results, walked by the DTC
//! - **Sequencer**: free-running or single-shot scan state machine
//! - **Event bridge**: CTSUWR / CTSURD / CTSUFN interrupt handling
//! - **Board abstraction**: compile-time board selection through pin tables
//!
//! Hardware access goes through the traits in [`hal`]; the `ra4m1` feature
//! provides register-level implementations.

#![cfg_attr(not(test), no_std)]

// Must come first so the other modules see its macros
#[macro_use]
mod fmt;

pub mod board;
pub mod config;
pub mod error;
pub mod events;
pub mod hal;
pub mod image;
pub mod registry;
pub mod sequencer;
pub mod sensor;
pub mod shared;
pub mod supervisor;
pub mod transfer;
pub mod types;

#[cfg(feature = "ra4m1")]
pub mod ra4m1;

#[cfg(test)]
mod testing;

pub use board::{Board, BoardConfig};
pub use error::ConfigError;
pub use hal::ScanEvent;
pub use sensor::{TouchReader, TouchSensor};
pub use sequencer::{ScanCallback, ScanFlags, ScanSignal, TouchEngine};
pub use shared::SharedEngine;
pub use supervisor::TouchSupervisor;
pub use types::{ChannelSettings, ClockDivider, IcoGain};
