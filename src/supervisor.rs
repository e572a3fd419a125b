//! Application supervisor and monitoring
//!
//! Attaches a sensor to every touch pin of a board, reports press and
//! release edges after each completed pass and prints periodic status.

use heapless::Vec;

use crate::board::{Board, BoardConfig};
use crate::config::{MAX_CHANNELS, NUM_BOARD_PINS};
use crate::error::ConfigError;
use crate::hal::{CtsuPeripheral, EventLink, PinMux, TransferEngine};
use crate::sensor::{TouchReader, TouchSensor};
use crate::sequencer::ScanSignal;
use crate::shared::SharedEngine;

/// Passes between status reports
const STATUS_INTERVAL: u32 = 1000;

/// Touch supervisor responsible for edge reporting and status
pub struct TouchSupervisor {
    board: Board,
    sensors: Vec<TouchSensor, MAX_CHANNELS>,
    /// Bit per Arduino pin
    touched: u32,
    last_status: u32,
}

impl TouchSupervisor {
    /// One sensor per touch pin of `board`, all sharing `threshold`
    pub fn for_board(board: Board, threshold: u16) -> Self {
        let mut sensors = Vec::new();
        for pin in 0..NUM_BOARD_PINS as u8 {
            if board.touch_pin(pin).is_some() {
                let _ = sensors.push(TouchSensor::new(pin, threshold));
            }
        }
        Self {
            board,
            sensors,
            touched: 0,
            last_status: 0,
        }
    }

    pub fn sensors(&self) -> &[TouchSensor] {
        &self.sensors
    }

    /// Adjust a single pin's threshold
    pub fn sensor_mut(&mut self, pin: u8) -> Option<&mut TouchSensor> {
        self.sensors.iter_mut().find(|s| s.pin() == pin)
    }

    pub fn touched(&self) -> u32 {
        self.touched
    }

    pub fn is_touched(&self, pin: u8) -> bool {
        pin < 32 && self.touched & (1 << pin) != 0
    }

    /// Print application startup banner with board information
    pub fn print_startup_banner(&self) {
        info!("========================================");
        info!("ra4-touch v{}", env!("CARGO_PKG_VERSION"));
        info!("========================================");
        info!("Hardware: Renesas RA4M1 CTSU (multi-scan)");
        info!("Board: {}", self.board.board_name());
        info!("Touch pins: {}", self.sensors.len());
        info!("========================================");
    }

    /// Configure every sensor pin
    pub fn begin(&self, engine: &mut impl TouchReader) -> Result<(), ConfigError> {
        for sensor in &self.sensors {
            sensor.begin(engine)?;
        }
        Ok(())
    }

    /// Sample every sensor and return the pins whose state changed
    pub fn update(&mut self, engine: &impl TouchReader) -> u32 {
        let now = self
            .sensors
            .iter()
            .filter(|s| s.is_touched(engine))
            .fold(0u32, |mask, s| mask | 1 << s.pin());
        let changed = now ^ self.touched;

        for sensor in self.sensors.iter().filter(|s| changed & (1 << s.pin()) != 0) {
            if now & (1 << sensor.pin()) != 0 {
                info!("pin {} touched ({})", sensor.pin(), sensor.read_raw(engine));
            } else {
                info!("pin {} released", sensor.pin());
            }
        }

        self.touched = now;
        changed
    }

    /// Run the supervisor loop, one update per completed pass
    pub async fn run<C, M, E, T>(&mut self, engine: &SharedEngine<'_, C, M, E, T>, done: &ScanSignal)
    where
        C: CtsuPeripheral,
        M: PinMux,
        E: EventLink,
        T: TransferEngine,
    {
        info!("Touch supervisor started");

        loop {
            let passes = done.wait().await;
            self.update(&engine);

            if passes.wrapping_sub(self.last_status) >= STATUS_INTERVAL {
                self.print_status(passes);
                self.last_status = passes;
            }
        }
    }

    /// Print current scan status
    fn print_status(&self, passes: u32) {
        info!("Status: {} passes, touched {=u32:#x}", passes, self.touched);
    }
}
