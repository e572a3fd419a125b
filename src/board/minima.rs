//! Arduino UNO R4 Minima pin table

use super::{BoardConfig, PinTable, TouchPin};

static MINIMA_PINS: PinTable = [
    Some(TouchPin::new(3, 1, 9)),  // D0  P301
    Some(TouchPin::new(3, 2, 8)),  // D1  P302
    Some(TouchPin::new(1, 5, 34)), // D2  P105
    Some(TouchPin::new(1, 4, 13)), // D3  P104
    None,                          // D4
    None,                          // D5
    None,                          // D6
    None,                          // D7
    Some(TouchPin::new(3, 4, 11)), // D8  P304
    Some(TouchPin::new(3, 3, 2)),  // D9  P303
    None,                          // D10
    Some(TouchPin::new(1, 9, 10)), // D11 P109
    None,                          // D12
    Some(TouchPin::new(1, 11, 12)), // D13 P111
    None,                          // A0
    Some(TouchPin::new(0, 0, 21)), // A1  P000
    Some(TouchPin::new(0, 1, 22)), // A2  P001
    None,                          // A3
    None,                          // A4
    None,                          // A5
    Some(TouchPin::new(2, 4, 0)),  // LOVE P204
];

/// UNO R4 Minima configuration
pub struct MinimaConfig;

impl BoardConfig for MinimaConfig {
    fn board_name(&self) -> &'static str {
        "Arduino UNO R4 Minima"
    }

    fn pin_table(&self) -> &'static PinTable {
        &MINIMA_PINS
    }
}
