//! Arduino UNO R4 WiFi pin table

use super::{BoardConfig, PinTable, TouchPin};

static WIFI_PINS: PinTable = [
    Some(TouchPin::new(3, 1, 9)),   // D0  P301
    Some(TouchPin::new(3, 2, 8)),   // D1  P302
    Some(TouchPin::new(1, 4, 13)),  // D2  P104
    Some(TouchPin::new(1, 5, 34)),  // D3  P105
    None,                           // D4
    None,                           // D5
    Some(TouchPin::new(1, 11, 12)), // D6  P111
    None,                           // D7
    Some(TouchPin::new(3, 4, 11)),  // D8  P304
    Some(TouchPin::new(3, 3, 2)),   // D9  P303
    None,                           // D10
    Some(TouchPin::new(4, 11, 7)),  // D11 P411
    Some(TouchPin::new(4, 10, 6)),  // D12 P410
    None,                           // D13
    None,                           // A0
    Some(TouchPin::new(0, 0, 21)),  // A1  P000
    Some(TouchPin::new(0, 1, 22)),  // A2  P001
    None,                           // A3
    None,                           // A4
    None,                           // A5
    Some(TouchPin::new(1, 13, 27)), // LOVE P113
];

/// UNO R4 WiFi configuration
pub struct WifiConfig;

impl BoardConfig for WifiConfig {
    fn board_name(&self) -> &'static str {
        "Arduino UNO R4 WiFi"
    }

    fn pin_table(&self) -> &'static PinTable {
        &WIFI_PINS
    }
}
