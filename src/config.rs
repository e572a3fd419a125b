//! Hardware configuration for ra4-touch
//! RA4M1 Capacitive Touch Sensing Unit (CTSU) as used on the Arduino UNO R4

// ===================================================================
// Capacity
// ===================================================================

pub const NUM_BOARD_PINS: usize = 21; // D0..D13, A0..A5, LOVE
pub const LOVE_PIN: u8 = 20; // On-board heart pad, not routed by the core
pub const MAX_CHANNELS: usize = 12; // Touch-capable pins on the largest board (WiFi)

// ===================================================================
// Register Image Layout
// ===================================================================

pub const WRITE_WORDS_PER_SLOT: usize = 3; // CTSUSSC, CTSUSO0, CTSUSO1
pub const RESULT_WORDS_PER_SLOT: usize = 2; // CTSUSC, CTSURC

// Fresh slot defaults
pub const DEFAULT_SSC: u16 = 0x0200;
pub const DEFAULT_SO0: u16 = 0x0000; // offset 0, one measurement
pub const DEFAULT_SO1: u16 = 0x0F00; // divider index 15, gain 100%, no current adjust

// CTSUSO0 fields
pub const SO0_OFFSET_MASK: u16 = 0x03FF;
pub const SO0_COUNT_SHIFT: u16 = 10;
pub const SO0_COUNT_MASK: u16 = 0xFC00;

// CTSUSO1 fields
pub const SO1_RICOA_MASK: u16 = 0x00FF;
pub const SO1_SDPA_SHIFT: u16 = 8;
pub const SO1_SDPA_MASK: u16 = 0x1F00;
pub const SO1_ICOG_SHIFT: u16 = 13;
pub const SO1_ICOG_MASK: u16 = 0x6000;

// CTSUSSC field
pub const SSC_SSDIV_SHIFT: u16 = 8;

// ===================================================================
// Channel Settings Limits
// ===================================================================

pub const MAX_SENSOR_OFFSET: u16 = 1023;
pub const MIN_MEASUREMENT_COUNT: u8 = 1;
pub const MAX_MEASUREMENT_COUNT: u8 = 64;

// ===================================================================
// Clocking
// ===================================================================

// CTSU runs from PCLKB, which the platform startup sets to system clock / 2
pub const CTSU_BASE_FREQ_KHZ: u32 = 24_000;

// Sensor drive frequency upper bounds (kHz) and the matching SSC value
pub const SSC_TABLE: [(u32, u16); 10] = [
    (400, 10),
    (440, 9),
    (500, 8),
    (570, 7),
    (670, 6),
    (800, 5),
    (1000, 4),
    (1330, 3),
    (2000, 2),
    (4000, 1),
];

// ===================================================================
// Event Link
// ===================================================================

pub const ELC_EVENT_CTSU_WRITE: u8 = 0x42; // CTSUWR
pub const ELC_EVENT_CTSU_READ: u8 = 0x43; // CTSURD
pub const ELC_EVENT_CTSU_END: u8 = 0x44; // CTSUFN
pub const EVENT_IRQ_PRIORITY: u8 = 12;

// ===================================================================
// CTSU Control Values
// ===================================================================

pub const CTSUCR0_START: u8 = 0x01; // CTSUSTRT, software trigger
pub const CTSUCR0_INIT: u8 = 0x10; // CTSUINIT, stops and resets the control block
pub const CTSUST_STATE_MASK: u8 = 0x07; // CTSUSTC, 0 = idle
