//! Board abstraction layer for RA4M1 touch boards
//!
//! Maps Arduino pin numbers to the MCU port/pin and the CTSU channel
//! (TS number) behind it. Pins without a TS function map to `None`.

pub mod minima;
pub mod wifi;

use crate::config::NUM_BOARD_PINS;

/// A CTSU sensing channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelInfo {
    /// TS number, also the channel's position in the hardware scan order
    pub hardware_id: u8,
    /// CTSUCHAC register holding the channel's enable bit
    pub group_index: u8,
    /// Enable bit within that register
    pub enable_mask: u8,
}

impl ChannelInfo {
    pub const fn new(hardware_id: u8) -> Self {
        Self {
            hardware_id,
            group_index: hardware_id / 8,
            enable_mask: 1 << (hardware_id % 8),
        }
    }
}

/// A board pin that can be routed to the CTSU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPin {
    pub port: u8,
    pub pin: u8,
    pub channel: ChannelInfo,
}

impl TouchPin {
    pub const fn new(port: u8, pin: u8, hardware_id: u8) -> Self {
        Self {
            port,
            pin,
            channel: ChannelInfo::new(hardware_id),
        }
    }
}

/// Pin table indexed by Arduino pin number
pub type PinTable = [Option<TouchPin>; NUM_BOARD_PINS];

/// Board configuration trait
pub trait BoardConfig {
    /// Get board name for identification
    fn board_name(&self) -> &'static str;

    /// Get the Arduino pin table
    fn pin_table(&self) -> &'static PinTable;

    /// Look up the touch routing of an Arduino pin
    fn touch_pin(&self, pin: u8) -> Option<TouchPin> {
        self.pin_table().get(pin as usize).copied().flatten()
    }

    /// Look up the CTSU channel behind an Arduino pin
    fn channel_info(&self, pin: u8) -> Option<ChannelInfo> {
        self.touch_pin(pin).map(|p| p.channel)
    }

    /// Number of touch-capable pins
    fn touch_pin_count(&self) -> usize {
        self.pin_table().iter().filter(|p| p.is_some()).count()
    }
}

/// Enum-based board selection for no_std environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Board {
    Minima,
    Wifi,
}

impl BoardConfig for Board {
    fn board_name(&self) -> &'static str {
        match self {
            Board::Minima => minima::MinimaConfig.board_name(),
            Board::Wifi => wifi::WifiConfig.board_name(),
        }
    }

    fn pin_table(&self) -> &'static PinTable {
        match self {
            Board::Minima => minima::MinimaConfig.pin_table(),
            Board::Wifi => wifi::WifiConfig.pin_table(),
        }
    }
}
