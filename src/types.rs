//! Common types and data structures used across ra4-touch
//!
//! Per-channel measurement settings and the enumerated register fields
//! they are built from.

use crate::config::{
    CTSU_BASE_FREQ_KHZ, MAX_MEASUREMENT_COUNT, MAX_SENSOR_OFFSET, MIN_MEASUREMENT_COUNT,
    SSC_TABLE,
};
use crate::error::ConfigError;

/// Sensor drive pulse divider (CTSUSO1.CTSUSDPA).
///
/// The encoded value `n` divides the base clock by `2 * (n + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDivider {
    Div2 = 0,
    Div4 = 1,
    Div6 = 2,
    Div8 = 3,
    Div10 = 4,
    Div12 = 5,
    Div14 = 6,
    Div16 = 7,
    Div18 = 8,
    Div20 = 9,
    Div22 = 10,
    Div24 = 11,
    Div26 = 12,
    Div28 = 13,
    Div30 = 14,
    Div32 = 15,
    Div34 = 16,
    Div36 = 17,
    Div38 = 18,
    Div40 = 19,
    Div42 = 20,
    Div44 = 21,
    Div46 = 22,
    Div48 = 23,
    Div50 = 24,
    Div52 = 25,
    Div54 = 26,
    Div56 = 27,
    Div58 = 28,
    Div60 = 29,
    Div62 = 30,
    Div64 = 31,
}

impl ClockDivider {
    /// Decode from the low 5 bits of a register field.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x1F {
            0 => Self::Div2,
            1 => Self::Div4,
            2 => Self::Div6,
            3 => Self::Div8,
            4 => Self::Div10,
            5 => Self::Div12,
            6 => Self::Div14,
            7 => Self::Div16,
            8 => Self::Div18,
            9 => Self::Div20,
            10 => Self::Div22,
            11 => Self::Div24,
            12 => Self::Div26,
            13 => Self::Div28,
            14 => Self::Div30,
            15 => Self::Div32,
            16 => Self::Div34,
            17 => Self::Div36,
            18 => Self::Div38,
            19 => Self::Div40,
            20 => Self::Div42,
            21 => Self::Div44,
            22 => Self::Div46,
            23 => Self::Div48,
            24 => Self::Div50,
            25 => Self::Div52,
            26 => Self::Div54,
            27 => Self::Div56,
            28 => Self::Div58,
            29 => Self::Div60,
            30 => Self::Div62,
            _ => Self::Div64,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Actual division ratio applied to the base clock.
    pub fn divisor(self) -> u32 {
        2 * (self as u32 + 1)
    }

    /// Frequency used to pick the spread-spectrum band, in kHz.
    ///
    /// The band is chosen from the base clock over the encoded value, not
    /// the division ratio, so the fresh-slot SSC of Div32 stays at 2.
    /// `None` for `Div2`, which sits above every band.
    pub fn band_frequency_khz(self) -> Option<u32> {
        match self.bits() {
            0 => None,
            code => Some(CTSU_BASE_FREQ_KHZ / code as u32),
        }
    }

    /// Spread-spectrum selection for this divider.
    pub fn spread_spectrum(self) -> u16 {
        let code = self.bits() as u32;
        if code == 0 {
            return 0;
        }
        // f < limit  <=>  base < limit * code, without rounding f
        SSC_TABLE
            .iter()
            .find(|&&(limit, _)| CTSU_BASE_FREQ_KHZ < limit * code)
            .map(|&(_, ssc)| ssc)
            .unwrap_or(0)
    }
}

impl TryFrom<u8> for ClockDivider {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 31 {
            return Err(ConfigError::InvalidSetting);
        }
        Ok(Self::from_bits(value))
    }
}

/// ICO gain (CTSUSO1.CTSUICOG).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IcoGain {
    Percent100 = 0,
    Percent66 = 1,
    Percent50 = 2,
    Percent40 = 3,
}

impl IcoGain {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Percent100,
            1 => Self::Percent66,
            2 => Self::Percent50,
            _ => Self::Percent40,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for IcoGain {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 3 {
            return Err(ConfigError::InvalidSetting);
        }
        Ok(Self::from_bits(value))
    }
}

/// Measurement settings for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSettings {
    pub clock_divider: ClockDivider,
    pub gain: IcoGain,
    /// ICO reference current adjustment (0-255)
    pub reference_current: u8,
    /// Sensor offset current (0-1023)
    pub sensor_offset: u16,
    /// Measurements accumulated per pass (1-64)
    pub measurement_count: u8,
}

impl ChannelSettings {
    /// Check every field against its register width.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_offset > MAX_SENSOR_OFFSET {
            return Err(ConfigError::InvalidSetting);
        }
        if !(MIN_MEASUREMENT_COUNT..=MAX_MEASUREMENT_COUNT).contains(&self.measurement_count) {
            return Err(ConfigError::InvalidSetting);
        }
        Ok(())
    }
}

impl Default for ChannelSettings {
    /// Settings decoded from a fresh slot's register image.
    fn default() -> Self {
        Self {
            clock_divider: ClockDivider::Div32,
            gain: IcoGain::Percent100,
            reference_current: 0,
            sensor_offset: 0,
            measurement_count: 1,
        }
    }
}
