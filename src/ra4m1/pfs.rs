//! Pin function select (PFS)

use super::{modify8, write32};
use crate::board::TouchPin;
use crate::error::PinError;
use crate::hal::PinMux;

const PFS_BASE: usize = 0x4004_0800;
const PWPR: usize = 0x4004_0D03;

const PWPR_B0WI: u8 = 1 << 7;
const PWPR_PFSWE: u8 = 1 << 6;

pub(crate) const PFS_PDR: u32 = 1 << 2;
pub(crate) const PFS_PMR: u32 = 1 << 16;
const PFS_PSEL_SHIFT: u32 = 24;
pub(crate) const PSEL_CTSU: u32 = 0x0C;

const MAX_PORT: u8 = 9;
const MAX_PIN: u8 = 15;

// TSCAP is driven by the CTSU itself
pub(crate) const TSCAP_PORT: u8 = 1;
pub(crate) const TSCAP_PIN: u8 = 12;

/// Write access to the PmnPFS registers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Pfs;

impl Pfs {
    pub const fn new() -> Self {
        Self
    }

    fn address(port: u8, pin: u8) -> Result<usize, PinError> {
        if port > MAX_PORT || pin > MAX_PIN {
            return Err(PinError::InvalidPort { port, pin });
        }
        Ok(PFS_BASE + port as usize * 0x40 + pin as usize * 4)
    }

    /// Write a whole PmnPFS register, lifting write protection around it.
    pub(crate) fn write(&mut self, port: u8, pin: u8, value: u32) -> Result<(), PinError> {
        let addr = Self::address(port, pin)?;
        unsafe {
            modify8(PWPR, |v| v & !PWPR_B0WI);
            modify8(PWPR, |v| v | PWPR_PFSWE);
            write32(addr, value);
            modify8(PWPR, |v| v & !PWPR_PFSWE);
            modify8(PWPR, |v| v | PWPR_B0WI);
        }
        Ok(())
    }

    /// Route a pin to peripheral function 12 (CTSU).
    pub(crate) fn select_ctsu(&mut self, port: u8, pin: u8) -> Result<(), PinError> {
        let psel = PSEL_CTSU << PFS_PSEL_SHIFT;
        // PSEL may only change while PMR is clear
        self.write(port, pin, psel)?;
        self.write(port, pin, psel | PFS_PMR)
    }
}

impl PinMux for Pfs {
    fn configure_pin_for_sensing(&mut self, pin: TouchPin) -> Result<(), PinError> {
        if (pin.port, pin.pin) == (TSCAP_PORT, TSCAP_PIN) {
            return Err(PinError::Reserved);
        }
        self.select_ctsu(pin.port, pin.pin)
    }
}
