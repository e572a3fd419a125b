//! Register-level RA4M1 back end
//!
//! Implements the collaborator traits in [`crate::hal`] with volatile
//! accesses to the CTSU, PFS, ICU and DTC blocks. There is no PAC for the
//! RA4M1 in this stack, so register addresses live next to the code that
//! uses them.
//!
//! Event interrupts are not bound to named vectors. cortex-m-rt routes
//! every device interrupt to `DefaultHandler(irqn)`, and the firmware
//! forwards `irqn` to [`SharedEngine::on_irq`](crate::SharedEngine::on_irq).

pub mod ctsu;
pub mod dtc;
pub mod icu;
pub mod pfs;

pub use ctsu::Ctsu;
pub use dtc::{Dtc, DtcHandle};
pub use icu::IcuEventLink;
pub use pfs::Pfs;

use core::ptr::{read_volatile, write_volatile};

use embedded_hal::delay::DelayNs;

/// Core clock after reset on the UNO R4 (HOCO 48 MHz).
pub const CORE_CLOCK_HZ: u32 = 48_000_000;

// ===================================================================
// Register access
// ===================================================================

#[inline(always)]
pub(crate) unsafe fn read8(addr: usize) -> u8 {
    read_volatile(addr as *const u8)
}

#[inline(always)]
pub(crate) unsafe fn write8(addr: usize, value: u8) {
    write_volatile(addr as *mut u8, value)
}

#[inline(always)]
pub(crate) unsafe fn write16(addr: usize, value: u16) {
    write_volatile(addr as *mut u16, value)
}

#[inline(always)]
pub(crate) unsafe fn read32(addr: usize) -> u32 {
    read_volatile(addr as *const u32)
}

#[inline(always)]
pub(crate) unsafe fn write32(addr: usize, value: u32) {
    write_volatile(addr as *mut u32, value)
}

#[inline(always)]
pub(crate) unsafe fn modify8(addr: usize, f: impl FnOnce(u8) -> u8) {
    write8(addr, f(read8(addr)))
}

#[inline(always)]
pub(crate) unsafe fn modify32(addr: usize, f: impl FnOnce(u32) -> u32) {
    write32(addr, f(read32(addr)))
}

// ===================================================================
// Delay
// ===================================================================

/// Busy-wait delay counted in core cycles.
#[derive(Debug, Clone, Copy)]
pub struct CycleDelay {
    cycles_per_us: u32,
}

impl CycleDelay {
    pub const fn new(core_clock_hz: u32) -> Self {
        Self {
            cycles_per_us: core_clock_hz / 1_000_000,
        }
    }
}

impl Default for CycleDelay {
    fn default() -> Self {
        Self::new(CORE_CLOCK_HZ)
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (ns as u64 * self.cycles_per_us as u64).div_ceil(1000);
        cortex_m::asm::delay(cycles.min(u32::MAX as u64) as u32);
    }

    fn delay_us(&mut self, us: u32) {
        cortex_m::asm::delay(us.saturating_mul(self.cycles_per_us));
    }
}
