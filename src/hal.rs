//! Hardware collaborator interfaces
//!
//! The scan engine reaches the chip only through these traits. The `ra4m1`
//! module implements them with register access, the unit tests with mocks.

use crate::board::TouchPin;
use crate::config::{ELC_EVENT_CTSU_END, ELC_EVENT_CTSU_READ, ELC_EVENT_CTSU_WRITE};
use crate::error::{EventLinkError, PinError};
use crate::transfer::TransferConfig;

/// The three events the CTSU raises during a multi-scan pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanEvent {
    /// CTSUWR: load the next channel's control words
    WriteRequest,
    /// CTSURD: drain the channel's counters
    ReadRequest,
    /// CTSUFN: every channel has been measured
    ScanEnd,
}

impl ScanEvent {
    pub const ALL: [ScanEvent; 3] = [
        ScanEvent::WriteRequest,
        ScanEvent::ReadRequest,
        ScanEvent::ScanEnd,
    ];

    /// ELC event number routed to the ICU.
    pub const fn event_number(self) -> u8 {
        match self {
            ScanEvent::WriteRequest => ELC_EVENT_CTSU_WRITE,
            ScanEvent::ReadRequest => ELC_EVENT_CTSU_READ,
            ScanEvent::ScanEnd => ELC_EVENT_CTSU_END,
        }
    }
}

/// Handle to an attached event source. On the RA4M1 this is the IRQ number
/// (IELSR slot) the event was linked to, which is also the DTC trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventToken(pub u8);

impl EventToken {
    pub fn irq(self) -> u8 {
        self.0
    }
}

/// The sensing unit itself.
pub trait CtsuPeripheral {
    /// One-time clock, power and analog bring-up.
    fn power_on(&mut self);

    /// Set a channel's enable bit in CTSUCHAC[group].
    fn enable_channel(&mut self, group: u8, mask: u8);

    /// Software-trigger a scan pass.
    fn software_start(&mut self);

    /// Stop and reset the control block.
    fn stop(&mut self);

    /// Raw CTSUST value.
    fn status(&self) -> u8;

    /// Address of CTSUSSC, the first of the three per-channel control registers.
    fn write_window(&self) -> usize;

    /// Address of CTSUSC, the first of the two counter registers.
    fn read_window(&self) -> usize;
}

/// Pin function selection.
pub trait PinMux {
    fn configure_pin_for_sensing(&mut self, pin: TouchPin) -> Result<(), PinError>;
}

/// Interrupt routing for scan events.
///
/// The implementation binds each event to its handler; the engine only keeps
/// the token to acknowledge with.
pub trait EventLink {
    fn attach(&mut self, event: ScanEvent) -> Result<EventToken, EventLinkError>;

    /// Clear the pending flag so the event can fire again.
    fn acknowledge(&mut self, token: EventToken);
}

/// Bulk transfer controller driven by event triggers.
pub trait TransferEngine {
    type Handle: Copy;

    /// Build a transfer from `config` and bind it to its trigger.
    fn configure(&mut self, config: &TransferConfig) -> Self::Handle;

    /// Reload addresses and block count before the next pass.
    fn reset(&mut self, handle: Self::Handle, src: usize, dst: usize, count: u16);

    /// Let the trigger start the transfer.
    fn enable(&mut self, handle: Self::Handle);
}
