//! Event dispatch bridge
//!
//! Entry point for the three CTSU interrupts. Write and read requests are
//! serviced by the transfer engine before the CPU sees them, so the handler
//! only has to acknowledge; end-of-scan also completes the pass.
//!
//! Every event must be acknowledged. A read request left pending stalls the
//! CTSU state machine for good.

use crate::hal::{CtsuPeripheral, EventLink, EventToken, PinMux, ScanEvent, TransferEngine};
use crate::sequencer::TouchEngine;

/// Links handed out when the event sources were attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventTokens {
    pub write: EventToken,
    pub read: EventToken,
    pub end: EventToken,
}

impl EventTokens {
    pub fn token_for(&self, event: ScanEvent) -> EventToken {
        match event {
            ScanEvent::WriteRequest => self.write,
            ScanEvent::ReadRequest => self.read,
            ScanEvent::ScanEnd => self.end,
        }
    }

    /// Map an IRQ number back to the event linked on it.
    pub fn event_for(&self, irq: u8) -> Option<ScanEvent> {
        ScanEvent::ALL
            .into_iter()
            .find(|&event| self.token_for(event).irq() == irq)
    }
}

impl<C, M, E, T> TouchEngine<'_, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    /// Handle one scan event. Call from the event's interrupt handler.
    ///
    /// Events arriving before the sources were attached are dropped.
    pub fn on_event(&mut self, event: ScanEvent) {
        let Some(links) = self.links() else {
            return;
        };

        self.acknowledge(links.tokens.token_for(event));
        if event == ScanEvent::ScanEnd {
            self.complete_pass();
        }
    }

    /// Handle whichever event is linked on `irq`.
    pub fn on_irq(&mut self, irq: u8) {
        let event = self.links().and_then(|links| links.tokens.event_for(irq));
        if let Some(event) = event {
            self.on_event(event);
        }
    }
}
