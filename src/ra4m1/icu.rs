//! ICU event linking and NVIC setup

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

use super::{modify32, read32};
use crate::config::EVENT_IRQ_PRIORITY;
use crate::error::EventLinkError;
use crate::hal::{EventLink, EventToken, ScanEvent};

const IELSR_BASE: usize = 0x4000_6300;
const IELSR_COUNT: u8 = 32;

const IELSR_IELS_MASK: u32 = 0x1FF;
const IELSR_IR: u32 = 1 << 16;
pub(crate) const IELSR_DTCE: u32 = 1 << 24;

// RA4M1 implements the top four priority bits
const NVIC_PRIO_BITS: u8 = 4;

pub(crate) fn ielsr(irq: u8) -> usize {
    IELSR_BASE + irq as usize * 4
}

#[derive(Debug, Clone, Copy)]
struct Irq(u16);

// SAFETY: `Irq` only ever holds an IELSR index below 32
unsafe impl InterruptNumber for Irq {
    fn number(self) -> u16 {
        self.0
    }
}

/// Links CTSU events to free ICU slots.
#[derive(Debug, Default)]
pub struct IcuEventLink {
    linked: u32,
}

impl IcuEventLink {
    pub const fn new() -> Self {
        Self { linked: 0 }
    }

    fn free_slot(&self) -> Option<u8> {
        (0..IELSR_COUNT).find(|&irq| {
            self.linked & (1 << irq) == 0
                && unsafe { read32(ielsr(irq)) } & IELSR_IELS_MASK == 0
        })
    }
}

impl EventLink for IcuEventLink {
    fn attach(&mut self, event: ScanEvent) -> Result<EventToken, EventLinkError> {
        let irq = self.free_slot().ok_or(EventLinkError::NoFreeSlot)?;
        self.linked |= 1 << irq;

        unsafe {
            modify32(ielsr(irq), |v| {
                (v & !(IELSR_IELS_MASK | IELSR_IR)) | event.event_number() as u32
            });
            let mut nvic = cortex_m::Peripherals::steal().NVIC;
            nvic.set_priority(Irq(irq as u16), EVENT_IRQ_PRIORITY << (8 - NVIC_PRIO_BITS));
            NVIC::unpend(Irq(irq as u16));
            NVIC::unmask(Irq(irq as u16));
        }

        debug!("icu: event {=u8:#x} on IRQ {}", event.event_number(), irq);
        Ok(EventToken(irq))
    }

    fn acknowledge(&mut self, token: EventToken) {
        unsafe { modify32(ielsr(token.irq()), |v| v & !IELSR_IR) }
    }
}
