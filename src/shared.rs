//! Interrupt-safe engine ownership
//!
//! The engine is touched from thread mode and from the three CTSU interrupt
//! handlers, so it lives in a critical-section mutex. Readiness is polled
//! through the lock-free [`ScanFlags`], which is what lets the single-shot
//! wait spin without blocking the end-of-scan handler.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::error::ConfigError;
use crate::hal::{CtsuPeripheral, EventLink, PinMux, ScanEvent, TransferEngine};
use crate::sequencer::{ScanFlags, TouchEngine};

pub struct SharedEngine<'a, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    flags: &'a ScanFlags,
    engine: Mutex<RefCell<Option<TouchEngine<'a, C, M, E, T>>>>,
}

impl<'a, C, M, E, T> SharedEngine<'a, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    pub const fn new(flags: &'a ScanFlags) -> Self {
        Self {
            flags,
            engine: Mutex::new(RefCell::new(None)),
        }
    }

    /// Hand the engine over. It must have been built with the same flags.
    ///
    /// Install before the first [`start`](Self::start): the engine moves
    /// here, and a pass in flight would keep writing to its old location.
    pub fn install(&self, engine: TouchEngine<'a, C, M, E, T>) {
        debug_assert!(core::ptr::eq(engine.flags(), self.flags));
        critical_section::with(|cs| {
            self.engine.borrow_ref_mut(cs).replace(engine);
        });
    }

    /// Run `f` on the engine inside a critical section.
    ///
    /// Returns `None` if no engine has been installed yet.
    pub fn with<R>(&self, f: impl FnOnce(&mut TouchEngine<'a, C, M, E, T>) -> R) -> Option<R> {
        critical_section::with(|cs| self.engine.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Interrupt handler entry.
    pub fn on_event(&self, event: ScanEvent) {
        self.with(|engine| engine.on_event(event));
    }

    pub fn on_irq(&self, irq: u8) {
        self.with(|engine| engine.on_irq(irq));
    }

    pub fn configure(&self, pin: u8) -> Result<(), ConfigError> {
        self.with(|engine| engine.configure(pin))
            .unwrap_or(Err(ConfigError::NoEngine))
    }

    pub fn start(&self, free_running: bool) {
        self.with(|engine| engine.start(free_running));
    }

    pub fn stop(&self) {
        self.with(|engine| engine.stop());
    }

    pub fn ready(&self) -> bool {
        self.flags.ready()
    }

    pub fn completed_passes(&self) -> u32 {
        self.flags.completed_passes()
    }

    pub fn read(&self, pin: u8) -> u16 {
        self.with(|engine| engine.read(pin)).unwrap_or(0)
    }

    pub fn read_reference(&self, pin: u8) -> u16 {
        self.with(|engine| engine.read_reference(pin)).unwrap_or(0)
    }

    /// Run one pass and wait for it to finish.
    ///
    /// Spins outside the critical section so the end-of-scan interrupt can
    /// get in. There is no timeout: a stalled CTSU hangs here.
    pub fn start_single_shot(&self) {
        self.start(false);
        while !self.ready() {
            core::hint::spin_loop();
        }
    }
}
