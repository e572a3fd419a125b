//! Recording mocks of the hardware collaborators for host tests

extern crate std;

use std::sync::{Arc, Mutex};
use std::vec::Vec;

use portable_atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::board::{Board, TouchPin};
use crate::error::{EventLinkError, PinError};
use crate::hal::{CtsuPeripheral, EventLink, EventToken, PinMux, ScanEvent, TransferEngine};
use crate::sequencer::{ScanFlags, TouchEngine};
use crate::transfer::TransferConfig;

const WRITE_WINDOW: usize = 0x4008_1012;
const READ_WINDOW: usize = 0x4008_1018;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    PowerOn,
    EnableChannel(u8, u8),
    SoftwareStart,
    Stop,
    ConfigurePin(TouchPin),
    Attach(ScanEvent),
    Acknowledge(EventToken),
    ConfigureTransfer(TransferConfig),
    ResetTransfer {
        handle: u8,
        src: usize,
        dst: usize,
        count: u16,
    },
    EnableTransfer(u8),
}

struct State {
    calls: Mutex<Vec<Call>>,
    busy: AtomicBool,
    refuse_pins: AtomicBool,
    event_slots: AtomicUsize,
}

/// Shared recorder behind every mock. Clones see the same log.
#[derive(Clone)]
pub struct MockHardware {
    state: Arc<State>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::with_event_slots(usize::MAX)
    }

    pub fn with_event_slots(slots: usize) -> Self {
        Self {
            state: Arc::new(State {
                calls: Mutex::new(Vec::new()),
                busy: AtomicBool::new(false),
                refuse_pins: AtomicBool::new(false),
                event_slots: AtomicUsize::new(slots),
            }),
        }
    }

    fn record(&self, call: Call) {
        self.state.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        self.state.calls.lock().unwrap().clear();
    }

    /// Make CTSUST report a scan in progress.
    pub fn set_busy(&self, busy: bool) {
        self.state.busy.store(busy, Ordering::SeqCst);
    }

    /// Return `n` event link slots to the pool.
    pub fn add_event_slots(&self, n: usize) {
        self.state.event_slots.fetch_add(n, Ordering::SeqCst);
    }

    pub fn refuse_pins(&self) {
        self.state.refuse_pins.store(true, Ordering::SeqCst);
    }

    pub fn write_window(&self) -> usize {
        WRITE_WINDOW
    }

    pub fn read_window(&self) -> usize {
        READ_WINDOW
    }
}

pub struct MockCtsu(MockHardware);
pub struct MockPins(MockHardware);
pub struct MockEvents {
    hw: MockHardware,
    next_irq: u8,
}
pub struct MockTransfers {
    hw: MockHardware,
    configured: Vec<TransferConfig>,
}

impl CtsuPeripheral for MockCtsu {
    fn power_on(&mut self) {
        self.0.record(Call::PowerOn);
    }

    fn enable_channel(&mut self, group: u8, mask: u8) {
        self.0.record(Call::EnableChannel(group, mask));
    }

    fn software_start(&mut self) {
        self.0.record(Call::SoftwareStart);
    }

    fn stop(&mut self) {
        self.0.record(Call::Stop);
    }

    fn status(&self) -> u8 {
        // CTSUSTC = 2: measuring
        if self.0.state.busy.load(Ordering::SeqCst) {
            2
        } else {
            0
        }
    }

    fn write_window(&self) -> usize {
        WRITE_WINDOW
    }

    fn read_window(&self) -> usize {
        READ_WINDOW
    }
}

impl PinMux for MockPins {
    fn configure_pin_for_sensing(&mut self, pin: TouchPin) -> Result<(), PinError> {
        if self.0.state.refuse_pins.load(Ordering::SeqCst) {
            return Err(PinError::InvalidPort {
                port: pin.port,
                pin: pin.pin,
            });
        }
        self.0.record(Call::ConfigurePin(pin));
        Ok(())
    }
}

impl EventLink for MockEvents {
    fn attach(&mut self, event: ScanEvent) -> Result<EventToken, EventLinkError> {
        let slots = &self.hw.state.event_slots;
        if slots.load(Ordering::SeqCst) == 0 {
            return Err(EventLinkError::NoFreeSlot);
        }
        slots.fetch_sub(1, Ordering::SeqCst);
        self.hw.record(Call::Attach(event));
        let token = EventToken(self.next_irq);
        self.next_irq += 1;
        Ok(token)
    }

    fn acknowledge(&mut self, token: EventToken) {
        self.hw.record(Call::Acknowledge(token));
    }
}

impl TransferEngine for MockTransfers {
    type Handle = u8;

    fn configure(&mut self, config: &TransferConfig) -> u8 {
        self.hw.record(Call::ConfigureTransfer(*config));
        self.configured.push(*config);
        (self.configured.len() - 1) as u8
    }

    fn reset(&mut self, handle: u8, src: usize, dst: usize, count: u16) {
        self.hw.record(Call::ResetTransfer {
            handle,
            src,
            dst,
            count,
        });
    }

    fn enable(&mut self, handle: u8) {
        self.hw.record(Call::EnableTransfer(handle));
    }
}

pub type TestEngine<'a> = TouchEngine<'a, MockCtsu, MockPins, MockEvents, MockTransfers>;

/// Engine wired to mocks that all record into `hw`.
pub fn engine<'a>(hw: &MockHardware, flags: &'a ScanFlags, board: Board) -> TestEngine<'a> {
    TouchEngine::new(
        board,
        flags,
        MockCtsu(hw.clone()),
        MockPins(hw.clone()),
        MockEvents {
            hw: hw.clone(),
            next_irq: 0,
        },
        MockTransfers {
            hw: hw.clone(),
            configured: Vec::new(),
        },
    )
}
