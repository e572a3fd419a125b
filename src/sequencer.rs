//! Scan sequencer
//!
//! Owns the channel registry and register image, and drives the CTSU through
//! repeated multi-scan passes. A pass is armed by re-issuing both transfers
//! with the current channel count, then software-started. The end-of-scan
//! event completes it and, in free-running mode, arms the next one.
//!
//! The flags thread mode polls live in [`ScanFlags`] so they can be read
//! without taking the lock the engine itself sits behind.

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::{AtomicBool, AtomicU32};

use crate::board::{Board, BoardConfig};
use crate::config::{CTSUST_STATE_MASK, MAX_CHANNELS};
use crate::error::ConfigError;
use crate::events::EventTokens;
use crate::hal::{CtsuPeripheral, EventLink, EventToken, PinMux, ScanEvent, TransferEngine};
use crate::image::RegisterImage;
use crate::registry::ChannelRegistry;
use crate::transfer::TransferConfig;
use crate::types::{ChannelSettings, ClockDivider, IcoGain};

/// Called from the end-of-scan interrupt after every pass.
pub type ScanCallback = fn();

/// Signalled with the completed-pass count after every pass.
pub type ScanSignal = Signal<CriticalSectionRawMutex, u32>;

/// Scan state shared between thread mode and the event handlers.
pub struct ScanFlags {
    free_running: AtomicBool,
    scan_done: AtomicBool,
    passes: AtomicU32,
}

impl ScanFlags {
    pub const fn new() -> Self {
        Self {
            free_running: AtomicBool::new(true),
            scan_done: AtomicBool::new(true),
            passes: AtomicU32::new(0),
        }
    }

    /// Results can be read: either scanning continuously or the last
    /// single-shot pass has finished.
    pub fn ready(&self) -> bool {
        self.free_running.load(Ordering::Acquire) || self.scan_done.load(Ordering::Acquire)
    }

    pub fn is_free_running(&self) -> bool {
        self.free_running.load(Ordering::Acquire)
    }

    pub fn is_scan_done(&self) -> bool {
        self.scan_done.load(Ordering::Acquire)
    }

    pub fn completed_passes(&self) -> u32 {
        self.passes.load(Ordering::Acquire)
    }
}

impl Default for ScanFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything set up on first use of the peripheral.
#[derive(Clone, Copy)]
pub(crate) struct Links<H> {
    pub(crate) tokens: EventTokens,
    write: H,
    read: H,
}

/// Progress of the one-time peripheral bring-up, kept so a failed attempt
/// resumes where it stopped instead of claiming resources twice.
#[derive(Clone, Copy, Default)]
struct BringUp {
    powered: bool,
    write: Option<EventToken>,
    read: Option<EventToken>,
    end: Option<EventToken>,
}

/// Multi-scan touch engine.
///
/// Once a pass is armed the transfer engine holds the address of the
/// register image inside this value. Do not move the engine while it is
/// scanning, that is after [`start`](Self::start) until [`stop`](Self::stop)
/// or the end of a single-shot pass. Every pass re-issues the addresses, so
/// moving a stopped engine is fine. Dropping the engine stops the CTSU.
pub struct TouchEngine<'a, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    flags: &'a ScanFlags,
    board: Board,
    ctsu: C,
    pins: M,
    events: E,
    transfers: T,
    registry: ChannelRegistry<MAX_CHANNELS>,
    image: RegisterImage<MAX_CHANNELS>,
    setup: BringUp,
    links: Option<Links<T::Handle>>,
    callback: Option<ScanCallback>,
    notifier: Option<&'a ScanSignal>,
}

impl<'a, C, M, E, T> TouchEngine<'a, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    pub fn new(board: Board, flags: &'a ScanFlags, ctsu: C, pins: M, events: E, transfers: T) -> Self {
        Self {
            flags,
            board,
            ctsu,
            pins,
            events,
            transfers,
            registry: ChannelRegistry::new(),
            image: RegisterImage::new(),
            setup: BringUp::default(),
            links: None,
            callback: None,
            notifier: None,
        }
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn flags(&self) -> &'a ScanFlags {
        self.flags
    }

    /// Add a pin to the scan.
    ///
    /// Stops any running scan first; call [`start`](Self::start) again
    /// afterwards. Unsupported and already configured pins leave the
    /// hardware untouched.
    pub fn configure(&mut self, pin: u8) -> Result<(), ConfigError> {
        let touch_pin = self
            .board
            .touch_pin(pin)
            .ok_or(ConfigError::UnsupportedPin(pin))?;
        self.registry.check(pin)?;

        self.stop();
        self.pins.configure_pin_for_sensing(touch_pin)?;
        if self.links.is_none() {
            self.bring_up()?;
        }

        let channel = touch_pin.channel;
        self.ctsu
            .enable_channel(channel.group_index, channel.enable_mask);
        let slot = self.registry.register(pin, channel, &mut self.image)?;

        info!(
            "touch: pin {} -> TS{} in slot {} ({} channels)",
            pin,
            channel.hardware_id,
            slot,
            self.registry.len()
        );
        Ok(())
    }

    fn bring_up(&mut self) -> Result<(), ConfigError> {
        if !self.setup.powered {
            info!("touch: bringing up CTSU on {}", self.board.board_name());
            self.ctsu.power_on();
            self.setup.powered = true;
        }

        let done = &mut self.setup;
        let tokens = EventTokens {
            write: attach_once(&mut self.events, &mut done.write, ScanEvent::WriteRequest)?,
            read: attach_once(&mut self.events, &mut done.read, ScanEvent::ReadRequest)?,
            end: attach_once(&mut self.events, &mut done.end, ScanEvent::ScanEnd)?,
        };

        // Block counts are placeholders until the first pass re-issues them
        let write = self.transfers.configure(&TransferConfig::write_phase(
            tokens.write,
            self.image.write_source(),
            self.ctsu.write_window(),
            1,
        ));
        let read = self.transfers.configure(&TransferConfig::read_phase(
            tokens.read,
            self.ctsu.read_window(),
            self.image.result_destination(),
            1,
        ));
        self.transfers.enable(write);
        self.transfers.enable(read);

        self.links = Some(Links { tokens, write, read });
        debug!(
            "touch: events linked on IRQ {} {} {}",
            tokens.write.irq(),
            tokens.read.irq(),
            tokens.end.irq()
        );
        Ok(())
    }

    /// Start scanning, continuously or for a single pass.
    ///
    /// A pass already in flight is left to finish on its own; in
    /// free-running mode it then rolls straight into the next one.
    pub fn start(&mut self, free_running: bool) {
        self.flags.free_running.store(free_running, Ordering::Release);

        let idle = self.ctsu.status() & CTSUST_STATE_MASK == 0;
        if self.flags.scan_done.load(Ordering::Acquire) || idle {
            self.begin_pass();
        } else {
            trace!("touch: pass in flight, start deferred");
        }
    }

    /// Stop scanning. Results of an interrupted pass are undefined.
    pub fn stop(&mut self) {
        self.ctsu.stop();
        self.flags.free_running.store(false, Ordering::Release);
    }

    pub fn ready(&self) -> bool {
        self.flags.ready()
    }

    pub fn completed_passes(&self) -> u32 {
        self.flags.completed_passes()
    }

    fn begin_pass(&mut self) {
        let count = self.registry.len() as u16;
        let Some(links) = self.links.filter(|_| count > 0) else {
            warn!("touch: no channels configured, scan not started");
            return;
        };

        self.flags.scan_done.store(false, Ordering::Release);
        self.transfers
            .reset(links.write, self.image.write_source(), self.ctsu.write_window(), count);
        self.transfers.reset(
            links.read,
            self.ctsu.read_window(),
            self.image.result_destination(),
            count,
        );
        // Image and transfer setup must land before the peripheral sees the trigger
        compiler_fence(Ordering::SeqCst);
        self.ctsu.software_start();
    }

    pub(crate) fn links(&self) -> Option<Links<T::Handle>> {
        self.links
    }

    pub(crate) fn acknowledge(&mut self, token: EventToken) {
        self.events.acknowledge(token);
    }

    /// End-of-scan transition.
    pub(crate) fn complete_pass(&mut self) {
        self.flags.scan_done.store(true, Ordering::Release);
        let passes = self.flags.passes.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

        if let Some(callback) = self.callback {
            callback();
        }
        if let Some(notifier) = self.notifier {
            notifier.signal(passes);
        }
        if self.flags.free_running.load(Ordering::Acquire) {
            self.begin_pass();
        }
    }

    // ===================================================================
    // Results
    // ===================================================================

    /// Latest measurement count for `pin`, 0 if it is not configured.
    pub fn read(&self, pin: u8) -> u16 {
        self.registry
            .slot_of(pin)
            .map_or(0, |slot| self.image.measurement(slot))
    }

    /// Latest reference count for `pin`, 0 if it is not configured.
    pub fn read_reference(&self, pin: u8) -> u16 {
        self.registry
            .slot_of(pin)
            .map_or(0, |slot| self.image.reference(slot))
    }

    pub fn slot_of(&self, pin: u8) -> Option<usize> {
        self.registry.slot_of(pin)
    }

    pub fn channel_count(&self) -> usize {
        self.registry.len()
    }

    /// TS numbers in scan order.
    pub fn hardware_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.registry.hardware_ids()
    }

    // ===================================================================
    // Completion hooks
    // ===================================================================

    /// Runs in interrupt context; keep it short.
    pub fn attach_callback(&mut self, callback: ScanCallback) {
        self.callback = Some(callback);
    }

    pub fn detach_callback(&mut self) {
        self.callback = None;
    }

    pub fn attach_notifier(&mut self, notifier: &'a ScanSignal) {
        self.notifier = Some(notifier);
    }

    // ===================================================================
    // Channel settings
    // ===================================================================

    pub fn get_channel_settings(&self, pin: u8) -> Option<ChannelSettings> {
        self.registry
            .slot_of(pin)
            .map(|slot| self.image.settings(slot))
    }

    pub fn apply_channel_settings(
        &mut self,
        pin: u8,
        settings: &ChannelSettings,
    ) -> Result<(), ConfigError> {
        let slot = self.configured_slot(pin)?;
        settings.validate()?;
        self.image.apply_settings(slot, settings);
        Ok(())
    }

    pub fn set_clock_divider(&mut self, pin: u8, divider: ClockDivider) -> Result<(), ConfigError> {
        let slot = self.configured_slot(pin)?;
        self.image.set_clock_divider(slot, divider);
        Ok(())
    }

    pub fn set_gain(&mut self, pin: u8, gain: IcoGain) -> Result<(), ConfigError> {
        let slot = self.configured_slot(pin)?;
        self.image.set_gain(slot, gain);
        Ok(())
    }

    pub fn set_reference_current(&mut self, pin: u8, current: u8) -> Result<(), ConfigError> {
        let slot = self.configured_slot(pin)?;
        self.image.set_reference_current(slot, current);
        Ok(())
    }

    pub fn set_sensor_offset(&mut self, pin: u8, offset: u16) -> Result<(), ConfigError> {
        let slot = self.configured_slot(pin)?;
        let mut settings = self.image.settings(slot);
        settings.sensor_offset = offset;
        settings.validate()?;
        self.image.set_sensor_offset(slot, offset);
        Ok(())
    }

    pub fn set_measurement_count(&mut self, pin: u8, count: u8) -> Result<(), ConfigError> {
        let slot = self.configured_slot(pin)?;
        let mut settings = self.image.settings(slot);
        settings.measurement_count = count;
        settings.validate()?;
        self.image.set_measurement_count(slot, count);
        Ok(())
    }

    fn configured_slot(&self, pin: u8) -> Result<usize, ConfigError> {
        self.registry
            .slot_of(pin)
            .ok_or(ConfigError::NotConfigured(pin))
    }

    #[cfg(test)]
    pub(crate) fn image_mut(&mut self) -> &mut RegisterImage<MAX_CHANNELS> {
        &mut self.image
    }

    #[cfg(test)]
    pub(crate) fn image(&self) -> &RegisterImage<MAX_CHANNELS> {
        &self.image
    }
}

impl<C, M, E, T> Drop for TouchEngine<'_, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    fn drop(&mut self) {
        // The DTC must not keep writing into the image once it is gone
        self.stop();
    }
}

/// Attach `event` unless an earlier attempt already did.
fn attach_once<E: EventLink>(
    events: &mut E,
    slot: &mut Option<EventToken>,
    event: ScanEvent,
) -> Result<EventToken, ConfigError> {
    if let Some(token) = *slot {
        return Ok(token);
    }
    let token = events.attach(event)?;
    *slot = Some(token);
    Ok(token)
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::vec::Vec;

    use portable_atomic::AtomicUsize;

    use super::*;
    use crate::board::TouchPin;
    use crate::testing::{engine, Call, MockHardware};

    fn starts(hw: &MockHardware) -> usize {
        hw.count(|c| matches!(c, Call::SoftwareStart))
    }

    #[test]
    fn unsupported_pin_touches_nothing() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        assert_eq!(e.configure(4), Err(ConfigError::UnsupportedPin(4)));
        assert_eq!(e.configure(21), Err(ConfigError::UnsupportedPin(21)));
        assert!(hw.calls().is_empty());
        assert_eq!(e.channel_count(), 0);
    }

    #[test]
    fn first_configure_brings_the_peripheral_up() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();

        let calls = hw.calls();
        assert_eq!(calls[0], Call::Stop);
        assert_eq!(calls[1], Call::ConfigurePin(TouchPin::new(1, 5, 34)));
        assert_eq!(calls[2], Call::PowerOn);
        assert_eq!(calls[3], Call::Attach(ScanEvent::WriteRequest));
        assert_eq!(calls[4], Call::Attach(ScanEvent::ReadRequest));
        assert_eq!(calls[5], Call::Attach(ScanEvent::ScanEnd));
        assert!(matches!(calls[6], Call::ConfigureTransfer(t) if t.block_len == 3));
        assert!(matches!(calls[7], Call::ConfigureTransfer(t) if t.block_len == 2));
        assert_eq!(calls[8], Call::EnableTransfer(0));
        assert_eq!(calls[9], Call::EnableTransfer(1));
        assert_eq!(calls[10], Call::EnableChannel(4, 1 << 2));
        assert_eq!(calls.len(), 11);
        assert!(!flags.is_free_running());
    }

    #[test]
    fn later_configures_skip_bring_up() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        hw.clear();
        e.configure(3).unwrap();
        assert_eq!(
            hw.calls(),
            [
                Call::Stop,
                Call::ConfigurePin(TouchPin::new(1, 4, 13)),
                Call::EnableChannel(1, 1 << 5),
            ]
        );
        assert_eq!(hw.count(|c| matches!(c, Call::PowerOn)), 0);
    }

    #[test]
    fn duplicate_configure_is_a_no_op() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.configure(9).unwrap();
        e.start(true);
        hw.clear();

        assert_eq!(e.configure(2), Err(ConfigError::AlreadyConfigured { slot: 1 }));
        assert!(hw.calls().is_empty());
        assert_eq!(e.channel_count(), 2);
        assert!(flags.is_free_running());
    }

    #[test]
    fn pin_mux_failure_is_reported() {
        let hw = MockHardware::new();
        hw.refuse_pins();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        assert!(matches!(e.configure(2), Err(ConfigError::Pin(_))));
        assert_eq!(e.channel_count(), 0);
        assert_eq!(e.read(2), 0);
    }

    #[test]
    fn event_link_exhaustion_is_reported() {
        let hw = MockHardware::with_event_slots(2);
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        assert!(matches!(e.configure(2), Err(ConfigError::EventLink(_))));
        assert_eq!(e.channel_count(), 0);
    }

    #[test]
    fn failed_bring_up_resumes_on_retry() {
        let hw = MockHardware::with_event_slots(2);
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        assert!(matches!(e.configure(2), Err(ConfigError::EventLink(_))));
        assert!(matches!(e.configure(2), Err(ConfigError::EventLink(_))));
        assert_eq!(hw.count(|c| matches!(c, Call::PowerOn)), 1);
        assert_eq!(hw.count(|c| matches!(c, Call::Attach(_))), 2);

        // a freed slot lets the next attempt finish with only the missing link
        hw.add_event_slots(1);
        e.configure(2).unwrap();
        assert_eq!(hw.count(|c| matches!(c, Call::PowerOn)), 1);
        assert_eq!(
            hw.count(|c| matches!(c, Call::Attach(ScanEvent::WriteRequest))),
            1
        );
        assert_eq!(hw.count(|c| matches!(c, Call::Attach(ScanEvent::ScanEnd))), 1);
        assert_eq!(e.channel_count(), 1);

        hw.clear();
        e.on_event(ScanEvent::ScanEnd);
        assert_eq!(hw.calls()[0], Call::Acknowledge(EventToken(2)));
    }

    #[test]
    fn dropping_the_engine_stops_the_scan() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.start(true);
        hw.clear();

        drop(e);
        assert_eq!(hw.calls(), [Call::Stop]);
        assert!(!flags.is_free_running());
    }

    #[test]
    fn start_rearms_transfers_with_channel_count() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        for pin in [2, 3, 8, 9] {
            e.configure(pin).unwrap();
        }
        hw.clear();
        e.start(false);

        let calls = hw.calls();
        let src = e.image().write_source();
        assert_eq!(
            calls[0],
            Call::ResetTransfer { handle: 0, src, dst: hw.write_window(), count: 4 }
        );
        assert!(matches!(
            calls[1],
            Call::ResetTransfer { handle: 1, src, count: 4, .. } if src == hw.read_window()
        ));
        assert_eq!(calls[2], Call::SoftwareStart);
        assert!(!flags.is_scan_done());
        assert!(!e.ready());
    }

    #[test]
    fn start_with_no_channels_arms_nothing() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Wifi);
        e.start(false);
        assert!(hw.calls().is_empty());
        assert!(e.ready());
    }

    #[test]
    fn start_during_a_pass_is_deferred() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.start(false);
        hw.set_busy(true);
        hw.clear();

        e.start(true);
        assert_eq!(starts(&hw), 0);
        assert!(flags.is_free_running());

        // the deferred pass rolls over on its own completion
        e.on_event(ScanEvent::ScanEnd);
        assert_eq!(starts(&hw), 1);
    }

    #[test]
    fn start_after_stop_begins_when_idle() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.start(true);
        e.stop();
        assert!(!flags.is_scan_done());
        hw.clear();

        e.start(false);
        assert_eq!(starts(&hw), 1);
    }

    #[test]
    fn single_shot_completes_once() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.start(false);
        hw.clear();

        e.on_event(ScanEvent::WriteRequest);
        e.on_event(ScanEvent::ReadRequest);
        assert!(!e.ready());
        e.on_event(ScanEvent::ScanEnd);

        assert!(e.ready());
        assert_eq!(e.completed_passes(), 1);
        assert_eq!(starts(&hw), 0);
        assert_eq!(hw.count(|c| matches!(c, Call::Acknowledge(_))), 3);
    }

    #[test]
    fn free_running_restarts_after_every_pass() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.configure(3).unwrap();
        e.start(true);
        assert!(e.ready());
        for _ in 0..5 {
            e.on_event(ScanEvent::ScanEnd);
            assert!(e.ready());
        }
        assert_eq!(starts(&hw), 6);
        assert_eq!(e.completed_passes(), 5);
        // every restart re-arms both phases for two channels
        assert_eq!(
            hw.count(|c| matches!(c, Call::ResetTransfer { count: 2, .. })),
            12
        );
    }

    #[test]
    fn stop_start_leaves_registry_alone() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Wifi);
        for pin in [3, 2, 8, 9, 15, 16] {
            e.configure(pin).unwrap();
        }
        let ids: Vec<u8> = e.hardware_ids().collect();
        let slots: Vec<Option<usize>> = (0..21).map(|p| e.slot_of(p)).collect();

        e.start(true);
        e.stop();
        e.start(false);
        e.stop();

        assert_eq!(e.channel_count(), 6);
        assert_eq!(e.hardware_ids().collect::<Vec<_>>(), ids);
        assert_eq!((0..21).map(|p| e.slot_of(p)).collect::<Vec<_>>(), slots);
        assert_eq!(ids, [2, 11, 13, 21, 22, 34]);
    }

    #[test]
    fn each_event_is_acknowledged_on_its_own_link() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        hw.clear();
        for event in ScanEvent::ALL {
            e.on_event(event);
        }
        let acks: Vec<EventToken> = hw
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Acknowledge(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(acks, [EventToken(0), EventToken(1), EventToken(2)]);
    }

    #[test]
    fn events_before_bring_up_are_ignored() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        flags.scan_done.store(false, Ordering::Release);
        e.on_event(ScanEvent::ScanEnd);
        assert!(hw.calls().is_empty());
        assert_eq!(e.completed_passes(), 0);
        assert!(!flags.is_scan_done());
    }

    #[test]
    fn callback_runs_on_every_pass() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        fn on_scan() {
            CALLS.fetch_add(1, Ordering::Relaxed);
        }

        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.attach_callback(on_scan);
        e.start(true);
        e.on_event(ScanEvent::ScanEnd);
        e.on_event(ScanEvent::ScanEnd);
        assert_eq!(CALLS.load(Ordering::Relaxed), 2);

        e.detach_callback();
        e.on_event(ScanEvent::ScanEnd);
        assert_eq!(CALLS.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn notifier_carries_pass_count() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let signal = ScanSignal::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        e.attach_notifier(&signal);
        e.start(false);
        e.on_event(ScanEvent::ScanEnd);
        assert_eq!(embassy_futures::block_on(signal.wait()), 1);

        e.start(false);
        e.on_event(ScanEvent::ScanEnd);
        assert_eq!(signal.try_take(), Some(2));
    }

    #[test]
    fn reads_follow_their_pin_across_insertions() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap(); // TS34
        e.configure(3).unwrap(); // TS13
        let s2 = e.slot_of(2).unwrap();
        let s3 = e.slot_of(3).unwrap();
        e.image_mut().store_result(s2, 1500, 900);
        e.image_mut().store_result(s3, 1300, 800);

        e.configure(9).unwrap(); // TS2 goes in front of both
        assert_eq!(e.hardware_ids().collect::<Vec<_>>(), [2, 13, 34]);
        assert_eq!(e.read(2), 1500);
        assert_eq!(e.read_reference(2), 900);
        assert_eq!(e.read(3), 1300);
        assert_eq!(e.read(9), 0);
        assert_eq!(e.read(4), 0);
        assert_eq!(e.read_reference(4), 0);
    }

    #[test]
    fn settings_require_a_configured_pin() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        assert_eq!(e.get_channel_settings(2), None);
        assert_eq!(
            e.apply_channel_settings(2, &ChannelSettings::default()),
            Err(ConfigError::NotConfigured(2))
        );
        assert_eq!(e.set_gain(2, IcoGain::Percent50), Err(ConfigError::NotConfigured(2)));

        e.configure(2).unwrap();
        assert_eq!(e.get_channel_settings(2), Some(ChannelSettings::default()));
    }

    #[test]
    fn invalid_settings_change_nothing() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        let before = e.image().write_words(0);

        let mut s = ChannelSettings::default();
        s.sensor_offset = 1024;
        assert_eq!(e.apply_channel_settings(2, &s), Err(ConfigError::InvalidSetting));
        s.sensor_offset = 0;
        s.measurement_count = 0;
        assert_eq!(e.apply_channel_settings(2, &s), Err(ConfigError::InvalidSetting));
        assert_eq!(e.set_sensor_offset(2, 2000), Err(ConfigError::InvalidSetting));
        assert_eq!(e.set_measurement_count(2, 65), Err(ConfigError::InvalidSetting));
        assert_eq!(e.image().write_words(0), before);
    }

    #[test]
    fn settings_round_trip_through_the_engine() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Wifi);
        e.configure(11).unwrap();
        let s = ChannelSettings {
            clock_divider: ClockDivider::Div6,
            gain: IcoGain::Percent66,
            reference_current: 40,
            sensor_offset: 700,
            measurement_count: 8,
        };
        e.apply_channel_settings(11, &s).unwrap();
        assert_eq!(e.get_channel_settings(11), Some(s));

        e.set_clock_divider(11, ClockDivider::Div64).unwrap();
        e.set_reference_current(11, 3).unwrap();
        let got = e.get_channel_settings(11).unwrap();
        assert_eq!(got.clock_divider, ClockDivider::Div64);
        assert_eq!(got.reference_current, 3);
        assert_eq!(got.sensor_offset, 700);
        // 24000 / 31 = 774 kHz
        assert_eq!(e.image().write_words(0)[0], 5 << 8);
    }

    #[test]
    fn reapplying_current_settings_keeps_the_image() {
        let hw = MockHardware::new();
        let flags = ScanFlags::new();
        let mut e = engine(&hw, &flags, Board::Minima);
        e.configure(2).unwrap();
        let before = e.image().write_words(0);

        let current = e.get_channel_settings(2).unwrap();
        e.apply_channel_settings(2, &current).unwrap();
        assert_eq!(e.image().write_words(0), before);

        e.set_clock_divider(2, current.clock_divider).unwrap();
        assert_eq!(e.image().write_words(0), before);
    }
}
