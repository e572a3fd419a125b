//! Per-pin touch sensor
//!
//! Wraps a pin and a caller-chosen threshold. Picking the threshold is left
//! to the application; the raw counts depend on the pad, the board and the
//! channel settings.

use crate::error::ConfigError;
use crate::hal::{CtsuPeripheral, EventLink, PinMux, TransferEngine};
use crate::sequencer::{ScanCallback, TouchEngine};
use crate::shared::SharedEngine;
use crate::types::{ChannelSettings, ClockDivider, IcoGain};

/// What a sensor needs from the scan engine.
pub trait TouchReader {
    fn configure(&mut self, pin: u8) -> Result<(), ConfigError>;
    fn read(&self, pin: u8) -> u16;
    fn read_reference(&self, pin: u8) -> u16;
    fn channel_settings(&self, pin: u8) -> Result<ChannelSettings, ConfigError>;
    fn apply_channel_settings(
        &mut self,
        pin: u8,
        settings: &ChannelSettings,
    ) -> Result<(), ConfigError>;
    fn start(&mut self, free_running: bool);
    fn stop(&mut self);
    fn ready(&self) -> bool;
    fn attach_callback(&mut self, callback: ScanCallback);
}

impl<C, M, E, T> TouchReader for TouchEngine<'_, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    fn configure(&mut self, pin: u8) -> Result<(), ConfigError> {
        TouchEngine::configure(self, pin)
    }

    fn read(&self, pin: u8) -> u16 {
        TouchEngine::read(self, pin)
    }

    fn read_reference(&self, pin: u8) -> u16 {
        TouchEngine::read_reference(self, pin)
    }

    fn channel_settings(&self, pin: u8) -> Result<ChannelSettings, ConfigError> {
        self.get_channel_settings(pin)
            .ok_or(ConfigError::NotConfigured(pin))
    }

    fn apply_channel_settings(
        &mut self,
        pin: u8,
        settings: &ChannelSettings,
    ) -> Result<(), ConfigError> {
        TouchEngine::apply_channel_settings(self, pin, settings)
    }

    fn start(&mut self, free_running: bool) {
        TouchEngine::start(self, free_running)
    }

    fn stop(&mut self) {
        TouchEngine::stop(self)
    }

    fn ready(&self) -> bool {
        TouchEngine::ready(self)
    }

    fn attach_callback(&mut self, callback: ScanCallback) {
        TouchEngine::attach_callback(self, callback)
    }
}

/// Calls without an installed engine fail with [`ConfigError::NoEngine`]
/// or do nothing.
impl<C, M, E, T> TouchReader for &SharedEngine<'_, C, M, E, T>
where
    C: CtsuPeripheral,
    M: PinMux,
    E: EventLink,
    T: TransferEngine,
{
    fn configure(&mut self, pin: u8) -> Result<(), ConfigError> {
        SharedEngine::configure(self, pin)
    }

    fn read(&self, pin: u8) -> u16 {
        SharedEngine::read(self, pin)
    }

    fn read_reference(&self, pin: u8) -> u16 {
        SharedEngine::read_reference(self, pin)
    }

    fn channel_settings(&self, pin: u8) -> Result<ChannelSettings, ConfigError> {
        self.with(|engine| engine.channel_settings(pin))
            .unwrap_or(Err(ConfigError::NoEngine))
    }

    fn apply_channel_settings(
        &mut self,
        pin: u8,
        settings: &ChannelSettings,
    ) -> Result<(), ConfigError> {
        self.with(|engine| engine.apply_channel_settings(pin, settings))
            .unwrap_or(Err(ConfigError::NoEngine))
    }

    fn start(&mut self, free_running: bool) {
        SharedEngine::start(self, free_running)
    }

    fn stop(&mut self) {
        SharedEngine::stop(self)
    }

    fn ready(&self) -> bool {
        SharedEngine::ready(self)
    }

    fn attach_callback(&mut self, callback: ScanCallback) {
        self.with(|engine| engine.attach_callback(callback));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchSensor {
    pin: u8,
    threshold: u16,
}

impl TouchSensor {
    pub const fn new(pin: u8, threshold: u16) -> Self {
        Self { pin, threshold }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u16) {
        self.threshold = threshold;
    }

    /// Register the pin with the engine. A pin that is already scanning
    /// counts as success.
    pub fn begin(&self, engine: &mut impl TouchReader) -> Result<(), ConfigError> {
        match engine.configure(self.pin) {
            Ok(()) | Err(ConfigError::AlreadyConfigured { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn read_raw(&self, engine: &impl TouchReader) -> u16 {
        engine.read(self.pin)
    }

    pub fn read_reference(&self, engine: &impl TouchReader) -> u16 {
        engine.read_reference(self.pin)
    }

    pub fn is_touched(&self, engine: &impl TouchReader) -> bool {
        self.read_raw(engine) > self.threshold
    }

    pub fn settings(&self, engine: &impl TouchReader) -> Result<ChannelSettings, ConfigError> {
        engine.channel_settings(self.pin)
    }

    pub fn apply_settings(
        &self,
        engine: &mut impl TouchReader,
        settings: &ChannelSettings,
    ) -> Result<(), ConfigError> {
        engine.apply_channel_settings(self.pin, settings)
    }

    pub fn set_clock_divider(
        &self,
        engine: &mut impl TouchReader,
        divider: ClockDivider,
    ) -> Result<(), ConfigError> {
        self.update_settings(engine, |s| s.clock_divider = divider)
    }

    pub fn set_gain(&self, engine: &mut impl TouchReader, gain: IcoGain) -> Result<(), ConfigError> {
        self.update_settings(engine, |s| s.gain = gain)
    }

    pub fn set_reference_current(
        &self,
        engine: &mut impl TouchReader,
        current: u8,
    ) -> Result<(), ConfigError> {
        self.update_settings(engine, |s| s.reference_current = current)
    }

    pub fn set_sensor_offset(
        &self,
        engine: &mut impl TouchReader,
        offset: u16,
    ) -> Result<(), ConfigError> {
        self.update_settings(engine, |s| s.sensor_offset = offset)
    }

    pub fn set_measurement_count(
        &self,
        engine: &mut impl TouchReader,
        count: u8,
    ) -> Result<(), ConfigError> {
        self.update_settings(engine, |s| s.measurement_count = count)
    }

    fn update_settings(
        &self,
        engine: &mut impl TouchReader,
        change: impl FnOnce(&mut ChannelSettings),
    ) -> Result<(), ConfigError> {
        let mut settings = engine.channel_settings(self.pin)?;
        change(&mut settings);
        engine.apply_channel_settings(self.pin, &settings)
    }

    /// Start free-running scans of every configured pin.
    pub fn start(&self, engine: &mut impl TouchReader) {
        engine.start(true);
    }

    pub fn stop(&self, engine: &mut impl TouchReader) {
        engine.stop();
    }

    /// Run one pass and wait for it.
    ///
    /// The end-of-scan interrupt has to reach the engine while this spins,
    /// so pass a [`SharedEngine`] reference rather than a bare engine.
    pub fn start_single(&self, engine: &mut impl TouchReader) {
        engine.start(false);
        while !engine.ready() {
            core::hint::spin_loop();
        }
    }

    pub fn attach_callback(&self, engine: &mut impl TouchReader, callback: ScanCallback) {
        engine.attach_callback(callback);
    }
}
