//! Channel registry
//!
//! Keeps the configured channels in ascending TS-number order, which is the
//! order the CTSU visits them in multi-scan mode, and maps Arduino pins to
//! their slot in that order.

use heapless::Vec;

use crate::board::ChannelInfo;
use crate::config::NUM_BOARD_PINS;
use crate::error::ConfigError;
use crate::image::RegisterImage;

/// A configured channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    pub pin: u8,
    pub info: ChannelInfo,
}

pub struct ChannelRegistry<const N: usize> {
    channels: Vec<Channel, N>,
    slots: [Option<u8>; NUM_BOARD_PINS],
}

impl<const N: usize> ChannelRegistry<N> {
    pub const fn new() -> Self {
        Self {
            channels: Vec::new(),
            slots: [None; NUM_BOARD_PINS],
        }
    }

    /// Number of configured channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Configured channels in slot order.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn hardware_ids(&self) -> impl Iterator<Item = u8> + '_ {
        self.channels.iter().map(|c| c.info.hardware_id)
    }

    pub fn slot_of(&self, pin: u8) -> Option<usize> {
        self.slots.get(pin as usize).copied().flatten().map(usize::from)
    }

    /// Check that `pin` could be registered, without touching anything.
    pub fn check(&self, pin: u8) -> Result<(), ConfigError> {
        if pin as usize >= NUM_BOARD_PINS {
            return Err(ConfigError::UnsupportedPin(pin));
        }
        if let Some(slot) = self.slot_of(pin) {
            return Err(ConfigError::AlreadyConfigured { slot });
        }
        if self.channels.is_full() {
            return Err(ConfigError::CapacityExceeded);
        }
        Ok(())
    }

    /// Insert a channel at its sorted position and return its slot.
    ///
    /// Channels with a higher TS number move up one slot, together with
    /// their register image, and every pin mapped at or above the new slot
    /// is renumbered.
    pub fn register(
        &mut self,
        pin: u8,
        info: ChannelInfo,
        image: &mut RegisterImage<N>,
    ) -> Result<usize, ConfigError> {
        self.check(pin)?;
        debug_assert!(self.hardware_ids().all(|id| id != info.hardware_id));

        let len = self.channels.len();
        // Walk down from the top slot to the first smaller TS number
        let slot = self
            .channels
            .iter()
            .rposition(|c| c.info.hardware_id < info.hardware_id)
            .map_or(0, |i| i + 1);

        self.channels
            .insert(slot, Channel { pin, info })
            .map_err(|_| ConfigError::CapacityExceeded)?;
        image.insert_slot(slot, len);

        for mapped in self.slots.iter_mut().flatten() {
            if *mapped as usize >= slot {
                *mapped += 1;
            }
        }
        self.slots[pin as usize] = Some(slot as u8);

        Ok(slot)
    }
}

impl<const N: usize> Default for ChannelRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
