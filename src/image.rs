//! Register image store
//!
//! Per-slot copies of the three CTSU control words loaded at each write
//! request, and the two counters drained at each read request. Both arrays
//! are the memory the transfer engine walks, so slot order must match the
//! hardware scan order (ascending TS number).

use core::ptr;

use crate::config::{
    DEFAULT_SO0, DEFAULT_SO1, DEFAULT_SSC, RESULT_WORDS_PER_SLOT, SO0_COUNT_MASK,
    SO0_COUNT_SHIFT, SO0_OFFSET_MASK, SO1_ICOG_MASK, SO1_ICOG_SHIFT, SO1_RICOA_MASK,
    SO1_SDPA_MASK, SO1_SDPA_SHIFT, SSC_SSDIV_SHIFT, WRITE_WORDS_PER_SLOT,
};
use crate::types::{ChannelSettings, ClockDivider, IcoGain};

const SSC: usize = 0;
const SO0: usize = 1;
const SO1: usize = 2;

const COUNT: usize = 0;
const REFERENCE: usize = 1;

const DEFAULT_WRITE_IMAGE: [u16; WRITE_WORDS_PER_SLOT] = [DEFAULT_SSC, DEFAULT_SO0, DEFAULT_SO1];

#[repr(C)]
pub struct RegisterImage<const N: usize> {
    write: [[u16; WRITE_WORDS_PER_SLOT]; N],
    results: [[u16; RESULT_WORDS_PER_SLOT]; N],
}

impl<const N: usize> RegisterImage<N> {
    pub const fn new() -> Self {
        Self {
            write: [[0; WRITE_WORDS_PER_SLOT]; N],
            results: [[0; RESULT_WORDS_PER_SLOT]; N],
        }
    }

    /// Open a slot at `slot` in a store currently holding `len` slots.
    ///
    /// Slots `slot..len` move one position up, carrying both their write
    /// words and their last results. The opened slot gets the default
    /// write image and zeroed results.
    pub fn insert_slot(&mut self, slot: usize, len: usize) {
        debug_assert!(slot <= len && len < N);
        self.write.copy_within(slot..len, slot + 1);
        self.results.copy_within(slot..len, slot + 1);
        self.write[slot] = DEFAULT_WRITE_IMAGE;
        self.results[slot] = [0; RESULT_WORDS_PER_SLOT];
    }

    pub fn write_words(&self, slot: usize) -> [u16; WRITE_WORDS_PER_SLOT] {
        self.write[slot]
    }

    /// Latest measurement count. The transfer engine writes this behind
    /// the compiler's back, hence the volatile load.
    pub fn measurement(&self, slot: usize) -> u16 {
        unsafe { ptr::read_volatile(&self.results[slot][COUNT]) }
    }

    /// Latest reference count.
    pub fn reference(&self, slot: usize) -> u16 {
        unsafe { ptr::read_volatile(&self.results[slot][REFERENCE]) }
    }

    /// Start of the write image, the write-phase transfer source.
    pub fn write_source(&self) -> usize {
        self.write.as_ptr() as usize
    }

    /// Start of the result image, the read-phase transfer destination.
    pub fn result_destination(&mut self) -> usize {
        self.results.as_mut_ptr() as usize
    }

    pub fn settings(&self, slot: usize) -> ChannelSettings {
        let so0 = self.write[slot][SO0];
        let so1 = self.write[slot][SO1];
        ChannelSettings {
            clock_divider: ClockDivider::from_bits(((so1 & SO1_SDPA_MASK) >> SO1_SDPA_SHIFT) as u8),
            gain: IcoGain::from_bits(((so1 & SO1_ICOG_MASK) >> SO1_ICOG_SHIFT) as u8),
            reference_current: (so1 & SO1_RICOA_MASK) as u8,
            sensor_offset: so0 & SO0_OFFSET_MASK,
            measurement_count: ((so0 & SO0_COUNT_MASK) >> SO0_COUNT_SHIFT) as u8 + 1,
        }
    }

    /// Caller validates `settings` first.
    pub fn apply_settings(&mut self, slot: usize, settings: &ChannelSettings) {
        self.set_clock_divider(slot, settings.clock_divider);
        self.set_gain(slot, settings.gain);
        self.set_reference_current(slot, settings.reference_current);
        self.set_sensor_offset(slot, settings.sensor_offset);
        self.set_measurement_count(slot, settings.measurement_count);
    }

    /// Sets the drive divider and the spread-spectrum word that goes with it.
    pub fn set_clock_divider(&mut self, slot: usize, divider: ClockDivider) {
        let words = &mut self.write[slot];
        words[SSC] = divider.spread_spectrum() << SSC_SSDIV_SHIFT;
        words[SO1] = (words[SO1] & !SO1_SDPA_MASK) | ((divider.bits() as u16) << SO1_SDPA_SHIFT);
    }

    pub fn set_gain(&mut self, slot: usize, gain: IcoGain) {
        let words = &mut self.write[slot];
        words[SO1] = (words[SO1] & !SO1_ICOG_MASK) | ((gain.bits() as u16) << SO1_ICOG_SHIFT);
    }

    pub fn set_reference_current(&mut self, slot: usize, current: u8) {
        let words = &mut self.write[slot];
        words[SO1] = (words[SO1] & !SO1_RICOA_MASK) | current as u16;
    }

    pub fn set_sensor_offset(&mut self, slot: usize, offset: u16) {
        let words = &mut self.write[slot];
        words[SO0] = (words[SO0] & !SO0_OFFSET_MASK) | (offset & SO0_OFFSET_MASK);
    }

    /// `count` is 1..=64; the register holds `count - 1`.
    pub fn set_measurement_count(&mut self, slot: usize, count: u8) {
        let words = &mut self.write[slot];
        let field = ((count.saturating_sub(1) as u16) << SO0_COUNT_SHIFT) & SO0_COUNT_MASK;
        words[SO0] = (words[SO0] & !SO0_COUNT_MASK) | field;
    }

    #[cfg(test)]
    pub(crate) fn store_result(&mut self, slot: usize, count: u16, reference: u16) {
        self.results[slot] = [count, reference];
    }
}

impl<const N: usize> Default for RegisterImage<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(len: usize) -> RegisterImage<6> {
        let mut image = RegisterImage::<6>::new();
        for slot in 0..len {
            image.insert_slot(slot, slot);
            image.set_reference_current(slot, slot as u8 + 1);
            image.store_result(slot, 100 + slot as u16, 200 + slot as u16);
        }
        image
    }

    #[test]
    fn fresh_slot_has_default_words() {
        let mut image = RegisterImage::<4>::new();
        image.insert_slot(0, 0);
        assert_eq!(image.write_words(0), [0x0200, 0x0000, 0x0F00]);
        assert_eq!(image.settings(0), ChannelSettings::default());
        assert_eq!(image.measurement(0), 0);
    }

    #[test]
    fn insert_shifts_words_and_results_together() {
        let mut image = seeded(3);
        image.insert_slot(1, 3);

        assert_eq!(image.settings(0).reference_current, 1);
        assert_eq!(image.write_words(1), DEFAULT_WRITE_IMAGE);
        assert_eq!(image.measurement(1), 0);
        assert_eq!(image.settings(2).reference_current, 2);
        assert_eq!(image.measurement(2), 101);
        assert_eq!(image.reference(2), 201);
        assert_eq!(image.settings(3).reference_current, 3);
        assert_eq!(image.measurement(3), 102);
    }

    #[test]
    fn insert_at_end_moves_nothing() {
        let mut image = seeded(2);
        image.insert_slot(2, 2);
        assert_eq!(image.settings(0).reference_current, 1);
        assert_eq!(image.settings(1).reference_current, 2);
        assert_eq!(image.write_words(2), DEFAULT_WRITE_IMAGE);
    }

    #[test]
    fn settings_round_trip_over_full_ranges() {
        let mut image = RegisterImage::<1>::new();
        image.insert_slot(0, 0);
        for div in 0..32u8 {
            for gain in 0..4u8 {
                for &(current, offset, count) in
                    &[(0u8, 0u16, 1u8), (255, 1023, 64), (128, 512, 33), (7, 1, 2)]
                {
                    let s = ChannelSettings {
                        clock_divider: ClockDivider::from_bits(div),
                        gain: IcoGain::from_bits(gain),
                        reference_current: current,
                        sensor_offset: offset,
                        measurement_count: count,
                    };
                    image.apply_settings(0, &s);
                    assert_eq!(image.settings(0), s);
                }
            }
        }
    }

    #[test]
    fn register_encoding_matches_field_layout() {
        let mut image = RegisterImage::<1>::new();
        image.insert_slot(0, 0);
        image.apply_settings(
            0,
            &ChannelSettings {
                clock_divider: ClockDivider::Div16,
                gain: IcoGain::Percent50,
                reference_current: 0x5A,
                sensor_offset: 0x155,
                measurement_count: 4,
            },
        );
        let [ssc, so0, so1] = image.write_words(0);
        assert_eq!(ssc, 1 << 8);
        assert_eq!(so0, (3 << 10) | 0x155);
        assert_eq!(so1, (2 << 13) | (7 << 8) | 0x5A);
    }

    #[test]
    fn single_field_setters_leave_neighbours_alone() {
        let mut image = RegisterImage::<1>::new();
        image.insert_slot(0, 0);
        image.set_sensor_offset(0, 300);
        image.set_measurement_count(0, 10);
        image.set_gain(0, IcoGain::Percent40);
        let s = image.settings(0);
        assert_eq!(s.sensor_offset, 300);
        assert_eq!(s.measurement_count, 10);
        assert_eq!(s.gain, IcoGain::Percent40);
        assert_eq!(s.clock_divider, ClockDivider::Div32);
        assert_eq!(s.reference_current, 0);
    }
}
