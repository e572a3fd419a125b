//! Transfer channel abstraction
//!
//! Describes the two bulk transfers of a multi-scan pass:
//! - write phase: on each CTSUWR, 3 half-words from the slot's write image
//!   into CTSUSSC..CTSUSO1
//! - read phase: on each CTSURD, 2 half-words from CTSUSC..CTSURC into the
//!   slot's result image
//!
//! Both run in block mode with one block per configured channel, so the
//! block count must be re-issued whenever the channel count changes.

use crate::config::{RESULT_WORDS_PER_SLOT, WRITE_WORDS_PER_SLOT};
use crate::hal::EventToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    Fixed = 0,
    Offset = 1,
    Increment = 2,
    Decrement = 3,
}

/// Which side returns to its start address after every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RepeatArea {
    Destination = 0,
    Source = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqMode {
    /// Interrupt the CPU once the whole transfer has finished
    End = 0,
    /// Interrupt the CPU after every unit
    Each = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainMode {
    Disabled = 0,
    Each = 2,
    End = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferSize {
    Byte = 0,
    HalfWord = 1,
    Word = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferMode {
    Normal = 0,
    Repeat = 1,
    Block = 2,
    RepeatBlock = 3,
}

// Settings word bit positions (DTC MRB in bits 15:8, MRA in bits 23:16)
const DEST_ADDR_MODE_SHIFT: u32 = 10;
const REPEAT_AREA_SHIFT: u32 = 12;
const IRQ_SHIFT: u32 = 13;
const CHAIN_SHIFT: u32 = 14;
const SRC_ADDR_MODE_SHIFT: u32 = 18;
const SIZE_SHIFT: u32 = 20;
const MODE_SHIFT: u32 = 22;

/// One transfer, bound to the event that triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    pub trigger: EventToken,
    pub mode: TransferMode,
    pub size: TransferSize,
    pub src_mode: AddressMode,
    pub dst_mode: AddressMode,
    pub repeat_area: RepeatArea,
    pub irq: IrqMode,
    pub chain: ChainMode,
    /// Units per block (block and repeat modes) or total units (normal mode)
    pub block_len: u8,
    /// Number of blocks
    pub count: u16,
    pub src: usize,
    pub dst: usize,
}

impl TransferConfig {
    /// Write image -> CTSUSSC..CTSUSO1, one block per channel.
    pub fn write_phase(trigger: EventToken, image: usize, window: usize, count: u16) -> Self {
        Self {
            trigger,
            mode: TransferMode::Block,
            size: TransferSize::HalfWord,
            src_mode: AddressMode::Increment,
            dst_mode: AddressMode::Increment,
            repeat_area: RepeatArea::Destination,
            irq: IrqMode::End,
            chain: ChainMode::Disabled,
            block_len: WRITE_WORDS_PER_SLOT as u8,
            count,
            src: image,
            dst: window,
        }
    }

    /// CTSUSC..CTSURC -> result image, one block per channel.
    pub fn read_phase(trigger: EventToken, window: usize, results: usize, count: u16) -> Self {
        Self {
            trigger,
            mode: TransferMode::Block,
            size: TransferSize::HalfWord,
            src_mode: AddressMode::Increment,
            dst_mode: AddressMode::Increment,
            repeat_area: RepeatArea::Source,
            irq: IrqMode::End,
            chain: ChainMode::Disabled,
            block_len: RESULT_WORDS_PER_SLOT as u8,
            count,
            src: window,
            dst: results,
        }
    }

    /// Same transfer with fresh addresses and block count.
    pub fn reissued(mut self, src: usize, dst: usize, count: u16) -> Self {
        self.src = src;
        self.dst = dst;
        self.count = count;
        self
    }

    /// First word of the transfer-information record (MRA/MRB).
    pub fn settings_word(&self) -> u32 {
        (self.dst_mode as u32) << DEST_ADDR_MODE_SHIFT
            | (self.repeat_area as u32) << REPEAT_AREA_SHIFT
            | (self.irq as u32) << IRQ_SHIFT
            | (self.chain as u32) << CHAIN_SHIFT
            | (self.src_mode as u32) << SRC_ADDR_MODE_SHIFT
            | (self.size as u32) << SIZE_SHIFT
            | (self.mode as u32) << MODE_SHIFT
    }

    /// Last word of the record: CRA in the high half, CRB in the low half.
    ///
    /// In block and repeat modes CRA holds the block length in both bytes,
    /// the high byte being the reload value.
    pub fn count_word(&self) -> u32 {
        let len = self.block_len as u32;
        let (cra, crb) = match self.mode {
            TransferMode::Normal => (self.count as u32, 0),
            _ => ((len << 8) | len, self.count as u32),
        };
        (cra << 16) | crb
    }

    /// Bytes moved by the whole transfer.
    pub fn total_bytes(&self) -> usize {
        let unit = 1usize << (self.size as usize);
        match self.mode {
            TransferMode::Normal => unit * self.count as usize,
            _ => unit * self.block_len as usize * self.count as usize,
        }
    }
}
