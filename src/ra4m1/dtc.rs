//! Data transfer controller
//!
//! Full-address mode: each trigger's vector entry points at a four-word
//! transfer-information record, and the DTC writes the record back as it
//! runs. Records are therefore rewritten in full before every pass.

use core::ptr::addr_of_mut;
use core::sync::atomic::{compiler_fence, Ordering};

use super::icu::{ielsr, IELSR_DTCE};
use super::{modify32, write16, write32, write8};
use crate::hal::TransferEngine;
use crate::transfer::TransferConfig;

const DTC_BASE: usize = 0x4000_5400;
const DTCCR: usize = DTC_BASE;
const DTCVBR: usize = DTC_BASE + 0x04;
const DTCST: usize = DTC_BASE + 0x0C;

const DTCST_START: u8 = 0x01;

// Module stop control register A, MSTPA22 = DMAC/DTC, behind PRCR.PRC1
const MSTPCRA: usize = 0x4001_E01C;
const MSTPCRA_DTC: u32 = 1 << 22;
const PRCR: usize = 0x4001_E3FE;
const PRCR_UNLOCK_PRC1: u16 = 0xA502;
const PRCR_LOCK: u16 = 0xA500;

const VECTOR_COUNT: usize = 32;
const MAX_TRANSFERS: usize = 4;

#[repr(C, align(1024))]
struct VectorTable([u32; VECTOR_COUNT]);

#[repr(C)]
#[derive(Clone, Copy)]
struct TransferInfo {
    settings: u32,
    src: u32,
    dst: u32,
    counts: u32,
}

impl TransferInfo {
    const EMPTY: Self = Self {
        settings: 0,
        src: 0,
        dst: 0,
        counts: 0,
    };
}

// DTC-owned memory; only written through raw pointers
static mut VECTORS: VectorTable = VectorTable([0; VECTOR_COUNT]);
static mut RECORDS: [TransferInfo; MAX_TRANSFERS] = [TransferInfo::EMPTY; MAX_TRANSFERS];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DtcHandle {
    record: u8,
    irq: u8,
}

pub struct Dtc {
    configs: [Option<TransferConfig>; MAX_TRANSFERS],
    running: bool,
}

impl Dtc {
    pub const fn new() -> Self {
        Self {
            configs: [None; MAX_TRANSFERS],
            running: false,
        }
    }

    fn power_up(&mut self) {
        let base = unsafe { addr_of_mut!(VECTORS) } as u32;
        unsafe {
            write16(PRCR, PRCR_UNLOCK_PRC1);
            modify32(MSTPCRA, |v| v & !MSTPCRA_DTC);
            write16(PRCR, PRCR_LOCK);

            write8(DTCST, 0);
            write8(DTCCR, 0);
            write32(DTCVBR, base);
        }
        self.running = true;
        debug!("dtc: vector table at {=u32:#x}", base);
    }

    fn store(&mut self, record: u8, config: &TransferConfig) {
        unsafe {
            let info = addr_of_mut!(RECORDS[record as usize]);
            write32(addr_of_mut!((*info).settings) as usize, config.settings_word());
            write32(addr_of_mut!((*info).src) as usize, config.src as u32);
            write32(addr_of_mut!((*info).dst) as usize, config.dst as u32);
            write32(addr_of_mut!((*info).counts) as usize, config.count_word());
        }
        self.configs[record as usize] = Some(*config);
    }
}

impl Default for Dtc {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferEngine for Dtc {
    type Handle = DtcHandle;

    fn configure(&mut self, config: &TransferConfig) -> DtcHandle {
        if !self.running {
            self.power_up();
        }
        // Past capacity the last record is reused
        let record = self
            .configs
            .iter()
            .position(Option::is_none)
            .unwrap_or(MAX_TRANSFERS - 1) as u8;
        let irq = config.trigger.irq();

        self.store(record, config);
        unsafe {
            let info = addr_of_mut!(RECORDS[record as usize]) as u32;
            let vector = addr_of_mut!(VECTORS.0[irq as usize % VECTOR_COUNT]);
            write32(vector as usize, info);
        }
        debug!(
            "dtc: record {} on IRQ {}, {} bytes per pass",
            record,
            irq,
            config.total_bytes()
        );
        DtcHandle { record, irq }
    }

    fn reset(&mut self, handle: DtcHandle, src: usize, dst: usize, count: u16) {
        let Some(config) = self.configs[handle.record as usize] else {
            return;
        };
        self.store(handle.record, &config.reissued(src, dst, count));
        compiler_fence(Ordering::SeqCst);
        unsafe { modify32(ielsr(handle.irq), |v| v | IELSR_DTCE) }
    }

    fn enable(&mut self, handle: DtcHandle) {
        unsafe {
            modify32(ielsr(handle.irq), |v| v | IELSR_DTCE);
            write8(DTCST, DTCST_START);
        }
    }
}
