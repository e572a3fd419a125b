//! CTSU register block

use embedded_hal::delay::DelayNs;

use super::pfs::{Pfs, PFS_PDR, TSCAP_PIN, TSCAP_PORT};
use super::{modify32, modify8, read8, write16, write8};
use crate::config::{CTSUCR0_INIT, CTSUCR0_START, DEFAULT_SO1};
use crate::hal::CtsuPeripheral;

const CTSU_BASE: usize = 0x4008_1000;
const CTSUCR0: usize = CTSU_BASE;
const CTSUCR1: usize = CTSU_BASE + 0x01;
const CTSUSDPRS: usize = CTSU_BASE + 0x02;
const CTSUSST: usize = CTSU_BASE + 0x03;
const CTSUCHAC0: usize = CTSU_BASE + 0x06;
const CTSUDCLKC: usize = CTSU_BASE + 0x10;
const CTSUST: usize = CTSU_BASE + 0x11;
const CTSUSSC: usize = CTSU_BASE + 0x12;
const CTSUSO1: usize = CTSU_BASE + 0x16;
const CTSUSC: usize = CTSU_BASE + 0x18;

const CTSUCHAC_COUNT: u8 = 5;

// Module stop control register C, MSTPC3 = CTSU
const MSTPCRC: usize = 0x4004_7004;
const MSTPCRC_CTSU: u32 = 1 << 3;

// CTSUCR1
const CR1_POWER_ON: u8 = 0x03; // CTSUPON | CTSUCSW
const CR1_MULTI_SCAN: u8 = 0x40; // CTSUMD0

// Values the hardware manual prescribes
const SDPRS_NOISE_REDUCTION: u8 = 0x23;
const SST_REQUIRED: u8 = 0x10;
const DCLKC_REQUIRED: u8 = 0x30;

const TSCAP_DISCHARGE_MS: u32 = 100;
const STABILISE_MS: u32 = 100;

pub struct Ctsu<D: DelayNs> {
    delay: D,
    pfs: Pfs,
}

impl<D: DelayNs> Ctsu<D> {
    pub fn new(delay: D) -> Self {
        Self {
            delay,
            pfs: Pfs::new(),
        }
    }
}

impl<D: DelayNs> CtsuPeripheral for Ctsu<D> {
    fn power_on(&mut self) {
        // Discharge TSCAP, then hand it to the CTSU
        let discharged = self.pfs.write(TSCAP_PORT, TSCAP_PIN, PFS_PDR);
        self.delay.delay_ms(TSCAP_DISCHARGE_MS);
        if let Err(e) = discharged.and_then(|_| self.pfs.select_ctsu(TSCAP_PORT, TSCAP_PIN)) {
            error!("ctsu: TSCAP setup failed: {}", e);
        }

        unsafe {
            modify32(MSTPCRC, |v| v & !MSTPCRC_CTSU);

            write8(CTSUCR0, 0);
            write8(CTSUCR0, CTSUCR0_INIT);

            write8(CTSUCR1, 0);
            write16(CTSUSO1, DEFAULT_SO1);
            write8(CTSUCR1, CR1_POWER_ON);
            modify8(CTSUCR1, |v| v | CR1_MULTI_SCAN);
        }

        self.delay.delay_ms(STABILISE_MS);

        unsafe {
            write8(CTSUSDPRS, SDPRS_NOISE_REDUCTION);
            write8(CTSUSST, SST_REQUIRED);
            write8(CTSUDCLKC, DCLKC_REQUIRED);
        }
        debug!("ctsu: powered on in multi-scan mode");
    }

    fn enable_channel(&mut self, group: u8, mask: u8) {
        if group >= CTSUCHAC_COUNT {
            warn!("ctsu: no CTSUCHAC{}", group);
            return;
        }
        unsafe { modify8(CTSUCHAC0 + group as usize, |v| v | mask) }
    }

    fn software_start(&mut self) {
        unsafe { write8(CTSUCR0, CTSUCR0_START) }
    }

    fn stop(&mut self) {
        unsafe { write8(CTSUCR0, CTSUCR0_INIT) }
    }

    fn status(&self) -> u8 {
        unsafe { read8(CTSUST) }
    }

    fn write_window(&self) -> usize {
        CTSUSSC
    }

    fn read_window(&self) -> usize {
        CTSUSC
    }
}
