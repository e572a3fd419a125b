//! ra4-touch - Arduino UNO R4 Minima Touch Demo Firmware
//!
//! This binary scans every touch pin of the UNO R4 Minima:
//! - 11 touch pins: D0-D3, D8, D9, D11, D13, A1, A2 and the LOVE pad
//! - Free-running multi-scan, results moved by the DTC
//! - Press/release edges logged over RTT after each pass

#![no_std]
#![no_main]

use cortex_m_rt::{entry, exception};
use defmt::*;
use defmt_rtt as _;
use embassy_executor::Executor;
use panic_halt as _;
use static_cell::StaticCell;

use ra4_touch::ra4m1::{CycleDelay, Ctsu, Dtc, IcuEventLink, Pfs};
use ra4_touch::*;

// Set compile-time board selection
const BOARD: Board = Board::Minima;

// Raw count above which a pad counts as touched
const THRESHOLD: u16 = 12_000;

type Engine = SharedEngine<'static, Ctsu<CycleDelay>, Pfs, IcuEventLink, Dtc>;

static FLAGS: ScanFlags = ScanFlags::new();
static SCAN_DONE: ScanSignal = ScanSignal::new();
static ENGINE: Engine = SharedEngine::new(&FLAGS);
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

/// Main application entry point for the UNO R4 Minima
#[entry]
fn main() -> ! {
    let mut engine = TouchEngine::new(
        BOARD,
        &FLAGS,
        Ctsu::new(CycleDelay::default()),
        Pfs::new(),
        IcuEventLink::new(),
        Dtc::new(),
    );
    engine.attach_notifier(&SCAN_DONE);
    ENGINE.install(engine);

    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        unwrap!(spawner.spawn(touch_task()));
    })
}

/// Touch task: configure the pins, start scanning and report edges
#[embassy_executor::task]
async fn touch_task() {
    let mut supervisor = TouchSupervisor::for_board(BOARD, THRESHOLD);
    supervisor.print_startup_banner();

    if let Err(e) = supervisor.begin(&mut &ENGINE) {
        error!("Touch pin setup failed: {}", e);
    }
    info!("Scanning {} channels", ENGINE.with(|e| e.channel_count()).unwrap_or(0));

    ENGINE.start(true);
    supervisor.run(&ENGINE, &SCAN_DONE).await;
}

// CTSU events land on whichever IRQs the ICU handed out
#[exception]
unsafe fn DefaultHandler(irqn: i16) {
    if let Ok(irq) = u8::try_from(irqn) {
        ENGINE.on_irq(irq);
    }
}
