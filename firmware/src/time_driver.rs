//! Embassy time driver on the CH32V203 SysTick counter
//!
//! SysTick runs from HCLK/8 and counts up over 64 bits. Embassy ticks are
//! microseconds, which is also the timebase of the PPM edge timestamps.

use core::cell::Cell;
use critical_section::Mutex;
use embassy_time_driver::{AlarmHandle, Driver};
use portable_atomic::{AtomicBool, Ordering};

const STK_BASE: u32 = 0xE000_F000;
const STK_CTLR: u32 = 0x00;
const STK_SR: u32 = 0x04;
const STK_CNTL: u32 = 0x08;
const STK_CNTH: u32 = 0x0C;
const STK_CMPLR: u32 = 0x10;
const STK_CMPHR: u32 = 0x14;

const PFIC_IENR1: u32 = 0xE000_E100;
const IRQ_SYSTICK: u32 = 12;

/// STE | STIE, HCLK/8, count up, free running
const STK_CTLR_RUN: u32 = 0b0000_0011;
const STK_CTLR_ENABLE_ONLY: u32 = 0b0000_0001;

/// SysTick ticks per microsecond at 144 MHz HCLK / 8
pub const TICKS_PER_US: u64 = 18;

struct AlarmState {
    timestamp: Cell<u64>,
    callback: Cell<Option<(fn(*mut ()), *mut ())>>,
}

// Only touched inside critical sections on a single core
unsafe impl Send for AlarmState {}

/// Single-alarm time driver
pub struct SysTickDriver {
    alarm_taken: AtomicBool,
    alarm: Mutex<AlarmState>,
}

impl SysTickDriver {
    const fn new() -> Self {
        Self {
            alarm_taken: AtomicBool::new(false),
            alarm: Mutex::new(AlarmState {
                timestamp: Cell::new(u64::MAX),
                callback: Cell::new(None),
            }),
        }
    }

    /// Start the counter; call once before the executor runs
    pub fn start(&self) {
        unsafe {
            write_reg(STK_CTLR, 0);
            write_reg(STK_CNTL, 0);
            write_reg(STK_CNTH, 0);
            write_reg(STK_SR, 0);
            write_reg(STK_CTLR, STK_CTLR_ENABLE_ONLY);
            core::ptr::write_volatile(PFIC_IENR1 as *mut u32, 1 << IRQ_SYSTICK);
        }
    }

    fn raw_ticks(&self) -> u64 {
        // High word may roll over between the two reads
        loop {
            let hi = unsafe { read_reg(STK_CNTH) };
            let lo = unsafe { read_reg(STK_CNTL) };
            if hi == unsafe { read_reg(STK_CNTH) } {
                return (u64::from(hi) << 32) | u64::from(lo);
            }
        }
    }

    /// Called from the SysTick compare interrupt
    pub fn on_interrupt(&self) {
        unsafe {
            write_reg(STK_SR, 0);
            write_reg(STK_CTLR, STK_CTLR_ENABLE_ONLY);
        }

        let fire = critical_section::with(|cs| {
            let alarm = self.alarm.borrow(cs);
            if alarm.timestamp.get() <= self.now() {
                alarm.timestamp.set(u64::MAX);
                alarm.callback.get()
            } else {
                None
            }
        });

        if let Some((callback, ctx)) = fire {
            callback(ctx);
        }
    }
}

impl Driver for SysTickDriver {
    fn now(&self) -> u64 {
        self.raw_ticks() / TICKS_PER_US
    }

    unsafe fn allocate_alarm(&self) -> Option<AlarmHandle> {
        if self.alarm_taken.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(AlarmHandle::new(0))
        }
    }

    fn set_alarm_callback(&self, _alarm: AlarmHandle, callback: fn(*mut ()), ctx: *mut ()) {
        critical_section::with(|cs| {
            self.alarm.borrow(cs).callback.set(Some((callback, ctx)));
        });
    }

    fn set_alarm(&self, _alarm: AlarmHandle, timestamp: u64) -> bool {
        critical_section::with(|cs| {
            let alarm = self.alarm.borrow(cs);
            if timestamp <= self.now() {
                alarm.timestamp.set(u64::MAX);
                return false;
            }
            alarm.timestamp.set(timestamp);

            let compare = timestamp.saturating_mul(TICKS_PER_US);
            unsafe {
                write_reg(STK_CMPLR, compare as u32);
                write_reg(STK_CMPHR, (compare >> 32) as u32);
                write_reg(STK_CTLR, STK_CTLR_RUN);
            }

            // Counter keeps running while we arm; a compare it already passed never fires
            if timestamp <= self.now() {
                unsafe {
                    write_reg(STK_CTLR, STK_CTLR_ENABLE_ONLY);
                    write_reg(STK_SR, 0);
                }
                alarm.timestamp.set(u64::MAX);
                return false;
            }
            true
        })
    }
}

unsafe fn read_reg(offset: u32) -> u32 {
    core::ptr::read_volatile((STK_BASE + offset) as *const u32)
}

unsafe fn write_reg(offset: u32, value: u32) {
    core::ptr::write_volatile((STK_BASE + offset) as *mut u32, value)
}

// Export the driver
embassy_time_driver::time_driver_impl!(static DRIVER: SysTickDriver = SysTickDriver::new());

/// Start the SysTick timebase
pub fn init() {
    DRIVER.start();
}

/// SysTick compare interrupt
#[no_mangle]
extern "C" fn SysTick() {
    DRIVER.on_interrupt();
}

// Critical section implementation for single-core RISC-V
critical_section::set_impl!(RiscvCriticalSection);

struct RiscvCriticalSection;

unsafe impl critical_section::Impl for RiscvCriticalSection {
    unsafe fn acquire() -> u8 {
        let was_active = riscv::register::mstatus::read().mie();
        riscv::interrupt::disable();
        was_active as u8
    }

    unsafe fn release(was_active: u8) {
        if was_active != 0 {
            riscv::interrupt::enable();
        }
    }
}
