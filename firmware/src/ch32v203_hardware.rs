//! CH32V203 Hardware Implementation
//!
//! 64KB Flash / 20KB RAM. PPM input on PA0 (EXTI0, both edges), status
//! stream on USART1 TX (PA9).

use ppm_core::{HalError, Level, PpmInput, SignalInput, StatusSink};

/// Register map used by this board layer
mod regs {
    pub const RCC_BASE: u32 = 0x4002_1000;
    pub const RCC_APB2PCENR: u32 = 0x18;

    pub const GPIOA_BASE: u32 = 0x4001_0800;
    pub const GPIO_CFGLR: u32 = 0x00;
    pub const GPIO_CFGHR: u32 = 0x04;
    pub const GPIO_INDR: u32 = 0x08;
    pub const GPIO_OUTDR: u32 = 0x0C;

    pub const AFIO_BASE: u32 = 0x4001_0000;
    pub const AFIO_EXTICR1: u32 = 0x08;

    pub const EXTI_BASE: u32 = 0x4001_0400;
    pub const EXTI_INTENR: u32 = 0x00;
    pub const EXTI_RTENR: u32 = 0x08;
    pub const EXTI_FTENR: u32 = 0x0C;
    pub const EXTI_INTFR: u32 = 0x14;

    pub const PFIC_IENR1: u32 = 0xE000_E100;
    pub const PFIC_IRER1: u32 = 0xE000_E180;
    /// EXTI0 interrupt number
    pub const IRQ_EXTI0: u32 = 22;

    pub const USART1_BASE: u32 = 0x4001_3800;
    pub const USART_STATR: u32 = 0x00;
    pub const USART_DATAR: u32 = 0x04;
    pub const USART_BRR: u32 = 0x08;
    pub const USART_CTLR1: u32 = 0x0C;
    pub const USART_STATR_TXE: u32 = 1 << 7;

    #[inline(always)]
    pub unsafe fn read(addr: u32) -> u32 {
        core::ptr::read_volatile(addr as *const u32)
    }

    #[inline(always)]
    pub unsafe fn write(addr: u32, value: u32) {
        core::ptr::write_volatile(addr as *mut u32, value)
    }

    #[inline(always)]
    pub unsafe fn modify(addr: u32, f: impl FnOnce(u32) -> u32) {
        write(addr, f(read(addr)))
    }
}

/// CH32V203 pin configuration constants
pub mod pins {
    /// PPM signal input pin (PA0)
    pub const PPM_PIN: u8 = 0;

    /// USART1 TX pin (PA9)
    pub const STATUS_TX_PIN: u8 = 9;
}

/// CH32V203 clock and timing constants
pub mod timing {
    /// System clock after PLL setup
    pub const HCLK_HZ: u32 = 144_000_000;

    /// Status stream baud rate
    pub const STATUS_BAUD: u32 = 115_200;
}

/// CH32V203 hardware abstraction layer implementation
pub struct Ch32v203PpmHal {
    pub signal: PpmSignalPin,
    pub status: UsartSink,
}

impl Ch32v203PpmHal {
    pub fn new() -> Self {
        Self {
            signal: PpmSignalPin::new(),
            status: UsartSink::new(),
        }
    }

    /// Initialize CH32V203 hardware
    pub fn initialize(&mut self) -> Result<(), HalError> {
        enable_peripheral_clocks();
        self.signal.init();
        self.status.init();
        self.signal.enable_interrupt()?;

        let _idle = self.signal.level()?;
        #[cfg(feature = "defmt")]
        defmt::info!("CH32V203 HAL initialized, PPM line {:?}", _idle);

        Ok(())
    }
}

impl Default for Ch32v203PpmHal {
    fn default() -> Self {
        Self::new()
    }
}

fn enable_peripheral_clocks() {
    // AFIO (bit 0), GPIOA (bit 2), USART1 (bit 14)
    unsafe {
        regs::modify(regs::RCC_BASE + regs::RCC_APB2PCENR, |v| v | (1 << 0) | (1 << 2) | (1 << 14));
    }
}

/// PPM signal input pin (PA0)
pub struct PpmSignalPin {
    _private: (),
}

impl PpmSignalPin {
    fn new() -> Self {
        Self { _private: () }
    }

    fn init(&self) {
        let shift = u32::from(pins::PPM_PIN) * 4;
        unsafe {
            // CNF=10 (input pull-up/down), MODE=00
            regs::modify(regs::GPIOA_BASE + regs::GPIO_CFGLR, |v| (v & !(0xF << shift)) | (0x8 << shift));
            // Pull-up keeps the idle line HIGH with no receiver attached
            regs::modify(regs::GPIOA_BASE + regs::GPIO_OUTDR, |v| v | (1 << pins::PPM_PIN));
            // EXTI0 source = port A
            regs::modify(regs::AFIO_BASE + regs::AFIO_EXTICR1, |v| v & !0xF);
            regs::modify(regs::EXTI_BASE + regs::EXTI_RTENR, |v| v | 1);
            regs::modify(regs::EXTI_BASE + regs::EXTI_FTENR, |v| v | 1);
        }
    }

    /// Read line level without going through the trait
    #[inline(always)]
    pub fn line_high() -> bool {
        unsafe { regs::read(regs::GPIOA_BASE + regs::GPIO_INDR) & (1 << pins::PPM_PIN) != 0 }
    }
}

impl embedded_hal::digital::ErrorType for PpmSignalPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for PpmSignalPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(Self::line_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!Self::line_high())
    }
}

impl SignalInput for PpmSignalPin {
    type Error = HalError;

    fn level(&mut self) -> Result<Level, Self::Error> {
        let high = embedded_hal::digital::InputPin::is_high(self).map_err(|_| HalError::GpioError)?;
        Ok(Level::from_high(high))
    }

    fn enable_interrupt(&mut self) -> Result<(), Self::Error> {
        unsafe {
            regs::write(regs::EXTI_BASE + regs::EXTI_INTFR, 1);
            regs::modify(regs::EXTI_BASE + regs::EXTI_INTENR, |v| v | 1);
            regs::write(regs::PFIC_IENR1, 1 << regs::IRQ_EXTI0);
        }
        Ok(())
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        unsafe {
            regs::modify(regs::EXTI_BASE + regs::EXTI_INTENR, |v| v & !1);
            regs::write(regs::PFIC_IRER1, 1 << regs::IRQ_EXTI0);
        }
        Ok(())
    }
}

/// Service the EXTI0 interrupt: sample, acknowledge, decode
///
/// Edges are timestamped with the embassy clock, so the time driver must be
/// running before EXTI0 is unmasked.
#[inline(always)]
pub fn handle_ppm_interrupt(input: &PpmInput) {
    let level = Level::from_high(PpmSignalPin::line_high());
    unsafe {
        regs::write(regs::EXTI_BASE + regs::EXTI_INTFR, 1);
    }
    input.on_edge_now(level);
}

/// Status stream over USART1 TX (PA9), blocking per byte
pub struct UsartSink {
    _private: (),
}

impl UsartSink {
    fn new() -> Self {
        Self { _private: () }
    }

    fn init(&self) {
        let shift = u32::from(pins::STATUS_TX_PIN - 8) * 4;
        unsafe {
            // PA9: CNF=10 (AF push-pull), MODE=11 (50 MHz)
            regs::modify(regs::GPIOA_BASE + regs::GPIO_CFGHR, |v| (v & !(0xF << shift)) | (0xB << shift));
            regs::write(regs::USART1_BASE + regs::USART_BRR, timing::HCLK_HZ / timing::STATUS_BAUD);
            // UE | TE
            regs::write(regs::USART1_BASE + regs::USART_CTLR1, (1 << 13) | (1 << 3));
        }
    }

    fn write_byte(&mut self, byte: u8) {
        unsafe {
            while regs::read(regs::USART1_BASE + regs::USART_STATR) & regs::USART_STATR_TXE == 0 {}
            regs::write(regs::USART1_BASE + regs::USART_DATAR, u32::from(byte));
        }
    }
}

impl StatusSink for UsartSink {
    type Error = HalError;

    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        for byte in line.bytes().chain(*b"\r\n") {
            self.write_byte(byte);
        }
        Ok(())
    }
}
