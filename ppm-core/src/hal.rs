//! Hardware Abstraction Layer for the PPM receiver

use core::fmt::Write;
use embedded_hal::digital::InputPin;

use crate::types::Level;

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Interrupt configuration failed
    InterruptError,
    /// Status sink rejected a line
    SinkError,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::InterruptError => write!(f, "Interrupt configuration failed"),
            HalError::SinkError => write!(f, "Status sink write failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Trait for the PPM signal line
pub trait SignalInput {
    type Error: From<HalError>;

    /// Current line level
    fn level(&mut self) -> Result<Level, Self::Error>;

    /// Trigger the edge interrupt on both rising and falling edges
    fn enable_interrupt(&mut self) -> Result<(), Self::Error>;

    /// Stop edge interrupts
    fn disable_interrupt(&mut self) -> Result<(), Self::Error>;
}

/// Trait for the textual status stream
pub trait StatusSink {
    type Error: From<HalError>;

    /// Write one status line; the sink adds the line terminator
    fn write_line(&mut self, line: &str) -> Result<(), Self::Error>;
}

/// Generic implementation for embedded-hal compatible input pins
///
/// Interrupt wiring is platform specific, so the interrupt methods fail
/// until a board layer takes over.
pub struct EmbeddedHalSignalInput<P> {
    pin: P,
}

impl<P> EmbeddedHalSignalInput<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> SignalInput for EmbeddedHalSignalInput<P>
where
    P: InputPin,
{
    type Error = HalError;

    fn level(&mut self) -> Result<Level, Self::Error> {
        // Line idles HIGH, pulses pull it LOW
        self.pin
            .is_high()
            .map(Level::from_high)
            .map_err(|_| HalError::GpioError)
    }

    fn enable_interrupt(&mut self) -> Result<(), Self::Error> {
        Err(HalError::InterruptError)
    }

    fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
        Err(HalError::InterruptError)
    }
}

/// Status sink over any `core::fmt::Write` (UART writer, string buffer)
pub struct FmtSink<W> {
    writer: W,
}

impl<W: Write> FmtSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StatusSink for FmtSink<W> {
    type Error = HalError;

    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.writer
            .write_str(line)
            .and_then(|_| self.writer.write_str("\r\n"))
            .map_err(|_| HalError::SinkError)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use core::cell::RefCell;
    use heapless::{String, Vec};

    /// Lines kept by [`MockSink`]
    pub const MOCK_SINK_LINES: usize = 64;

    pub struct MockSignalInput {
        high: RefCell<bool>,
        interrupt_enabled: RefCell<bool>,
    }

    impl MockSignalInput {
        pub fn new() -> Self {
            Self {
                high: RefCell::new(true),
                interrupt_enabled: RefCell::new(false),
            }
        }

        pub fn set_level(&self, level: Level) {
            *self.high.borrow_mut() = level == Level::High;
        }

        pub fn interrupt_enabled(&self) -> bool {
            *self.interrupt_enabled.borrow()
        }
    }

    impl Default for MockSignalInput {
        fn default() -> Self {
            Self::new()
        }
    }

    impl SignalInput for MockSignalInput {
        type Error = HalError;

        fn level(&mut self) -> Result<Level, Self::Error> {
            Ok(Level::from_high(*self.high.borrow()))
        }

        fn enable_interrupt(&mut self) -> Result<(), Self::Error> {
            *self.interrupt_enabled.borrow_mut() = true;
            Ok(())
        }

        fn disable_interrupt(&mut self) -> Result<(), Self::Error> {
            *self.interrupt_enabled.borrow_mut() = false;
            Ok(())
        }
    }

    /// Captures status lines, oldest dropped when full
    #[derive(Default)]
    pub struct MockSink {
        lines: Vec<String<{ crate::report::STATUS_LINE_CAPACITY }>, MOCK_SINK_LINES>,
        fail: bool,
    }

    impl MockSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every following write fail
        pub fn set_failing(&mut self, fail: bool) {
            self.fail = fail;
        }

        pub fn lines(&self) -> impl Iterator<Item = &str> {
            self.lines.iter().map(|l| l.as_str())
        }

        pub fn last(&self) -> Option<&str> {
            self.lines.last().map(|l| l.as_str())
        }

        pub fn len(&self) -> usize {
            self.lines.len()
        }

        pub fn is_empty(&self) -> bool {
            self.lines.is_empty()
        }
    }

    impl StatusSink for MockSink {
        type Error = HalError;

        fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
            if self.fail {
                return Err(HalError::SinkError);
            }
            let line = String::try_from(line).map_err(|_| HalError::SinkError)?;
            if self.lines.is_full() {
                self.lines.remove(0);
            }
            self.lines.push(line).map_err(|_| HalError::SinkError)
        }
    }
}
