//! Human-readable status lines

use core::fmt::{self, Write};
use heapless::String;

use crate::consumer::PollResult;
use crate::types::consts::CHANNEL_COUNT;
use crate::types::{ButtonState, Channel, ChannelReport, PpmConfig};

/// Longest rendered status line
pub const STATUS_LINE_CAPACITY: usize = 160;

/// One rendered status line
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine(String<STATUS_LINE_CAPACITY>);

impl StatusLine {
    /// Startup readiness line
    pub fn startup(config: &PpmConfig) -> Self {
        Self::render(|w| {
            write!(
                w,
                "PPM receiver ready ({} ch, timeout {} ms)",
                CHANNEL_COUNT, config.signal_timeout_ms()
            )
        })
    }

    /// Signal-loss notice
    pub fn signal_lost(age_ms: Option<u32>) -> Self {
        Self::render(|w| match age_ms {
            Some(age) => write!(w, "SIGNAL LOST (no frame for {} ms)", age),
            None => write!(w, "SIGNAL LOST (no frame yet)"),
        })
    }

    /// Structured channel report
    pub fn report(report: &ChannelReport) -> Self {
        Self::render(|w| {
            for (channel, stick) in Channel::STICKS.iter().zip(report.sticks.iter()) {
                write!(w, "CH{} {}us={} ", channel.number(), stick.raw, stick.value)?;
            }
            for (channel, button) in Channel::BUTTONS.iter().zip(report.buttons.iter()) {
                write!(w, "| CH{} ", channel.number())?;
                write_button(w, *button)?;
                w.write_char(' ')?;
            }
            Ok(())
        })
    }

    /// Line for the outcome of a consumer cycle
    pub fn from_poll(result: &PollResult) -> Self {
        match result {
            PollResult::SignalLost { age_ms } => Self::signal_lost(*age_ms),
            PollResult::Report(report) => Self::report(report),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str().trim_end()
    }

    fn render(f: impl FnOnce(&mut String<STATUS_LINE_CAPACITY>) -> fmt::Result) -> Self {
        let mut line = String::new();
        // Capacity covers the worst case; a failed write leaves a truncated line
        let _ = f(&mut line);
        Self(line)
    }
}

fn write_button<W: Write>(w: &mut W, state: ButtonState) -> fmt::Result {
    write!(w, "top={} bottom={}", state.top() as u8, state.bottom() as u8)
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
