#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # PPM Core
//!
//! PPM radio-control receiver logic for embedded systems.
//! Decodes six pulse-width channels from a single edge-timed input under
//! interrupt and hands complete frames to a polling consumer that maps them
//! to stick positions and button states, with a signal-loss failsafe.

pub mod types;
pub mod decoder;
pub mod input;
pub mod mapping;
pub mod consumer;
pub mod report;
pub mod hal;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use decoder::*;
pub use input::*;
pub use mapping::*;
pub use consumer::*;
pub use report::*;
pub use hal::{HalError, SignalInput, StatusSink, EmbeddedHalSignalInput, FmtSink};

/// PPM core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build-time receiver configuration
pub fn default_config() -> PpmConfig {
    PpmConfig::DEFAULT
}
