#![no_std]

//! Firmware library exposing board hardware and tasks for the PPM receiver

pub use embassy_executor::Spawner;
pub use embassy_time::Duration;
pub use static_cell::StaticCell;

pub use ppm_core::*;

// Re-export hardware implementations
pub use crate::defmt_sink::*;
pub use crate::ch32v203_hardware::*;
pub use crate::tasks::*;

// Status sink over the debug probe
pub mod defmt_sink {
    use ppm_core::{HalError, StatusSink};

    /// Status sink that forwards lines to the defmt log
    ///
    /// Without the `defmt` feature lines are dropped, which keeps the
    /// consumer running on boards with no UART wired.
    #[derive(Debug, Default)]
    pub struct DefmtSink;

    impl DefmtSink {
        pub const fn new() -> Self {
            Self
        }
    }

    impl StatusSink for DefmtSink {
        type Error = HalError;

        fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
            #[cfg(feature = "defmt")]
            defmt::info!("{=str}", line);
            #[cfg(not(feature = "defmt"))]
            let _ = line;
            Ok(())
        }
    }
}

// Embassy tasks module
pub mod tasks {
    use super::*;
    use crate::ch32v203_hardware::UsartSink;

    /// Consumer task writing status lines to USART1
    #[embassy_executor::task]
    pub async fn consumer_task_wrapper(
        input: &'static PpmInput,
        sink: &'static mut UsartSink,
        config: PpmConfig,
    ) {
        #[cfg(feature = "defmt")]
        defmt::info!("Consumer task started");
        ppm_core::consumer::consumer_task(input, sink, config).await;
    }

    /// Consumer task writing status lines to the defmt log
    #[embassy_executor::task]
    pub async fn consumer_task_with_defmt(input: &'static PpmInput, config: PpmConfig) {
        #[cfg(feature = "defmt")]
        defmt::info!("Consumer task started (defmt sink)");
        let mut sink = DefmtSink::new();
        ppm_core::consumer::consumer_task(input, &mut sink, config).await;
    }
}

// CH32V203 hardware module
pub mod ch32v203_hardware;

// Time driver for embassy
pub mod time_driver;
