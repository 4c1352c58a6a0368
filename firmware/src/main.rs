#![no_std]
#![no_main]

#[cfg(feature = "defmt")]
use defmt_rtt as _;

// RISC-V runtime
use riscv_rt as _;

// Panic handler
#[cfg(feature = "defmt")]
use panic_probe as _;
#[cfg(not(feature = "defmt"))]
use panic_halt as _;

use embassy_executor::Spawner;
use embassy_time::Duration;
use static_cell::StaticCell;

use ppm_core::*;
use ppm_firmware::*;

// Static resources
static PPM: PpmInput = PpmInput::new();
static STATUS: StaticCell<UsartSink> = StaticCell::new();

/// Main firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    #[cfg(feature = "defmt")]
    defmt::info!("PPM receiver firmware starting (v{=str})", ppm_core::VERSION);

    // Timebase first: the edge interrupt timestamps from it
    time_driver::init();

    let config = default_config();
    #[cfg(feature = "defmt")]
    defmt::info!("Config: {:?}", config);

    let mut hal = Ch32v203PpmHal::new();
    match hal.initialize() {
        Ok(()) => {
            let sink = STATUS.init(hal.status);
            spawner.must_spawn(consumer_task_wrapper(&PPM, sink, config));
        }
        Err(_e) => {
            // Keep reporting over the debug probe
            #[cfg(feature = "defmt")]
            defmt::error!("Hardware init failed: {:?}", _e);
            spawner.must_spawn(consumer_task_with_defmt(&PPM, config));
        }
    }

    #[cfg(feature = "defmt")]
    defmt::info!("PPM receiver ready");

    // Main supervision loop
    loop {
        embassy_time::Timer::after(Duration::from_secs(1)).await;
        #[cfg(feature = "defmt")]
        defmt::trace!("Heartbeat: {:?}", PPM.stats());
    }
}

/// PA0 edge interrupt
#[no_mangle]
extern "C" fn EXTI0_IRQHandler() {
    handle_ppm_interrupt(&PPM);
}
