//! Consumer task driven by the embassy mock clock

use std::cell::RefCell;
use std::rc::Rc;

use embassy_time::{Duration, Instant, MockDriver};
use ppm_core::test_utils::pulse_train::PulseTrain;
use ppm_core::test_utils::scenarios;
use ppm_core::*;
use tokio_test::{assert_pending, task};

/// Sink whose lines stay readable while the task holds it
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<String>>>);

impl SharedSink {
    fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl StatusSink for SharedSink {
    type Error = HalError;

    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.0.borrow_mut().push(line.to_string());
        Ok(())
    }
}

fn now_us() -> u32 {
    Instant::now().as_micros() as u32
}

// Single test: the mock clock is process-wide
#[test]
fn consumer_task_reports_every_poll_interval() {
    let clock = MockDriver::get();
    let input = PpmInput::new();
    let lines = SharedSink::default();
    let mut sink = lines.clone();
    let config = PpmConfig::DEFAULT;
    let interval = Duration::from_millis(u64::from(config.poll_interval_ms()));

    let mut consumer = task::spawn(consumer_task(&input, &mut sink, config));

    // Startup line, then the first cycle with no frame
    assert_pending!(consumer.poll());
    assert_eq!(
        lines.lines(),
        ["PPM receiver ready (6 ch, timeout 100 ms)", "SIGNAL LOST (no frame yet)"]
    );

    // Frame lands between two cycles, each edge stamped by the clock itself
    let cycle_start = now_us();
    let train = PulseTrain::new(cycle_start.wrapping_add(10_000)).frame(scenarios::FULL_DEFLECTION);
    for edge in train.edges() {
        clock.advance(Duration::from_micros(u64::from(edge.at_us.wrapping_sub(now_us()))));
        input.on_edge_now(edge.level);
    }
    let completed = input.last_frame_us().unwrap();
    assert_eq!(Some(completed), train.last_rising_us());
    assert!(!consumer.is_woken());

    let elapsed = now_us().wrapping_sub(cycle_start);
    clock.advance(interval - Duration::from_micros(u64::from(elapsed)));
    assert!(consumer.is_woken());
    assert_pending!(consumer.poll());
    assert_eq!(
        lines.lines().last().map(String::as_str),
        Some(
            "CH1 840us=-100 CH2 1680us=100 CH3 840us=-100 CH4 1680us=100 \
             | CH5 top=1 bottom=0 | CH6 top=0 bottom=1"
        )
    );

    // Transmitter goes quiet: last values repeat until the timeout
    let mut lost_at = None;
    for _ in 0..4 {
        clock.advance(interval);
        assert!(consumer.is_woken());
        assert_pending!(consumer.poll());
        if lines.lines().last().is_some_and(|l| l.starts_with("SIGNAL LOST")) {
            lost_at = Some(now_us());
            break;
        }
    }

    let lost_at = lost_at.expect("link should time out");
    let age_ms = lost_at.wrapping_sub(completed) / 1000;
    assert!(age_ms > config.signal_timeout_ms());
    assert_eq!(
        lines.lines().last().map(String::as_str),
        Some(format!("SIGNAL LOST (no frame for {} ms)", age_ms).as_str())
    );
    assert_eq!(lines.lines().len(), 2 + 1 + 2);
}
