// Scenario runner: feeds simulated PPM signals through the decoder and
// prints the status lines the receiver would emit

use ppm_core::test_utils::pulse_train::PulseTrain;
use ppm_core::test_utils::scenarios;
use ppm_core::*;

fn main() {
    println!("PPM receiver scenario runner (ppm-core {})", ppm_core::VERSION);
    println!("{}", StatusLine::startup(&default_config()));

    run_steady_frames();
    run_truncated_frame();
    run_signal_loss();
    run_counter_wrap();

    println!("All scenarios completed");
}

/// Feed a train and print one consumer cycle
fn cycle(label: &str, input: &PpmInput, consumer: &mut FrameConsumer, now_us: u32) -> PollResult {
    let result = consumer.poll(input, now_us);
    println!("  [{}] {}", label, StatusLine::from_poll(&result));
    result
}

fn run_steady_frames() {
    println!("Steady frames");
    let input = PpmInput::new();
    let mut consumer = FrameConsumer::default();

    let train = scenarios::steady(0, scenarios::NEUTRAL, 2);
    train.feed(&input);
    cycle("neutral", &input, &mut consumer, train.now_us());

    let train = scenarios::steady(train.now_us(), scenarios::FULL_DEFLECTION, 2);
    train.feed(&input);
    let result = cycle("full", &input, &mut consumer, train.now_us());
    assert!(matches!(result, PollResult::Report(_)));
    println!("  stats: {:?}", input.stats());
}

fn run_truncated_frame() {
    println!("Truncated frame");
    let input = PpmInput::new();
    let mut consumer = FrameConsumer::default();

    let train = scenarios::truncated_frame(0, [900, 1100, 1250, 1400, 1000, 1650]);
    train.feed(&input);
    cycle("after", &input, &mut consumer, train.now_us());
    println!("  partial frames dropped: {}", input.stats().partial_frames);
}

fn run_signal_loss() {
    println!("Signal loss");
    let input = PpmInput::new();
    let mut consumer = FrameConsumer::default();

    let train = PulseTrain::new(0).frame(scenarios::FULL_DEFLECTION);
    train.feed(&input);
    let mut now = train.now_us();
    cycle("live", &input, &mut consumer, now);

    for _ in 0..3 {
        now += 50_000;
        cycle("silent", &input, &mut consumer, now);
    }

    let train = PulseTrain::new(now).frame(scenarios::NEUTRAL);
    train.feed(&input);
    let result = cycle("back", &input, &mut consumer, train.now_us());
    assert_eq!(consumer.link(), LinkState::Up);
    assert!(matches!(result, PollResult::Report(_)));
}

fn run_counter_wrap() {
    println!("Counter wrap");
    let input = PpmInput::new();
    let mut consumer = FrameConsumer::default();

    let train = scenarios::steady(u32::MAX - 30_000, scenarios::FULL_DEFLECTION, 3);
    train.feed(&input);
    let result = cycle("wrapped", &input, &mut consumer, train.now_us());
    assert!(matches!(result, PollResult::Report(_)));
}
