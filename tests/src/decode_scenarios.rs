//! End-to-end decoding scenarios: edges in, status lines out

use ppm_core::test_utils::pulse_train::PulseTrain;
use ppm_core::test_utils::scenarios;
use ppm_core::*;
use rstest::rstest;

fn report_after(train: &PulseTrain) -> (PpmInput, PollResult) {
    let input = PpmInput::new();
    train.feed(&input);
    let mut consumer = FrameConsumer::default();
    let result = consumer.poll(&input, train.now_us());
    (input, result)
}

#[rstest]
#[case(840, -100)]
#[case(1045, -50)]
#[case(1224, -6)]
#[case(1250, 0)]
#[case(1271, 0)]
#[case(1276, 6)]
#[case(1465, 50)]
#[case(1680, 100)]
#[case(1780, 100)]
#[case(740, -100)]
fn stick_mapping(#[case] raw: u16, #[case] expected: i16) {
    assert_eq!(map_stick(raw, &PpmConfig::DEFAULT), expected);
}

#[rstest]
#[case(740, ButtonState::Top)]
#[case(1049, ButtonState::Top)]
#[case(1050, ButtonState::Released)]
#[case(1250, ButtonState::Released)]
#[case(1580, ButtonState::Released)]
#[case(1581, ButtonState::Bottom)]
#[case(1780, ButtonState::Bottom)]
fn button_classification(#[case] raw: u16, #[case] expected: ButtonState) {
    assert_eq!(classify_button(raw, &PpmConfig::DEFAULT), expected);
}

#[test]
fn neutral_frames_report_centered_sticks() {
    let train = scenarios::steady(0, scenarios::NEUTRAL, 3);
    let (input, result) = report_after(&train);

    assert_eq!(
        StatusLine::from_poll(&result).as_str(),
        "CH1 1250us=0 CH2 1250us=0 CH3 1250us=0 CH4 1250us=0 \
         | CH5 top=0 bottom=0 | CH6 top=0 bottom=0"
    );
    assert_eq!(input.stats().frames, 3);
}

#[test]
fn full_deflection_report() {
    let train = PulseTrain::new(1_000).frame(scenarios::FULL_DEFLECTION);
    let (_, result) = report_after(&train);

    assert_eq!(
        StatusLine::from_poll(&result).as_str(),
        "CH1 840us=-100 CH2 1680us=100 CH3 840us=-100 CH4 1680us=100 \
         | CH5 top=1 bottom=0 | CH6 top=0 bottom=1"
    );
}

#[test]
fn truncated_frame_is_dropped() {
    let train = scenarios::truncated_frame(0, [1000, 1100, 1200, 1300, 1400, 1500]);
    let input = PpmInput::new();
    let events = train.feed(&input);

    let completed = events
        .iter()
        .filter(|e| matches!(e, EdgeEvent::FrameComplete { .. }))
        .count();
    assert_eq!(completed, 2);
    assert!(events.contains(&EdgeEvent::Sync { discarded: 3 }));
    assert_eq!(input.stats().partial_frames, 1);
    assert_eq!(input.snapshot(), Some(RawFrame([1000, 1100, 1200, 1300, 1400, 1500])));
}

#[test]
fn pulses_before_first_sync_are_ignored() {
    let train = PulseTrain::new(0)
        .channels(&[1300, 1300, 1300])
        .frame(scenarios::NEUTRAL);
    let input = PpmInput::new();
    train.feed(&input);

    assert_eq!(input.stats().unsynced_pulses, 3);
    assert_eq!(input.snapshot(), Some(RawFrame(scenarios::NEUTRAL)));
}

#[rstest]
#[case::counter_start(0)]
#[case::just_before_wrap(u32::MAX - 10_000)]
#[case::mid_range(0x8000_0000)]
fn decodes_across_counter_wrap(#[case] start_us: u32) {
    let train = scenarios::steady(start_us, scenarios::FULL_DEFLECTION, 4);
    let (input, result) = report_after(&train);

    let PollResult::Report(report) = result else {
        panic!("expected a report, got {:?}", result);
    };
    assert_eq!(report.buttons, [ButtonState::Top, ButtonState::Bottom]);
    assert_eq!(input.stats().frames, 4);
}

#[test]
fn signal_loss_and_recovery_lines() {
    let input = PpmInput::new();
    let mut consumer = FrameConsumer::default();
    let mut sink = hal::mock::MockSink::new();

    let mut emit = |consumer: &mut FrameConsumer, at: u32| {
        let result = consumer.poll(&input, at);
        sink.write_line(StatusLine::from_poll(&result).as_str()).unwrap();
    };

    emit(&mut consumer, 0);

    let first = PulseTrain::new(10_000).frame(scenarios::FULL_DEFLECTION);
    first.feed(&input);
    emit(&mut consumer, first.now_us());

    // Transmitter switched off
    let silent_at = first.now_us() + 250_000;
    emit(&mut consumer, silent_at);

    let second = PulseTrain::new(silent_at).frame(scenarios::NEUTRAL);
    second.feed(&input);
    emit(&mut consumer, second.now_us());

    let lines: Vec<&str> = sink.lines().collect();
    assert_eq!(lines[0], "SIGNAL LOST (no frame yet)");
    assert!(lines[1].starts_with("CH1 840us=-100"));
    assert!(lines[2].starts_with("SIGNAL LOST (no frame for 25"));
    assert!(lines[3].starts_with("CH1 1250us=0"));
    assert!(lines[3].ends_with("CH6 top=0 bottom=0"));
}

#[test]
fn custom_config_changes_thresholds() {
    let config = PpmConfig::new(4_000, 50, (1000, 1500, 2000), 50, 0, (1200, 1800), 20).unwrap();
    let input = PpmInput::with_config(config);
    let train = PulseTrain::new(0)
        .sync(4_000)
        .channels(&[1000, 1750, 2050, 1500, 1100, 1900]);
    train.feed(&input);

    let mut consumer = FrameConsumer::new(config);
    let PollResult::Report(report) = consumer.poll(&input, train.now_us()) else {
        panic!("expected report");
    };
    assert_eq!(report.sticks.map(|s| s.value), [-100, 50, 100, 0]);
    assert_eq!(report.sticks[2].raw, 2050);
    assert_eq!(report.buttons, [ButtonState::Top, ButtonState::Bottom]);

    let lost = consumer.poll(&input, train.now_us() + 60_000);
    assert_eq!(StatusLine::from_poll(&lost).as_str(), "SIGNAL LOST (no frame for 60 ms)");
}
