//! Pulse width to stick position and button state conversion

use crate::types::{ButtonState, Channel, ChannelReport, PpmConfig, RawFrame, StickReading};

/// Full-scale stick deflection
pub const STICK_FULL_SCALE: i16 = 100;

/// Map a stick pulse width to [-100, 100] with deadzone applied
///
/// Piecewise linear: [min, mid] maps to [-100, 0] and [mid, max] to
/// [0, 100], so the neutral point stays at zero even when the range is
/// asymmetric around it. Integer division truncates toward zero.
pub fn map_stick(raw: u16, config: &PpmConfig) -> i16 {
    let raw = i32::from(raw);
    let min = i32::from(config.channel_min_us());
    let mid = i32::from(config.channel_mid_us());
    let max = i32::from(config.channel_max_us());
    let full = i32::from(STICK_FULL_SCALE);

    let mapped = if raw <= mid {
        (raw - mid) * full / (mid - min)
    } else {
        (raw - mid) * full / (max - mid)
    };
    let mapped = mapped.clamp(-full, full) as i16;

    if mapped.abs() <= config.stick_deadzone() {
        0
    } else {
        mapped
    }
}

/// Classify a button channel pulse width
///
/// Values between the two thresholds, including neutral, are `Released`.
pub fn classify_button(raw: u16, config: &PpmConfig) -> ButtonState {
    if raw < config.button_low_us() {
        ButtonState::Top
    } else if raw > config.button_high_us() {
        ButtonState::Bottom
    } else {
        ButtonState::Released
    }
}

/// Derive all stick and button values from a raw frame
pub fn derive_report(frame: &RawFrame, config: &PpmConfig) -> ChannelReport {
    let stick = |channel: Channel| {
        let raw = frame[channel];
        StickReading {
            raw,
            value: map_stick(raw, config),
        }
    };

    ChannelReport {
        sticks: Channel::STICKS.map(stick),
        buttons: Channel::BUTTONS.map(|channel| classify_button(frame[channel], config)),
    }
}
