//! Core data types for the PPM receiver

use core::ops::Index;

/// Build-time receiver constants
pub mod consts {
    /// Number of channels carried in one PPM frame
    pub const CHANNEL_COUNT: usize = 6;
    /// A LOW pulse at least this long is the inter-frame sync gap
    pub const SYNC_THRESHOLD_US: u32 = 5_000;
    /// No completed frame for longer than this means the link is lost
    pub const SIGNAL_TIMEOUT_MS: u32 = 100;
    /// Shortest expected channel pulse
    pub const CHANNEL_MIN_US: u16 = 840;
    /// Neutral channel pulse
    pub const CHANNEL_MID_US: u16 = 1250;
    /// Longest expected channel pulse
    pub const CHANNEL_MAX_US: u16 = 1680;
    /// Tolerance around [min, max] before a pulse is clamped
    pub const CLAMP_MARGIN_US: u16 = 100;
    /// Mapped stick magnitudes at or below this collapse to zero
    pub const STICK_DEADZONE: i16 = 5;
    /// Button channel pulses shorter than this press the top button
    pub const BUTTON_LOW_US: u16 = 1050;
    /// Button channel pulses longer than this press the bottom button
    pub const BUTTON_HIGH_US: u16 = 1580;
    /// Consumer cadence
    pub const POLL_INTERVAL_MS: u32 = 50;
}

use consts::*;

/// Physical PPM channel (1-based naming, 0-based storage)
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
    Ch5,
    Ch6,
}

impl Channel {
    /// All channels in capture order
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Ch1,
        Channel::Ch2,
        Channel::Ch3,
        Channel::Ch4,
        Channel::Ch5,
        Channel::Ch6,
    ];

    /// Channels carrying analog stick axes
    pub const STICKS: [Channel; 4] = [Channel::Ch1, Channel::Ch2, Channel::Ch3, Channel::Ch4];

    /// Channels carrying two-state button pairs
    pub const BUTTONS: [Channel; 2] = [Channel::Ch5, Channel::Ch6];

    /// Storage index within a frame
    pub const fn index(&self) -> usize {
        match self {
            Channel::Ch1 => 0,
            Channel::Ch2 => 1,
            Channel::Ch3 => 2,
            Channel::Ch4 => 3,
            Channel::Ch5 => 4,
            Channel::Ch6 => 5,
        }
    }

    /// Channel number as printed on the transmitter
    pub const fn number(&self) -> u8 {
        self.index() as u8 + 1
    }

    /// Returns true for the four stick channels
    pub const fn is_stick(&self) -> bool {
        self.index() < 4
    }

    pub const fn from_index(index: usize) -> Option<Channel> {
        if index < CHANNEL_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }
}

/// One complete set of channel pulse widths in microseconds
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawFrame(pub [u16; CHANNEL_COUNT]);

impl RawFrame {
    /// Frame with every channel at the neutral pulse width
    pub const fn neutral() -> Self {
        Self([CHANNEL_MID_US; CHANNEL_COUNT])
    }

    pub const fn values(&self) -> &[u16; CHANNEL_COUNT] {
        &self.0
    }
}

impl Default for RawFrame {
    fn default() -> Self {
        Self::neutral()
    }
}

impl Index<Channel> for RawFrame {
    type Output = u16;

    fn index(&self, channel: Channel) -> &u16 {
        &self.0[channel.index()]
    }
}

/// Signal line level after an edge
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Frame assembly state of the edge decoder
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncState {
    /// No sync gap seen yet, pulses are ignored
    Searching,
    /// Sync acquired, holding the number of channels captured so far (< 6)
    Capturing(u8),
    /// All channels captured, waiting for the next sync gap
    Complete,
}

/// What a single edge did to the decoder
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeEvent {
    /// Falling edge, only the timing reference moved
    Ignored,
    /// Sync gap; `discarded` counts channels dropped from an unfinished frame
    Sync { discarded: u8 },
    /// Channel pulse stored
    Channel { channel: Channel, width: u16, clamped: bool },
    /// Sixth channel stored and the frame published
    FrameComplete { width: u16, clamped: bool },
    /// Pulse after a complete frame and before the next sync
    Overrun,
    /// Pulse before the first sync
    Unsynced,
}

/// Two-state button classification of a button channel
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Neither button pressed (also the idle and failsafe state)
    #[default]
    Released,
    /// Short pulse
    Top,
    /// Long pulse
    Bottom,
}

impl ButtonState {
    pub const fn top(&self) -> bool {
        matches!(self, ButtonState::Top)
    }

    pub const fn bottom(&self) -> bool {
        matches!(self, ButtonState::Bottom)
    }
}

/// Raw and normalized value of a stick channel
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StickReading {
    pub raw: u16,
    /// Normalized position in [-100, 100]
    pub value: i16,
}

impl StickReading {
    pub const fn neutral() -> Self {
        Self {
            raw: CHANNEL_MID_US,
            value: 0,
        }
    }
}

/// Derived values of one consumer cycle
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelReport {
    pub sticks: [StickReading; 4],
    pub buttons: [ButtonState; 2],
}

impl ChannelReport {
    /// Neutral sticks and released buttons
    pub const fn failsafe() -> Self {
        Self {
            sticks: [StickReading::neutral(); 4],
            buttons: [ButtonState::Released; 2],
        }
    }

    pub fn stick(&self, channel: Channel) -> Option<StickReading> {
        self.sticks.get(channel.index()).copied()
    }

    pub fn button(&self, channel: Channel) -> Option<ButtonState> {
        channel
            .index()
            .checked_sub(Channel::Ch5.index())
            .and_then(|i| self.buttons.get(i).copied())
    }
}

/// Configuration validation errors
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Channel range must satisfy min < mid < max
    ChannelRange,
    /// Button thresholds must satisfy low < mid < high
    ButtonThresholds,
    /// Sync threshold must exceed the longest clamped channel pulse
    SyncThreshold,
    /// Deadzone must be below full scale
    Deadzone,
    /// Timeout and poll interval must be non-zero
    Timing,
}

#[cfg(feature = "std")]
impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ChannelRange => write!(f, "channel range must satisfy min < mid < max"),
            ConfigError::ButtonThresholds => write!(f, "button thresholds must satisfy low < mid < high"),
            ConfigError::SyncThreshold => write!(f, "sync threshold must exceed the clamped channel range"),
            ConfigError::Deadzone => write!(f, "deadzone must be between 0 and 99"),
            ConfigError::Timing => write!(f, "timeout and poll interval must be non-zero"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Receiver configuration parameters
///
/// Only [`PpmConfig::DEFAULT`] and [`PpmConfig::new`] build one, so every
/// instance satisfies the ordering checks in `new`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PpmConfig {
    sync_threshold_us: u32,
    signal_timeout_ms: u32,
    channel_min_us: u16,
    channel_mid_us: u16,
    channel_max_us: u16,
    clamp_margin_us: u16,
    stick_deadzone: i16,
    button_low_us: u16,
    button_high_us: u16,
    poll_interval_ms: u32,
}

impl Default for PpmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PpmConfig {
    /// Build-time configuration
    pub const DEFAULT: PpmConfig = PpmConfig {
        sync_threshold_us: SYNC_THRESHOLD_US,
        signal_timeout_ms: SIGNAL_TIMEOUT_MS,
        channel_min_us: CHANNEL_MIN_US,
        channel_mid_us: CHANNEL_MID_US,
        channel_max_us: CHANNEL_MAX_US,
        clamp_margin_us: CLAMP_MARGIN_US,
        stick_deadzone: STICK_DEADZONE,
        button_low_us: BUTTON_LOW_US,
        button_high_us: BUTTON_HIGH_US,
        poll_interval_ms: POLL_INTERVAL_MS,
    };

    /// Create a new configuration with validation
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sync_threshold_us: u32,
        signal_timeout_ms: u32,
        channel_range_us: (u16, u16, u16),
        clamp_margin_us: u16,
        stick_deadzone: i16,
        button_thresholds_us: (u16, u16),
        poll_interval_ms: u32,
    ) -> Result<Self, ConfigError> {
        let (channel_min_us, channel_mid_us, channel_max_us) = channel_range_us;
        let (button_low_us, button_high_us) = button_thresholds_us;

        if !(channel_min_us < channel_mid_us && channel_mid_us < channel_max_us) {
            return Err(ConfigError::ChannelRange);
        }
        if !(button_low_us < channel_mid_us && channel_mid_us < button_high_us) {
            return Err(ConfigError::ButtonThresholds);
        }
        if sync_threshold_us <= u32::from(channel_max_us) + u32::from(clamp_margin_us) {
            return Err(ConfigError::SyncThreshold);
        }
        if !(0..100).contains(&stick_deadzone) {
            return Err(ConfigError::Deadzone);
        }
        if signal_timeout_ms == 0 || poll_interval_ms == 0 {
            return Err(ConfigError::Timing);
        }

        Ok(Self {
            sync_threshold_us,
            signal_timeout_ms,
            channel_min_us,
            channel_mid_us,
            channel_max_us,
            clamp_margin_us,
            stick_deadzone,
            button_low_us,
            button_high_us,
            poll_interval_ms,
        })
    }

    pub const fn sync_threshold_us(&self) -> u32 {
        self.sync_threshold_us
    }

    pub const fn signal_timeout_ms(&self) -> u32 {
        self.signal_timeout_ms
    }

    pub const fn channel_min_us(&self) -> u16 {
        self.channel_min_us
    }

    /// Neutral pulse width
    pub const fn channel_mid_us(&self) -> u16 {
        self.channel_mid_us
    }

    pub const fn channel_max_us(&self) -> u16 {
        self.channel_max_us
    }

    pub const fn clamp_margin_us(&self) -> u16 {
        self.clamp_margin_us
    }

    pub const fn stick_deadzone(&self) -> i16 {
        self.stick_deadzone
    }

    /// Button pulses shorter than this press the top button
    pub const fn button_low_us(&self) -> u16 {
        self.button_low_us
    }

    /// Button pulses longer than this press the bottom button
    pub const fn button_high_us(&self) -> u16 {
        self.button_high_us
    }

    pub const fn poll_interval_ms(&self) -> u32 {
        self.poll_interval_ms
    }

    /// Lowest pulse width stored by the decoder
    pub const fn clamp_floor_us(&self) -> u16 {
        self.channel_min_us.saturating_sub(self.clamp_margin_us)
    }

    /// Highest pulse width stored by the decoder
    pub const fn clamp_ceiling_us(&self) -> u16 {
        self.channel_max_us.saturating_add(self.clamp_margin_us)
    }

    /// Signal-loss timeout in microseconds
    pub const fn signal_timeout_us(&self) -> u32 {
        self.signal_timeout_ms.saturating_mul(1000)
    }
}
