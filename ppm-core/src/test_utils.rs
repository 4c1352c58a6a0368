//! Test utilities for PPM decoding

#[cfg(feature = "test-utils")]
pub mod pulse_train {
    //! PPM signal simulation for testing

    use crate::decoder::EdgeDecoder;
    use crate::input::PpmInput;
    use crate::types::consts::CHANNEL_COUNT;
    use crate::types::{EdgeEvent, Level};
    use std::vec::Vec;

    /// HIGH separator between LOW pulses
    pub const SEPARATOR_US: u32 = 300;
    /// Sync gap used by [`PulseTrain::frame`]
    pub const DEFAULT_SYNC_US: u32 = 9_000;

    /// One edge of the simulated signal line
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Edge {
        /// Level after the edge
        pub level: Level,
        /// Microsecond timestamp, wraps like a hardware counter
        pub at_us: u32,
    }

    /// Builder for a timed sequence of edges
    #[derive(Debug, Clone)]
    pub struct PulseTrain {
        edges: Vec<Edge>,
        now_us: u32,
    }

    impl PulseTrain {
        /// Start a train with the line idling HIGH at `start_us`
        pub fn new(start_us: u32) -> Self {
            Self {
                edges: Vec::new(),
                now_us: start_us,
            }
        }

        /// LOW pulse of `width_us`, followed by the HIGH separator
        pub fn pulse(mut self, width_us: u32) -> Self {
            self.edges.push(Edge { level: Level::Low, at_us: self.now_us });
            self.now_us = self.now_us.wrapping_add(width_us);
            self.edges.push(Edge { level: Level::High, at_us: self.now_us });
            self.now_us = self.now_us.wrapping_add(SEPARATOR_US);
            self
        }

        /// Sync gap of `gap_us`
        pub fn sync(self, gap_us: u32) -> Self {
            self.pulse(gap_us)
        }

        /// Sync gap followed by one pulse per channel
        pub fn frame(self, channels: [u16; CHANNEL_COUNT]) -> Self {
            self.sync(DEFAULT_SYNC_US).channels(&channels)
        }

        /// Channel pulses without a leading sync
        pub fn channels(mut self, widths: &[u16]) -> Self {
            for &w in widths {
                self = self.pulse(u32::from(w));
            }
            self
        }

        /// Let the line idle HIGH
        pub fn idle(mut self, duration_us: u32) -> Self {
            self.now_us = self.now_us.wrapping_add(duration_us);
            self
        }

        /// Timestamp after the last generated edge
        pub fn now_us(&self) -> u32 {
            self.now_us
        }

        pub fn edges(&self) -> &[Edge] {
            &self.edges
        }

        /// Timestamp of the last rising edge (completion time of the last frame)
        pub fn last_rising_us(&self) -> Option<u32> {
            self.edges
                .iter()
                .rev()
                .find(|e| e.level == Level::High)
                .map(|e| e.at_us)
        }

        /// Drive every edge into a shared input
        pub fn feed(&self, input: &PpmInput) -> Vec<EdgeEvent> {
            self.edges.iter().map(|e| input.on_edge(e.level, e.at_us)).collect()
        }

        /// Drive every edge into a bare decoder
        pub fn feed_decoder(&self, decoder: &mut EdgeDecoder) -> Vec<EdgeEvent> {
            self.edges.iter().map(|e| decoder.on_edge(e.level, e.at_us)).collect()
        }
    }
}

#[cfg(feature = "test-utils")]
pub mod scenarios {
    //! Common signal scenarios

    use super::pulse_train::PulseTrain;
    use crate::types::consts::{CHANNEL_MAX_US, CHANNEL_MID_US, CHANNEL_MIN_US};

    /// Neutral sticks, no buttons
    pub const NEUTRAL: [u16; 6] = [CHANNEL_MID_US; 6];

    /// Full deflection on every stick, top then bottom button pressed
    pub const FULL_DEFLECTION: [u16; 6] = [
        CHANNEL_MIN_US,
        CHANNEL_MAX_US,
        CHANNEL_MIN_US,
        CHANNEL_MAX_US,
        900,
        1600,
    ];

    /// `count` identical frames at a 22.5 ms frame rate
    pub fn steady(start_us: u32, channels: [u16; 6], count: usize) -> PulseTrain {
        let mut train = PulseTrain::new(start_us);
        for _ in 0..count {
            let frame_start = train.now_us();
            train = train.frame(channels);
            let used = train.now_us().wrapping_sub(frame_start);
            train = train.idle(22_500u32.saturating_sub(used));
        }
        train
    }

    /// Complete frame, a truncated frame, then another complete frame
    pub fn truncated_frame(start_us: u32, channels: [u16; 6]) -> PulseTrain {
        PulseTrain::new(start_us)
            .frame(channels)
            .sync(9_000)
            .channels(&channels[..3])
            .frame(channels)
    }
}
