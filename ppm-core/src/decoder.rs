//! Edge-timing decoder and frame assembly state machine
//!
//! Runs in interrupt context. Every method here is bounded: no loops over
//! external state, no blocking, no allocation.

use crate::types::consts::CHANNEL_COUNT;
use crate::types::{Channel, EdgeEvent, Level, PpmConfig, RawFrame, SyncState};

/// PPM edge decoder
///
/// Pulse information lives in the width of each LOW pulse. The decoder
/// measures the time between consecutive edges and acts on the edge that
/// returns the line HIGH.
pub struct EdgeDecoder {
    config: PpmConfig,
    state: SyncState,
    /// Timestamp of the previous edge, `None` before the first edge
    last_edge_us: Option<u32>,
    /// Channels of the frame currently being captured
    working: RawFrame,
    /// Last complete frame
    published: RawFrame,
    frame_ready: bool,
    last_frame_us: Option<u32>,
}

impl EdgeDecoder {
    /// Create a new decoder with the given configuration
    pub const fn new(config: PpmConfig) -> Self {
        Self {
            config,
            state: SyncState::Searching,
            last_edge_us: None,
            working: RawFrame::neutral(),
            published: RawFrame::neutral(),
            frame_ready: false,
            last_frame_us: None,
        }
    }

    /// Process one edge of the signal line
    ///
    /// `now_us` is a free-running microsecond counter; wrap-around between
    /// two edges is handled.
    pub fn on_edge(&mut self, level: Level, now_us: u32) -> EdgeEvent {
        let duration = match self.last_edge_us {
            Some(last) => now_us.wrapping_sub(last),
            None => 0,
        };
        self.last_edge_us = Some(now_us);

        if level == Level::Low {
            return EdgeEvent::Ignored;
        }

        if duration >= self.config.sync_threshold_us() {
            let discarded = match self.state {
                SyncState::Capturing(n) => n,
                SyncState::Searching | SyncState::Complete => 0,
            };
            self.state = SyncState::Capturing(0);
            return EdgeEvent::Sync { discarded };
        }

        match self.state {
            SyncState::Searching => EdgeEvent::Unsynced,
            SyncState::Complete => EdgeEvent::Overrun,
            SyncState::Capturing(n) => {
                let index = n as usize;
                let (width, clamped) = self.clamp_width(duration);
                self.working.0[index] = width;

                if index + 1 == CHANNEL_COUNT {
                    self.published = self.working;
                    self.frame_ready = true;
                    self.last_frame_us = Some(now_us);
                    self.state = SyncState::Complete;
                    EdgeEvent::FrameComplete { width, clamped }
                } else {
                    self.state = SyncState::Capturing(n + 1);
                    EdgeEvent::Channel {
                        channel: Channel::ALL[index],
                        width,
                        clamped,
                    }
                }
            }
        }
    }

    /// Clamp a pulse to [min - margin, max + margin]
    fn clamp_width(&self, duration: u32) -> (u16, bool) {
        let floor = u32::from(self.config.clamp_floor_us());
        let ceiling = u32::from(self.config.clamp_ceiling_us());
        let width = duration.clamp(floor, ceiling);
        // ceiling fits in u16 by construction
        (width as u16, width != duration)
    }

    /// Take the published frame if one is ready, clearing the ready flag
    pub fn take_frame(&mut self) -> Option<RawFrame> {
        if self.frame_ready {
            self.frame_ready = false;
            Some(self.published)
        } else {
            None
        }
    }

    /// Returns true if a complete frame is waiting for the consumer
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    /// Timestamp of the most recent completed frame
    pub fn last_frame_us(&self) -> Option<u32> {
        self.last_frame_us
    }

    /// Get current frame assembly state
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Get current configuration
    pub fn config(&self) -> &PpmConfig {
        &self.config
    }

    /// Reset decoder to initial state
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

impl Default for EdgeDecoder {
    fn default() -> Self {
        Self::new(PpmConfig::DEFAULT)
    }
}
