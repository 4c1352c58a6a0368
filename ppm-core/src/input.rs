//! Interrupt-safe PPM input shared between the edge interrupt and the consumer

use core::cell::RefCell;
use critical_section::Mutex;
use portable_atomic::{AtomicU32, Ordering};

use crate::decoder::EdgeDecoder;
use crate::types::{EdgeEvent, Level, PpmConfig, RawFrame, SyncState};

/// Decoder counters, readable without a critical section
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    /// Completed frames
    pub frames: u32,
    /// Sync gaps observed
    pub syncs: u32,
    /// Frames dropped because a sync arrived before the last channel
    pub partial_frames: u32,
    /// Channel pulses clamped into the envelope
    pub clamped_pulses: u32,
    /// Pulses after a complete frame and before the next sync
    pub overrun_pulses: u32,
    /// Pulses seen before the first sync
    pub unsynced_pulses: u32,
}

struct AtomicStats {
    frames: AtomicU32,
    syncs: AtomicU32,
    partial_frames: AtomicU32,
    clamped_pulses: AtomicU32,
    overrun_pulses: AtomicU32,
    unsynced_pulses: AtomicU32,
}

impl AtomicStats {
    const fn new() -> Self {
        Self {
            frames: AtomicU32::new(0),
            syncs: AtomicU32::new(0),
            partial_frames: AtomicU32::new(0),
            clamped_pulses: AtomicU32::new(0),
            overrun_pulses: AtomicU32::new(0),
            unsynced_pulses: AtomicU32::new(0),
        }
    }

    fn record(&self, event: EdgeEvent) {
        let bump = |counter: &AtomicU32| {
            counter.fetch_add(1, Ordering::Relaxed);
        };

        match event {
            EdgeEvent::Ignored => {}
            EdgeEvent::Sync { discarded } => {
                bump(&self.syncs);
                if discarded > 0 {
                    bump(&self.partial_frames);
                }
            }
            EdgeEvent::Channel { clamped, .. } => {
                if clamped {
                    bump(&self.clamped_pulses);
                }
            }
            EdgeEvent::FrameComplete { clamped, .. } => {
                if clamped {
                    bump(&self.clamped_pulses);
                }
                bump(&self.frames);
            }
            EdgeEvent::Overrun => bump(&self.overrun_pulses),
            EdgeEvent::Unsynced => bump(&self.unsynced_pulses),
        }
    }

    fn load(&self) -> DecoderStats {
        DecoderStats {
            frames: self.frames.load(Ordering::Relaxed),
            syncs: self.syncs.load(Ordering::Relaxed),
            partial_frames: self.partial_frames.load(Ordering::Relaxed),
            clamped_pulses: self.clamped_pulses.load(Ordering::Relaxed),
            overrun_pulses: self.overrun_pulses.load(Ordering::Relaxed),
            unsynced_pulses: self.unsynced_pulses.load(Ordering::Relaxed),
        }
    }
}

/// PPM input state management
///
/// Meant to live in a `static`. The edge interrupt is the only caller of
/// [`PpmInput::on_edge`]; the consumer reads through [`PpmInput::snapshot`]
/// and [`PpmInput::last_frame_us`], which hold a critical section only for a
/// fixed-size copy.
pub struct PpmInput {
    decoder: Mutex<RefCell<EdgeDecoder>>,
    stats: AtomicStats,
}

impl PpmInput {
    /// Create new PPM input with the build-time configuration
    pub const fn new() -> Self {
        Self::with_config(PpmConfig::DEFAULT)
    }

    pub const fn with_config(config: PpmConfig) -> Self {
        Self {
            decoder: Mutex::new(RefCell::new(EdgeDecoder::new(config))),
            stats: AtomicStats::new(),
        }
    }

    /// Feed one signal edge (called from interrupt handler)
    ///
    /// `level` is the line level after the edge, `now_us` a free-running
    /// microsecond counter.
    pub fn on_edge(&self, level: Level, now_us: u32) -> EdgeEvent {
        let event = critical_section::with(|cs| self.decoder.borrow_ref_mut(cs).on_edge(level, now_us));
        self.stats.record(event);
        event
    }

    /// Feed one edge timestamped with the embassy clock
    #[cfg(feature = "embassy-time")]
    pub fn on_edge_now(&self, level: Level) -> EdgeEvent {
        let now_us = embassy_time::Instant::now().as_micros() as u32;
        self.on_edge(level, now_us)
    }

    /// Copy out the latest complete frame and clear the ready flag
    ///
    /// Returns `None` when no new frame completed since the last snapshot.
    /// This is the only point where raw channel data leaves the decoder.
    pub fn snapshot(&self) -> Option<RawFrame> {
        critical_section::with(|cs| self.decoder.borrow_ref_mut(cs).take_frame())
    }

    /// Check for a pending frame without consuming it
    pub fn frame_pending(&self) -> bool {
        critical_section::with(|cs| self.decoder.borrow_ref(cs).frame_ready())
    }

    /// Timestamp of the most recent completed frame
    pub fn last_frame_us(&self) -> Option<u32> {
        critical_section::with(|cs| self.decoder.borrow_ref(cs).last_frame_us())
    }

    /// Current frame assembly state
    pub fn sync_state(&self) -> SyncState {
        critical_section::with(|cs| self.decoder.borrow_ref(cs).state())
    }

    pub fn config(&self) -> PpmConfig {
        critical_section::with(|cs| *self.decoder.borrow_ref(cs).config())
    }

    /// Current decoder counters
    pub fn stats(&self) -> DecoderStats {
        self.stats.load()
    }
}

impl Default for PpmInput {
    fn default() -> Self {
        Self::new()
    }
}
