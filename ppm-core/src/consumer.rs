//! Polling frame consumer with signal-loss failsafe

use crate::input::PpmInput;
use crate::mapping::derive_report;
use crate::types::{ChannelReport, PpmConfig, RawFrame};

/// Radio link status as seen by the consumer
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Frames arriving within the timeout
    Up,
    /// No frame within the timeout
    Lost,
}

/// Outcome of one consumer cycle
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollResult {
    /// Link lost; `age_ms` is the time since the last frame, `None` if no
    /// frame was ever received
    SignalLost { age_ms: Option<u32> },
    /// Derived values from the latest snapshot
    Report(ChannelReport),
}

/// Frame consumer
///
/// Owns the local copy of the raw frame. All computation happens on that
/// copy, outside any critical section.
pub struct FrameConsumer {
    config: PpmConfig,
    snapshot: RawFrame,
    link: LinkState,
    output: ChannelReport,
    last_poll_us: Option<u32>,
    /// Time since the last frame, carried across polls while the link is lost
    loss_age_us: Option<u32>,
}

impl FrameConsumer {
    /// Create new consumer; the link starts out lost
    pub fn new(config: PpmConfig) -> Self {
        Self {
            config,
            snapshot: RawFrame::neutral(),
            link: LinkState::Lost,
            output: ChannelReport::failsafe(),
            last_poll_us: None,
            loss_age_us: None,
        }
    }

    /// Run one consumer cycle
    ///
    /// `now_us` must come from the same free-running microsecond counter the
    /// edge interrupt uses.
    pub fn poll(&mut self, input: &PpmInput, now_us: u32) -> PollResult {
        let age_us = input.last_frame_us().map(|at| now_us.wrapping_sub(at));
        let stale = age_us.map_or(true, |age| age > self.config.signal_timeout_us());
        let since_poll_us = self.last_poll_us.map(|at| now_us.wrapping_sub(at));
        self.last_poll_us = Some(now_us);

        // After a loss only a newly completed frame brings the link back, so a
        // wrapped timestamp cannot fake a fresh one.
        if stale || (self.link == LinkState::Lost && !input.frame_pending()) {
            self.enter_failsafe();
            // Frame timestamps alias once the counter wraps; poll gaps do not
            let loss_age_us = match (self.loss_age_us, since_poll_us) {
                (Some(age), Some(elapsed)) => Some(age.saturating_add(elapsed)),
                _ => age_us,
            };
            self.loss_age_us = loss_age_us;
            return PollResult::SignalLost {
                age_ms: loss_age_us.map(|age| age / 1000),
            };
        }
        self.loss_age_us = None;

        if let Some(frame) = input.snapshot() {
            self.snapshot = frame;
        }

        if self.link == LinkState::Lost {
            #[cfg(feature = "defmt")]
            defmt::info!("PPM link restored");
            self.link = LinkState::Up;
        }

        self.output = derive_report(&self.snapshot, &self.config);
        PollResult::Report(self.output)
    }

    fn enter_failsafe(&mut self) {
        if self.link == LinkState::Up {
            #[cfg(feature = "defmt")]
            defmt::warn!("PPM signal lost, outputs forced to failsafe");
            self.link = LinkState::Lost;
        }
        self.snapshot = RawFrame::neutral();
        self.output = ChannelReport::failsafe();
    }

    /// Latest derived values (failsafe while the link is lost)
    pub fn output(&self) -> &ChannelReport {
        &self.output
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    /// Local copy of the last raw frame taken from the decoder
    pub fn snapshot(&self) -> &RawFrame {
        &self.snapshot
    }

    /// Get current configuration
    pub fn config(&self) -> &PpmConfig {
        &self.config
    }
}

impl Default for FrameConsumer {
    fn default() -> Self {
        Self::new(PpmConfig::DEFAULT)
    }
}

/// Async task running the consumer and writing status lines to a sink
#[cfg(feature = "embassy-time")]
pub async fn consumer_task<S: crate::hal::StatusSink>(input: &PpmInput, sink: &mut S, config: PpmConfig) {
    use crate::report::StatusLine;
    use embassy_time::{Duration, Instant, Timer};

    let mut consumer = FrameConsumer::new(config);
    let interval = Duration::from_millis(u64::from(config.poll_interval_ms()));

    if sink.write_line(StatusLine::startup(&config).as_str()).is_err() {
        #[cfg(feature = "defmt")]
        defmt::warn!("Status sink rejected startup line");
    }

    loop {
        let now_us = Instant::now().as_micros() as u32;
        let result = consumer.poll(input, now_us);

        if sink.write_line(StatusLine::from_poll(&result).as_str()).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Status sink write failed");
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("Decoder stats: {:?}", input.stats());

        Timer::after(interval).await;
    }
}
