//! Playback backends.
//!
//! Expansion hands two parallel sample buffers to a backend, which is
//! responsible for streaming them at the configured sample period, honoring
//! the rig's external start trigger, and reporting hardware failures back.
//! The DAQ itself stays behind [`StimulusOutput`]; the core never retries a
//! failed playback.
//!
//! [`SoftOutput`] is the software-timed stand-in used when no DAQ is
//! attached: it walks the timeline on the wall clock and logs every channel
//! write, so a sequence file can be rehearsed end to end at the bench.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::RigConfig;
use crate::expand::DenseTimeline;

/// Failure reported by a playback backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputError {
    pub backend: &'static str,
    pub message: String,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "playback failed on {}: {}", self.backend, self.message)
    }
}

impl std::error::Error for OutputError {}

/// A device capable of playing an expanded timeline.
///
/// Implementations receive complete, well-formed buffers; once `play`
/// returns, the timeline is no longer needed and the caller releases it.
pub trait StimulusOutput {
    /// Backend name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Play the whole timeline, blocking until generation completes or
    /// fails.
    fn play(&mut self, timeline: &DenseTimeline) -> Result<(), OutputError>;
}

/// Software-timed playback that logs instead of driving hardware.
pub struct SoftOutput {
    config: RigConfig,
}

impl SoftOutput {
    pub fn new(config: RigConfig) -> Self {
        Self { config }
    }
}

impl StimulusOutput for SoftOutput {
    fn name(&self) -> &'static str {
        "soft"
    }

    fn play(&mut self, timeline: &DenseTimeline) -> Result<(), OutputError> {
        let samples = timeline.len();
        if samples == 0 {
            info!("timeline is zero-length, nothing to play");
            return Ok(());
        }

        info!(
            "software playback: {samples} samples over {} ms",
            samples as u64 * self.config.sample_period_ms as u64
        );
        info!(
            "start trigger on {} is not wired in software mode, starting immediately",
            self.config.trigger_line
        );

        // The dense timeline repeats each word for as long as the state
        // holds; collapse the runs again so we sleep once per state instead
        // of once per sample.
        let mut i = 0usize;
        while i < samples {
            let word = timeline.digital[i];
            let level = timeline.analog[i];

            let mut j = i + 1;
            while j < samples && timeline.digital[j] == word && timeline.analog[j] == level {
                j += 1;
            }
            let hold_ms = (j - i) as u64 * self.config.sample_period_ms as u64;

            let volts = level.min(self.config.led_max_volts);
            debug!(
                "t={i:>6} ms: {}={word:#06x} {}={volts:.2} V, hold {hold_ms} ms",
                self.config.valves_port, self.config.led_channel
            );
            thread::sleep(Duration::from_millis(hold_ms));

            i = j;
        }

        info!("software playback finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_timeline_plays_immediately() {
        let timeline = DenseTimeline {
            digital: Vec::new(),
            analog: Vec::new(),
        };
        let mut out = SoftOutput::new(RigConfig::default());
        assert!(out.play(&timeline).is_ok());
    }

    #[test]
    fn short_timeline_plays_in_roughly_real_time() {
        let timeline = DenseTimeline {
            digital: vec![1, 1, 0, 0, 0],
            analog: vec![0.0, 0.0, 2.0, 2.0, 2.0],
        };
        let mut out = SoftOutput::new(RigConfig::default());

        let started = std::time::Instant::now();
        out.play(&timeline).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5));
    }
}
