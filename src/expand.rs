//! Expansion of sparse sequences into dense per-millisecond buffers.
//!
//! Hardware playback needs one sample per clock tick on every channel; a
//! sequence file only lists the instants where something changes. Expansion
//! bridges the two: for each millisecond it resolves the latest step whose
//! timestamp has been reached and emits that step's state, packed into one
//! digital word plus one analog level.
//!
//! The timeline is end-exclusive: a sequence whose last step is at `T` ms
//! expands to exactly `T` samples, with the final step's timestamp marking
//! the end of playback rather than emitting a sample of its own.

use std::fmt;

use tracing::{debug, enabled, Level};

use crate::pack::ChannelPacker;
use crate::sequence::{Sequence, TimeStep};

/// Dense sample buffers ready for clocked playback.
///
/// Both buffers have equal length and are indexed by millisecond offset from
/// the start trigger. Ownership transfers wholly to the caller; the playback
/// backend releases them after use.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTimeline {
    /// One packed digital word per sample: valve lines plus the piezo flag.
    pub digital: Vec<u32>,
    /// One analog LED level per sample, still unscaled.
    pub analog: Vec<f64>,
}

impl DenseTimeline {
    /// Number of samples, equal to the sequence's end timestamp.
    pub fn len(&self) -> usize {
        self.digital.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digital.is_empty()
    }
}

/// Fatal expansion failure. No partial buffers are ever returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// Nothing to play; callers must catch this before asking for playback.
    EmptySequence,
    /// Playback state would be undefined before the first step.
    FirstStepNotAtZero { time_ms: u32 },
    /// The sample buffers could not be allocated.
    Allocation { samples: usize },
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandError::EmptySequence => write!(f, "sequence contains no steps"),
            ExpandError::FirstStepNotAtZero { time_ms } => {
                write!(f, "first step must be at 0 ms, found {time_ms} ms")
            }
            ExpandError::Allocation { samples } => {
                write!(f, "failed to allocate sample buffers for {samples} samples")
            }
        }
    }
}

impl std::error::Error for ExpandError {}

/// Expand a sparse sequence into dense sample buffers.
///
/// Requires at least one step and a first step at 0 ms; both are checked up
/// front. Strictly increasing step timestamps are a precondition inherited
/// from the parser and are not re-validated here: the expansion loop is a
/// single forward merge pass and callers feeding unsorted steps get
/// undefined buffers, not a crash.
pub fn expand(sequence: &Sequence, packer: &ChannelPacker) -> Result<DenseTimeline, ExpandError> {
    let steps = sequence.steps();
    let last = steps.last().ok_or(ExpandError::EmptySequence)?;
    let first = &steps[0];
    if first.time_ms != 0 {
        return Err(ExpandError::FirstStepNotAtZero {
            time_ms: first.time_ms,
        });
    }

    let samples = last.time_ms as usize;
    let mut digital: Vec<u32> = Vec::new();
    let mut analog: Vec<f64> = Vec::new();
    digital
        .try_reserve_exact(samples)
        .map_err(|_| ExpandError::Allocation { samples })?;
    analog
        .try_reserve_exact(samples)
        .map_err(|_| ExpandError::Allocation { samples })?;

    let trace = enabled!(Level::DEBUG);
    if trace {
        debug!("sample | source ts |  led  | piezo | digital word");
    }

    let mut cursor = 0usize;
    let mut lines = Vec::with_capacity(sequence.valve_count() + 1);
    collect_lines(&mut lines, first);

    for i in 0..samples as u32 {
        while cursor + 1 < steps.len() && steps[cursor + 1].time_ms <= i {
            cursor += 1;
            collect_lines(&mut lines, &steps[cursor]);
        }
        let step = &steps[cursor];
        let word = packer.pack(&lines);
        digital.push(word);
        analog.push(step.led_level as f64);

        if trace {
            debug!(
                "{i:>6} | {:>9} | {:>5} | {:>5} | {word:#010b}",
                step.time_ms, step.led_level, step.piezo as u8
            );
        }
    }

    Ok(DenseTimeline { digital, analog })
}

/// Channel states of one step in packing order: valves first, piezo last.
fn collect_lines(lines: &mut Vec<bool>, step: &TimeStep) {
    lines.clear();
    lines.extend_from_slice(&step.valves);
    lines.push(step.piezo);
}
