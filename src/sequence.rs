//! Sequence file model and parser.
//!
//! A sequence file is line-oriented CSV with no header row. Each record
//! declares the full channel state taking effect at one instant and holding
//! until the next record:
//!
//! ```text
//! * timestamp, V1..V8, LED, Piezo
//! 0,0,0,0,0,0,0,0,0,0,0
//! 1000,1,0,0,0,0,0,0,0,5,0
//! 2000,0,0,0,0,0,0,0,0,0,1
//! 3000,0,0,0,0,0,0,0,0,0,0
//! ```
//!
//! Lines starting with `*` are comments. All fields are non-negative
//! integers; valve and piezo fields are boolean-interpreted (0 = off, any
//! nonzero = on). The last record marks the end of playback.
//!
//! The parser is tolerant of bad rows: a malformed record is skipped with a
//! warning and parsing continues. Structural problems (unreadable file) are
//! errors. Skipped-row and comment counts are reported alongside the parsed
//! sequence so callers can surface them.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// First character of a comment line.
pub const COMMENT_MARKER: char = '*';

/// Channel state taking effect at `time_ms` and holding until superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeStep {
    /// Milliseconds from sequence start.
    pub time_ms: u32,
    /// One state per valve line; length equals the configured valve count.
    pub valves: Vec<bool>,
    /// Analog LED level, not yet voltage-scaled.
    pub led_level: u32,
    /// Piezo trigger line state.
    pub piezo: bool,
}

/// An ordered list of time steps, sparse in time.
///
/// Steps are kept in input order with strictly increasing timestamps; the
/// parser enforces this, and expansion relies on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    valve_count: usize,
    steps: Vec<TimeStep>,
}

impl Sequence {
    /// Build a sequence directly from steps.
    ///
    /// Steps must be strictly increasing in `time_ms` and every step must
    /// carry `valve_count` valve states; sequences read from disk get this
    /// from the parser, and callers constructing steps by hand are expected
    /// to uphold it. Violations give undefined expansion results.
    pub fn from_steps(valve_count: usize, steps: Vec<TimeStep>) -> Self {
        Self { valve_count, steps }
    }

    pub fn valve_count(&self) -> usize {
        self.valve_count
    }

    pub fn steps(&self) -> &[TimeStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Timestamp of the final step, which marks the end of playback.
    pub fn end_time_ms(&self) -> Option<u32> {
        self.steps.last().map(|step| step.time_ms)
    }
}

/// Knobs the parser needs from the rig configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Number of valve fields expected per record.
    pub valve_count: usize,
    /// Minimum increment between consecutive accepted timestamps. Rows that
    /// come too early (or go backwards) are skipped with a warning.
    pub min_time_step_ms: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            valve_count: 8,
            min_time_step_ms: 1,
        }
    }
}

impl ParseOptions {
    /// Total comma-separated fields per record:
    /// timestamp + valves + LED level + piezo flag.
    pub fn fields_per_record(&self) -> usize {
        self.valve_count + 3
    }
}

/// Per-parse bookkeeping surfaced to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub comment_lines: usize,
    pub skipped_rows: usize,
}

/// Why a single row was rejected. Rejection never aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    FieldCount { found: usize, expected: usize },
    Field { index: usize, value: String },
    TimeStepTooSmall { time_ms: u32, min_next_ms: u32 },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::FieldCount { found, expected } => {
                write!(f, "expected {expected} fields, found {found}")
            }
            RowError::Field { index, value } => {
                write!(f, "field {index} is not a non-negative integer: {value:?}")
            }
            RowError::TimeStepTooSmall {
                time_ms,
                min_next_ms,
            } => {
                write!(
                    f,
                    "timestamp {time_ms} ms is below the minimum next step of {min_next_ms} ms"
                )
            }
        }
    }
}

/// Structural failure reading a sequence file.
#[derive(Debug)]
pub enum SequenceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::Io { path, source } => {
                write!(f, "cannot read sequence file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SequenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SequenceError::Io { source, .. } => Some(source),
        }
    }
}

/// Read and parse a sequence file.
///
/// Fails only on structural problems (the file cannot be read). A file whose
/// every row is rejected parses successfully to an empty sequence; callers
/// must treat that as "nothing to play" before expansion.
pub fn load_sequence(
    path: &Path,
    options: &ParseOptions,
) -> Result<(Sequence, ParseReport), SequenceError> {
    info!("parsing sequence file: {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| SequenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_records(&text, options))
}

/// Parse sequence records from text.
///
/// Pure apart from diagnostics: the same text and options always produce the
/// same sequence.
pub fn parse_records(text: &str, options: &ParseOptions) -> (Sequence, ParseReport) {
    let mut steps: Vec<TimeStep> = Vec::new();
    let mut report = ParseReport::default();

    for (line_no, raw) in text.lines().enumerate() {
        let line_no = line_no + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }
        if line.starts_with(COMMENT_MARKER) {
            info!("line {line_no}: comment skipped");
            report.comment_lines += 1;
            continue;
        }

        let step = match parse_record(line, options.valve_count) {
            Ok(step) => step,
            Err(err) => {
                warn!("line {line_no}: row skipped: {err}");
                report.skipped_rows += 1;
                continue;
            }
        };

        match steps.last() {
            Some(prev) => {
                // Accepted timestamps must advance by at least the configured
                // minimum; this also rejects rows that go backwards in time.
                let min_next_ms = prev.time_ms.saturating_add(options.min_time_step_ms);
                if step.time_ms < min_next_ms {
                    let err = RowError::TimeStepTooSmall {
                        time_ms: step.time_ms,
                        min_next_ms,
                    };
                    warn!("line {line_no}: row skipped: {err}");
                    report.skipped_rows += 1;
                    continue;
                }
            }
            None => {
                if step.time_ms != 0 {
                    // Kept as written; expansion rejects sequences that do
                    // not start at 0 ms.
                    warn!(
                        "line {line_no}: first step is at {} ms, playback requires 0",
                        step.time_ms
                    );
                }
            }
        }

        steps.push(step);
    }

    debug!(
        "parsed {} steps ({} comments, {} rows skipped)",
        steps.len(),
        report.comment_lines,
        report.skipped_rows
    );

    (Sequence::from_steps(options.valve_count, steps), report)
}

/// Parse one record line into a time step.
fn parse_record(line: &str, valve_count: usize) -> Result<TimeStep, RowError> {
    let expected = valve_count + 3;
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != expected {
        return Err(RowError::FieldCount {
            found: fields.len(),
            expected,
        });
    }

    let mut values = Vec::with_capacity(expected);
    for (index, field) in fields.iter().enumerate() {
        let value: u32 = field.parse().map_err(|_| RowError::Field {
            index,
            value: (*field).to_string(),
        })?;
        values.push(value);
    }

    let valves = values[1..=valve_count].iter().map(|&v| v != 0).collect();

    Ok(TimeStep {
        time_ms: values[0],
        valves,
        led_level: values[valve_count + 1],
        piezo: values[valve_count + 2] != 0,
    })
}
