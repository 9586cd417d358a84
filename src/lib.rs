//! # Stimseq - Stimulus Sequence Engine
//!
//! Stimseq drives a stimulus-delivery rig (odor valves, a piezo trigger
//! line, an LED) from a human-authored sequence file. All channels share one
//! millisecond clock and start together on the rig's external trigger.
//!
//! ## Pipeline
//!
//! 1. [`sequence`] parses the line-oriented CSV file into an ordered list of
//!    sparse time steps, one record per instant where any channel changes.
//! 2. [`expand`] turns the sparse steps into dense per-millisecond sample
//!    buffers, holding each state forward until the next step.
//! 3. [`pack`] folds the boolean channels of each sample into one digital
//!    word under the rig's bit-order convention.
//! 4. [`output`] streams the finished buffers; real DAQ hardware lives
//!    behind its [`output::StimulusOutput`] trait.
//!
//! [`config`] describes the rig (valve count, wiring routes, timing rules)
//! and [`plot`] renders a sequence preview for eyeballing before a run.
//!
//! ## Quick start
//!
//! ```
//! use stimseq::expand::expand;
//! use stimseq::pack::{BitOrder, ChannelPacker};
//! use stimseq::sequence::{parse_records, ParseOptions};
//!
//! let text = "\
//! * time, V1..V8, LED, piezo
//! 0,0,0,0,0,0,0,0,0,0,0
//! 250,1,0,0,0,0,0,0,0,5,0
//! 500,0,0,0,0,0,0,0,0,0,0
//! ";
//!
//! let options = ParseOptions::default();
//! let (sequence, report) = parse_records(text, &options);
//! assert_eq!(sequence.len(), 3);
//! assert_eq!(report.comment_lines, 1);
//!
//! // 8 valve lines plus the piezo flag per digital word.
//! let packer = ChannelPacker::new(9, BitOrder::LittleEndian).unwrap();
//! let timeline = expand(&sequence, &packer).unwrap();
//!
//! assert_eq!(timeline.len(), 500);
//! assert_eq!(timeline.digital[0], 0);
//! assert_eq!(timeline.digital[250], 0b1_0000_0000);
//! assert_eq!(timeline.analog[250], 5.0);
//! ```

pub mod config;
pub mod expand;
pub mod output;
pub mod pack;
pub mod plot;
pub mod sequence;
