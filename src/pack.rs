//! Packing of boolean channel states into digital sample words.
//!
//! The digital output port consumes one unsigned word per sample, with each
//! wired line mapped to a single bit. The wiring convention of the rig decides
//! which end of the channel list lands in the least-significant bit, so the
//! mapping is selected by [`BitOrder`] rather than hard-coded.
//!
//! Packing is a pure function of the channel states: no side effects, same
//! input always gives the same word.
//!
//! # Example
//!
//! ```
//! use stimseq::pack::{BitOrder, ChannelPacker};
//!
//! let packer = ChannelPacker::new(8, BitOrder::LittleEndian).unwrap();
//! let lines = [true, false, false, false, false, false, false, true];
//! assert_eq!(packer.pack(&lines), 0b1000_0001);
//! ```

use std::fmt;

use serde::Deserialize;

/// Number of bits in a packed sample word.
pub const WORD_BITS: usize = u32::BITS as usize;

/// Which end of the channel list maps to the least-significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BitOrder {
    /// The last-listed channel occupies bit 0.
    #[serde(rename = "little")]
    LittleEndian,
    /// The first-listed channel occupies bit 0.
    #[serde(rename = "big")]
    BigEndian,
}

/// Error building a [`ChannelPacker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// More channels requested than a sample word can hold.
    WidthTooLarge { width: usize },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::WidthTooLarge { width } => write!(
                f,
                "cannot pack {width} channels into a {WORD_BITS}-bit sample word"
            ),
        }
    }
}

impl std::error::Error for PackError {}

/// Packs a fixed-width list of channel states into one sample word.
///
/// The width is validated once at construction; oversized widths are a
/// configuration error, not something to discover per sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelPacker {
    width: usize,
    order: BitOrder,
}

impl ChannelPacker {
    /// Build a packer for `width` channels.
    pub fn new(width: usize, order: BitOrder) -> Result<Self, PackError> {
        if width > WORD_BITS {
            return Err(PackError::WidthTooLarge { width });
        }
        Ok(Self { width, order })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Pack `lines` into a single word under the configured bit order.
    ///
    /// `lines.len()` must equal the constructed width; a mismatch is a caller
    /// bug, not a runtime condition.
    pub fn pack(&self, lines: &[bool]) -> u32 {
        assert_eq!(
            lines.len(),
            self.width,
            "packer built for {} channels, got {}",
            self.width,
            lines.len()
        );

        let mut word = 0u32;
        match self.order {
            BitOrder::LittleEndian => {
                for (bit, &line) in lines.iter().rev().enumerate() {
                    if line {
                        word |= 1 << bit;
                    }
                }
            }
            BitOrder::BigEndian => {
                for (bit, &line) in lines.iter().enumerate() {
                    if line {
                        word |= 1 << bit;
                    }
                }
            }
        }
        word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_maps_last_channel_to_bit_zero() {
        let packer = ChannelPacker::new(8, BitOrder::LittleEndian).unwrap();
        let lines = [true, false, false, false, false, false, false, true];
        assert_eq!(packer.pack(&lines), 129);

        let lines = [true, false, false, false, false, false, false, false];
        assert_eq!(packer.pack(&lines), 128);
    }

    #[test]
    fn big_endian_maps_first_channel_to_bit_zero() {
        let packer = ChannelPacker::new(8, BitOrder::BigEndian).unwrap();
        let lines = [true, false, false, false, false, false, false, false];
        assert_eq!(packer.pack(&lines), 1);

        let lines = [false, true, false, false, false, false, false, false];
        assert_eq!(packer.pack(&lines), 2);
    }

    #[test]
    fn all_clear_and_all_set() {
        let packer = ChannelPacker::new(9, BitOrder::LittleEndian).unwrap();
        assert_eq!(packer.pack(&[false; 9]), 0);
        assert_eq!(packer.pack(&[true; 9]), 0b1_1111_1111);
    }

    #[test]
    fn single_channel_width() {
        let packer = ChannelPacker::new(1, BitOrder::LittleEndian).unwrap();
        assert_eq!(packer.pack(&[true]), 1);
        assert_eq!(packer.pack(&[false]), 0);
    }

    #[test]
    fn width_up_to_word_size_is_accepted() {
        assert!(ChannelPacker::new(WORD_BITS, BitOrder::LittleEndian).is_ok());
        assert_eq!(
            ChannelPacker::new(WORD_BITS + 1, BitOrder::LittleEndian),
            Err(PackError::WidthTooLarge {
                width: WORD_BITS + 1
            })
        );
    }

    #[test]
    fn little_endian_round_trip() {
        let width = 9;
        let packer = ChannelPacker::new(width, BitOrder::LittleEndian).unwrap();
        let lines = [true, false, true, true, false, false, true, false, true];
        let word = packer.pack(&lines);

        // Bit k corresponds to the channel at position width - 1 - k.
        for (pos, &line) in lines.iter().enumerate() {
            let bit = width - 1 - pos;
            assert_eq!((word >> bit) & 1 == 1, line, "channel {pos}");
        }
    }

    #[test]
    fn big_endian_round_trip() {
        let width = 9;
        let packer = ChannelPacker::new(width, BitOrder::BigEndian).unwrap();
        let lines = [true, false, true, true, false, false, true, false, true];
        let word = packer.pack(&lines);

        for (pos, &line) in lines.iter().enumerate() {
            assert_eq!((word >> pos) & 1 == 1, line, "channel {pos}");
        }
    }

    #[test]
    #[should_panic(expected = "packer built for 8 channels")]
    fn width_mismatch_is_a_caller_bug() {
        let packer = ChannelPacker::new(8, BitOrder::LittleEndian).unwrap();
        packer.pack(&[true, false]);
    }
}
