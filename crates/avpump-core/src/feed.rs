//! Feeds a unit parser from a byte source through a sliding window.
//!
//! The feeder keeps a fixed-size window over the source. Whenever the
//! unconsumed residual falls below [`REFILL_THRESHOLD`], the tail is
//! shifted to the window start (a move, not a reallocation) and fresh
//! bytes are appended after it, so the parser is never starved in the
//! middle of a unit. Chunk boundaries of the underlying source never
//! drop or duplicate bytes.

use std::io::Read;

use crate::engine::UnitParser;
use crate::error::{Error, Result};
use crate::unit::CodedUnit;

/// Size of the sliding window in bytes.
pub const WINDOW_SIZE: usize = 20480;

/// Low-water mark: refill once the residual drops below this.
pub const REFILL_THRESHOLD: usize = 4096;

/// Pulls coded units out of a growing byte window.
pub struct UnitFeeder<R, P> {
    source: R,
    parser: P,
    window: Vec<u8>,
    start: usize,
    len: usize,
    source_eof: bool,
}

impl<R: Read, P: UnitParser> UnitFeeder<R, P> {
    /// Create a feeder over `source` using `parser` for framing.
    pub fn new(source: R, parser: P) -> Self {
        Self {
            source,
            parser,
            window: vec![0u8; WINDOW_SIZE],
            start: 0,
            len: 0,
            source_eof: false,
        }
    }

    /// Unconsumed bytes currently buffered.
    pub fn residual(&self) -> usize {
        self.len
    }

    /// Produce the next coded unit, refilling from the source as
    /// needed. `Ok(None)` is a clean end of stream.
    pub fn next_unit(&mut self) -> Result<Option<CodedUnit>> {
        loop {
            if self.len < REFILL_THRESHOLD && !self.source_eof {
                self.refill()?;
            }
            if self.len == 0 {
                return Ok(None);
            }

            let window = &self.window[self.start..self.start + self.len];
            let (consumed, unit) = self
                .parser
                .parse(window)
                .map_err(|e| Error::Parse(e.to_string()))?;

            if consumed == 0 && unit.is_none() {
                // Parser needs more bytes than the residual holds.
                if self.len == WINDOW_SIZE {
                    return Err(Error::parse(format!(
                        "coded unit larger than the {WINDOW_SIZE}-byte feed window"
                    )));
                }
                if self.source_eof {
                    return Err(Error::parse(format!(
                        "truncated unit at end of stream ({} bytes unconsumed)",
                        self.len
                    )));
                }
                self.refill()?;
                continue;
            }

            debug_assert!(consumed <= self.len);
            self.start += consumed;
            self.len -= consumed;

            if let Some(unit) = unit {
                return Ok(Some(unit));
            }
        }
    }

    fn refill(&mut self) -> Result<()> {
        // Move the unconsumed tail to the window start, then append
        // freshly read bytes after it.
        self.window.copy_within(self.start..self.start + self.len, 0);
        self.start = 0;
        while self.len < WINDOW_SIZE {
            let n = self.source.read(&mut self.window[self.len..])?;
            if n == 0 {
                self.source_eof = true;
                break;
            }
            self.len += n;
        }
        tracing::trace!(residual = self.len, eof = self.source_eof, "window refilled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{frame_len_wrap, FrameLenParser};
    use crate::vio::MemorySource;

    fn stream(payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for p in payloads {
            out.extend_from_slice(&frame_len_wrap(p));
        }
        out
    }

    fn collect(mut feeder: UnitFeeder<MemorySource, FrameLenParser>) -> Vec<Vec<u8>> {
        let mut units = Vec::new();
        while let Some(unit) = feeder.next_unit().unwrap() {
            units.push(unit.data().to_vec());
        }
        units
    }

    #[test]
    fn test_units_across_tiny_source_chunks() {
        // Chunks far smaller than one unit: boundaries must not drop
        // or duplicate bytes.
        let payloads: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 300]).collect();
        let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
        let data = stream(&refs);

        let source = MemorySource::with_chunk_size(data, 7);
        let feeder = UnitFeeder::new(source, FrameLenParser);
        assert_eq!(collect(feeder), payloads);
    }

    #[test]
    fn test_units_larger_than_refill_threshold() {
        // One unit larger than the low-water mark forces mid-unit
        // refills.
        let big = vec![0x5A; REFILL_THRESHOLD * 2];
        let data = stream(&[big.as_slice(), &[1, 2, 3]]);

        let source = MemorySource::with_chunk_size(data, 1024);
        let feeder = UnitFeeder::new(source, FrameLenParser);
        let units = collect(feeder);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0], big);
        assert_eq!(units[1], vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_source_is_clean_eof() {
        let source = MemorySource::new(Vec::new());
        let mut feeder = UnitFeeder::new(source, FrameLenParser);
        assert!(feeder.next_unit().unwrap().is_none());
        // Asking again stays at eof.
        assert!(feeder.next_unit().unwrap().is_none());
    }

    #[test]
    fn test_truncated_trailing_unit_is_a_parse_error() {
        let mut data = stream(&[&[9, 9, 9][..]]);
        // Header promising 10 bytes with only 2 behind it.
        data.extend_from_slice(&[0, 10, 1, 2]);

        let source = MemorySource::with_chunk_size(data, 3);
        let mut feeder = UnitFeeder::new(source, FrameLenParser);
        assert_eq!(feeder.next_unit().unwrap().unwrap().data(), &[9, 9, 9]);
        assert!(matches!(feeder.next_unit(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_matches_fully_concatenated_parse() {
        // Feeding through chunked refills must produce exactly the
        // units the parser would yield on the whole stream at once.
        let payloads: Vec<Vec<u8>> = (1..20u8).map(|i| vec![i; i as usize * 13]).collect();
        let refs: Vec<&[u8]> = payloads.iter().map(|p| p.as_slice()).collect();
        let data = stream(&refs);

        let mut whole = Vec::new();
        let mut parser = FrameLenParser;
        let mut cursor = 0;
        while cursor < data.len() {
            let (consumed, unit) = parser.parse(&data[cursor..]).unwrap();
            cursor += consumed;
            whole.push(unit.unwrap().data().to_vec());
        }

        let source = MemorySource::with_chunk_size(data, 11);
        let feeder = UnitFeeder::new(source, FrameLenParser);
        assert_eq!(collect(feeder), whole);
    }
}
