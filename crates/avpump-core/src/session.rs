//! Demux session: one decode pump per logical stream.
//!
//! A session replaces process-wide stream state with an explicit
//! object created at stream-open time. Each stream gets its own engine,
//! sink, and planar policy, selected once when the stream is opened and
//! never re-checked per unit. Sinks must be distinct destinations;
//! nothing is shared between the per-stream pumps.

use std::collections::HashMap;

use crate::engine::{DecodeEngine, Sink};
use crate::error::{Error, Result};
use crate::frame::Shape;
use crate::pump::{DecodePump, PlanarPolicy};
use crate::unit::CodedUnit;

type StreamPump = DecodePump<Box<dyn DecodeEngine>, Box<dyn Sink>>;

/// Per-stream totals reported after a session finishes.
#[derive(Debug)]
pub struct StreamSummary {
    /// Demuxed stream index.
    pub index: usize,
    /// Shape locked from the stream's first decoded unit.
    pub shape: Option<Shape>,
    /// Raw units written to the stream's sink.
    pub units_written: u64,
}

/// Owns the pumps of one demux+decode run.
#[derive(Default)]
pub struct Session {
    streams: HashMap<usize, StreamPump>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a decode pump for stream `index`.
    pub fn open_stream(
        &mut self,
        index: usize,
        engine: Box<dyn DecodeEngine>,
        sink: Box<dyn Sink>,
        policy: PlanarPolicy,
    ) -> Result<()> {
        if self.streams.contains_key(&index) {
            return Err(Error::config(format!("stream {index} is already open")));
        }
        self.streams
            .insert(index, DecodePump::with_policy(engine, sink, policy));
        Ok(())
    }

    /// Whether stream `index` has a pump.
    pub fn is_open(&self, index: usize) -> bool {
        self.streams.contains_key(&index)
    }

    /// Route one demuxed unit to its stream's pump. Units for streams
    /// that were never opened are skipped, not errors. Returns the
    /// number of raw units written.
    pub fn route(&mut self, index: usize, unit: &CodedUnit) -> Result<usize> {
        match self.streams.get_mut(&index) {
            Some(pump) => pump.feed(unit),
            None => {
                tracing::trace!(stream = index, "skipping unit for unopened stream");
                Ok(0)
            }
        }
    }

    /// Flush every stream's pump, in stream-index order. Returns the
    /// total number of raw units written by the flushes.
    pub fn finish(&mut self) -> Result<usize> {
        let mut indices: Vec<usize> = self.streams.keys().copied().collect();
        indices.sort_unstable();
        let mut written = 0;
        for index in indices {
            let pump = self.streams.get_mut(&index).expect("index from keys");
            written += pump.finish()?;
        }
        Ok(written)
    }

    /// Per-stream totals, in stream-index order.
    pub fn summaries(&self) -> Vec<StreamSummary> {
        let mut out: Vec<StreamSummary> = self
            .streams
            .iter()
            .map(|(&index, pump)| StreamSummary {
                index,
                shape: pump.output_shape(),
                units_written: pump.units_written(),
            })
            .collect();
        out.sort_unstable_by_key(|s| s.index);
        out
    }
}
