//! Contracts between the pump and its external collaborators.
//!
//! The pump is format-agnostic: it knows the push/pull shape of these
//! traits, never how a collaborator does its work. A real codec
//! library is wired in by implementing [`DecodeEngine`] /
//! [`EncodeEngine`] over it; the [`crate::sim`] module provides
//! trivial synthetic implementations for tests and demos.

use std::fs::File;
use std::io::{self, Write};

use thiserror::Error;

use crate::frame::RawUnit;
use crate::unit::CodedUnit;

/// Opaque failure reported by an engine or parser. The pump wraps it
/// with the stage (submit / retrieve / parse) that observed it.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    /// Create an engine error.
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Result type for engine and parser calls.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Outcome of submitting input to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Input accepted; buffered output may now be available.
    Accepted,
    /// Engine holds output that must be drained before it will accept
    /// this input again.
    NeedsDrain,
}

/// Outcome of asking an engine for its next output unit.
///
/// `NeedsInput` and `Eof` end a drain loop; both are success, never
/// failure.
#[derive(Debug)]
pub enum Retrieve<T> {
    /// One output unit.
    Unit(T),
    /// Nothing buffered; submit more input first.
    NeedsInput,
    /// Terminal: the flush signal has been fully drained.
    Eof,
}

/// A stateful transform from compressed to raw data.
pub trait DecodeEngine {
    /// Push one coded unit into the engine.
    fn submit(&mut self, unit: &CodedUnit) -> EngineResult<SubmitStatus>;

    /// Signal that no more input will ever arrive.
    fn begin_flush(&mut self) -> EngineResult<()>;

    /// Pull the next decoded unit, if any.
    fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>>;
}

/// A stateful transform from raw to compressed data.
pub trait EncodeEngine {
    /// Push one raw unit into the engine.
    fn submit(&mut self, unit: &RawUnit) -> EngineResult<SubmitStatus>;

    /// Signal that no more input will ever arrive.
    fn begin_flush(&mut self) -> EngineResult<()>;

    /// Pull the next encoded unit, if any.
    fn retrieve(&mut self) -> EngineResult<Retrieve<CodedUnit>>;
}

/// Splits a raw byte stream into self-contained coded units.
pub trait UnitParser {
    /// Inspect `window` for one complete unit starting at its first
    /// byte. Returns the number of bytes consumed and, when enough
    /// bytes were available, the ready unit. `(0, None)` means more
    /// bytes are needed.
    fn parse(&mut self, window: &[u8]) -> EngineResult<(usize, Option<CodedUnit>)>;
}

/// An append-only byte destination. Bytes are written in the exact
/// order units are drained; the sink itself may buffer.
pub trait Sink {
    /// Append bytes to the destination.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl Sink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl Sink for File {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }
}

/// Adapter turning any [`Write`] (e.g. a `BufWriter`) into a [`Sink`].
pub struct IoSink<W>(pub W);

impl<W: Write> Sink for IoSink<W> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.write_all(bytes)
    }
}

impl<T: Sink + ?Sized> Sink for Box<T> {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).append(bytes)
    }
}

impl<T: Sink + ?Sized> Sink for &mut T {
    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).append(bytes)
    }
}

impl<T: DecodeEngine + ?Sized> DecodeEngine for Box<T> {
    fn submit(&mut self, unit: &CodedUnit) -> EngineResult<SubmitStatus> {
        (**self).submit(unit)
    }

    fn begin_flush(&mut self) -> EngineResult<()> {
        (**self).begin_flush()
    }

    fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>> {
        (**self).retrieve()
    }
}

impl<T: EncodeEngine + ?Sized> EncodeEngine for Box<T> {
    fn submit(&mut self, unit: &RawUnit) -> EngineResult<SubmitStatus> {
        (**self).submit(unit)
    }

    fn begin_flush(&mut self) -> EngineResult<()> {
        (**self).begin_flush()
    }

    fn retrieve(&mut self) -> EngineResult<Retrieve<CodedUnit>> {
        (**self).retrieve()
    }
}

impl<T: UnitParser + ?Sized> UnitParser for Box<T> {
    fn parse(&mut self, window: &[u8]) -> EngineResult<(usize, Option<CodedUnit>)> {
        (**self).parse(window)
    }
}
