//! Avpump-Core: a generic pump for push/pull codec engines.
//!
//! This crate provides the reusable pieces behind the avpump example
//! drivers:
//!
//! - `engine` - Contracts for decode/encode engines, unit parsers, and
//!   output sinks
//! - `pump` - The submit/drain loop with flush semantics and
//!   output-shape bookkeeping
//! - `feed` - Sliding-window feeding of a unit parser from a byte
//!   source
//! - `session` - One pump per demuxed stream behind a single object
//! - `vio` - Abstracted directory operations and an in-memory source
//! - `sim` - Trivial synthetic collaborators for demos and tests
//!
//! # Architecture
//!
//! The pump owns one engine and one sink and drives a single direction
//! of transformation. Each cycle submits one unit, then drains every
//! output the engine will give; `NeedsInput` and `Eof` end a drain as
//! success. A terminal `finish` sends the flush signal and drains to
//! exhaustion. The engine behind the trait is expected to come from an
//! external codec library; nothing in this crate parses or transforms
//! media itself.

pub mod engine;
pub mod error;
pub mod feed;
pub mod frame;
pub mod pump;
pub mod session;
pub mod sim;
pub mod unit;
pub mod vio;

pub use engine::{
    DecodeEngine, EncodeEngine, EngineError, IoSink, Retrieve, Sink, SubmitStatus, UnitParser,
};
pub use error::{Error, Result};
pub use feed::UnitFeeder;
pub use frame::{PixelFormat, RawUnit, SampleFormat, Shape};
pub use pump::{DecodePump, EncodePump, PlanarPolicy, PumpState};
pub use session::{Session, StreamSummary};
pub use unit::CodedUnit;
