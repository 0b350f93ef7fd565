//! The codec pump: drives a push/pull engine to exhaustion per unit.
//!
//! Both directions follow the same cycle: submit one input unit, then
//! drain every output the engine will give before the next submission.
//! `NeedsInput` and `Eof` end a drain as success. A terminal
//! [`DecodePump::finish`] / [`EncodePump::finish`] sends the flush
//! signal and drains until `Eof`; calling it again is a no-op.
//!
//! Any submit, retrieve, or sink failure latches the pump in
//! [`PumpState::Errored`]; the caller must stop driving it.

use crate::engine::{DecodeEngine, EncodeEngine, Retrieve, Sink, SubmitStatus};
use crate::error::{Error, Result};
use crate::frame::{RawUnit, Shape};
use crate::unit::CodedUnit;

/// Lifecycle state of a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// No pending submission; input is welcome.
    Ready,
    /// Flush signal sent, terminal drain in progress.
    Flushing,
    /// Terminal flush fully drained; no further submissions are valid.
    Done,
    /// A fatal error occurred; no further submissions are valid.
    Errored,
}

/// How a decode pump writes multi-plane (planar) audio to its sink.
///
/// The reference examples disagree: the elementary-stream audio
/// decoder interleaves channels into packed order, while the demuxing
/// example writes only the first channel and prints a warning. Both
/// behaviors are preserved here as an explicit choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanarPolicy {
    /// Emit only the first plane, surfacing a warning once per pump.
    #[default]
    FirstPlaneOnly,
    /// Interleave all channel planes into packed order before writing.
    Interleave,
}

/// Drives one decode engine: coded units in, raw payload bytes out.
pub struct DecodePump<E, S> {
    engine: E,
    sink: S,
    policy: PlanarPolicy,
    state: PumpState,
    shape: Option<Shape>,
    planar_warned: bool,
    units_fed: u64,
    units_written: u64,
}

impl<E: DecodeEngine, S: Sink> DecodePump<E, S> {
    /// Create a pump with the default planar policy.
    pub fn new(engine: E, sink: S) -> Self {
        Self::with_policy(engine, sink, PlanarPolicy::default())
    }

    /// Create a pump with an explicit planar policy.
    pub fn with_policy(engine: E, sink: S, policy: PlanarPolicy) -> Self {
        Self {
            engine,
            sink,
            policy,
            state: PumpState::Ready,
            shape: None,
            planar_warned: false,
            units_fed: 0,
            units_written: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// Shape locked from the first decoded unit, if any was produced.
    pub fn output_shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Coded units submitted so far.
    pub fn units_fed(&self) -> u64 {
        self.units_fed
    }

    /// Raw units written to the sink so far.
    pub fn units_written(&self) -> u64 {
        self.units_written
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear the pump apart, recovering the engine and sink.
    pub fn into_inner(self) -> (E, S) {
        (self.engine, self.sink)
    }

    /// Submit one coded unit and drain every raw unit it makes
    /// available, writing each to the sink. Returns the number of raw
    /// units written.
    pub fn feed(&mut self, unit: &CodedUnit) -> Result<usize> {
        self.check_ready()?;
        self.submit(unit)?;
        self.units_fed += 1;
        self.drain()
    }

    /// Send the flush signal and drain until the engine reports `Eof`.
    /// Idempotent: once the pump is `Done`, further calls return 0.
    pub fn finish(&mut self) -> Result<usize> {
        match self.state {
            PumpState::Done => return Ok(0),
            PumpState::Errored => {
                return Err(Error::Submit("pump is in an errored state".into()))
            }
            PumpState::Ready => {
                self.engine
                    .begin_flush()
                    .map_err(|e| self.fail(Error::Submit(e.to_string())))?;
                self.state = PumpState::Flushing;
            }
            PumpState::Flushing => {}
        }
        let written = self.drain()?;
        self.state = PumpState::Done;
        tracing::debug!(units = self.units_written, "decode pump drained to eof");
        Ok(written)
    }

    fn check_ready(&self) -> Result<()> {
        match self.state {
            PumpState::Ready => Ok(()),
            PumpState::Flushing | PumpState::Done => {
                Err(Error::Submit("submission after flush".into()))
            }
            PumpState::Errored => Err(Error::Submit("pump is in an errored state".into())),
        }
    }

    fn submit(&mut self, unit: &CodedUnit) -> Result<()> {
        match self.engine.submit(unit) {
            Ok(SubmitStatus::Accepted) => Ok(()),
            Ok(SubmitStatus::NeedsDrain) => {
                // Drain buffered output once, then try again.
                self.drain()?;
                match self.engine.submit(unit) {
                    Ok(SubmitStatus::Accepted) => Ok(()),
                    Ok(SubmitStatus::NeedsDrain) => Err(self.fail(Error::Submit(
                        "engine refused input after a full drain".into(),
                    ))),
                    Err(e) => Err(self.fail(Error::Submit(e.to_string()))),
                }
            }
            Err(e) => Err(self.fail(Error::Submit(e.to_string()))),
        }
    }

    fn drain(&mut self) -> Result<usize> {
        let mut written = 0;
        loop {
            match self.engine.retrieve() {
                Ok(Retrieve::Unit(unit)) => {
                    self.write_unit(&unit)?;
                    written += 1;
                    self.units_written += 1;
                }
                Ok(Retrieve::NeedsInput) | Ok(Retrieve::Eof) => break,
                Err(e) => return Err(self.fail(Error::Retrieve(e.to_string()))),
            }
        }
        Ok(written)
    }

    fn write_unit(&mut self, unit: &RawUnit) -> Result<()> {
        let shape = unit.shape();
        match self.shape {
            None => self.shape = Some(shape),
            Some(expected) if expected != shape => {
                return Err(self.fail(Error::FormatChange {
                    expected: expected.to_string(),
                    got: shape.to_string(),
                }));
            }
            Some(_) => {}
        }

        match shape {
            Shape::Audio { format, .. } => {
                if format.is_planar() && unit.plane_count() > 1 {
                    match self.policy {
                        PlanarPolicy::FirstPlaneOnly => {
                            if !self.planar_warned {
                                self.planar_warned = true;
                                tracing::warn!(
                                    "sample format {format} is planar; \
                                     writing the first channel only"
                                );
                            }
                            self.append(unit.plane_data(0))?;
                        }
                        PlanarPolicy::Interleave => {
                            let packed = unit.packed_bytes();
                            self.append(&packed)?;
                        }
                    }
                } else {
                    self.append(unit.plane_data(0))?;
                }
            }
            Shape::Video {
                format,
                width,
                height,
            } => {
                // Plane order, rows trimmed to the logical width so
                // stride padding never reaches the rawvideo sink.
                for i in 0..unit.plane_count() {
                    let (row_bytes, rows) = format.plane_size(i, width, height);
                    let plane = unit.plane(i);
                    if plane.stride() == row_bytes {
                        self.append(&plane.data()[..row_bytes * rows])?;
                    } else {
                        for row in 0..rows {
                            let start = row * plane.stride();
                            self.append(&plane.data()[start..start + row_bytes])?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink
            .append(bytes)
            .map_err(|e| self.fail(Error::Io(e)))
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = PumpState::Errored;
        err
    }
}

/// Drives one encode engine: raw units in, coded payload bytes out.
pub struct EncodePump<E, S> {
    engine: E,
    sink: S,
    state: PumpState,
    units_fed: u64,
    units_written: u64,
}

impl<E: EncodeEngine, S: Sink> EncodePump<E, S> {
    /// Create an encode pump.
    pub fn new(engine: E, sink: S) -> Self {
        Self {
            engine,
            sink,
            state: PumpState::Ready,
            units_fed: 0,
            units_written: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PumpState {
        self.state
    }

    /// Raw units submitted so far.
    pub fn units_fed(&self) -> u64 {
        self.units_fed
    }

    /// Coded units written to the sink so far.
    pub fn units_written(&self) -> u64 {
        self.units_written
    }

    /// Borrow the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear the pump apart, recovering the engine and sink.
    pub fn into_inner(self) -> (E, S) {
        (self.engine, self.sink)
    }

    /// Submit one raw unit and drain every coded unit it makes
    /// available, writing each payload to the sink.
    ///
    /// The unit is forced into a writable (exclusively owned) state
    /// first, so a caller that kept a clone of it can keep reading the
    /// old contents while this buffer is refilled for the next cycle.
    pub fn feed(&mut self, unit: &mut RawUnit) -> Result<usize> {
        match self.state {
            PumpState::Ready => {}
            PumpState::Flushing | PumpState::Done => {
                return Err(Error::Submit("submission after flush".into()))
            }
            PumpState::Errored => {
                return Err(Error::Submit("pump is in an errored state".into()))
            }
        }
        unit.make_writable();
        self.submit(unit)?;
        self.units_fed += 1;
        self.drain()
    }

    /// Send the flush signal and drain until the engine reports `Eof`.
    /// Idempotent once `Done`.
    pub fn finish(&mut self) -> Result<usize> {
        match self.state {
            PumpState::Done => return Ok(0),
            PumpState::Errored => {
                return Err(Error::Submit("pump is in an errored state".into()))
            }
            PumpState::Ready => {
                self.engine
                    .begin_flush()
                    .map_err(|e| self.fail(Error::Submit(e.to_string())))?;
                self.state = PumpState::Flushing;
            }
            PumpState::Flushing => {}
        }
        let written = self.drain()?;
        self.state = PumpState::Done;
        tracing::debug!(units = self.units_written, "encode pump drained to eof");
        Ok(written)
    }

    fn submit(&mut self, unit: &RawUnit) -> Result<()> {
        match self.engine.submit(unit) {
            Ok(SubmitStatus::Accepted) => Ok(()),
            Ok(SubmitStatus::NeedsDrain) => {
                self.drain()?;
                match self.engine.submit(unit) {
                    Ok(SubmitStatus::Accepted) => Ok(()),
                    Ok(SubmitStatus::NeedsDrain) => Err(self.fail(Error::Submit(
                        "engine refused input after a full drain".into(),
                    ))),
                    Err(e) => Err(self.fail(Error::Submit(e.to_string()))),
                }
            }
            Err(e) => Err(self.fail(Error::Submit(e.to_string()))),
        }
    }

    fn drain(&mut self) -> Result<usize> {
        let mut written = 0;
        loop {
            match self.engine.retrieve() {
                Ok(Retrieve::Unit(unit)) => {
                    self.sink
                        .append(unit.data())
                        .map_err(|e| self.fail(Error::Io(e)))?;
                    written += 1;
                    self.units_written += 1;
                }
                Ok(Retrieve::NeedsInput) | Ok(Retrieve::Eof) => break,
                Err(e) => return Err(self.fail(Error::Retrieve(e.to_string()))),
            }
        }
        Ok(written)
    }

    fn fail(&mut self, err: Error) -> Error {
        self.state = PumpState::Errored;
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, EngineResult};
    use crate::frame::SampleFormat;
    use crate::sim::{BufferingDecoder, EchoDecoder, EchoEncoder};

    fn unit(payload: &[u8]) -> CodedUnit {
        CodedUnit::new(payload.to_vec())
    }

    #[test]
    fn test_echo_scenario_three_units_in_order() {
        // Engine echoes each submission as one raw unit of equal size;
        // flush produces nothing further.
        let engine = EchoDecoder::audio(SampleFormat::S16, 2, 44100);
        let mut pump = DecodePump::new(engine, Vec::new());

        assert_eq!(pump.feed(&unit(&[1, 2, 3, 4])).unwrap(), 1);
        assert_eq!(pump.feed(&unit(&[5, 6, 7, 8])).unwrap(), 1);
        assert_eq!(pump.feed(&unit(&[9, 10, 11, 12])).unwrap(), 1);
        assert_eq!(pump.finish().unwrap(), 0);
        assert_eq!(pump.state(), PumpState::Done);
        assert_eq!(pump.units_written(), 3);

        let (mut engine, sink) = pump.into_inner();
        assert_eq!(sink, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        // Draining was exhaustive: the engine has nothing left.
        assert!(matches!(engine.retrieve().unwrap(), Retrieve::Eof));
    }

    #[test]
    fn test_buffering_engine_emits_everything_at_flush() {
        let engine = BufferingDecoder::audio(SampleFormat::S16, 1, 8000);
        let mut pump = DecodePump::new(engine, Vec::new());

        assert_eq!(pump.feed(&unit(&[1, 2])).unwrap(), 0);
        assert_eq!(pump.feed(&unit(&[3, 4])).unwrap(), 0);
        assert_eq!(pump.feed(&unit(&[5, 6])).unwrap(), 0);

        // Nothing reaches the sink before the flush signal.
        assert!(pump.sink().is_empty());

        assert_eq!(pump.finish().unwrap(), 3);
        let (_, sink) = pump.into_inner();
        assert_eq!(sink, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let engine = EchoDecoder::audio(SampleFormat::S16, 1, 8000);
        let mut pump = DecodePump::new(engine, Vec::new());
        pump.feed(&unit(&[0, 1])).unwrap();
        pump.finish().unwrap();
        assert_eq!(pump.state(), PumpState::Done);
        // Done -> Done is a no-op, not an error.
        assert_eq!(pump.finish().unwrap(), 0);
        assert_eq!(pump.state(), PumpState::Done);
    }

    #[test]
    fn test_feed_after_finish_is_rejected() {
        let engine = EchoDecoder::audio(SampleFormat::S16, 1, 8000);
        let mut pump = DecodePump::new(engine, Vec::new());
        pump.finish().unwrap();
        let err = pump.feed(&unit(&[0, 1])).unwrap_err();
        assert!(matches!(err, Error::Submit(_)));
        // Caller misuse does not demote Done to Errored.
        assert_eq!(pump.state(), PumpState::Done);
    }

    /// Emits a unit of a different shape on the second retrieval.
    struct ShapeShift {
        pending: Vec<RawUnit>,
        flushed: bool,
    }

    impl ShapeShift {
        fn new() -> Self {
            Self {
                pending: Vec::new(),
                flushed: false,
            }
        }
    }

    impl DecodeEngine for ShapeShift {
        fn submit(&mut self, _unit: &CodedUnit) -> EngineResult<SubmitStatus> {
            let rate = if self.pending.is_empty() { 44100 } else { 48000 };
            let mut raw = RawUnit::alloc_audio(SampleFormat::S16, 1, rate, 2);
            raw.plane_mut(0).copy_from_slice(&[0xEE; 4]);
            self.pending.push(raw);
            Ok(SubmitStatus::Accepted)
        }

        fn begin_flush(&mut self) -> EngineResult<()> {
            self.flushed = true;
            Ok(())
        }

        fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>> {
            if self.pending.is_empty() {
                if self.flushed {
                    Ok(Retrieve::Eof)
                } else {
                    Ok(Retrieve::NeedsInput)
                }
            } else {
                Ok(Retrieve::Unit(self.pending.remove(0)))
            }
        }
    }

    #[test]
    fn test_format_change_is_fatal_before_output() {
        let mut pump = DecodePump::new(ShapeShift::new(), Vec::new());
        assert_eq!(pump.feed(&unit(&[0])).unwrap(), 1);

        let err = pump.feed(&unit(&[0])).unwrap_err();
        assert!(matches!(err, Error::FormatChange { .. }));
        assert_eq!(pump.state(), PumpState::Errored);

        // No byte of the offending unit reached the sink.
        let (_, sink) = pump.into_inner();
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn test_errored_pump_rejects_everything() {
        let mut pump = DecodePump::new(ShapeShift::new(), Vec::new());
        pump.feed(&unit(&[0])).unwrap();
        pump.feed(&unit(&[0])).unwrap_err();
        assert!(matches!(
            pump.feed(&unit(&[0])).unwrap_err(),
            Error::Submit(_)
        ));
        assert!(matches!(pump.finish().unwrap_err(), Error::Submit(_)));
    }

    /// Refuses the first submission until its buffered unit is drained.
    struct GrumpyEngine {
        buffered: Option<RawUnit>,
        accepted: usize,
        flushed: bool,
    }

    impl GrumpyEngine {
        fn new() -> Self {
            let mut raw = RawUnit::alloc_audio(SampleFormat::U8, 1, 8000, 2);
            raw.plane_mut(0).copy_from_slice(&[7, 8]);
            Self {
                buffered: Some(raw),
                accepted: 0,
                flushed: false,
            }
        }
    }

    impl DecodeEngine for GrumpyEngine {
        fn submit(&mut self, unit: &CodedUnit) -> EngineResult<SubmitStatus> {
            if self.buffered.is_some() {
                return Ok(SubmitStatus::NeedsDrain);
            }
            let mut raw = RawUnit::alloc_audio(SampleFormat::U8, 1, 8000, unit.len());
            raw.plane_mut(0).copy_from_slice(unit.data());
            self.buffered = Some(raw);
            self.accepted += 1;
            Ok(SubmitStatus::Accepted)
        }

        fn begin_flush(&mut self) -> EngineResult<()> {
            self.flushed = true;
            Ok(())
        }

        fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>> {
            match self.buffered.take() {
                Some(raw) => Ok(Retrieve::Unit(raw)),
                None if self.flushed => Ok(Retrieve::Eof),
                None => Ok(Retrieve::NeedsInput),
            }
        }
    }

    #[test]
    fn test_needs_drain_is_drained_then_resubmitted() {
        let mut pump = DecodePump::new(GrumpyEngine::new(), Vec::new());
        // The pre-buffered unit comes out first, then the echoed one.
        assert_eq!(pump.feed(&unit(&[9, 9])).unwrap(), 2);
        pump.finish().unwrap();
        let (engine, sink) = pump.into_inner();
        assert_eq!(engine.accepted, 1);
        assert_eq!(sink, vec![7, 8, 9, 9]);
    }

    /// Fails on every retrieval.
    struct BrokenRetrieve;

    impl DecodeEngine for BrokenRetrieve {
        fn submit(&mut self, _unit: &CodedUnit) -> EngineResult<SubmitStatus> {
            Ok(SubmitStatus::Accepted)
        }

        fn begin_flush(&mut self) -> EngineResult<()> {
            Ok(())
        }

        fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>> {
            Err(EngineError::new("bad state"))
        }
    }

    #[test]
    fn test_retrieve_failure_is_fatal_with_stage() {
        let mut pump = DecodePump::new(BrokenRetrieve, Vec::new());
        let err = pump.feed(&unit(&[0])).unwrap_err();
        assert!(matches!(err, Error::Retrieve(_)));
        assert_eq!(pump.state(), PumpState::Errored);
    }

    #[test]
    fn test_planar_first_plane_only() {
        let engine = EchoDecoder::audio(SampleFormat::U8p, 2, 8000);
        let mut pump =
            DecodePump::with_policy(engine, Vec::new(), PlanarPolicy::FirstPlaneOnly);
        // Payload deinterleaves as ch0=[1,3], ch1=[2,4].
        pump.feed(&unit(&[1, 2, 3, 4])).unwrap();
        pump.finish().unwrap();
        let (_, sink) = pump.into_inner();
        assert_eq!(sink, vec![1, 3]);
    }

    #[test]
    fn test_planar_interleave() {
        let engine = EchoDecoder::audio(SampleFormat::U8p, 2, 8000);
        let mut pump = DecodePump::with_policy(engine, Vec::new(), PlanarPolicy::Interleave);
        pump.feed(&unit(&[1, 2, 3, 4])).unwrap();
        pump.finish().unwrap();
        let (_, sink) = pump.into_inner();
        assert_eq!(sink, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_encode_pump_orders_payloads_and_forces_cow() {
        let engine = EchoEncoder::new();
        let mut pump = EncodePump::new(engine, Vec::new());

        let mut raw = RawUnit::alloc_audio(SampleFormat::U8, 1, 8000, 2);
        raw.plane_mut(0).copy_from_slice(&[1, 2]);
        let held = raw.clone();
        assert!(!raw.is_writable());

        assert_eq!(pump.feed(&mut raw).unwrap(), 1);
        // The pump forced a private copy for the next refill cycle.
        assert!(raw.is_writable());
        assert_eq!(held.plane_data(0), &[1, 2]);

        raw.plane_mut(0).copy_from_slice(&[3, 4]);
        pump.feed(&mut raw).unwrap();
        assert_eq!(pump.finish().unwrap(), 0);
        assert_eq!(pump.finish().unwrap(), 0);

        let (_, sink) = pump.into_inner();
        // Each payload carries the length-prefix framing of the sim
        // elementary stream.
        assert_eq!(sink, vec![0, 2, 1, 2, 0, 2, 3, 4]);
        assert_eq!(held.plane_data(0), &[1, 2]);
    }
}
