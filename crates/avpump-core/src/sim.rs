//! Synthetic collaborators for demos and tests.
//!
//! None of these are codecs: the "decoders" reshape payload bytes into
//! raw units without transforming them, and the "encoder" packs raw
//! units back into payloads. They exist so the pump, feeder, and
//! session can be exercised end to end without linking a codec
//! library.
//!
//! Framing is a trivial length prefix (`u16` big-endian length, then
//! payload), with a one-byte stream tag in front of it for the demux
//! variant.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::engine::{
    DecodeEngine, EncodeEngine, EngineError, EngineResult, Retrieve, SubmitStatus, UnitParser,
};
use crate::frame::{PixelFormat, RawUnit, SampleFormat, Shape};
use crate::unit::CodedUnit;

/// Frame a payload for [`FrameLenParser`].
pub fn frame_len_wrap(payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= u16::MAX as usize, "payload too large to frame");
    let mut out = Vec::with_capacity(2 + payload.len());
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Frame a payload for [`StreamTagDemux`].
pub fn stream_tag_wrap(stream: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(3 + payload.len());
    out.push(stream);
    out.extend_from_slice(&frame_len_wrap(payload));
    out
}

/// Length-prefixed elementary-stream framing: `u16` big-endian length,
/// then that many payload bytes.
pub struct FrameLenParser;

impl UnitParser for FrameLenParser {
    fn parse(&mut self, window: &[u8]) -> EngineResult<(usize, Option<CodedUnit>)> {
        if window.len() < 2 {
            return Ok((0, None));
        }
        let need = u16::from_be_bytes([window[0], window[1]]) as usize;
        if window.len() < 2 + need {
            return Ok((0, None));
        }
        let unit = CodedUnit::new(Bytes::copy_from_slice(&window[2..2 + need]));
        Ok((2 + need, Some(unit)))
    }
}

/// Reshape a coded payload into a raw unit of `shape`, without
/// transforming the bytes. Planar audio deinterleaves the payload
/// across channel planes; video repeats the payload across plane
/// storage.
fn shape_payload(shape: Shape, payload: &[u8]) -> EngineResult<RawUnit> {
    match shape {
        Shape::Audio {
            format,
            channels,
            sample_rate,
        } => {
            let frame_bytes = format.bytes_per_sample() * channels as usize;
            if payload.is_empty() || payload.len() % frame_bytes != 0 {
                return Err(EngineError::new(format!(
                    "payload of {} bytes is not a whole number of {} frames",
                    payload.len(),
                    shape
                )));
            }
            let nb_samples = payload.len() / frame_bytes;
            let mut raw = RawUnit::alloc_audio(format, channels, sample_rate, nb_samples);
            if format.is_planar() {
                let bps = format.bytes_per_sample();
                for ch in 0..channels as usize {
                    for i in 0..nb_samples {
                        let src = (i * channels as usize + ch) * bps;
                        let plane = raw.plane_mut(ch);
                        plane[i * bps..(i + 1) * bps].copy_from_slice(&payload[src..src + bps]);
                    }
                }
            } else {
                raw.plane_mut(0).copy_from_slice(payload);
            }
            Ok(raw)
        }
        Shape::Video {
            format,
            width,
            height,
        } => {
            if payload.is_empty() {
                return Err(EngineError::new("empty video payload"));
            }
            let mut raw = RawUnit::alloc_video(format, width, height);
            for i in 0..raw.plane_count() {
                let plane = raw.plane_mut(i);
                for (j, byte) in plane.iter_mut().enumerate() {
                    *byte = payload[j % payload.len()];
                }
            }
            Ok(raw)
        }
    }
}

/// Emits one raw unit per submission, immediately.
pub struct EchoDecoder {
    shape: Shape,
    pending: VecDeque<RawUnit>,
    flushed: bool,
}

impl EchoDecoder {
    /// Echo decoder producing audio of the given shape.
    pub fn audio(format: SampleFormat, channels: u16, sample_rate: u32) -> Self {
        Self {
            shape: Shape::Audio {
                format,
                channels,
                sample_rate,
            },
            pending: VecDeque::new(),
            flushed: false,
        }
    }

    /// Echo decoder producing video frames of the given shape.
    pub fn video(format: PixelFormat, width: u32, height: u32) -> Self {
        Self {
            shape: Shape::Video {
                format,
                width,
                height,
            },
            pending: VecDeque::new(),
            flushed: false,
        }
    }
}

impl DecodeEngine for EchoDecoder {
    fn submit(&mut self, unit: &CodedUnit) -> EngineResult<SubmitStatus> {
        if self.flushed {
            return Err(EngineError::new("input after flush"));
        }
        let mut raw = shape_payload(self.shape, unit.data())?;
        raw.set_pts(unit.pts());
        self.pending.push_back(raw);
        Ok(SubmitStatus::Accepted)
    }

    fn begin_flush(&mut self) -> EngineResult<()> {
        self.flushed = true;
        Ok(())
    }

    fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>> {
        match self.pending.pop_front() {
            Some(raw) => Ok(Retrieve::Unit(raw)),
            None if self.flushed => Ok(Retrieve::Eof),
            None => Ok(Retrieve::NeedsInput),
        }
    }
}

/// Holds every decoded unit until the flush signal, then emits them in
/// submission order.
pub struct BufferingDecoder {
    shape: Shape,
    held: VecDeque<RawUnit>,
    flushed: bool,
}

impl BufferingDecoder {
    /// Buffering decoder producing audio of the given shape.
    pub fn audio(format: SampleFormat, channels: u16, sample_rate: u32) -> Self {
        Self {
            shape: Shape::Audio {
                format,
                channels,
                sample_rate,
            },
            held: VecDeque::new(),
            flushed: false,
        }
    }
}

impl DecodeEngine for BufferingDecoder {
    fn submit(&mut self, unit: &CodedUnit) -> EngineResult<SubmitStatus> {
        if self.flushed {
            return Err(EngineError::new("input after flush"));
        }
        let mut raw = shape_payload(self.shape, unit.data())?;
        raw.set_pts(unit.pts());
        self.held.push_back(raw);
        Ok(SubmitStatus::Accepted)
    }

    fn begin_flush(&mut self) -> EngineResult<()> {
        self.flushed = true;
        Ok(())
    }

    fn retrieve(&mut self) -> EngineResult<Retrieve<RawUnit>> {
        if !self.flushed {
            return Ok(Retrieve::NeedsInput);
        }
        match self.held.pop_front() {
            Some(raw) => Ok(Retrieve::Unit(raw)),
            None => Ok(Retrieve::Eof),
        }
    }
}

/// Packs each raw unit into one length-prefixed coded unit,
/// immediately. The concatenated payloads form an elementary stream
/// that [`FrameLenParser`] can split back into units.
pub struct EchoEncoder {
    pending: VecDeque<CodedUnit>,
    flushed: bool,
}

impl EchoEncoder {
    /// Create an echo encoder.
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            flushed: false,
        }
    }
}

impl Default for EchoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EncodeEngine for EchoEncoder {
    fn submit(&mut self, unit: &RawUnit) -> EngineResult<SubmitStatus> {
        if self.flushed {
            return Err(EngineError::new("input after flush"));
        }
        let mut coded = CodedUnit::new(frame_len_wrap(&unit.packed_bytes()));
        coded.set_pts(unit.pts());
        self.pending.push_back(coded);
        Ok(SubmitStatus::Accepted)
    }

    fn begin_flush(&mut self) -> EngineResult<()> {
        self.flushed = true;
        Ok(())
    }

    fn retrieve(&mut self) -> EngineResult<Retrieve<CodedUnit>> {
        match self.pending.pop_front() {
            Some(coded) => Ok(Retrieve::Unit(coded)),
            None if self.flushed => Ok(Retrieve::Eof),
            None => Ok(Retrieve::NeedsInput),
        }
    }
}

/// Walks an in-memory multi-stream byte sequence: records of
/// `[stream tag][u16 be length][payload]`.
pub struct StreamTagDemux {
    data: Bytes,
    pos: usize,
}

impl StreamTagDemux {
    /// Open a demux walk over `data`.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Next `(stream tag, unit)` record, or `None` at a clean end.
    pub fn next_unit(&mut self) -> EngineResult<Option<(u8, CodedUnit)>> {
        if self.pos == self.data.len() {
            return Ok(None);
        }
        if self.data.len() - self.pos < 3 {
            return Err(EngineError::new("truncated record header"));
        }
        let stream = self.data[self.pos];
        let need =
            u16::from_be_bytes([self.data[self.pos + 1], self.data[self.pos + 2]]) as usize;
        let start = self.pos + 3;
        if self.data.len() - start < need {
            return Err(EngineError::new("truncated record payload"));
        }
        self.pos = start + need;
        let unit = CodedUnit::new(self.data.slice(start..start + need));
        Ok(Some((stream, unit)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_len_round_trip() {
        let framed = frame_len_wrap(&[1, 2, 3]);
        assert_eq!(framed, vec![0, 3, 1, 2, 3]);
        let mut parser = FrameLenParser;
        let (consumed, unit) = parser.parse(&framed).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(unit.unwrap().data(), &[1, 2, 3]);
    }

    #[test]
    fn test_frame_len_partial_window() {
        let mut parser = FrameLenParser;
        assert!(matches!(parser.parse(&[0]).unwrap(), (0, None)));
        // Header present, payload incomplete.
        assert!(matches!(parser.parse(&[0, 4, 1, 2]).unwrap(), (0, None)));
    }

    #[test]
    fn test_shape_payload_rejects_ragged_audio() {
        let shape = Shape::Audio {
            format: SampleFormat::S16,
            channels: 2,
            sample_rate: 8000,
        };
        // 2 ch x 2 bytes: payloads must be multiples of 4.
        assert!(shape_payload(shape, &[0, 1, 2]).is_err());
        assert!(shape_payload(shape, &[]).is_err());
        let raw = shape_payload(shape, &[0, 1, 2, 3]).unwrap();
        assert_eq!(raw.samples(), 1);
    }

    #[test]
    fn test_echo_decoder_rejects_input_after_flush() {
        let mut dec = EchoDecoder::audio(SampleFormat::U8, 1, 8000);
        dec.begin_flush().unwrap();
        assert!(dec.submit(&CodedUnit::new(vec![0u8])).is_err());
    }

    #[test]
    fn test_stream_tag_demux_walk() {
        let mut data = stream_tag_wrap(0, &[1, 2]);
        data.extend_from_slice(&stream_tag_wrap(1, &[3]));
        data.extend_from_slice(&stream_tag_wrap(0, &[4, 5, 6]));

        let mut demux = StreamTagDemux::new(data);
        let (s, u) = demux.next_unit().unwrap().unwrap();
        assert_eq!((s, u.data()), (0, &[1u8, 2][..]));
        let (s, u) = demux.next_unit().unwrap().unwrap();
        assert_eq!((s, u.data()), (1, &[3u8][..]));
        let (s, u) = demux.next_unit().unwrap().unwrap();
        assert_eq!((s, u.data()), (0, &[4u8, 5, 6][..]));
        assert!(demux.next_unit().unwrap().is_none());
    }

    #[test]
    fn test_stream_tag_demux_truncation() {
        let mut data = stream_tag_wrap(0, &[1, 2]);
        data.truncate(data.len() - 1);
        let mut demux = StreamTagDemux::new(data);
        assert!(demux.next_unit().is_err());
    }
}
