//! Encode drivers: synthesized raw units in, elementary stream out.

use std::f32::consts::PI;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use avpump_core::sim::EchoEncoder;
use avpump_core::{EncodePump, IoSink, RawUnit, SampleFormat};

use super::{
    AUDIO_CHANNELS, AUDIO_RATE, AUDIO_UNIT_SAMPLES, VIDEO_FORMAT, VIDEO_HEIGHT, VIDEO_WIDTH,
};

const TONE_HZ: f32 = 440.0;
const TONE_AMPLITUDE: f32 = 10000.0;
const AUDIO_UNITS: usize = 200;
const VIDEO_UNITS: usize = 25;

/// Synthesize a sine tone and encode it to `output`.
pub fn audio(output: &Path) -> Result<()> {
    let dest = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut pump = EncodePump::new(EchoEncoder::new(), IoSink(BufWriter::new(dest)));

    let mut phase = 0f32;
    for i in 0..AUDIO_UNITS {
        let mut unit = sine_unit(i, &mut phase);
        pump.feed(&mut unit)?;
    }
    finish(pump, output)
}

/// Synthesize a moving gradient and encode it to `output`.
pub fn video(output: &Path) -> Result<()> {
    let dest = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    let mut pump = EncodePump::new(EchoEncoder::new(), IoSink(BufWriter::new(dest)));

    for i in 0..VIDEO_UNITS {
        let mut unit = gradient_frame(i);
        unit.set_pts(Some(i as i64));
        pump.feed(&mut unit)?;
    }
    finish(pump, output)
}

fn finish(mut pump: EncodePump<EchoEncoder, IoSink<BufWriter<File>>>, output: &Path) -> Result<()> {
    pump.finish()?;
    tracing::info!(
        units_fed = pump.units_fed(),
        units_written = pump.units_written(),
        "encode finished"
    );
    let written = pump.units_written();
    let (_, IoSink(mut dest)) = pump.into_inner();
    dest.flush()?;
    println!("Wrote {} coded units to {}", written, output.display());
    Ok(())
}

/// One unit of a sine tone: packed native-endian s16 stereo, the same
/// sample on both channels, phase carried across units by the caller.
pub(crate) fn sine_unit(index: usize, phase: &mut f32) -> RawUnit {
    let step = 2.0 * PI * TONE_HZ / AUDIO_RATE as f32;
    let mut unit = RawUnit::alloc_audio(
        SampleFormat::S16,
        AUDIO_CHANNELS,
        AUDIO_RATE,
        AUDIO_UNIT_SAMPLES,
    );
    unit.set_pts(Some((index * AUDIO_UNIT_SAMPLES) as i64));
    let plane = unit.plane_mut(0);
    for s in 0..AUDIO_UNIT_SAMPLES {
        let sample = ((phase.sin() * TONE_AMPLITUDE) as i16).to_ne_bytes();
        for ch in 0..AUDIO_CHANNELS as usize {
            let off = (s * AUDIO_CHANNELS as usize + ch) * 2;
            plane[off..off + 2].copy_from_slice(&sample);
        }
        *phase += step;
    }
    unit
}

/// One frame of a gradient that drifts with the frame index.
pub(crate) fn gradient_frame(index: usize) -> RawUnit {
    let mut unit = RawUnit::alloc_video(VIDEO_FORMAT, VIDEO_WIDTH, VIDEO_HEIGHT);

    let (row_bytes, rows) = VIDEO_FORMAT.plane_size(0, VIDEO_WIDTH, VIDEO_HEIGHT);
    let luma = unit.plane_mut(0);
    for y in 0..rows {
        for x in 0..row_bytes {
            luma[y * row_bytes + x] = (x + y + index * 3) as u8;
        }
    }

    let (crow_bytes, crows) = VIDEO_FORMAT.plane_size(1, VIDEO_WIDTH, VIDEO_HEIGHT);
    let cb = unit.plane_mut(1);
    for y in 0..crows {
        for x in 0..crow_bytes {
            cb[y * crow_bytes + x] = (128 + y + index * 2) as u8;
        }
    }
    let cr = unit.plane_mut(2);
    for y in 0..crows {
        for x in 0..crow_bytes {
            cr[y * crow_bytes + x] = (64 + x + index * 5) as u8;
        }
    }

    unit
}
