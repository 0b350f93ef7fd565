//! Decode drivers: elementary stream in, raw samples/pixels out.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use avpump_core::sim::{EchoDecoder, FrameLenParser};
use avpump_core::{DecodePump, IoSink, PlanarPolicy, UnitFeeder};

use super::{
    print_play_hint, AUDIO_CHANNELS, AUDIO_FORMAT, AUDIO_RATE, VIDEO_FORMAT, VIDEO_HEIGHT,
    VIDEO_WIDTH,
};

/// Decode an audio elementary stream to raw PCM.
pub fn audio(input: &Path, output: &Path, policy: PlanarPolicy) -> Result<()> {
    let engine = EchoDecoder::audio(AUDIO_FORMAT, AUDIO_CHANNELS, AUDIO_RATE);
    run(input, output, engine, policy)
}

/// Decode a video elementary stream to rawvideo.
pub fn video(input: &Path, output: &Path) -> Result<()> {
    let engine = EchoDecoder::video(VIDEO_FORMAT, VIDEO_WIDTH, VIDEO_HEIGHT);
    run(input, output, engine, PlanarPolicy::default())
}

fn run(input: &Path, output: &Path, engine: EchoDecoder, policy: PlanarPolicy) -> Result<()> {
    let source = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let dest = File::create(output).with_context(|| format!("creating {}", output.display()))?;

    let mut feeder = UnitFeeder::new(BufReader::new(source), FrameLenParser);
    let mut pump = DecodePump::with_policy(engine, IoSink(BufWriter::new(dest)), policy);

    while let Some(unit) = feeder.next_unit()? {
        pump.feed(&unit)?;
    }
    pump.finish()?;

    tracing::info!(
        units_fed = pump.units_fed(),
        units_written = pump.units_written(),
        "decode finished"
    );

    let shape = pump.output_shape();
    let (_, IoSink(mut dest)) = pump.into_inner();
    dest.flush()?;

    match shape {
        Some(shape) => print_play_hint(shape, policy, output),
        None => println!("No units decoded from {}", input.display()),
    }
    Ok(())
}
