//! Demux driver: split a tagged transport and decode both streams.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use avpump_core::sim::{EchoDecoder, StreamTagDemux};
use avpump_core::{PlanarPolicy, Session};

use super::{
    print_play_hint, AUDIO_CHANNELS, AUDIO_FORMAT, AUDIO_RATE, AUDIO_STREAM, VIDEO_FORMAT,
    VIDEO_HEIGHT, VIDEO_STREAM, VIDEO_WIDTH,
};

pub fn run(
    input: &Path,
    video_output: &Path,
    audio_output: &Path,
    policy: PlanarPolicy,
) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let mut demux = StreamTagDemux::new(data);

    let video_dest =
        File::create(video_output).with_context(|| format!("creating {}", video_output.display()))?;
    let audio_dest =
        File::create(audio_output).with_context(|| format!("creating {}", audio_output.display()))?;

    let mut session = Session::new();
    session.open_stream(
        VIDEO_STREAM as usize,
        Box::new(EchoDecoder::video(VIDEO_FORMAT, VIDEO_WIDTH, VIDEO_HEIGHT)),
        Box::new(video_dest),
        PlanarPolicy::default(),
    )?;
    session.open_stream(
        AUDIO_STREAM as usize,
        Box::new(EchoDecoder::audio(AUDIO_FORMAT, AUDIO_CHANNELS, AUDIO_RATE)),
        Box::new(audio_dest),
        policy,
    )?;

    let mut routed = 0u64;
    while let Some((stream, unit)) = demux.next_unit()? {
        session.route(stream as usize, &unit)?;
        routed += 1;
    }
    session.finish()?;

    tracing::info!(routed, "transport fully demuxed");
    println!("Demuxing succeeded.");

    for summary in session.summaries() {
        let output = if summary.index == VIDEO_STREAM as usize {
            video_output
        } else {
            audio_output
        };
        tracing::debug!(
            stream = summary.index,
            units = summary.units_written,
            "stream totals"
        );
        if let Some(shape) = summary.shape {
            print_play_hint(shape, policy, output);
        }
    }
    Ok(())
}
