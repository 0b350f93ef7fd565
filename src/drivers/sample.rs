//! Generates the stream-tagged A/V transport the demux driver expects.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use avpump_core::sim::stream_tag_wrap;

use super::encode::{gradient_frame, sine_unit};
use super::{AUDIO_STREAM, VIDEO_STREAM};

const VIDEO_UNITS: usize = 25;
/// Audio units interleaved after each video frame.
const AUDIO_PER_VIDEO: usize = 4;

pub fn run(output: &Path) -> Result<()> {
    let mut data = Vec::new();
    let mut phase = 0f32;
    let mut audio_index = 0;

    // Interleave the way a muxer would: one video frame, then the
    // audio that plays over it.
    for i in 0..VIDEO_UNITS {
        let frame = gradient_frame(i).packed_bytes();
        data.extend_from_slice(&stream_tag_wrap(VIDEO_STREAM, &frame));
        for _ in 0..AUDIO_PER_VIDEO {
            let unit = sine_unit(audio_index, &mut phase).packed_bytes();
            data.extend_from_slice(&stream_tag_wrap(AUDIO_STREAM, &unit));
            audio_index += 1;
        }
    }

    fs::write(output, &data).with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(
        video_units = VIDEO_UNITS,
        audio_units = audio_index,
        bytes = data.len(),
        "sample transport written"
    );
    println!(
        "Wrote {} bytes of tagged transport to {}",
        data.len(),
        output.display()
    );
    Ok(())
}
