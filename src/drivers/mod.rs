//! Demo drivers behind the CLI subcommands.
//!
//! Every driver wires the core pump to the synthetic engines from
//! `avpump_core::sim`, so the pipelines run end to end without a codec
//! library. The stream parameters below are shared so that the encode
//! drivers produce files the decode drivers can consume.

use std::path::Path;

use avpump_core::{PixelFormat, PlanarPolicy, SampleFormat, Shape};

pub mod decode;
pub mod demux;
pub mod encode;
pub mod io;
pub mod sample;

/// Sample format the audio decode engines produce. Planar, so the
/// `--planar` flag has something to decide.
pub const AUDIO_FORMAT: SampleFormat = SampleFormat::S16p;
pub const AUDIO_CHANNELS: u16 = 2;
pub const AUDIO_RATE: u32 = 44100;

/// Samples per channel in one coded audio unit.
pub const AUDIO_UNIT_SAMPLES: usize = 1152;

pub const VIDEO_FORMAT: PixelFormat = PixelFormat::Yuv420p;
// Small enough that a whole coded frame fits the feed window.
pub const VIDEO_WIDTH: u32 = 128;
pub const VIDEO_HEIGHT: u32 = 96;

/// Stream tags used by the sample transport.
pub const VIDEO_STREAM: u8 = 0;
pub const AUDIO_STREAM: u8 = 1;

/// Print the ffplay invocation that plays a raw output file.
pub(crate) fn print_play_hint(shape: Shape, policy: PlanarPolicy, output: &Path) {
    match shape {
        Shape::Audio {
            format,
            channels,
            sample_rate,
        } => {
            // First-plane-only output carries a single channel no
            // matter how many the decoder produced.
            let channels = match policy {
                PlanarPolicy::FirstPlaneOnly if format.is_planar() && channels > 1 => 1,
                _ => channels,
            };
            println!("Play the output audio file with the command:");
            println!(
                "ffplay -f {} -ac {} -ar {} {}",
                format.ffplay_name(),
                channels,
                sample_rate,
                output.display()
            );
        }
        Shape::Video {
            format,
            width,
            height,
        } => {
            println!("Play the output video file with the command:");
            println!(
                "ffplay -f rawvideo -pixel_format {} -video_size {}x{} {}",
                format,
                width,
                height,
                output.display()
            );
        }
    }
}
