use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use avpump_core::PlanarPolicy;

#[derive(Parser)]
#[command(name = "avpump")]
#[command(author, version, about = "Decode/encode pump demos over synthetic codec engines")]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// How planar audio is written to the output file.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum PlanarArg {
    /// Write only the first channel plane
    #[default]
    First,
    /// Interleave all channel planes into packed order
    Interleave,
}

impl From<PlanarArg> for PlanarPolicy {
    fn from(arg: PlanarArg) -> Self {
        match arg {
            PlanarArg::First => PlanarPolicy::FirstPlaneOnly,
            PlanarArg::Interleave => PlanarPolicy::Interleave,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Directory operations through the virtual I/O layer
    Dir {
        #[command(subcommand)]
        op: DirOp,
    },

    /// Parse a file into coded units through an in-memory source
    ReadMem {
        /// Length-prefixed elementary stream to read
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Decode an audio elementary stream to raw PCM
    DecodeAudio {
        /// Length-prefixed audio elementary stream
        #[arg(required = true)]
        input: PathBuf,

        /// Raw PCM output file
        #[arg(required = true)]
        output: PathBuf,

        /// How planar audio is written
        #[arg(long, value_enum, default_value_t)]
        planar: PlanarArg,
    },

    /// Decode a video elementary stream to rawvideo
    DecodeVideo {
        /// Length-prefixed video elementary stream
        #[arg(required = true)]
        input: PathBuf,

        /// Rawvideo output file
        #[arg(required = true)]
        output: PathBuf,
    },

    /// Demux a tagged transport and decode both streams
    DemuxDecode {
        /// Stream-tagged transport file (see make-sample)
        #[arg(required = true)]
        input: PathBuf,

        /// Rawvideo output file
        #[arg(required = true)]
        video_output: PathBuf,

        /// Raw PCM output file
        #[arg(required = true)]
        audio_output: PathBuf,

        /// How planar audio is written
        #[arg(long, value_enum, default_value_t)]
        planar: PlanarArg,
    },

    /// Synthesize a sine tone and encode it to an elementary stream
    EncodeAudio {
        /// Output elementary stream file
        #[arg(required = true)]
        output: PathBuf,
    },

    /// Synthesize a moving gradient and encode it to an elementary stream
    EncodeVideo {
        /// Output elementary stream file
        #[arg(required = true)]
        output: PathBuf,
    },

    /// Generate a stream-tagged A/V transport for demux-decode
    MakeSample {
        /// Output transport file
        #[arg(required = true)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum DirOp {
    /// List the entries of a directory
    List {
        /// Directory to list
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Rename (move) an entry
    Move {
        /// Source path
        #[arg(required = true)]
        from: PathBuf,

        /// Destination path
        #[arg(required = true)]
        to: PathBuf,
    },

    /// Delete a file or empty directory
    Del {
        /// Path to delete
        #[arg(required = true)]
        path: PathBuf,
    },
}
