mod cli;
mod drivers;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, DirOp};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "avpump=trace,avpump_core=trace".to_string()
        } else {
            "avpump=info,avpump_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Dir { op } => match op {
            DirOp::List { path } => drivers::io::list(&path),
            DirOp::Move { from, to } => drivers::io::mv(&from, &to),
            DirOp::Del { path } => drivers::io::del(&path),
        },
        Commands::ReadMem { input } => drivers::io::read_mem(&input),
        Commands::DecodeAudio {
            input,
            output,
            planar,
        } => drivers::decode::audio(&input, &output, planar.into()),
        Commands::DecodeVideo { input, output } => drivers::decode::video(&input, &output),
        Commands::DemuxDecode {
            input,
            video_output,
            audio_output,
            planar,
        } => drivers::demux::run(&input, &video_output, &audio_output, planar.into()),
        Commands::EncodeAudio { output } => drivers::encode::audio(&output),
        Commands::EncodeVideo { output } => drivers::encode::video(&output),
        Commands::MakeSample { output } => drivers::sample::run(&output),
    }
}
