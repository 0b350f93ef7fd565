//! Directory operations and the in-memory read demo.

use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use avpump_core::sim::FrameLenParser;
use avpump_core::vio::{LocalFs, MemorySource, VirtualIo};
use avpump_core::UnitFeeder;

/// List a directory through the virtual I/O layer.
pub fn list(path: &Path) -> Result<()> {
    let entries = LocalFs
        .list_dir(path)
        .with_context(|| format!("listing {}", path.display()))?;

    println!("{:<20} {:>12}  {:<16} {}", "TYPE", "SIZE", "MODIFIED", "NAME");
    for entry in entries {
        let size = entry
            .size
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let modified = entry
            .modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:>12}  {:<16} {}",
            entry.kind.to_string(),
            size,
            modified,
            entry.name
        );
    }
    Ok(())
}

/// Rename (move) an entry.
pub fn mv(from: &Path, to: &Path) -> Result<()> {
    LocalFs
        .rename(from, to)
        .with_context(|| format!("moving {} to {}", from.display(), to.display()))?;
    tracing::info!(from = %from.display(), to = %to.display(), "moved");
    Ok(())
}

/// Delete a file or empty directory.
pub fn del(path: &Path) -> Result<()> {
    LocalFs
        .remove(path)
        .with_context(|| format!("deleting {}", path.display()))?;
    tracing::info!(path = %path.display(), "deleted");
    Ok(())
}

/// Slurp a file into memory and parse it into coded units through a
/// chunked in-memory source.
pub fn read_mem(input: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let total = data.len();

    let mut feeder = UnitFeeder::new(MemorySource::new(data), FrameLenParser);
    let mut units = 0u64;
    let mut payload_bytes = 0u64;
    let mut min = usize::MAX;
    let mut max = 0usize;
    while let Some(unit) = feeder.next_unit()? {
        tracing::debug!(unit = units, size = unit.len(), "parsed unit");
        units += 1;
        payload_bytes += unit.len() as u64;
        min = min.min(unit.len());
        max = max.max(unit.len());
    }

    println!("Input: {} ({} bytes)", input.display(), total);
    if units == 0 {
        println!("No units found");
    } else {
        println!("Units: {units} ({payload_bytes} payload bytes, {min}..{max} bytes per unit)");
    }
    Ok(())
}
