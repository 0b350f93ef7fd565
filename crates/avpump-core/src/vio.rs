//! Abstracted I/O: directory operations behind a trait, plus an
//! in-memory byte source.
//!
//! The directory side mirrors the list/move/del resource operations of
//! an I/O-context API; [`LocalFs`] is the plain-filesystem backend.
//! [`MemorySource`] stands in for a custom read callback over a buffer
//! already resident in memory, delivering at most one chunk per read.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::Result;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryKind {
    File,
    Directory,
    BlockDevice,
    CharacterDevice,
    Pipe,
    SymbolicLink,
    Socket,
    Unknown,
}

impl fmt::Display for DirEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::File => "<FILE>",
            Self::Directory => "<DIR>",
            Self::BlockDevice => "<BLOCK DEVICE>",
            Self::CharacterDevice => "<CHARACTER DEVICE>",
            Self::Pipe => "<PIPE>",
            Self::SymbolicLink => "<LINK>",
            Self::Socket => "<SOCKET>",
            Self::Unknown => "<UNKNOWN>",
        };
        f.write_str(s)
    }
}

/// One listed directory entry.
#[derive(Debug)]
pub struct DirEntry {
    pub name: String,
    pub kind: DirEntryKind,
    /// Size in bytes, if known.
    pub size: Option<u64>,
    /// Last modification time, if known.
    pub modified: Option<SystemTime>,
}

/// Resource operations over some I/O backend.
pub trait VirtualIo {
    /// List the entries of a directory, sorted by name.
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Delete a file or empty directory.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Rename (move) an entry.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Local-filesystem backend.
pub struct LocalFs;

impl LocalFs {
    fn entry_kind(file_type: fs::FileType) -> DirEntryKind {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_block_device() {
                return DirEntryKind::BlockDevice;
            }
            if file_type.is_char_device() {
                return DirEntryKind::CharacterDevice;
            }
            if file_type.is_fifo() {
                return DirEntryKind::Pipe;
            }
            if file_type.is_socket() {
                return DirEntryKind::Socket;
            }
        }
        if file_type.is_dir() {
            DirEntryKind::Directory
        } else if file_type.is_symlink() {
            DirEntryKind::SymbolicLink
        } else if file_type.is_file() {
            DirEntryKind::File
        } else {
            DirEntryKind::Unknown
        }
    }
}

impl VirtualIo for LocalFs {
    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let kind = Self::entry_kind(metadata.file_type());
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
                size: (kind == DirEntryKind::File).then(|| metadata.len()),
                modified: metadata.modified().ok(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn remove(&self, path: &Path) -> Result<()> {
        if fs::metadata(path)?.is_dir() {
            fs::remove_dir(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to)?;
        Ok(())
    }
}

/// Default chunk delivered per read call.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Chunked reader over an in-memory buffer.
///
/// Delivers at most `chunk_size` bytes per call, which also makes it a
/// convenient stand-in for slow or fragmented upstream sources in
/// refill tests.
pub struct MemorySource {
    data: Bytes,
    pos: usize,
    chunk_size: usize,
}

impl MemorySource {
    /// Read the buffer in [`DEFAULT_CHUNK_SIZE`] chunks.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_chunk_size(data, DEFAULT_CHUNK_SIZE)
    }

    /// Read the buffer in chunks of at most `chunk_size` bytes.
    pub fn with_chunk_size(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl Read for MemorySource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.chunk_size).min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
