//! Sink contract (spec.md §6) and the blocking file-backed adapter.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// An opaque byte destination for encoded Ogg pages.
///
/// Mirrors the C-style `write`/`close` callback pair from spec.md §6: the
/// encoder core never distinguishes *why* a write failed, only that it
/// did, and latches `Error::Unrecoverable` per the policy in spec.md §9
/// (the original source swallows sink write errors; this crate does not).
pub trait Sink: Send {
    /// Writes `bytes` to the sink. A non-`Ok` return latches the
    /// encoder's unrecoverable flag.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Closes the sink. Called at most once per stream, only if the
    /// stream's close-at-end flag is set.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The thin blocking file-I/O adapter named in spec.md §1 as an external
/// collaborator: it maps the sink contract onto a plain file handle.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    /// Opens `path` for writing, truncating any existing file.
    ///
    /// # Errors
    ///
    /// Returns the underlying `io::Error` if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { writer: BufWriter::with_capacity(64 * 1024, file) })
    }
}

impl Sink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// An in-memory sink that accumulates pages into a growable buffer,
/// useful for tests and for callers who want the whole file in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub buffer: Vec<u8>,
    pub closed: bool,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sink for MemorySink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}
