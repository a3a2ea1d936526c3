//! The read/write copy loop.
//!
//! One buffer, one source, one sink. Reads up to the buffer size, then
//! flushes the chunk completely before reading again; a single write is
//! allowed to move fewer bytes than asked, so the unwritten tail is reissued
//! until the chunk is drained.

use std::fmt;
use std::io::{self, ErrorKind, Read, Write};

use crate::buffer::{AlignedBuffer, AllocError};

/// Which half of the copy loop failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Failure while reading from the source.
    Reading,
    /// Failure while writing to the sink.
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Reading => write!(f, "reading from source"),
            Stage::Writing => write!(f, "writing to sink"),
        }
    }
}

/// Errors surfaced by a copy operation.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// The I/O buffer could not be allocated.
    #[error("buffer allocation failed: {0}")]
    Alloc(#[from] AllocError),
    /// The source or sink failed.
    #[error("{stage} failed: {source}")]
    Io {
        /// Which half of the loop failed.
        stage: Stage,
        /// The underlying stream error.
        #[source]
        source: io::Error,
    },
}

impl CopyError {
    /// The failing stage, if this is a stream error.
    pub const fn stage(&self) -> Option<Stage> {
        match self {
            CopyError::Io { stage, .. } => Some(*stage),
            CopyError::Alloc(_) => None,
        }
    }

    fn reading(source: io::Error) -> Self {
        CopyError::Io {
            stage: Stage::Reading,
            source,
        }
    }

    fn writing(source: io::Error) -> Self {
        CopyError::Io {
            stage: Stage::Writing,
            source,
        }
    }
}

/// Copy `source` to `sink` through `buffer` until the source is exhausted.
///
/// Returns the total number of bytes copied. Each iteration reads up to
/// `buffer.size()` bytes, then writes the chunk completely: short writes are
/// reissued for the remaining tail, and a write interrupted by a signal is
/// retried without being counted as progress or as an error. A sink that
/// accepts zero bytes for a nonempty chunk is a fatal write failure, not a
/// reason to spin. Any read error is fatal.
///
/// The buffer is exclusively borrowed for the duration of the copy; whether
/// the copy succeeds or fails, releasing the memory stays the owner's
/// responsibility and happens exactly once.
pub fn copy_stream<R, W>(
    source: &mut R,
    sink: &mut W,
    buffer: &mut AlignedBuffer,
) -> Result<u64, CopyError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let chunk = buffer.as_mut_slice();
    let mut total: u64 = 0;

    loop {
        let read = match source.read(chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => return Err(CopyError::reading(err)),
        };

        let mut written = 0;
        while written < read {
            match sink.write(&chunk[written..read]) {
                Ok(0) => {
                    return Err(CopyError::writing(io::Error::new(
                        ErrorKind::WriteZero,
                        "sink accepted no bytes",
                    )))
                }
                Ok(n) => written += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CopyError::writing(err)),
            }
        }

        total += read as u64;
    }

    Ok(total)
}
