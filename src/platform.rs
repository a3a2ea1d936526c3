//! Platform probes: page size, filesystem block size, readahead hints.
//!
//! Everything here is best-effort. Probe failures degrade to safe fallbacks
//! and never abort a copy.

use std::fs::File;
use std::io;

use crate::constants::FALLBACK_PAGE_SIZE;

/// The platform memory page size in bytes.
///
/// Falls back to [`FALLBACK_PAGE_SIZE`] when the platform cannot report one
/// or reports a non-positive value.
#[cfg(unix)]
pub fn page_size() -> usize {
    // SAFETY: sysconf reads a system constant and has no preconditions.
    let reported = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if reported > 0 {
        reported as usize
    } else {
        FALLBACK_PAGE_SIZE
    }
}

/// The platform memory page size in bytes.
#[cfg(not(unix))]
pub fn page_size() -> usize {
    FALLBACK_PAGE_SIZE
}

/// The block size the filesystem reports for this file, if any.
///
/// The value is returned raw; filesystems are not required to report a sane
/// number, so callers must validate it.
#[cfg(unix)]
pub fn file_block_size(file: &File) -> Option<i64> {
    use std::os::unix::fs::MetadataExt;

    match file.metadata() {
        Ok(meta) => Some(meta.blksize() as i64),
        Err(err) => {
            tracing::debug!("block size probe failed: {err}");
            None
        }
    }
}

/// The block size the filesystem reports for this file, if any.
#[cfg(not(unix))]
pub fn file_block_size(_file: &File) -> Option<i64> {
    None
}

/// Declare that the file will be read sequentially, start to end.
///
/// Advisory only: callers may log a failure but must proceed regardless.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn advise_sequential(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    // posix_fadvise reports failure through its return value, not errno.
    let rc = unsafe {
        libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_SEQUENTIAL)
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::from_raw_os_error(rc))
    }
}

/// Declare that the file will be read sequentially, start to end.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn advise_sequential(_file: &File) -> io::Result<()> {
    Ok(())
}
