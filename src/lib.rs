//! oxicat - a streaming file copier with tunable, aligned I/O buffering
//!
//! The interesting part of copying a file to an output stream is deciding how
//! many bytes to request per read and where in memory to put them. This crate
//! provides:
//! - **Aligned buffers**: memory carved out of the general-purpose allocator
//!   so that the usable region starts on a caller-chosen power-of-two
//!   boundary, released exactly once via RAII
//! - **Block-size policies**: an escalating family of sizing strategies, from
//!   a one-byte degenerate baseline through page size, the filesystem's
//!   reported block size, and empirically tuned constants
//! - **Copy loop**: a blocking read/write loop that survives short writes and
//!   transient interruption
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use oxicat::prelude::*;
//!
//! let mut file = std::fs::File::open("data.bin")?;
//! let props = FileProperties::for_file(&file);
//! let profile = CopyProfile::empirical();
//!
//! let size = profile.policy.choose_size(&props);
//! let mut buffer = AlignedBuffer::allocate(size, profile.alignment(&props))?;
//! let copied = copy_stream(&mut file, &mut std::io::stdout().lock(), &mut buffer)?;
//! eprintln!("{copied} bytes copied");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod copy;
pub mod platform;
pub mod policy;
mod util;

// Re-exports for convenience
pub use buffer::{AlignedBuffer, AllocError};
pub use copy::{copy_stream, CopyError, Stage};
pub use policy::{BlockSizePolicy, CopyProfile, FileProperties};

/// Constants used throughout the library
pub mod constants {
    use crate::size::KIB;

    /// Page size assumed when the platform cannot report one
    pub const FALLBACK_PAGE_SIZE: usize = 4096;

    /// Ceiling above which a filesystem-reported block size is not believed
    pub const BLOCK_SIZE_SANITY_LIMIT: usize = 1024 * KIB;

    /// Tuned buffer size for the empirical profile (256 KiB)
    pub const DEFAULT_EMPIRICAL_BYTES: usize = 256 * KIB;

    /// Tuned buffer size for the sequential-hint profile (512 KiB)
    pub const DEFAULT_SEQUENTIAL_BYTES: usize = 512 * KIB;
}

/// Utility for size literals (e.g., 256 * KIB)
pub mod size {
    /// 1 KiB in bytes
    pub const KIB: usize = 1024;
    /// 1 MiB in bytes
    pub const MIB: usize = 1024 * KIB;
}

/// Prelude module for common imports
pub mod prelude {
    pub use crate::buffer::{AlignedBuffer, AllocError};
    pub use crate::copy::{copy_stream, CopyError, Stage};
    pub use crate::policy::{BlockSizePolicy, CopyProfile, FileProperties};
}
