//! Block-size selection strategies.
//!
//! Every strategy answers the same question: how many bytes should the copy
//! loop request per read? The progression from one byte to an empirically
//! tuned constant trades system-call overhead against memory footprint and
//! cache pressure, and each strategy stays selectable rather than collapsing
//! into "use the biggest one".

use std::fs::File;

use crate::constants::{
    BLOCK_SIZE_SANITY_LIMIT, DEFAULT_EMPIRICAL_BYTES, DEFAULT_SEQUENTIAL_BYTES,
};
use crate::platform;

/// What is known about the target file when sizing a buffer.
///
/// Computed once per invocation, immediately before allocation, and never
/// mutated afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileProperties {
    /// Platform memory page size in bytes; always positive, fallback applied
    /// at probe time.
    pub page_size: usize,
    /// Block size as reported by the filesystem, if any. Kept raw: reports
    /// of zero, negative, or absurd values do happen.
    pub block_size: Option<i64>,
}

impl FileProperties {
    /// Probe the platform and the given file.
    pub fn for_file(file: &File) -> Self {
        Self {
            page_size: platform::page_size(),
            block_size: platform::file_block_size(file),
        }
    }
}

impl Default for FileProperties {
    /// Platform page size, no file knowledge.
    fn default() -> Self {
        Self {
            page_size: platform::page_size(),
            block_size: None,
        }
    }
}

/// A fixed strategy for choosing the number of bytes per read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSizePolicy {
    /// One byte per read; the degenerate baseline the others are judged
    /// against.
    Unbuffered,
    /// The platform memory page size.
    PageSized,
    /// The filesystem-reported block size when plausible, else page size.
    FilesystemBlock,
    /// A fixed, tuned byte count, clamped up to at least the page size.
    Empirical {
        /// Tuned buffer size in bytes.
        bytes: usize,
    },
    /// Same sizing as [`Empirical`](Self::Empirical), plus a best-effort
    /// sequential readahead hint before the first read.
    EmpiricalSequential {
        /// Tuned buffer size in bytes.
        bytes: usize,
    },
}

impl BlockSizePolicy {
    /// Choose the buffer size in bytes for a file with the given properties.
    ///
    /// Always returns a positive value.
    pub fn choose_size(&self, props: &FileProperties) -> usize {
        match *self {
            BlockSizePolicy::Unbuffered => 1,
            BlockSizePolicy::PageSized => props.page_size,
            BlockSizePolicy::FilesystemBlock => match props.block_size {
                Some(reported)
                    if reported > 0 && (reported as u64) < BLOCK_SIZE_SANITY_LIMIT as u64 =>
                {
                    reported as usize
                }
                _ => props.page_size,
            },
            BlockSizePolicy::Empirical { bytes }
            | BlockSizePolicy::EmpiricalSequential { bytes } => bytes.max(props.page_size),
        }
    }

    /// Whether the caller should issue a sequential-access hint before the
    /// first read. Advisory only; the outcome never affects sizing.
    #[inline]
    pub const fn wants_sequential_hint(&self) -> bool {
        matches!(self, BlockSizePolicy::EmpiricalSequential { .. })
    }
}

/// A sizing policy paired with an alignment choice.
///
/// The six named presets reproduce the optimization journey from a one-byte
/// stack buffer to a tuned, page-aligned block with readahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyProfile {
    /// How the buffer size is chosen.
    pub policy: BlockSizePolicy,
    /// Whether the buffer starts on a page boundary; unaligned profiles use
    /// alignment 1.
    pub page_aligned: bool,
}

impl CopyProfile {
    /// One byte per read, unaligned.
    pub const fn unbuffered() -> Self {
        Self {
            policy: BlockSizePolicy::Unbuffered,
            page_aligned: false,
        }
    }

    /// Page-size buffer, unaligned.
    pub const fn page_sized() -> Self {
        Self {
            policy: BlockSizePolicy::PageSized,
            page_aligned: false,
        }
    }

    /// Page-size buffer on a page boundary.
    pub const fn page_aligned() -> Self {
        Self {
            policy: BlockSizePolicy::PageSized,
            page_aligned: true,
        }
    }

    /// Filesystem-reported block size, page-aligned.
    pub const fn filesystem_block() -> Self {
        Self {
            policy: BlockSizePolicy::FilesystemBlock,
            page_aligned: true,
        }
    }

    /// Tuned 256 KiB buffer, page-aligned.
    pub const fn empirical() -> Self {
        Self {
            policy: BlockSizePolicy::Empirical {
                bytes: DEFAULT_EMPIRICAL_BYTES,
            },
            page_aligned: true,
        }
    }

    /// Tuned 512 KiB buffer, page-aligned, with a sequential readahead hint.
    pub const fn sequential() -> Self {
        Self {
            policy: BlockSizePolicy::EmpiricalSequential {
                bytes: DEFAULT_SEQUENTIAL_BYTES,
            },
            page_aligned: true,
        }
    }

    /// All six presets in progression order.
    pub const fn all() -> [Self; 6] {
        [
            Self::unbuffered(),
            Self::page_sized(),
            Self::page_aligned(),
            Self::filesystem_block(),
            Self::empirical(),
            Self::sequential(),
        ]
    }

    /// Look up a preset by its canonical name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "unbuffered" => Some(Self::unbuffered()),
            "page-sized" => Some(Self::page_sized()),
            "page-aligned" => Some(Self::page_aligned()),
            "fs-block" => Some(Self::filesystem_block()),
            "empirical" => Some(Self::empirical()),
            "sequential" => Some(Self::sequential()),
            _ => None,
        }
    }

    /// Canonical name of the profile.
    pub fn name(&self) -> &'static str {
        match (self.policy, self.page_aligned) {
            (BlockSizePolicy::Unbuffered, _) => "unbuffered",
            (BlockSizePolicy::PageSized, false) => "page-sized",
            (BlockSizePolicy::PageSized, true) => "page-aligned",
            (BlockSizePolicy::FilesystemBlock, _) => "fs-block",
            (BlockSizePolicy::Empirical { .. }, _) => "empirical",
            (BlockSizePolicy::EmpiricalSequential { .. }, _) => "sequential",
        }
    }

    /// Alignment in bytes for the buffer this profile allocates.
    pub fn alignment(&self, props: &FileProperties) -> usize {
        if self.page_aligned {
            props.page_size
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(page_size: usize, block_size: Option<i64>) -> FileProperties {
        FileProperties {
            page_size,
            block_size,
        }
    }

    #[test]
    fn unbuffered_is_one_byte() {
        let p = props(4096, Some(8192));
        assert_eq!(BlockSizePolicy::Unbuffered.choose_size(&p), 1);
    }

    #[test]
    fn page_sized_follows_page_size() {
        assert_eq!(BlockSizePolicy::PageSized.choose_size(&props(4096, None)), 4096);
        assert_eq!(
            BlockSizePolicy::PageSized.choose_size(&props(16384, None)),
            16384
        );
    }

    #[test]
    fn filesystem_block_accepts_plausible_reports() {
        let policy = BlockSizePolicy::FilesystemBlock;
        assert_eq!(policy.choose_size(&props(4096, Some(8192))), 8192);
        // Not required to be a power of two.
        assert_eq!(policy.choose_size(&props(4096, Some(12_000))), 12_000);
    }

    #[test]
    fn filesystem_block_rejects_insane_reports() {
        let policy = BlockSizePolicy::FilesystemBlock;
        assert_eq!(policy.choose_size(&props(4096, Some(0))), 4096);
        assert_eq!(policy.choose_size(&props(4096, Some(-1))), 4096);
        assert_eq!(policy.choose_size(&props(4096, Some(2 << 30))), 4096);
        assert_eq!(policy.choose_size(&props(4096, None)), 4096);
    }

    #[test]
    fn filesystem_block_sanity_ceiling_is_exclusive() {
        let policy = BlockSizePolicy::FilesystemBlock;
        let limit = crate::constants::BLOCK_SIZE_SANITY_LIMIT as i64;
        assert_eq!(policy.choose_size(&props(4096, Some(limit))), 4096);
        assert_eq!(
            policy.choose_size(&props(4096, Some(limit - 1))),
            (limit - 1) as usize
        );
    }

    #[test]
    fn empirical_clamps_up_to_page_size() {
        let policy = BlockSizePolicy::Empirical { bytes: 1024 };
        assert_eq!(policy.choose_size(&props(4096, None)), 4096);

        let policy = BlockSizePolicy::Empirical { bytes: 256 * 1024 };
        assert_eq!(policy.choose_size(&props(4096, None)), 256 * 1024);
    }

    #[test]
    fn sequential_sizes_like_empirical() {
        let p = props(4096, Some(8192));
        let a = BlockSizePolicy::Empirical { bytes: 512 * 1024 }.choose_size(&p);
        let b = BlockSizePolicy::EmpiricalSequential { bytes: 512 * 1024 }.choose_size(&p);
        assert_eq!(a, b);
    }

    #[test]
    fn only_sequential_wants_the_hint() {
        assert!(BlockSizePolicy::EmpiricalSequential { bytes: 1 }.wants_sequential_hint());
        assert!(!BlockSizePolicy::Unbuffered.wants_sequential_hint());
        assert!(!BlockSizePolicy::PageSized.wants_sequential_hint());
        assert!(!BlockSizePolicy::FilesystemBlock.wants_sequential_hint());
        assert!(!BlockSizePolicy::Empirical { bytes: 1 }.wants_sequential_hint());
    }

    #[test]
    fn profile_names_round_trip() {
        for profile in CopyProfile::all() {
            assert_eq!(CopyProfile::by_name(profile.name()), Some(profile));
        }
        assert_eq!(CopyProfile::by_name("nonsense"), None);
    }

    #[test]
    fn profile_progression_matches_presets() {
        let p = props(4096, Some(8192));
        let sizes: Vec<usize> = CopyProfile::all()
            .iter()
            .map(|profile| profile.policy.choose_size(&p))
            .collect();
        assert_eq!(sizes, vec![1, 4096, 4096, 8192, 256 * 1024, 512 * 1024]);
    }

    #[test]
    fn alignment_follows_page_flag() {
        let p = props(4096, None);
        assert_eq!(CopyProfile::unbuffered().alignment(&p), 1);
        assert_eq!(CopyProfile::page_sized().alignment(&p), 1);
        assert_eq!(CopyProfile::page_aligned().alignment(&p), 4096);
        assert_eq!(CopyProfile::empirical().alignment(&p), 4096);
    }

    #[test]
    fn default_properties_have_positive_page_size() {
        let p = FileProperties::default();
        assert!(p.page_size > 0);
        assert_eq!(p.block_size, None);
    }
}
