//! Archive entry metadata.

use crate::ArchivePath;
use crate::codec::CompressionMethod;
use crate::format::DosDateTime;

/// An entry in a page archive, as listed by the central directory.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Entry {
    /// The path within the archive.
    pub path: ArchivePath,
    /// How the payload is stored.
    pub method: CompressionMethod,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Stored payload size in bytes.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
    /// Per-entry comment; page archives keep the resource's original URL here.
    pub comment: String,
    /// Modification time.
    pub modified: DosDateTime,
    /// Absolute offset of the local header in the archive bytes.
    pub(crate) local_header_offset: u64,
    /// Position in directory order.
    pub(crate) index: usize,
}

impl Entry {
    /// Returns the file name (last component of the path).
    pub fn name(&self) -> &str {
        self.path.file_name()
    }

    /// Returns whether the payload is stored without compression.
    pub fn is_stored(&self) -> bool {
        self.method == CompressionMethod::Stored
    }

    /// Returns the position of this entry in directory order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the comment, or `None` when it is empty.
    pub fn comment(&self) -> Option<&str> {
        if self.comment.is_empty() {
            None
        } else {
            Some(&self.comment)
        }
    }
}
