//! Archive-level summary information.

/// Summary of a parsed archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInfo {
    /// Number of entries.
    pub entry_count: usize,
    /// Total uncompressed size of all entries.
    pub total_size: u64,
    /// Total stored size of all payloads.
    pub packed_size: u64,
    /// Number of entries stored without compression.
    pub stored_entries: usize,
    /// Bytes preceding the container (the HTML shell, for page archives).
    pub prefix_len: u64,
    /// The end record comment; for page archives this is the shell trailer.
    pub comment: Vec<u8>,
}

impl ArchiveInfo {
    /// Returns the compression ratio (packed / unpacked).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.packed_size as f64 / self.total_size as f64
        }
    }

    /// Returns the space savings fraction.
    pub fn space_savings(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            1.0 - self.compression_ratio()
        }
    }

    /// Returns the archive comment as text, if it is valid UTF-8 and non-empty.
    pub fn comment(&self) -> Option<&str> {
        match std::str::from_utf8(&self.comment) {
            Ok(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}
