//! Writer configuration and results.

use crate::codec::CompressionMethod;
use crate::format::DosDateTime;

/// Options for creating archives.
///
/// # Example
///
/// ```rust
/// use pagezip::codec::CompressionMethod;
/// use pagezip::write::WriteOptions;
///
/// let options = WriteOptions::new()
///     .method(CompressionMethod::Deflate)
///     .level(9)?;
/// assert_eq!(options.level, 9);
/// # Ok::<(), pagezip::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression method for entries not flagged as stored.
    pub method: CompressionMethod,
    /// Compression level (0-9). Level 0 stores every entry.
    pub level: u32,
    /// Timestamp written into every record.
    ///
    /// Defaults to the DOS epoch so identical input yields identical bytes.
    pub modified: DosDateTime,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            method: CompressionMethod::Deflate,
            level: 6,
            modified: DosDateTime::EPOCH,
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression method.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = method;
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`](crate::Error::InvalidCompressionLevel)
    /// if `level` is greater than 9.
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Sets the timestamp recorded for every entry.
    pub fn modified(mut self, modified: DosDateTime) -> Self {
        self.modified = modified;
        self
    }

    /// Returns the method actually used for an entry.
    pub(crate) fn effective_method(&self, store_uncompressed: bool) -> CompressionMethod {
        if store_uncompressed || self.level == 0 {
            CompressionMethod::Stored
        } else {
            self.method
        }
    }
}

/// Per-entry options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryOptions {
    /// Comment stored in the central directory.
    pub comment: Option<String>,
    /// Store the payload without compression.
    pub store_uncompressed: bool,
}

impl EntryOptions {
    /// Creates entry options with no comment, compressed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets whether the payload is stored uncompressed.
    pub fn store_uncompressed(mut self, store: bool) -> Self {
        self.store_uncompressed = store;
        self
    }
}

/// Result of writing an archive.
#[must_use = "write results should be checked to ensure archive was created successfully"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResult {
    /// Number of entries written.
    pub entries_written: usize,
    /// Number of entries stored without compression.
    pub stored_entries: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total stored payload bytes.
    pub compressed_size: u64,
    /// Bytes written before the first entry.
    pub prefix_size: u64,
    /// Total bytes written, prefix and trailer included.
    pub archive_size: u64,
}

impl WriteResult {
    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
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
}
