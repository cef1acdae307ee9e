//! Checksum computation utilities.
//!
//! ZIP stores a CRC-32 (IEEE 802.3 polynomial) of every entry's
//! uncompressed payload. The writer computes it while adding entries and
//! the reader verifies it after decoding.
//!
//! # Example
//!
//! ```rust
//! use pagezip::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.finalize(), Crc32::compute(b"Hello, World!"));
//! ```

use crate::{Error, Result};

/// CRC-32 checksum calculator.
///
/// # Example
///
/// ```rust
/// use pagezip::checksum::Crc32;
///
/// assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new checksum calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of everything seen so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

/// Verifies that `data` matches the CRC stored for the entry at `path`.
///
/// # Errors
///
/// Returns [`Error::CrcMismatch`] when the checksums differ.
pub fn verify_crc32(path: &str, expected: u32, data: &[u8]) -> Result<()> {
    let actual = Crc32::compute(data);
    if actual != expected {
        return Err(Error::CrcMismatch {
            path: path.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
