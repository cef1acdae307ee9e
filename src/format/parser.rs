//! Locating and reading the central directory inside a prefixed buffer.
//!
//! A page archive starts with HTML, so the container does not begin at
//! offset zero. The end of central directory record is found by scanning
//! backwards from the end of the buffer; the distance between where the
//! central directory actually ends and where the record says it ends is
//! the prefix delta added to every recorded offset.

use crate::{Error, Result};

use super::header::{CentralDirectoryHeader, EndOfCentralDirectory};
use super::reader::{u16_at, u32_at};
use super::{
    END_OF_CENTRAL_DIRECTORY_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, MAX_COMMENT_LENGTH,
};

/// Limits applied while reading the central directory.
///
/// Untrusted bytes can declare absurd entry counts or sizes; these limits
/// bound what the reader is willing to allocate.
///
/// # Example
///
/// ```rust
/// use pagezip::format::parser::ReadLimits;
///
/// let limits = ReadLimits::default()
///     .max_entries(1000)
///     .max_entry_unpacked(16 * 1024 * 1024);
/// assert_eq!(limits.max_entries, 1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Maximum number of entries in the central directory.
    pub max_entries: usize,
    /// Maximum size of the central directory in bytes.
    pub max_central_directory_bytes: u64,
    /// Maximum decoded size of a single entry.
    pub max_entry_unpacked: u64,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_entries: super::MAX_ENTRIES,
            max_central_directory_bytes: 64 * 1024 * 1024,
            max_entry_unpacked: 1024 * 1024 * 1024,
        }
    }
}

impl ReadLimits {
    /// Limits that accept anything the format can express.
    pub fn unlimited() -> Self {
        Self {
            max_entries: usize::MAX,
            max_central_directory_bytes: u64::MAX,
            max_entry_unpacked: u64::MAX,
        }
    }

    /// Sets the maximum entry count.
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Sets the maximum central directory size.
    pub fn max_central_directory_bytes(mut self, max: u64) -> Self {
        self.max_central_directory_bytes = max;
        self
    }

    /// Sets the maximum decoded size per entry.
    pub fn max_entry_unpacked(mut self, max: u64) -> Self {
        self.max_entry_unpacked = max;
        self
    }
}

/// Position and content of the end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedEnd {
    /// Absolute offset of the record in the buffer.
    pub position: usize,
    /// The parsed record.
    pub record: EndOfCentralDirectory,
}

/// The parsed central directory with its prefix adjustment.
#[derive(Debug, Clone)]
pub struct CentralDirectory {
    /// Records in directory order.
    pub headers: Vec<CentralDirectoryHeader>,
    /// Bytes preceding the offsets the records were written against.
    pub delta: u64,
    /// Absolute offset where the central directory starts.
    pub start: usize,
    /// The end record.
    pub end: LocatedEnd,
}

/// Finds the end of central directory record by scanning backwards.
///
/// A candidate whose comment reaches exactly to the end of the buffer is
/// preferred; otherwise the last candidate whose comment fits is used,
/// tolerating bytes appended after the trailer.
///
/// # Errors
///
/// Returns [`Error::InvalidFormat`] when no record is found.
pub fn locate_end_of_central_directory(data: &[u8]) -> Result<LocatedEnd> {
    if data.len() < END_OF_CENTRAL_DIRECTORY_SIZE {
        return Err(Error::InvalidFormat(
            "too short to contain an end of central directory record".into(),
        ));
    }
    let last = data.len() - END_OF_CENTRAL_DIRECTORY_SIZE;
    let first = last.saturating_sub(MAX_COMMENT_LENGTH);

    let mut fallback = None;
    for pos in (first..=last).rev() {
        if u32_at(data, pos) != Some(END_OF_CENTRAL_DIRECTORY_SIGNATURE) {
            continue;
        }
        let Some(comment_len) = u16_at(data, pos + 20) else {
            continue;
        };
        let end = pos + END_OF_CENTRAL_DIRECTORY_SIZE + usize::from(comment_len);
        if end == data.len() {
            return parse_end(data, pos);
        }
        if end < data.len() && fallback.is_none() {
            fallback = Some(pos);
        }
    }

    match fallback {
        Some(pos) => {
            log::debug!("end of central directory at {pos:#x} followed by trailing bytes");
            parse_end(data, pos)
        }
        None => Err(Error::InvalidFormat(
            "no end of central directory record found".into(),
        )),
    }
}

fn parse_end(data: &[u8], position: usize) -> Result<LocatedEnd> {
    let record = EndOfCentralDirectory::parse(&mut &data[position..], position as u64)?;
    if record.disk_number != 0
        || record.central_directory_disk != 0
        || record.entries_on_disk != record.total_entries
    {
        return Err(Error::InvalidFormat(
            "multi-disk archives are not supported".into(),
        ));
    }
    if record.total_entries == u16::MAX
        || record.central_directory_offset == u32::MAX
        || record.central_directory_size == u32::MAX
    {
        return Err(Error::InvalidFormat("ZIP64 archives are not supported".into()));
    }
    Ok(LocatedEnd { position, record })
}

/// Reads every central directory record.
///
/// # Errors
///
/// Returns [`Error::CorruptHeader`] when the directory does not fit before
/// its end record, and [`Error::ResourceLimitExceeded`] when `limits` are
/// exceeded.
pub fn read_central_directory(data: &[u8], limits: &ReadLimits) -> Result<CentralDirectory> {
    let end = locate_end_of_central_directory(data)?;
    let record = &end.record;
    let count = usize::from(record.total_entries);
    let size = u64::from(record.central_directory_size);

    if count > limits.max_entries {
        return Err(Error::ResourceLimitExceeded(format!(
            "{count} entries exceeds the limit of {}",
            limits.max_entries
        )));
    }
    if size > limits.max_central_directory_bytes {
        return Err(Error::ResourceLimitExceeded(format!(
            "central directory of {size} bytes exceeds the limit of {}",
            limits.max_central_directory_bytes
        )));
    }

    let recorded_end = u64::from(record.central_directory_offset) + size;
    let actual_end = end.position as u64;
    let delta = actual_end
        .checked_sub(recorded_end)
        .ok_or_else(|| Error::CorruptHeader {
            offset: actual_end,
            reason: format!(
                "central directory recorded to end at {recorded_end:#x}, past its end record"
            ),
        })?;
    let start = (u64::from(record.central_directory_offset) + delta) as usize;
    if delta > 0 {
        log::debug!("container offsets shifted by {delta} prefix bytes");
    }

    let mut cursor = &data[start..end.position];
    let mut headers = Vec::with_capacity(count);
    for _ in 0..count {
        let offset = (end.position - cursor.len()) as u64;
        headers.push(CentralDirectoryHeader::parse(&mut cursor, offset)?);
    }
    if !cursor.is_empty() {
        log::warn!(
            "{} unused bytes at the end of the central directory",
            cursor.len()
        );
    }

    Ok(CentralDirectory {
        headers,
        delta,
        start,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eocd_bytes(entries: u16, size: u32, offset: u32, comment: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        EndOfCentralDirectory::new(entries, size, offset, comment.to_vec())
            .write_to(&mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_empty_archive_with_prefix() {
        let mut data = b"<html>prefix".to_vec();
        let prefix = data.len() as u32;
        data.extend(eocd_bytes(0, 0, prefix, b"]]></html>"));
        let cd = read_central_directory(&data, &ReadLimits::default()).unwrap();
        assert!(cd.headers.is_empty());
        assert_eq!(cd.delta, 0);
        assert_eq!(cd.end.position, prefix as usize);
        assert_eq!(cd.end.record.comment, b"]]></html>");
    }

    #[test]
    fn test_relative_offsets_produce_delta() {
        let mut data = b"0123456789".to_vec();
        data.extend(eocd_bytes(0, 0, 0, b""));
        let cd = read_central_directory(&data, &ReadLimits::default()).unwrap();
        assert_eq!(cd.delta, 10);
    }

    #[test]
    fn test_offset_past_end_is_corrupt() {
        let data = eocd_bytes(0, 0, 100, b"");
        let err = read_central_directory(&data, &ReadLimits::default()).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }

    #[test]
    fn test_signature_inside_comment_is_not_preferred() {
        // The comment itself contains a fake record signature.
        let mut comment = END_OF_CENTRAL_DIRECTORY_SIGNATURE.to_le_bytes().to_vec();
        comment.extend_from_slice(&[0u8; 30]);
        let data = eocd_bytes(0, 0, 0, &comment);
        let located = locate_end_of_central_directory(&data).unwrap();
        assert_eq!(located.position, 0);
    }

    #[test]
    fn test_trailing_garbage_falls_back() {
        let mut data = eocd_bytes(0, 0, 0, b"]]></html>");
        data.extend_from_slice(b"\n");
        let located = locate_end_of_central_directory(&data).unwrap();
        assert_eq!(located.position, 0);
    }

    #[test]
    fn test_not_an_archive() {
        let err = locate_end_of_central_directory(b"<html><body>plain page</body></html>")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
        assert!(locate_end_of_central_directory(b"PK").is_err());
    }

    #[test]
    fn test_multi_disk_rejected() {
        let mut data = eocd_bytes(0, 0, 0, b"");
        data[4] = 1;
        assert!(matches!(
            locate_end_of_central_directory(&data),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_entry_limit() {
        let data = eocd_bytes(3, 0, 0, b"");
        let err =
            read_central_directory(&data, &ReadLimits::default().max_entries(2)).unwrap_err();
        assert!(matches!(err, Error::ResourceLimitExceeded(_)));
    }

    #[test]
    fn test_declared_entries_missing() {
        let data = eocd_bytes(1, 0, 0, b"");
        let err = read_central_directory(&data, &ReadLimits::default()).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { .. }));
    }
}
