//! ZIP record structures and their byte encoding.

use crate::{Error, Result};
use std::io::{self, Read, Write};

use super::reader::{read_bytes, read_u16_le, read_u32_le, write_u16_le, write_u32_le};
use super::{
    CENTRAL_DIRECTORY_HEADER_SIZE, CENTRAL_DIRECTORY_SIGNATURE, DosDateTime,
    END_OF_CENTRAL_DIRECTORY_SIGNATURE, END_OF_CENTRAL_DIRECTORY_SIZE, FLAG_UTF8,
    LOCAL_FILE_HEADER_SIGNATURE, LOCAL_FILE_HEADER_SIZE, VERSION_MADE_BY, VERSION_NEEDED,
};

fn truncated(offset: u64, record: &str) -> impl FnOnce(io::Error) -> Error + '_ {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::CorruptHeader {
                offset,
                reason: format!("truncated {record}"),
            }
        } else {
            Error::Io(e)
        }
    }
}

fn expect_signature<R: Read>(r: &mut R, expected: u32, offset: u64, record: &str) -> Result<()> {
    let sig = read_u32_le(r).map_err(truncated(offset, record))?;
    if sig != expected {
        return Err(Error::InvalidFormat(format!(
            "bad {record} signature {sig:#010x} at offset {offset:#x}"
        )));
    }
    Ok(())
}

fn field_len(len: usize, what: &str) -> Result<u16> {
    u16::try_from(len)
        .map_err(|_| Error::ResourceLimitExceeded(format!("{what} longer than 65535 bytes")))
}

fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Local file header preceding every entry payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// General purpose flags.
    pub flags: u16,
    /// Compression method identifier.
    pub method: u16,
    /// Modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
    /// Size of the stored payload.
    pub compressed_size: u32,
    /// Size of the payload after decoding.
    pub uncompressed_size: u32,
    /// Entry name.
    pub name: String,
    /// Extra field length; the extra bytes themselves are skipped.
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// Total encoded size, including name and extra field.
    pub fn encoded_len(&self) -> usize {
        LOCAL_FILE_HEADER_SIZE + self.name.len() + usize::from(self.extra_len)
    }

    /// Encodes this header. The extra field is written as zeros.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let name_len = field_len(self.name.len(), "entry name")?;
        write_u32_le(w, LOCAL_FILE_HEADER_SIGNATURE)?;
        write_u16_le(w, VERSION_NEEDED)?;
        write_u16_le(w, self.flags)?;
        write_u16_le(w, self.method)?;
        write_u16_le(w, self.modified.time)?;
        write_u16_le(w, self.modified.date)?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, self.compressed_size)?;
        write_u32_le(w, self.uncompressed_size)?;
        write_u16_le(w, name_len)?;
        write_u16_le(w, self.extra_len)?;
        w.write_all(self.name.as_bytes())?;
        w.write_all(&vec![0u8; usize::from(self.extra_len)])?;
        Ok(())
    }

    /// Parses a local header, consuming its name and extra field.
    ///
    /// `offset` is only used for error reporting.
    pub fn parse<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        const RECORD: &str = "local file header";
        expect_signature(r, LOCAL_FILE_HEADER_SIGNATURE, offset, RECORD)?;
        let mut fixed = [0u8; LOCAL_FILE_HEADER_SIZE - 4];
        r.read_exact(&mut fixed).map_err(truncated(offset, RECORD))?;
        let mut f = &fixed[..];
        let _version = read_u16_le(&mut f)?;
        let flags = read_u16_le(&mut f)?;
        let method = read_u16_le(&mut f)?;
        let time = read_u16_le(&mut f)?;
        let date = read_u16_le(&mut f)?;
        let crc32 = read_u32_le(&mut f)?;
        let compressed_size = read_u32_le(&mut f)?;
        let uncompressed_size = read_u32_le(&mut f)?;
        let name_len = read_u16_le(&mut f)?;
        let extra_len = read_u16_le(&mut f)?;
        let name = read_bytes(r, usize::from(name_len)).map_err(truncated(offset, RECORD))?;
        read_bytes(r, usize::from(extra_len)).map_err(truncated(offset, RECORD))?;
        Ok(Self {
            flags,
            method,
            modified: DosDateTime { date, time },
            crc32,
            compressed_size,
            uncompressed_size,
            name: decode_text(name),
            extra_len,
        })
    }
}

/// One record of the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// General purpose flags.
    pub flags: u16,
    /// Compression method identifier.
    pub method: u16,
    /// Modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed payload.
    pub crc32: u32,
    /// Size of the stored payload.
    pub compressed_size: u32,
    /// Size of the payload after decoding.
    pub uncompressed_size: u32,
    /// Entry name.
    pub name: String,
    /// Per-entry comment.
    pub comment: String,
    /// Disk on which the entry starts.
    pub disk_start: u16,
    /// External file attributes.
    pub external_attributes: u32,
    /// Offset of the local header, as recorded (before prefix adjustment).
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    /// Total encoded size, including name and comment.
    pub fn encoded_len(&self) -> usize {
        CENTRAL_DIRECTORY_HEADER_SIZE + self.name.len() + self.comment.len()
    }

    /// Encodes this record without an extra field.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let name_len = field_len(self.name.len(), "entry name")?;
        let comment_len = field_len(self.comment.len(), "entry comment")?;
        write_u32_le(w, CENTRAL_DIRECTORY_SIGNATURE)?;
        write_u16_le(w, VERSION_MADE_BY)?;
        write_u16_le(w, VERSION_NEEDED)?;
        write_u16_le(w, self.flags)?;
        write_u16_le(w, self.method)?;
        write_u16_le(w, self.modified.time)?;
        write_u16_le(w, self.modified.date)?;
        write_u32_le(w, self.crc32)?;
        write_u32_le(w, self.compressed_size)?;
        write_u32_le(w, self.uncompressed_size)?;
        write_u16_le(w, name_len)?;
        write_u16_le(w, 0)?;
        write_u16_le(w, comment_len)?;
        write_u16_le(w, self.disk_start)?;
        write_u16_le(w, 0)?;
        write_u32_le(w, self.external_attributes)?;
        write_u32_le(w, self.local_header_offset)?;
        w.write_all(self.name.as_bytes())?;
        w.write_all(self.comment.as_bytes())?;
        Ok(())
    }

    /// Parses one central directory record, skipping its extra field.
    pub fn parse<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        const RECORD: &str = "central directory header";
        expect_signature(r, CENTRAL_DIRECTORY_SIGNATURE, offset, RECORD)?;
        let mut fixed = [0u8; CENTRAL_DIRECTORY_HEADER_SIZE - 4];
        r.read_exact(&mut fixed).map_err(truncated(offset, RECORD))?;
        let mut f = &fixed[..];
        let _made_by = read_u16_le(&mut f)?;
        let _needed = read_u16_le(&mut f)?;
        let flags = read_u16_le(&mut f)?;
        let method = read_u16_le(&mut f)?;
        let time = read_u16_le(&mut f)?;
        let date = read_u16_le(&mut f)?;
        let crc32 = read_u32_le(&mut f)?;
        let compressed_size = read_u32_le(&mut f)?;
        let uncompressed_size = read_u32_le(&mut f)?;
        let name_len = read_u16_le(&mut f)?;
        let extra_len = read_u16_le(&mut f)?;
        let comment_len = read_u16_le(&mut f)?;
        let disk_start = read_u16_le(&mut f)?;
        let _internal = read_u16_le(&mut f)?;
        let external_attributes = read_u32_le(&mut f)?;
        let local_header_offset = read_u32_le(&mut f)?;

        let name = read_bytes(r, usize::from(name_len)).map_err(truncated(offset, RECORD))?;
        read_bytes(r, usize::from(extra_len)).map_err(truncated(offset, RECORD))?;
        let comment =
            read_bytes(r, usize::from(comment_len)).map_err(truncated(offset, RECORD))?;

        Ok(Self {
            flags,
            method,
            modified: DosDateTime { date, time },
            crc32,
            compressed_size,
            uncompressed_size,
            name: decode_text(name),
            comment: decode_text(comment),
            disk_start,
            external_attributes,
            local_header_offset,
        })
    }

    /// Builds the matching local header for this record.
    pub fn local_header(&self) -> LocalFileHeader {
        LocalFileHeader {
            flags: self.flags,
            method: self.method,
            modified: self.modified,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            name: self.name.clone(),
            extra_len: 0,
        }
    }

    /// Returns whether names and comments are flagged as UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.flags & FLAG_UTF8 != 0
    }
}

/// End of central directory record.
///
/// Its trailing comment is where a page archive keeps the closing markup
/// of the HTML shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub central_directory_disk: u16,
    /// Entries recorded on this disk.
    pub entries_on_disk: u16,
    /// Total number of entries.
    pub total_entries: u16,
    /// Size of the central directory in bytes.
    pub central_directory_size: u32,
    /// Recorded offset of the central directory.
    pub central_directory_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Creates a single-disk record.
    pub fn new(entries: u16, size: u32, offset: u32, comment: Vec<u8>) -> Self {
        Self {
            disk_number: 0,
            central_directory_disk: 0,
            entries_on_disk: entries,
            total_entries: entries,
            central_directory_size: size,
            central_directory_offset: offset,
            comment,
        }
    }

    /// Total encoded size including the comment.
    pub fn encoded_len(&self) -> usize {
        END_OF_CENTRAL_DIRECTORY_SIZE + self.comment.len()
    }

    /// Encodes this record followed by its comment.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let comment_len = field_len(self.comment.len(), "archive comment")?;
        write_u32_le(w, END_OF_CENTRAL_DIRECTORY_SIGNATURE)?;
        write_u16_le(w, self.disk_number)?;
        write_u16_le(w, self.central_directory_disk)?;
        write_u16_le(w, self.entries_on_disk)?;
        write_u16_le(w, self.total_entries)?;
        write_u32_le(w, self.central_directory_size)?;
        write_u32_le(w, self.central_directory_offset)?;
        write_u16_le(w, comment_len)?;
        w.write_all(&self.comment)?;
        Ok(())
    }

    /// Parses the record, reading at most the declared comment length.
    ///
    /// A comment cut short by the end of the input is kept as far as it
    /// goes; callers decide whether that is acceptable.
    pub fn parse<R: Read>(r: &mut R, offset: u64) -> Result<Self> {
        const RECORD: &str = "end of central directory";
        expect_signature(r, END_OF_CENTRAL_DIRECTORY_SIGNATURE, offset, RECORD)?;
        let mut fixed = [0u8; END_OF_CENTRAL_DIRECTORY_SIZE - 4];
        r.read_exact(&mut fixed).map_err(truncated(offset, RECORD))?;
        let mut f = &fixed[..];
        let disk_number = read_u16_le(&mut f)?;
        let central_directory_disk = read_u16_le(&mut f)?;
        let entries_on_disk = read_u16_le(&mut f)?;
        let total_entries = read_u16_le(&mut f)?;
        let central_directory_size = read_u32_le(&mut f)?;
        let central_directory_offset = read_u32_le(&mut f)?;
        let comment_len = read_u16_le(&mut f)?;
        let mut comment = Vec::with_capacity(usize::from(comment_len));
        r.take(u64::from(comment_len)).read_to_end(&mut comment)?;
        Ok(Self {
            disk_number,
            central_directory_disk,
            entries_on_disk,
            total_entries,
            central_directory_size,
            central_directory_offset,
            comment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cd() -> CentralDirectoryHeader {
        CentralDirectoryHeader {
            flags: FLAG_UTF8,
            method: 8,
            modified: DosDateTime::EPOCH,
            crc32: 0xEC4A_C3D0,
            compressed_size: 11,
            uncompressed_size: 13,
            name: "frames/0/index.html".into(),
            comment: "https://example.com/frame".into(),
            disk_start: 0,
            external_attributes: 0,
            local_header_offset: 1234,
        }
    }

    #[test]
    fn test_local_header_layout() {
        let header = sample_cd().local_header();
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), header.encoded_len());
        assert_eq!(&buf[..4], b"PK\x03\x04");
        assert_eq!(&buf[30..], b"frames/0/index.html");

        let parsed = LocalFileHeader::parse(&mut &buf[..], 0).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_central_directory_layout() {
        let record = sample_cd();
        let mut buf = Vec::new();
        record.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), record.encoded_len());
        // comment length field
        assert_eq!(u16::from_le_bytes([buf[32], buf[33]]), 25);
        let parsed = CentralDirectoryHeader::parse(&mut &buf[..], 0).unwrap();
        assert_eq!(parsed, record);
        assert!(parsed.is_utf8());
    }

    #[test]
    fn test_eocd_carries_comment() {
        let eocd = EndOfCentralDirectory::new(2, 100, 500, b"]]></html>".to_vec());
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 22 + 10);
        assert!(buf.ends_with(b"]]></html>"));
        let parsed = EndOfCentralDirectory::parse(&mut &buf[..], 0).unwrap();
        assert_eq!(parsed, eocd);
    }

    #[test]
    fn test_bad_signature() {
        let err = LocalFileHeader::parse(&mut &b"PK\x01\x02rest of bytes"[..], 7).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_truncated_record() {
        let mut buf = Vec::new();
        sample_cd().write_to(&mut buf).unwrap();
        buf.truncate(50);
        let err = CentralDirectoryHeader::parse(&mut &buf[..], 0x40).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 0x40, .. }));
    }

    #[test]
    fn test_name_too_long() {
        let mut record = sample_cd();
        record.name = "a".repeat(70_000);
        let err = record.write_to(&mut Vec::new()).unwrap_err();
        assert!(matches!(err, Error::ResourceLimitExceeded(_)));
    }

    #[test]
    fn test_non_utf8_name_is_lossy() {
        assert_eq!(decode_text(vec![b'a', 0xFF, b'b']), "a\u{FFFD}b");
    }
}
