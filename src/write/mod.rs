//! Container writing API.
//!
//! A [`Writer`] appends entries to any `Write + Seek` sink and finishes
//! with the central directory and an end record carrying a caller-chosen
//! trailer. Bytes written before the first entry (the HTML shell of a page
//! archive) are accounted for in every recorded offset.
//!
//! # Example
//!
//! ```rust
//! use pagezip::write::{EntryOptions, Writer};
//! use pagezip::ArchivePath;
//!
//! let mut writer = Writer::in_memory_with_prefix(b"<!doctype html>")?;
//! writer.add_text(
//!     ArchivePath::new("index.html")?,
//!     "<p>hello</p>",
//!     &EntryOptions::new().comment("https://example.com/"),
//! )?;
//! let (result, bytes) = writer.finish_to_vec(b"")?;
//! assert_eq!(result.entries_written, 1);
//! assert!(bytes.starts_with(b"<!doctype html>PK"));
//! # Ok::<(), pagezip::Error>(())
//! ```

mod entry_input;
pub(crate) mod options;
mod writer_init;

pub use options::{EntryOptions, WriteOptions, WriteResult};

use std::collections::HashSet;

use crate::format::header::CentralDirectoryHeader;

/// State of the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Accepting new entries.
    AcceptingEntries,
    /// An entry failed; the archive can no longer be finished.
    Poisoned,
}

/// Running totals reported in [`WriteResult`].
#[derive(Debug, Default)]
struct Totals {
    total_size: u64,
    compressed_size: u64,
    stored_entries: usize,
}

/// A page archive container writer.
pub struct Writer<W> {
    sink: W,
    options: WriteOptions,
    state: WriterState,
    entries: Vec<CentralDirectoryHeader>,
    names: HashSet<String>,
    prefix_size: u64,
    totals: Totals,
}

impl<W> std::fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("entries", &self.entries.len())
            .field("prefix_size", &self.prefix_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CompressionMethod;
    use crate::read::Archive;
    use crate::{ArchivePath, Error};
    use std::io::Cursor;

    fn path(s: &str) -> ArchivePath {
        ArchivePath::new(s).unwrap()
    }

    #[test]
    fn test_writer_create() {
        let writer = Writer::create(Cursor::new(Vec::new())).unwrap();
        assert_eq!(writer.state, WriterState::AcceptingEntries);
        assert_eq!(writer.prefix_size, 0);
    }

    #[test]
    fn test_writer_options() {
        let writer = Writer::in_memory()
            .unwrap()
            .options(WriteOptions::new().level(9).unwrap());
        assert_eq!(writer.options.level, 9);
    }

    #[test]
    fn test_empty_archive_is_openable() {
        let (result, bytes) = Writer::in_memory().unwrap().finish_to_vec(b"").unwrap();
        assert_eq!(result.entries_written, 0);
        assert_eq!(bytes.len(), 22);
        let archive = Archive::open(bytes).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn test_duplicate_entry_poisons_writer() {
        let mut writer = Writer::in_memory().unwrap();
        writer
            .add_text(path("a.css"), "a{}", &EntryOptions::new())
            .unwrap();
        let err = writer
            .add_text(path("a.css"), "b{}", &EntryOptions::new())
            .unwrap_err();
        match err {
            Error::EntryWrite { path, source } => {
                assert_eq!(path, "a.css");
                assert!(matches!(*source, Error::DuplicateEntry { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(writer.state, WriterState::Poisoned);
        assert!(matches!(
            writer.add_text(path("b.css"), "", &EntryOptions::new()),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            writer.finish_to_vec(b""),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_store_uncompressed_flag() {
        let mut writer = Writer::in_memory().unwrap();
        let data = vec![7u8; 4096];
        writer
            .add_bytes(
                path("img.png"),
                &data,
                &EntryOptions::new().store_uncompressed(true),
            )
            .unwrap();
        writer
            .add_bytes(path("data.bin"), &data, &EntryOptions::new())
            .unwrap();
        let (result, bytes) = writer.finish_to_vec(b"").unwrap();
        assert_eq!(result.stored_entries, 1);

        let archive = Archive::open(bytes).unwrap();
        let png = archive.entry("img.png").unwrap();
        assert_eq!(png.method, CompressionMethod::Stored);
        assert_eq!(png.compressed_size, 4096);
        #[cfg(feature = "deflate")]
        {
            let bin = archive.entry("data.bin").unwrap();
            assert_eq!(bin.method, CompressionMethod::Deflate);
            assert!(bin.compressed_size < 100);
        }
    }

    #[test]
    fn test_prefix_and_trailer_placement() {
        let mut writer = Writer::in_memory_with_prefix(b"<html><![CDATA[").unwrap();
        writer
            .add_text(path("index.html"), "<p>x</p>", &EntryOptions::new())
            .unwrap();
        let (result, bytes) = writer.finish_to_vec(b"]]></html>").unwrap();
        assert_eq!(result.prefix_size, 15);
        assert_eq!(result.archive_size, bytes.len() as u64);
        assert!(bytes.starts_with(b"<html><![CDATA[PK\x03\x04"));
        assert!(bytes.ends_with(b"]]></html>"));
    }

    #[test]
    fn test_level_zero_stores() {
        let mut writer = Writer::in_memory()
            .unwrap()
            .options(WriteOptions::new().level(0).unwrap());
        writer
            .add_text(path("a.txt"), &"x".repeat(100), &EntryOptions::new())
            .unwrap();
        let (result, _) = writer.finish_to_vec(b"").unwrap();
        assert_eq!(result.stored_entries, 1);
        assert_eq!(result.compressed_size, 100);
    }
}
