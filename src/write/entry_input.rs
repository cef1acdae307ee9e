//! Entry input methods.

use std::io::{Read, Seek, Write};

use crate::checksum::Crc32;
use crate::codec::{CompressionMethod, compress};
use crate::format::header::CentralDirectoryHeader;
use crate::format::{FLAG_UTF8, MAX_ENTRIES, MAX_SIZE};
use crate::progress::{NoProgress, ProgressReporter};
use crate::{ArchivePath, Error, Result};

use super::options::EntryOptions;
use super::{Writer, WriterState};

/// Largest comment a central directory record can hold.
const MAX_COMMENT_BYTES: usize = u16::MAX as usize;

/// Returns the comment to store, cut at a character boundary if too long.
fn entry_comment(path: &ArchivePath, comment: Option<&str>) -> String {
    let comment = comment.unwrap_or_default();
    if comment.len() <= MAX_COMMENT_BYTES {
        return comment.to_string();
    }
    let mut end = MAX_COMMENT_BYTES;
    while !comment.is_char_boundary(end) {
        end -= 1;
    }
    log::warn!("comment of {path} truncated to {end} bytes");
    comment[..end].to_string()
}

impl<W: Write + Seek> Writer<W> {
    /// Adds an entry from a byte slice.
    ///
    /// # Errors
    ///
    /// Any failure is reported as [`Error::EntryWrite`] and leaves the
    /// writer unusable: a partial archive can never be finished.
    pub fn add_bytes(
        &mut self,
        path: ArchivePath,
        data: &[u8],
        options: &EntryOptions,
    ) -> Result<()> {
        self.add_bytes_with_progress(path, data, options, &mut NoProgress)
    }

    /// Adds a text entry, stored as UTF-8.
    pub fn add_text(
        &mut self,
        path: ArchivePath,
        text: &str,
        options: &EntryOptions,
    ) -> Result<()> {
        self.add_bytes(path, text.as_bytes(), options)
    }

    /// Adds an entry from a reader, buffering its content.
    pub fn add_stream<R: Read>(
        &mut self,
        path: ArchivePath,
        source: &mut R,
        options: &EntryOptions,
    ) -> Result<()> {
        self.ensure_accepting_entries()?;
        let mut data = Vec::new();
        if let Err(e) = source.read_to_end(&mut data) {
            self.state = WriterState::Poisoned;
            return Err(Error::Io(e).into_entry_write(path.as_str()));
        }
        self.add_bytes(path, &data, options)
    }

    /// Adds an entry, reporting its start and completion to `progress`.
    pub fn add_bytes_with_progress(
        &mut self,
        path: ArchivePath,
        data: &[u8],
        options: &EntryOptions,
        progress: &mut dyn ProgressReporter,
    ) -> Result<()> {
        self.ensure_accepting_entries()?;
        progress.on_entry_start(path.as_str(), data.len() as u64);
        match self.write_entry(&path, data, options) {
            Ok(stored_size) => {
                progress.on_ratio(data.len() as u64, stored_size);
                progress.on_entry_complete(path.as_str(), true);
                Ok(())
            }
            Err(e) => {
                self.state = WriterState::Poisoned;
                progress.on_entry_complete(path.as_str(), false);
                Err(e.into_entry_write(path.as_str()))
            }
        }
    }

    fn write_entry(
        &mut self,
        path: &ArchivePath,
        data: &[u8],
        options: &EntryOptions,
    ) -> Result<u64> {
        if self.names.contains(path.as_str()) {
            return Err(Error::DuplicateEntry {
                path: path.to_string(),
            });
        }
        if self.entries.len() >= MAX_ENTRIES {
            return Err(Error::ResourceLimitExceeded(format!(
                "more than {MAX_ENTRIES} entries need ZIP64"
            )));
        }
        if data.len() as u64 > MAX_SIZE {
            return Err(Error::ResourceLimitExceeded(
                "entry larger than 4 GiB needs ZIP64".into(),
            ));
        }

        let method = self.options.effective_method(options.store_uncompressed);
        let payload = match method {
            CompressionMethod::Stored => None,
            other => Some(compress(other, self.options.level, data)?),
        };
        let stored: &[u8] = payload.as_deref().unwrap_or(data);

        let offset = self.sink.stream_position().map_err(Error::Io)?;
        if offset > MAX_SIZE || stored.len() as u64 > MAX_SIZE {
            return Err(Error::ResourceLimitExceeded(
                "archive exceeds 4 GiB without ZIP64".into(),
            ));
        }

        let header = CentralDirectoryHeader {
            flags: FLAG_UTF8,
            method: method.id(),
            modified: self.options.modified,
            crc32: Crc32::compute(data),
            compressed_size: stored.len() as u32,
            uncompressed_size: data.len() as u32,
            name: path.as_str().to_string(),
            comment: entry_comment(path, options.comment.as_deref()),
            disk_start: 0,
            external_attributes: 0,
            local_header_offset: offset as u32,
        };
        header.local_header().write_to(&mut self.sink)?;
        self.sink.write_all(stored).map_err(Error::Io)?;

        log::debug!(
            "added {} ({} -> {} bytes, {})",
            path,
            data.len(),
            stored.len(),
            method
        );

        self.totals.total_size += data.len() as u64;
        self.totals.compressed_size += stored.len() as u64;
        if method == CompressionMethod::Stored {
            self.totals.stored_entries += 1;
        }
        self.names.insert(header.name.clone());
        self.entries.push(header);
        Ok(stored.len() as u64)
    }
}
