//! Archive opening and entry indexing.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::codec::CompressionMethod;
use crate::format::parser::{ReadLimits, read_central_directory};
use crate::format::{FLAG_ENCRYPTED, header::CentralDirectoryHeader};
use crate::{ArchivePath, Error, Result};

use super::{Archive, ArchiveInfo, Entry};

impl Archive {
    /// Opens an archive from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid archive.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_path_with_limits(path, ReadLimits::default())
    }

    /// Opens an archive from a file path with custom resource limits.
    pub fn open_path_with_limits(path: impl AsRef<Path>, limits: ReadLimits) -> Result<Self> {
        let data = fs::read(path.as_ref()).map_err(Error::Io)?;
        Self::open_with_limits(data, limits)
    }

    /// Opens an archive from its complete byte content.
    ///
    /// Any bytes may precede the container; the HTML shell of a page
    /// archive is skipped transparently.
    ///
    /// # Errors
    ///
    /// Returns a format error ([`Error::is_format_error`]) when the bytes
    /// hold no valid container.
    pub fn open(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::open_with_limits(data, ReadLimits::default())
    }

    /// Opens an archive with custom resource limits.
    ///
    /// # Errors
    ///
    /// Additionally returns [`Error::ResourceLimitExceeded`] when the
    /// central directory violates `limits`.
    pub fn open_with_limits(data: impl Into<Vec<u8>>, limits: ReadLimits) -> Result<Self> {
        let data = data.into();
        let directory = read_central_directory(&data, &limits)?;

        let mut entries = Vec::with_capacity(directory.headers.len());
        let mut index = HashMap::with_capacity(directory.headers.len());
        let mut info = ArchiveInfo {
            comment: directory.end.record.comment.clone(),
            ..Default::default()
        };

        for header in &directory.headers {
            if header.name.ends_with('/') {
                log::debug!("skipping directory entry {}", header.name);
                continue;
            }
            let entry = build_entry(header, directory.delta, directory.start, entries.len())?;
            if index.contains_key(entry.path.as_str()) {
                log::warn!("duplicate entry {} ignored", entry.path);
                continue;
            }
            info.total_size += entry.size;
            info.packed_size += entry.compressed_size;
            if entry.is_stored() {
                info.stored_entries += 1;
            }
            index.insert(entry.path.as_str().to_string(), entries.len());
            entries.push(entry);
        }

        info.entry_count = entries.len();
        info.prefix_len = entries
            .iter()
            .map(|e| e.local_header_offset)
            .min()
            .unwrap_or(directory.start as u64);

        log::debug!(
            "opened archive: {} entries, {} prefix bytes",
            info.entry_count,
            info.prefix_len
        );

        Ok(Self {
            data,
            entries,
            index,
            info,
            limits,
        })
    }
}

fn build_entry(
    header: &CentralDirectoryHeader,
    delta: u64,
    directory_start: usize,
    position: usize,
) -> Result<Entry> {
    if header.flags & FLAG_ENCRYPTED != 0 {
        return Err(Error::InvalidFormat(format!(
            "entry {} is encrypted",
            header.name
        )));
    }
    let path = ArchivePath::new(&header.name)
        .map_err(|e| Error::InvalidFormat(format!("entry name {:?}: {e}", header.name)))?;
    let method = CompressionMethod::from_id(header.method)?;
    let local_header_offset = u64::from(header.local_header_offset) + delta;
    if local_header_offset >= directory_start as u64 {
        return Err(Error::CorruptHeader {
            offset: local_header_offset,
            reason: format!("entry {} starts inside the central directory", header.name),
        });
    }
    Ok(Entry {
        path,
        method,
        size: u64::from(header.uncompressed_size),
        compressed_size: u64::from(header.compressed_size),
        crc32: header.crc32,
        comment: header.comment.clone(),
        modified: header.modified,
        local_header_offset,
        index: position,
    })
}
