//! Entry decoding and extraction.

use std::fs;
use std::path::Path;

use crate::checksum::verify_crc32;
use crate::codec::decompress;
use crate::format::header::LocalFileHeader;
use crate::{Error, Result};

use super::{Archive, Entry};

impl Archive {
    /// Reads the decoded payload of the entry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] if no such entry exists, and a
    /// format or integrity error if the payload cannot be decoded.
    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self.require(path)?;
        self.read_entry_bytes(entry)
    }

    /// Reads the entry at `path` as UTF-8 text.
    ///
    /// Invalid sequences are replaced with U+FFFD.
    pub fn read_text(&self, path: &str) -> Result<String> {
        let entry = self.require(path)?;
        self.read_entry_text(entry)
    }

    /// Reads the decoded payload of `entry`.
    pub fn read_entry_bytes(&self, entry: &Entry) -> Result<Vec<u8>> {
        if entry.size > self.limits.max_entry_unpacked {
            return Err(Error::ResourceLimitExceeded(format!(
                "entry {} unpacks to {} bytes, limit is {}",
                entry.path, entry.size, self.limits.max_entry_unpacked
            )));
        }
        let payload = self.payload(entry)?;
        let data = decompress(entry.method, payload, entry.size).map_err(|e| match e {
            Error::CorruptHeader { reason, .. } => Error::CorruptHeader {
                offset: entry.local_header_offset,
                reason: format!("{}: {reason}", entry.path),
            },
            other => other,
        })?;
        verify_crc32(entry.path.as_str(), entry.crc32, &data)?;
        log::debug!("read {} ({} bytes, {})", entry.path, data.len(), entry.method);
        Ok(data)
    }

    /// Reads `entry` as UTF-8 text, replacing invalid sequences.
    pub fn read_entry_text(&self, entry: &Entry) -> Result<String> {
        let bytes = self.read_entry_bytes(entry)?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("entry {} is not valid UTF-8", entry.path);
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        })
    }

    /// Writes every entry under `dir`, creating directories as needed.
    ///
    /// Entry paths are validated when the archive is opened, so no entry
    /// can resolve outside `dir`. Returns the number of files written.
    pub fn extract_to(&self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        for entry in &self.entries {
            let target = dir.join(entry.path.as_str());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(Error::Io)?;
            }
            let data = self.read_entry_bytes(entry)?;
            fs::write(&target, data).map_err(Error::Io)?;
        }
        Ok(self.entries.len())
    }

    fn require(&self, path: &str) -> Result<&Entry> {
        self.entry(path).ok_or_else(|| Error::EntryNotFound {
            path: path.to_string(),
        })
    }

    fn payload(&self, entry: &Entry) -> Result<&[u8]> {
        let offset = entry.local_header_offset;
        let start = usize::try_from(offset).map_err(|_| Error::CorruptHeader {
            offset,
            reason: "offset out of range".into(),
        })?;
        let tail = self.data.get(start..).ok_or_else(|| Error::CorruptHeader {
            offset,
            reason: format!("local header of {} past end of data", entry.path),
        })?;
        let local = LocalFileHeader::parse(&mut &tail[..], offset)?;
        if local.name != entry.path.as_str() {
            log::warn!(
                "local header name {:?} differs from directory name {}",
                local.name,
                entry.path
            );
        }
        let data_start = local.encoded_len();
        let data_end = usize::try_from(entry.compressed_size)
            .ok()
            .and_then(|len| data_start.checked_add(len))
            .filter(|&end| end <= tail.len())
            .ok_or_else(|| Error::CorruptHeader {
                offset,
                reason: format!("payload of {} runs past end of data", entry.path),
            })?;
        Ok(&tail[data_start..data_end])
    }
}
