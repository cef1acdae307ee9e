//! Archive query methods.

use super::{Archive, ArchiveInfo, Entry};

impl Archive {
    /// Returns information about the archive.
    pub fn info(&self) -> &ArchiveInfo {
        &self.info
    }

    /// Returns all entries in directory order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds an entry by path.
    pub fn entry(&self, path: &str) -> Option<&Entry> {
        self.index.get(path).map(|&i| &self.entries[i])
    }

    /// Returns the bytes preceding the container.
    ///
    /// For a page archive this is the HTML shell.
    pub fn prefix(&self) -> &[u8] {
        let end = usize::try_from(self.info.prefix_len).unwrap_or(self.data.len());
        &self.data[..end.min(self.data.len())]
    }

    /// Returns the end record comment (the shell trailer for page archives).
    pub fn comment(&self) -> &[u8] {
        &self.info.comment
    }

    /// Returns the complete archive bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the archive and returns its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
