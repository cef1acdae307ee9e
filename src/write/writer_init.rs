//! Writer initialization and finalization.

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use crate::format::header::EndOfCentralDirectory;
use crate::format::{MAX_ENTRIES, MAX_SIZE};
use crate::{Error, Result};

use super::options::{WriteOptions, WriteResult};
use super::{Totals, Writer, WriterState};

impl Writer<BufWriter<File>> {
    /// Creates a new archive file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        Self::create(BufWriter::new(file))
    }
}

impl Writer<Cursor<Vec<u8>>> {
    /// Creates a writer that builds the archive in memory.
    pub fn in_memory() -> Result<Self> {
        Self::create(Cursor::new(Vec::new()))
    }

    /// Creates an in-memory writer whose output starts with `prefix`.
    pub fn in_memory_with_prefix(prefix: &[u8]) -> Result<Self> {
        Self::with_prefix(Cursor::new(Vec::new()), prefix)
    }

    /// Finishes the archive and returns its bytes.
    pub fn finish_to_vec(self, trailer: &[u8]) -> Result<(WriteResult, Vec<u8>)> {
        let (result, sink) = self.finish_into_inner(trailer)?;
        Ok((result, sink.into_inner()))
    }
}

impl<W: Write + Seek> Writer<W> {
    /// Creates a new archive writer.
    ///
    /// Entries are written starting at the sink's current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink position cannot be queried.
    pub fn create(mut sink: W) -> Result<Self> {
        let prefix_size = sink.stream_position().map_err(Error::Io)?;
        Ok(Self {
            sink,
            options: WriteOptions::default(),
            state: WriterState::AcceptingEntries,
            entries: Vec::new(),
            names: Default::default(),
            prefix_size,
            totals: Totals::default(),
        })
    }

    /// Creates a writer that first writes `prefix` to the sink.
    ///
    /// The prefix is opaque to the container; it is typically the HTML
    /// shell of a page archive.
    pub fn with_prefix(mut sink: W, prefix: &[u8]) -> Result<Self> {
        sink.write_all(prefix).map_err(Error::Io)?;
        Self::create(sink)
    }

    /// Sets the write options.
    pub fn options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries were added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn ensure_accepting_entries(&self) -> Result<()> {
        match self.state {
            WriterState::AcceptingEntries => Ok(()),
            WriterState::Poisoned => Err(Error::InvalidState(
                "writer aborted after a failed entry",
            )),
        }
    }

    /// Finishes writing the archive and drops the sink.
    ///
    /// `trailer` becomes the end record comment and is therefore the last
    /// bytes of the output.
    pub fn finish(self, trailer: &[u8]) -> Result<WriteResult> {
        let (result, _sink) = self.finish_into_inner(trailer)?;
        Ok(result)
    }

    /// Finishes writing the archive and returns the sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if an earlier entry failed, and
    /// [`Error::ResourceLimitExceeded`] if the archive needs ZIP64.
    pub fn finish_into_inner(mut self, trailer: &[u8]) -> Result<(WriteResult, W)> {
        self.ensure_accepting_entries()?;

        if self.entries.len() > MAX_ENTRIES {
            return Err(Error::ResourceLimitExceeded(format!(
                "{} entries exceed the {MAX_ENTRIES} entry format limit",
                self.entries.len()
            )));
        }
        let directory_start = self.sink.stream_position().map_err(Error::Io)?;
        for header in &self.entries {
            header.write_to(&mut self.sink)?;
        }
        let directory_end = self.sink.stream_position().map_err(Error::Io)?;
        let directory_size = directory_end - directory_start;
        if directory_end > MAX_SIZE {
            return Err(Error::ResourceLimitExceeded(
                "archive exceeds 4 GiB without ZIP64".into(),
            ));
        }

        EndOfCentralDirectory::new(
            self.entries.len() as u16,
            directory_size as u32,
            directory_start as u32,
            trailer.to_vec(),
        )
        .write_to(&mut self.sink)?;
        self.sink.flush().map_err(Error::Io)?;
        let archive_size = self.sink.stream_position().map_err(Error::Io)?;

        let result = WriteResult {
            entries_written: self.entries.len(),
            stored_entries: self.totals.stored_entries,
            total_size: self.totals.total_size,
            compressed_size: self.totals.compressed_size,
            prefix_size: self.prefix_size,
            archive_size,
        };
        log::info!(
            "archive finished: {} entries, {} bytes",
            result.entries_written,
            result.archive_size
        );
        Ok((result, self.sink))
    }
}
