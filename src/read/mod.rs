//! Container reading API.
//!
//! An [`Archive`] holds the complete byte buffer of a page archive (shell
//! prefix, container, trailer) and an index of its entries. Entries are
//! decoded on demand and verified against their stored CRC-32.
//!
//! # Example
//!
//! ```rust,no_run
//! use pagezip::read::Archive;
//!
//! let archive = Archive::open_path("page.html")?;
//! for entry in archive.entries() {
//!     println!("{}: {} bytes ({})", entry.path, entry.size, entry.method);
//! }
//! let markup = archive.read_text("index.html")?;
//! # Ok::<(), pagezip::Error>(())
//! ```

mod archive_open;
mod archive_query;
mod entry;
mod extraction;
mod info;

pub use crate::format::parser::ReadLimits;
pub use entry::Entry;
pub use info::ArchiveInfo;

use std::collections::HashMap;

/// A parsed page archive.
///
/// The archive owns its bytes; reading an entry never copies more than
/// that entry's payload.
#[derive(Debug, Clone)]
pub struct Archive {
    pub(crate) data: Vec<u8>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) index: HashMap<String, usize>,
    pub(crate) info: ArchiveInfo,
    pub(crate) limits: ReadLimits,
}
