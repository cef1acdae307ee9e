//! # pagezip
//!
//! Self-extracting, single-file web page archives.
//!
//! A captured page (its markup, nested frames, stylesheets, scripts, fonts
//! and images) is packed into one file that is at the same time a ZIP
//! archive and an HTML document. Opened in a browser, the document's
//! embedded bootstrap script reads the file's own bytes, unpacks the
//! entries, rewrites references between them, and replaces itself with the
//! original page. No server or companion program is needed.
//!
//! ## Quick Start
//!
//! ### Writing a Page Archive
//!
//! ```rust,no_run
//! use pagezip::{ArchiveOptions, PageData, ResourceEntry, Result, write_page};
//!
//! fn main() -> Result<()> {
//!     let page = PageData::new("<!doctype html>\n<link rel=stylesheet href=stylesheet_0.css><h1>Hi</h1>")
//!         .title("Hi")
//!         .url("https://example.com/")
//!         .resource("stylesheets", ResourceEntry::new("stylesheet_0.css", "h1 { color: teal }"));
//!
//!     let bytes = write_page(&page, &ArchiveOptions::new().insert_text_body(true))?;
//!     std::fs::write("hi.html", bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Rebuilding a Page Without a Browser
//!
//! ```rust,no_run
//! use pagezip::{Bootstrap, HeadlessHost, Result};
//!
//! fn main() -> Result<()> {
//!     let mut bootstrap = Bootstrap::new(HeadlessHost::from_path("hi.html"));
//!     bootstrap.run()?;
//!     if let Some(html) = bootstrap.host().render() {
//!         println!("{html}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Reading Entries
//!
//! ```rust,no_run
//! use pagezip::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path("hi.html")?;
//!     for entry in archive.entries() {
//!         println!("{} {} bytes {}", entry.path, entry.size, entry.comment().unwrap_or(""));
//!     }
//!     println!("{}", archive.read_text("stylesheet_0.css")?);
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! | Module | Role |
//! |--------|------|
//! | [`read`], [`write`], [`format`], [`codec`] | ZIP container codec |
//! | [`shell`] | HTML prefix, trailer and embedded bootstrap script |
//! | [`archiver`] | Page tree to archive |
//! | [`bootstrap`], [`dom`] | Archive back to a live document |
//! | [`transport`] | Chunked delivery of captured pages |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression of entries |
//! | `cli` | No | Command-line interface tool |
//!
//! Without `deflate`, every entry is stored and archives using deflate
//! cannot be read.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Errors that mean "these bytes are
//! not a usable archive" are grouped by [`Error::is_format_error`]:
//!
//! ```rust,no_run
//! use pagezip::{Archive, Error};
//!
//! fn open(path: &str) -> pagezip::Result<()> {
//!     match Archive::open_path(path) {
//!         Ok(archive) => {
//!             println!("{} entries", archive.len());
//!             Ok(())
//!         }
//!         Err(e) if e.is_format_error() => {
//!             eprintln!("Not a page archive: {e}");
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! # fn main() {}
//! ```
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod archive_path;
pub mod archiver;
pub mod bootstrap;
pub mod checksum;
pub mod codec;
pub mod dom;
pub mod error;
pub mod format;
pub mod page;
pub mod progress;
pub mod read;
pub mod shell;
pub mod transport;
pub mod write;

pub use archive_path::ArchivePath;
pub use error::{Error, Result};

// Re-export the container API at crate root for convenience
pub use codec::CompressionMethod;
pub use read::{Archive, ArchiveInfo, Entry, ReadLimits};
pub use write::{EntryOptions, WriteOptions, WriteResult, Writer};

// Re-export the page archive API
pub use archiver::{ArchiveOptions, write_page, write_page_to, write_page_with_progress};
pub use page::{PageData, ResourceContent, ResourceEntry, Resources};
pub use shell::{ShellBuilder, ShellOptions, TRAILER};

// Re-export the reconstruction API
pub use bootstrap::{
    Bootstrap, BootstrapOptions, BootstrapState, DocumentHost, HeadlessHost, Outcome, ShellMessage,
};

// Re-export the transport API
pub use transport::{
    ChunkAssembler, DownloadMessage, MessageSink, SavePayload, SaveSession, TransportOptions,
    send_page,
};

// Re-export progress API
pub use progress::{NoProgress, ProgressReporter, ProgressState, StatisticsProgress, progress_fn};
