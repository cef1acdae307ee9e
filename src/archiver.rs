//! Page archive writer.
//!
//! Serializes a [`PageData`] tree into a single page archive: the HTML
//! shell, then one container entry per document and resource, then the
//! trailer. Entries are written in a fixed order (the page's `index.html`,
//! then its resource groups in declared order, descending depth-first into
//! frames), so identical input always yields identical bytes.
//!
//! # Example
//!
//! ```rust
//! use pagezip::archiver::{write_page, ArchiveOptions};
//! use pagezip::page::{PageData, ResourceEntry};
//! use pagezip::read::Archive;
//!
//! let page = PageData::new("<!doctype html>\n<img src=images/0.png>")
//!     .title("Example")
//!     .resource("images", ResourceEntry::new("images/0.png", vec![137u8, 80, 78, 71]));
//! let bytes = write_page(&page, &ArchiveOptions::new().url("https://example.com/"))?;
//!
//! let archive = Archive::open(bytes)?;
//! assert_eq!(archive.entries()[0].name(), "index.html");
//! assert!(archive.entry("images/0.png").unwrap().is_stored());
//! # Ok::<(), pagezip::Error>(())
//! ```

use std::io::{Cursor, Seek, Write};

use crate::dom::Document;
use crate::page::{PageData, ResourceEntry, ResourceGroup};
use crate::progress::{NoProgress, ProgressReporter};
use crate::shell::{ShellBuilder, ShellOptions, TRAILER};
use crate::write::{EntryOptions, WriteOptions, WriteResult, Writer};
use crate::{ArchivePath, Result};

/// Extensions of already-compressed formats, stored without compression.
pub const NO_COMPRESSION_EXTENSIONS: [&str; 10] = [
    ".jpg", ".jpeg", ".png", ".pdf", ".woff2", ".mp4", ".mp3", ".ogg", ".webp", ".webm",
];

/// Name of the document entry in every frame directory.
pub const INDEX_FILE: &str = "index.html";

/// Returns true if a resource should be stored without compression.
///
/// Either the entry name's suffix or the declared extension must be one of
/// the already compressed formats.
///
/// ```
/// use pagezip::archiver::is_precompressed;
/// use pagezip::page::ResourceEntry;
///
/// assert!(is_precompressed(&ResourceEntry::new("images/0.png", vec![0u8])));
/// assert!(!is_precompressed(&ResourceEntry::new("images/1.svg", "<svg/>")));
/// ```
pub fn is_precompressed(resource: &ResourceEntry) -> bool {
    NO_COMPRESSION_EXTENSIONS
        .iter()
        .any(|extension| resource.name.ends_with(extension) || resource.extension == *extension)
}

/// Options for writing a page archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
    /// Embed the page's plain text as a hidden fallback in the shell.
    pub insert_text_body: bool,
    /// URL recorded as the comment of the root document entry.
    ///
    /// Falls back to [`PageData::url`] when unset.
    pub url: Option<String>,
    /// Container writer options.
    pub write: WriteOptions,
    /// Shell page options.
    pub shell: ShellOptions,
}

impl ArchiveOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the hidden text body.
    pub fn insert_text_body(mut self, insert: bool) -> Self {
        self.insert_text_body = insert;
        self
    }

    /// Sets the root document URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the container writer options.
    pub fn write(mut self, write: WriteOptions) -> Self {
        self.write = write;
        self
    }

    /// Sets the shell options.
    pub fn shell(mut self, shell: ShellOptions) -> Self {
        self.shell = shell;
        self
    }
}

/// Writes `page` as a page archive and returns its bytes.
///
/// # Errors
///
/// Returns [`crate::Error::EntryWrite`] if any entry cannot be added; no
/// partial archive is ever returned.
pub fn write_page(page: &PageData, options: &ArchiveOptions) -> Result<Vec<u8>> {
    let (_, bytes) = write_page_with_progress(page, options, &mut NoProgress)?;
    Ok(bytes)
}

/// Writes `page` in memory, reporting each entry to `progress`.
pub fn write_page_with_progress(
    page: &PageData,
    options: &ArchiveOptions,
    progress: &mut dyn ProgressReporter,
) -> Result<(WriteResult, Vec<u8>)> {
    let (result, sink) = write_page_to(Cursor::new(Vec::new()), page, options, progress)?;
    Ok((result, sink.into_inner()))
}

/// Writes `page` to `sink`, starting at its current position.
///
/// On error the sink may hold a partial archive; callers writing to a
/// file should remove it.
pub fn write_page_to<W: Write + Seek>(
    sink: W,
    page: &PageData,
    options: &ArchiveOptions,
    progress: &mut dyn ProgressReporter,
) -> Result<(WriteResult, W)> {
    let mut shell = ShellBuilder::new()
        .options(options.shell.clone())
        .doctype_from(&page.content)
        .title(page.title.as_str());
    if options.insert_text_body {
        shell = shell.text_body(Document::parse(&page.content).body_text());
    }
    let shell = shell.build()?;

    let mut writer = Writer::with_prefix(sink, shell.as_bytes())?.options(options.write.clone());
    progress.on_total(page.entry_count());
    let url = options.url.as_deref().unwrap_or(&page.url);
    add_page(&mut writer, page, "", url, progress)?;

    let (result, sink) = writer.finish_into_inner(TRAILER.as_bytes())?;
    log::info!(
        "page archive written: {} entries, {} of {} bytes in the shell",
        result.entries_written,
        result.prefix_size,
        result.archive_size
    );
    Ok((result, sink))
}

fn add_page<W: Write + Seek>(
    writer: &mut Writer<W>,
    page: &PageData,
    prefix: &str,
    url: &str,
    progress: &mut dyn ProgressReporter,
) -> Result<()> {
    let index = entry_path(prefix, INDEX_FILE)?;
    writer.add_bytes_with_progress(
        index,
        page.content.as_bytes(),
        &EntryOptions::new().comment(url),
        progress,
    )?;

    for (group, resources) in page.resources.iter() {
        match resources {
            ResourceGroup::Frames(frames) => {
                for frame in frames {
                    let frame_prefix = frame_prefix(prefix, &frame.name);
                    log::debug!("entering frame {frame_prefix}");
                    add_page(writer, frame, &frame_prefix, &frame.url, progress)?;
                }
            }
            ResourceGroup::Entries(entries) => {
                for resource in entries {
                    let path = entry_path(prefix, &resource.name)?;
                    let entry_options = EntryOptions::new()
                        .comment(resource.url.as_str())
                        .store_uncompressed(is_precompressed(resource));
                    log::debug!("adding {group} resource {path}");
                    writer.add_bytes_with_progress(
                        path,
                        resource.content.as_bytes(),
                        &entry_options,
                        progress,
                    )?;
                }
            }
        }
    }
    Ok(())
}

fn entry_path(prefix: &str, name: &str) -> Result<ArchivePath> {
    ArchivePath::with_prefix(prefix, name)
        .map_err(|e| e.into_entry_write(format!("{prefix}{name}")))
}

/// Joins a frame directory name onto the parent prefix.
fn frame_prefix(parent: &str, name: &str) -> String {
    let mut prefix = format!("{parent}{name}");
    if !prefix.is_empty() && !prefix.ends_with('/') {
        prefix.push('/');
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::page::FRAMES;
    use crate::progress::StatisticsProgress;
    use crate::read::Archive;
    use crate::shell::SHELL_END;

    fn sample_page() -> PageData {
        let frame = PageData::new("<p>frame</p>")
            .name("frames/0/")
            .url("https://example.com/frame")
            .resource(
                "images",
                ResourceEntry::new("images/0.gif", vec![71u8, 73, 70]).url("https://example.com/f.gif"),
            );
        PageData::new("<!DOCTYPE html>\n<html><body><h1>Hello</h1><script>x()</script></body></html>")
            .title("Hello")
            .url("https://example.com/")
            .resource(
                "stylesheets",
                ResourceEntry::new("stylesheet_0.css", "h1 { color: red }")
                    .url("https://example.com/a.css"),
            )
            .frame(frame)
            .resource(
                "images",
                ResourceEntry::new("images/1.png", vec![137u8, 80, 78, 71])
                    .url("https://example.com/b.png"),
            )
    }

    #[test]
    fn test_entry_order_and_prefixes() {
        let bytes = write_page(&sample_page(), &ArchiveOptions::new()).unwrap();
        let archive = Archive::open(bytes).unwrap();
        let names: Vec<_> = archive.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            names,
            [
                "index.html",
                "stylesheet_0.css",
                "frames/0/index.html",
                "frames/0/images/0.gif",
                "images/1.png",
            ]
        );
    }

    #[test]
    fn test_comments_carry_urls() {
        let options = ArchiveOptions::new().url("https://example.com/?saved");
        let archive = Archive::open(write_page(&sample_page(), &options).unwrap()).unwrap();
        let comment = |path: &str| archive.entry(path).and_then(|e| e.comment()).map(str::to_string);
        assert_eq!(comment("index.html").as_deref(), Some("https://example.com/?saved"));
        assert_eq!(comment("frames/0/index.html").as_deref(), Some("https://example.com/frame"));
        assert_eq!(comment("images/1.png").as_deref(), Some("https://example.com/b.png"));
    }

    #[test]
    fn test_root_url_falls_back_to_page_url() {
        let archive = Archive::open(write_page(&sample_page(), &ArchiveOptions::new()).unwrap()).unwrap();
        assert_eq!(
            archive.entry("index.html").unwrap().comment(),
            Some("https://example.com/")
        );
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_precompressed_media_is_stored() {
        let archive = Archive::open(write_page(&sample_page(), &ArchiveOptions::new()).unwrap()).unwrap();
        assert!(archive.entry("images/1.png").unwrap().is_stored());
        assert!(!archive.entry("frames/0/images/0.gif").unwrap().is_stored());
        assert!(!archive.entry("stylesheet_0.css").unwrap().is_stored());
    }

    #[test]
    fn test_is_precompressed_checks_name_and_extension() {
        let resource = ResourceEntry::new("images/0", vec![1u8]).extension(".webp");
        assert!(is_precompressed(&resource));
        let resource = ResourceEntry::new("images/0.png", vec![1u8]).extension(".svg");
        assert!(is_precompressed(&resource));
        let resource = ResourceEntry::new("images/0.svg", vec![1u8]).extension(".svg");
        assert!(!is_precompressed(&resource));
        assert!(!is_precompressed(&ResourceEntry::new("a.PNG", vec![1u8]).extension(".PNG")));
    }

    #[test]
    fn test_shell_and_trailer() {
        let bytes = write_page(&sample_page(), &ArchiveOptions::new()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("<!DOCTYPE html>\n<html data-pagezip>"));
        assert!(text.contains("<title>Hello</title>"));
        assert!(text.contains(SHELL_END));
        assert!(!text.contains("<main hidden>"));
        assert!(bytes.ends_with(TRAILER.as_bytes()));
    }

    #[test]
    fn test_insert_text_body() {
        let options = ArchiveOptions::new().insert_text_body(true);
        let bytes = write_page(&sample_page(), &options).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("\n<main hidden>\nHello\n</main>\n</body><![CDATA["));
    }

    #[test]
    fn test_deterministic_output() {
        let page = sample_page();
        let first = write_page(&page, &ArchiveOptions::new()).unwrap();
        let second = write_page(&page, &ArchiveOptions::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_collision_aborts() {
        let page = PageData::new("<p>")
            .resource("images", ResourceEntry::new("a.png", vec![1u8]))
            .resource("other", ResourceEntry::new("a.png", vec![2u8]));
        let err = write_page(&page, &ArchiveOptions::new()).unwrap_err();
        match err {
            Error::EntryWrite { path, source } => {
                assert_eq!(path, "a.png");
                assert!(matches!(*source, Error::DuplicateEntry { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_resource_name_aborts() {
        let page = PageData::new("<p>").resource("images", ResourceEntry::new("../a.png", vec![1u8]));
        let err = write_page(&page, &ArchiveOptions::new()).unwrap_err();
        assert!(matches!(err, Error::EntryWrite { .. }));
    }

    #[test]
    fn test_frame_name_without_slash() {
        let page = PageData::new("<p>").frame(PageData::new("<p>inner").name("frames/1"));
        let archive = Archive::open(write_page(&page, &ArchiveOptions::new()).unwrap()).unwrap();
        assert!(archive.entry("frames/1/index.html").is_some());
        assert!(page.resources.get(FRAMES).is_some());
    }

    #[test]
    fn test_progress_reports_every_entry() {
        let mut progress = StatisticsProgress::new();
        let (result, _) =
            write_page_with_progress(&sample_page(), &ArchiveOptions::new(), &mut progress).unwrap();
        assert_eq!(progress.state().entries_total, 5);
        assert_eq!(progress.state().entries_processed, 5);
        assert_eq!(result.entries_written, 5);
    }
}
