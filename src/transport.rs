//! Chunked delivery of captured pages to a save mechanism.
//!
//! The host's message channel has a size ceiling, so a captured page is
//! serialized to JSON (`{resources, content, title}`) and sent as one or
//! more [`DownloadMessage`]s of at most [`MAX_CONTENT_SIZE`] characters of
//! content each. Every message carries `truncated` (the payload was split)
//! and `finished` (this is the last piece). The receiving side rebuilds the
//! payload with a [`ChunkAssembler`].
//!
//! # Example
//!
//! ```rust
//! use pagezip::page::PageData;
//! use pagezip::transport::{send_page, ChunkAssembler, DownloadMessage, TransportOptions};
//!
//! let page = PageData::new("<p>hello</p>").title("Hello");
//! let options = TransportOptions::new().filename("hello.html").max_content_size(16);
//! let mut messages: Vec<DownloadMessage> = Vec::new();
//! let sent = send_page(&page, &options, &mut messages)?;
//! assert!(sent > 1);
//!
//! let mut assembler = ChunkAssembler::new();
//! let mut complete = None;
//! for message in messages {
//!     complete = assembler.push(message)?;
//! }
//! let payload = complete.unwrap().payload()?;
//! assert_eq!(payload.title, "Hello");
//! # Ok::<(), pagezip::Error>(())
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::archiver::{ArchiveOptions, write_page};
use crate::page::{PageData, Resources};
use crate::{Error, Result};

/// Largest content carried by one message, in characters.
pub const MAX_CONTENT_SIZE: usize = 64 * 1024 * 1024;

/// Method name of download messages.
pub const DOWNLOAD_METHOD: &str = "downloads.download";

/// The serialized form of a captured page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePayload {
    /// Resources grouped by type.
    #[serde(default)]
    pub resources: Resources,
    /// Serialized HTML of the page.
    pub content: String,
    /// Page title.
    #[serde(default)]
    pub title: String,
}

impl SavePayload {
    /// Takes the transferable parts of `page`.
    pub fn from_page(page: &PageData) -> Self {
        Self {
            resources: page.resources.clone(),
            content: page.content.clone(),
            title: page.title.clone(),
        }
    }

    /// Rebuilds a page. The origin URL is not transferred.
    pub fn into_page(self) -> PageData {
        PageData {
            content: self.content,
            title: self.title,
            resources: self.resources,
            ..Default::default()
        }
    }

    /// Serializes the payload to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a JSON payload.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What the save mechanism does when the target file exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameConflictAction {
    /// Pick a fresh name.
    #[default]
    Uniquify,
    /// Replace the existing file.
    Overwrite,
    /// Ask the user.
    Prompt,
}

/// Delivery settings, copied into every message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Largest content per message, in characters.
    pub max_content_size: usize,
    /// Target file name.
    pub filename: String,
    /// Conflict policy.
    pub filename_conflict_action: FilenameConflictAction,
    /// Replacement for characters not allowed in file names.
    pub filename_replacement_character: String,
    /// Ask the user to confirm the file name.
    pub confirm_filename: bool,
    /// Embed the page text in the archive shell.
    pub insert_text_body: bool,
    /// Page URL recorded in the archive. Defaults to the page's own URL.
    pub url: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            max_content_size: MAX_CONTENT_SIZE,
            filename: String::new(),
            filename_conflict_action: FilenameConflictAction::default(),
            filename_replacement_character: "_".to_string(),
            confirm_filename: false,
            insert_text_body: false,
            url: None,
        }
    }
}

impl TransportOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chunk bound. Zero is treated as one.
    pub fn max_content_size(mut self, size: usize) -> Self {
        self.max_content_size = size.max(1);
        self
    }

    /// Sets the target file name.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Sets the conflict policy.
    pub fn filename_conflict_action(mut self, action: FilenameConflictAction) -> Self {
        self.filename_conflict_action = action;
        self
    }

    /// Sets the file name replacement character.
    pub fn filename_replacement_character(mut self, replacement: impl Into<String>) -> Self {
        self.filename_replacement_character = replacement.into();
        self
    }

    /// Sets whether the file name is confirmed by the user.
    pub fn confirm_filename(mut self, confirm: bool) -> Self {
        self.confirm_filename = confirm;
        self
    }

    /// Sets whether the archive embeds the page text.
    pub fn insert_text_body(mut self, insert: bool) -> Self {
        self.insert_text_body = insert;
        self
    }

    /// Sets the page URL recorded in the archive.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One message to the save mechanism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadMessage {
    /// Always [`DOWNLOAD_METHOD`].
    pub method: String,
    /// Embed the page text in the archive shell.
    pub insert_text_body: bool,
    /// Page URL recorded as the root entry comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Ask the user to confirm the file name.
    pub confirm_filename: bool,
    /// Conflict policy.
    pub filename_conflict_action: FilenameConflictAction,
    /// Target file name.
    pub filename: String,
    /// Replacement for characters not allowed in file names.
    pub filename_replacement_character: String,
    /// The payload was split over several messages.
    pub truncated: bool,
    /// This is the last message of the payload.
    pub finished: bool,
    /// The payload, or a piece of it.
    pub content: String,
}

impl DownloadMessage {
    fn new(options: &TransportOptions, truncated: bool, finished: bool, content: String) -> Self {
        Self {
            method: DOWNLOAD_METHOD.to_string(),
            insert_text_body: options.insert_text_body,
            url: options.url.clone(),
            confirm_filename: options.confirm_filename,
            filename_conflict_action: options.filename_conflict_action,
            filename: options.filename.clone(),
            filename_replacement_character: options.filename_replacement_character.clone(),
            truncated,
            finished,
            content,
        }
    }

    /// Decodes the content of a complete message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] for a piece of a split payload and
    /// [`Error::Serialization`] for malformed JSON.
    pub fn payload(&self) -> Result<SavePayload> {
        if self.truncated {
            return Err(Error::InvalidState(
                "message holds only part of the payload",
            ));
        }
        SavePayload::from_json(&self.content)
    }

    /// Decodes a complete message and writes the page archive it describes.
    pub fn write_archive(&self) -> Result<Vec<u8>> {
        let page = self.payload()?.into_page();
        let mut options = ArchiveOptions::new().insert_text_body(self.insert_text_body);
        if let Some(url) = &self.url {
            options = options.url(url.clone());
        }
        write_page(&page, &options)
    }
}

/// Receives download messages.
pub trait MessageSink {
    /// Delivers one message, waiting until the host accepted it.
    fn send(&mut self, message: DownloadMessage) -> Result<()>;
}

impl MessageSink for Vec<DownloadMessage> {
    fn send(&mut self, message: DownloadMessage) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

/// A sink that calls a closure for each message.
pub struct FnSink<F> {
    callback: F,
}

impl<F> MessageSink for FnSink<F>
where
    F: FnMut(DownloadMessage) -> Result<()>,
{
    fn send(&mut self, message: DownloadMessage) -> Result<()> {
        (self.callback)(message)
    }
}

/// Creates a closure-based message sink.
pub fn sink_fn<F>(callback: F) -> FnSink<F>
where
    F: FnMut(DownloadMessage) -> Result<()>,
{
    FnSink { callback }
}

/// Splits `content` into pieces of at most `max_chars` characters.
///
/// Returns `ceil(chars / max_chars)` pieces, and a single empty piece for
/// empty content. No piece splits a character.
///
/// ```
/// use pagezip::transport::split_chunks;
///
/// assert_eq!(split_chunks("aébc", 2), ["aé", "bc"]);
/// assert_eq!(split_chunks("", 4), [""]);
/// ```
pub fn split_chunks(content: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    if content.is_empty() {
        return vec![content];
    }
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (index, _) in content.char_indices() {
        if count == max_chars {
            chunks.push(&content[start..index]);
            start = index;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&content[start..]);
    chunks
}

/// Serializes `page` and sends it to `sink`, split as needed.
///
/// Returns the number of messages sent.
///
/// # Errors
///
/// Returns the first error reported by `sink`; later chunks are not sent.
pub fn send_page<S: MessageSink + ?Sized>(
    page: &PageData,
    options: &TransportOptions,
    sink: &mut S,
) -> Result<usize> {
    let with_page_url;
    let options = if options.url.is_none() && !page.url.is_empty() {
        with_page_url = options.clone().url(page.url.clone());
        &with_page_url
    } else {
        options
    };
    let content = SavePayload::from_page(page).to_json()?;
    let chunks = split_chunks(&content, options.max_content_size);
    let truncated = chunks.len() > 1;
    let total = chunks.len();
    for (index, chunk) in chunks.into_iter().enumerate() {
        let finished = index + 1 == total;
        sink.send(DownloadMessage::new(options, truncated, finished, chunk.to_string()))?;
    }
    log::debug!(
        "sent {} characters of page data in {total} message(s)",
        content.chars().count()
    );
    Ok(total)
}

/// Rebuilds split payloads on the receiving side.
#[derive(Debug, Default)]
pub struct ChunkAssembler {
    buffer: String,
    pieces: usize,
}

impl ChunkAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a split payload is partially received.
    pub fn is_pending(&self) -> bool {
        self.pieces > 0
    }

    /// Accepts the next message.
    ///
    /// Returns the complete message, with the full content and
    /// `truncated` cleared, once the last piece arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if a whole message arrives while a
    /// split payload is still incomplete.
    pub fn push(&mut self, mut message: DownloadMessage) -> Result<Option<DownloadMessage>> {
        if !message.truncated {
            if self.is_pending() {
                return Err(Error::InvalidState(
                    "whole message received during reassembly",
                ));
            }
            message.finished = true;
            return Ok(Some(message));
        }
        self.buffer.push_str(&message.content);
        self.pieces += 1;
        if !message.finished {
            return Ok(None);
        }
        log::debug!("reassembled payload from {} pieces", self.pieces);
        message.content = std::mem::take(&mut self.buffer);
        message.truncated = false;
        self.pieces = 0;
        Ok(Some(message))
    }
}

/// Serializes save requests from one source document.
///
/// A save started while another one is in flight fails with
/// [`Error::CaptureInProgress`]. The latch is released when the save
/// returns, whether it succeeded or not.
#[derive(Debug, Default)]
pub struct SaveSession {
    processing: AtomicBool,
}

struct ProcessingGuard<'a> {
    processing: &'a AtomicBool,
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.processing.store(false, Ordering::Release);
    }
}

impl SaveSession {
    /// Creates an idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a save is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<ProcessingGuard<'_>> {
        self.processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::CaptureInProgress)?;
        Ok(ProcessingGuard {
            processing: &self.processing,
        })
    }

    /// Sends `page` to `sink` unless another save is in flight.
    pub fn save<S: MessageSink + ?Sized>(
        &self,
        page: &PageData,
        options: &TransportOptions,
        sink: &mut S,
    ) -> Result<usize> {
        let _guard = self.begin()?;
        send_page(page, options, sink)
    }
}
