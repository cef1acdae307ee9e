//! In-memory document host.

use std::path::PathBuf;
use std::time::Duration;

use crate::dom::Document;
use crate::{Error, Result};

use super::{DocumentHost, ShellMessage, TimerId, data_uri};

/// Scheme of the object URLs handed out by [`HeadlessHost`].
const OBJECT_URL_PREFIX: &str = "blob:pagezip/";

#[derive(Debug, Clone)]
enum Source {
    Bytes(Vec<u8>),
    Path(PathBuf),
    Unavailable(String),
}

#[derive(Debug, Clone)]
struct ObjectUrl {
    url: String,
    mime_type: String,
    data: Vec<u8>,
}

/// A [`DocumentHost`] without a renderer.
///
/// Records every interaction so callers can inspect the outcome, and
/// renders the rebuilt document with object URLs inlined as data URIs.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    source: Source,
    stopped: bool,
    next_timer: u64,
    scheduled: Vec<(ShellMessage, Duration)>,
    pending: Vec<(TimerId, ShellMessage)>,
    object_urls: Vec<ObjectUrl>,
    document: Option<Document>,
    replacements: usize,
    events: Vec<String>,
}

impl HeadlessHost {
    fn with_source(source: Source) -> Self {
        Self {
            source,
            stopped: false,
            next_timer: 0,
            scheduled: Vec::new(),
            pending: Vec::new(),
            object_urls: Vec::new(),
            document: None,
            replacements: 0,
            events: Vec::new(),
        }
    }

    /// Creates a host whose current document is `bytes`.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_source(Source::Bytes(bytes.into()))
    }

    /// Creates a host whose current document is read from `path` on fetch.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::Path(path.into()))
    }

    /// Creates a host that refuses to fetch its document.
    pub fn unreadable(reason: impl Into<String>) -> Self {
        Self::with_source(Source::Unavailable(reason.into()))
    }

    /// Returns true once loading was halted.
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// Returns every message scheduled so far, cancelled or not.
    pub fn scheduled(&self) -> &[(ShellMessage, Duration)] {
        &self.scheduled
    }

    /// Returns the message that would eventually be shown, if any.
    pub fn visible_message(&self) -> Option<ShellMessage> {
        self.pending.last().map(|(_, message)| *message)
    }

    /// Returns the number of object URLs created.
    pub fn object_url_count(&self) -> usize {
        self.object_urls.len()
    }

    /// Returns the data behind an object URL.
    pub fn object_data(&self, url: &str) -> Option<(&str, &[u8])> {
        self.object_urls
            .iter()
            .find(|object| object.url == url)
            .map(|object| (object.mime_type.as_str(), object.data.as_slice()))
    }

    /// Returns the live document, once replaced.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Returns how many times the document was replaced.
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Returns the events dispatched so far.
    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Replaces every object URL in `markup` with an equivalent data URI.
    pub fn inline_object_urls(&self, markup: &str) -> String {
        let mut out = markup.to_string();
        for object in &self.object_urls {
            if out.contains(&object.url) {
                out = out.replace(&object.url, &data_uri(&object.mime_type, &object.data));
            }
        }
        out
    }

    /// Serializes the live document as a standalone page.
    pub fn render(&self) -> Option<String> {
        self.document
            .as_ref()
            .map(|document| self.inline_object_urls(&document.to_html()))
    }
}

impl DocumentHost for HeadlessHost {
    fn fetch_self(&mut self) -> Result<Vec<u8>> {
        match &self.source {
            Source::Bytes(bytes) => Ok(bytes.clone()),
            Source::Path(path) => std::fs::read(path)
                .map_err(|e| Error::Fetch(format!("{}: {e}", path.display()))),
            Source::Unavailable(reason) => Err(Error::Fetch(reason.clone())),
        }
    }

    fn stop_loading(&mut self) {
        self.stopped = true;
    }

    fn schedule_message(&mut self, message: ShellMessage, delay: Duration) -> TimerId {
        self.next_timer += 1;
        let timer = TimerId(self.next_timer);
        self.scheduled.push((message, delay));
        self.pending.push((timer, message));
        timer
    }

    fn cancel_message(&mut self, timer: TimerId) {
        self.pending.retain(|(id, _)| *id != timer);
    }

    fn create_object_url(&mut self, data: Vec<u8>, mime_type: &str) -> String {
        // fixed width so no URL is a prefix of another
        let url = format!("{OBJECT_URL_PREFIX}{:08}", self.object_urls.len() + 1);
        self.object_urls.push(ObjectUrl {
            url: url.clone(),
            mime_type: mime_type.to_string(),
            data,
        });
        url
    }

    fn replace_document(&mut self, document: Document) {
        self.replacements += 1;
        self.document = Some(document);
    }

    fn dispatch_event(&mut self, name: &str) {
        self.events.push(name.to_string());
    }
}
