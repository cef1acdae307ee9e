//! Page reconstruction from archive bytes.
//!
//! The [`Bootstrap`] drives the same algorithm as the script embedded in
//! every shell: read the archive's own bytes, load every entry, resolve
//! sibling references, then swap the live document for the rebuilt one.
//! Everything a renderer provides (fetching, timers, object URLs, the live
//! document, events) goes through the [`DocumentHost`] trait, so the
//! pipeline runs unchanged against a browser binding or the in-memory
//! [`HeadlessHost`].
//!
//! ```text
//! Idle -> Fetching -> Parsing -> Resolving -> Replacing -> Done
//!            \            \           \
//!             +------------+-----------+--> Error
//! ```
//!
//! # Example
//!
//! ```rust
//! use pagezip::archiver::{write_page, ArchiveOptions};
//! use pagezip::bootstrap::{Bootstrap, BootstrapState, HeadlessHost};
//! use pagezip::page::PageData;
//!
//! let bytes = write_page(&PageData::new("<p>Saved</p>"), &ArchiveOptions::new())?;
//! let mut bootstrap = Bootstrap::new(HeadlessHost::new(bytes));
//! bootstrap.run()?;
//! assert_eq!(bootstrap.state(), BootstrapState::Done);
//! assert!(bootstrap.host().render().unwrap().contains("<p>Saved</p>"));
//! # Ok::<(), pagezip::Error>(())
//! ```

mod headless;
mod resolve;

pub use headless::HeadlessHost;
pub use resolve::{
    BINARY_MIME_TYPE, EntryKind, SVG_MIME_TYPE, ResolutionStats, Resource, data_uri, load_resources,
    resolve_references,
};

use std::fmt;
use std::time::Duration;

use crate::dom::Document;
use crate::read::{Archive, ReadLimits};
use crate::shell::{ERROR_MESSAGE_ID, WAIT_MESSAGE_ID};
use crate::{Error, Result};

/// Event dispatched once the rebuilt document is in place.
pub const COMPLETION_EVENT: &str = "pagezip-display-infobar";

/// Delay before a shell message is shown.
pub const DEFAULT_MESSAGE_DELAY: Duration = Duration::from_millis(1500);

/// Reconstruction progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapState {
    /// Not started.
    Idle,
    /// Retrieving the archive bytes.
    Fetching,
    /// Reading the container.
    Parsing,
    /// Loading entries and substituting references.
    Resolving,
    /// Swapping in the rebuilt document.
    Replacing,
    /// The rebuilt document is live.
    Done,
    /// Reconstruction failed; the fallback message is shown.
    Error,
}

impl BootstrapState {
    /// Returns true for `Done` and `Error`, which are never left.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Resolving => "resolving",
            Self::Replacing => "replacing",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// One of the two messages embedded in the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellMessage {
    /// The "please wait" placeholder.
    Wait,
    /// The "cannot open the page" fallback.
    Error,
}

impl ShellMessage {
    /// Returns the id of the shell element holding this message.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::Wait => WAIT_MESSAGE_ID,
            Self::Error => ERROR_MESSAGE_ID,
        }
    }
}

/// Handle of a scheduled message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// The renderer environment a bootstrap runs in.
pub trait DocumentHost {
    /// Retrieves the bytes of the currently open document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] when the environment forbids the read.
    fn fetch_self(&mut self) -> Result<Vec<u8>>;

    /// Halts any in-progress load of the current document.
    fn stop_loading(&mut self) {}

    /// Shows `message` after `delay`, hiding the rest of the shell.
    fn schedule_message(&mut self, message: ShellMessage, delay: Duration) -> TimerId;

    /// Cancels a message that has not been shown yet.
    fn cancel_message(&mut self, timer: TimerId);

    /// Registers `data` and returns a URL usable as a resource source.
    fn create_object_url(&mut self, data: Vec<u8>, mime_type: &str) -> String;

    /// Replaces the live document.
    fn replace_document(&mut self, document: Document);

    /// Dispatches an application-level event on the document.
    fn dispatch_event(&mut self, name: &str);
}

impl<H: DocumentHost + ?Sized> DocumentHost for &mut H {
    fn fetch_self(&mut self) -> Result<Vec<u8>> {
        (**self).fetch_self()
    }

    fn stop_loading(&mut self) {
        (**self).stop_loading()
    }

    fn schedule_message(&mut self, message: ShellMessage, delay: Duration) -> TimerId {
        (**self).schedule_message(message, delay)
    }

    fn cancel_message(&mut self, timer: TimerId) {
        (**self).cancel_message(timer)
    }

    fn create_object_url(&mut self, data: Vec<u8>, mime_type: &str) -> String {
        (**self).create_object_url(data, mime_type)
    }

    fn replace_document(&mut self, document: Document) {
        (**self).replace_document(document)
    }

    fn dispatch_event(&mut self, name: &str) {
        (**self).dispatch_event(name)
    }
}

/// Bootstrap configuration.
#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Delay before the wait or error message appears.
    pub message_delay: Duration,
    /// Event dispatched on completion.
    pub completion_event: String,
    /// Limits applied when reading the archive.
    pub limits: ReadLimits,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            message_delay: DEFAULT_MESSAGE_DELAY,
            completion_event: COMPLETION_EVENT.to_string(),
            limits: ReadLimits::default(),
        }
    }
}

impl BootstrapOptions {
    /// Creates default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message delay.
    pub fn message_delay(mut self, delay: Duration) -> Self {
        self.message_delay = delay;
        self
    }

    /// Sets the completion event name.
    pub fn completion_event(mut self, name: impl Into<String>) -> Self {
        self.completion_event = name.into();
        self
    }

    /// Sets the archive read limits.
    pub fn limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Summary of a completed reconstruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Reference resolution counters.
    pub resolution: ResolutionStats,
    /// Number of `noscript` elements removed.
    pub noscript_removed: usize,
    /// Number of scripts re-created.
    pub scripts_recreated: usize,
}

/// Result of a bootstrap entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// This call rebuilt the document.
    Completed(BootstrapReport),
    /// An earlier call already started; nothing was done.
    AlreadyStarted,
}

/// One-shot page reconstruction against a [`DocumentHost`].
pub struct Bootstrap<H> {
    host: H,
    options: BootstrapOptions,
    state: BootstrapState,
    display_timer: Option<TimerId>,
}

impl<H> fmt::Debug for Bootstrap<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bootstrap")
            .field("state", &self.state)
            .field("display_timer", &self.display_timer)
            .finish_non_exhaustive()
    }
}

impl<H: DocumentHost> Bootstrap<H> {
    /// Creates a bootstrap with default options.
    pub fn new(host: H) -> Self {
        Self::with_options(host, BootstrapOptions::default())
    }

    /// Creates a bootstrap with custom options.
    pub fn with_options(host: H, options: BootstrapOptions) -> Self {
        Self {
            host,
            options,
            state: BootstrapState::Idle,
            display_timer: None,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Returns the host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Returns the host mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Consumes the bootstrap and returns the host.
    pub fn into_host(self) -> H {
        self.host
    }

    /// Fetches the archive's own bytes and rebuilds the page.
    ///
    /// Only the first call on a bootstrap does anything; later calls
    /// return [`Outcome::AlreadyStarted`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Fetch`] if the bytes cannot be retrieved, or a
    /// format error if they hold no usable archive. Either way the
    /// fallback message is scheduled and the state becomes `Error`.
    pub fn run(&mut self) -> Result<Outcome> {
        if !self.start() {
            return Ok(Outcome::AlreadyStarted);
        }
        match self.host.fetch_self() {
            Ok(bytes) => self.reconstruct(bytes),
            Err(e) => self.fail(e),
        }
    }

    /// Rebuilds the page from bytes supplied by the caller.
    ///
    /// Shares the one-shot latch with [`run`](Self::run).
    pub fn run_with_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> Result<Outcome> {
        if !self.start() {
            return Ok(Outcome::AlreadyStarted);
        }
        self.reconstruct(bytes.into())
    }

    fn start(&mut self) -> bool {
        if self.state != BootstrapState::Idle {
            log::debug!("bootstrap already started ({})", self.state);
            return false;
        }
        self.transition(BootstrapState::Fetching);
        true
    }

    fn reconstruct(&mut self, bytes: Vec<u8>) -> Result<Outcome> {
        self.host.stop_loading();
        self.show_message(ShellMessage::Wait);

        self.transition(BootstrapState::Parsing);
        let archive = match Archive::open_with_limits(bytes, self.options.limits) {
            Ok(archive) => archive,
            Err(e) => return self.fail(e),
        };

        self.transition(BootstrapState::Resolving);
        let resolved = load_resources(&archive, &mut self.host)
            .and_then(|mut resources| resolve_references(&mut resources));
        let (markup, resolution) = match resolved {
            Ok(resolved) => resolved,
            Err(e) => return self.fail(e),
        };
        drop(archive);

        self.transition(BootstrapState::Replacing);
        let mut document = Document::parse(&markup);
        let noscript_removed = document.remove_noscript();
        self.clear_message();
        let scripts_recreated = document.rehome_executable_nodes();
        self.host.replace_document(document);
        self.host.dispatch_event(&self.options.completion_event);

        self.transition(BootstrapState::Done);
        log::info!(
            "page rebuilt from {} resources ({} references resolved)",
            resolution.resources,
            resolution.substitutions
        );
        Ok(Outcome::Completed(BootstrapReport {
            resolution,
            noscript_removed,
            scripts_recreated,
        }))
    }

    fn fail(&mut self, error: Error) -> Result<Outcome> {
        log::warn!("cannot open the page: {error}");
        self.show_message(ShellMessage::Error);
        self.transition(BootstrapState::Error);
        Err(error)
    }

    fn show_message(&mut self, message: ShellMessage) {
        self.clear_message();
        let delay = self.options.message_delay;
        self.display_timer = Some(self.host.schedule_message(message, delay));
    }

    fn clear_message(&mut self) {
        if let Some(timer) = self.display_timer.take() {
            self.host.cancel_message(timer);
        }
    }

    fn transition(&mut self, next: BootstrapState) {
        log::debug!("bootstrap: {} -> {}", self.state, next);
        self.state = next;
    }
}
