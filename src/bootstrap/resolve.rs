//! Entry classification and sibling reference resolution.
//!
//! Captured markup and stylesheets refer to other resources by their bare
//! file name relative to the owning frame directory. There is no manifest,
//! so references are resolved by substituting each sibling's name with its
//! materialized content (a data URI or an object URL). Resources are
//! visited longest name first so that `img2.png` is replaced before
//! `img.png` could match inside it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::archiver::INDEX_FILE;
use crate::read::Archive;
use crate::{Error, Result};

use super::DocumentHost;

pub(crate) const DOCUMENT_PATTERN: &str = r"index\.html$";
pub(crate) const STYLESHEET_PATTERN: &str = r"stylesheet_[0-9]+\.css";
pub(crate) const SCRIPT_PATTERN: &str = r"scripts/[0-9]+\.js";
pub(crate) const SVG_PATTERN: &str = r"\.svg$";
pub(crate) const FRAME_PATTERN: &str = r"frames/";

static DOCUMENT_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(DOCUMENT_PATTERN).expect("Invalid document entry regex"));
static STYLESHEET_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(STYLESHEET_PATTERN).expect("Invalid stylesheet entry regex"));
static SCRIPT_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(SCRIPT_PATTERN).expect("Invalid script entry regex"));
static SVG_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(SVG_PATTERN).expect("Invalid svg regex"));
static FRAME_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(FRAME_PATTERN).expect("Invalid frame regex"));

/// MIME type of SVG images.
pub const SVG_MIME_TYPE: &str = "image/svg+xml";

/// MIME type of binary entries other than SVG images.
pub const BINARY_MIME_TYPE: &str = "application/octet-stream";

/// How an entry is read and materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A frame document (`index.html` at any depth).
    Document,
    /// A captured stylesheet (`stylesheet_<N>.css`).
    Stylesheet,
    /// A captured script (`scripts/<N>.js`); never rewritten.
    Script,
    /// Anything else, read as bytes.
    Binary,
}

impl EntryKind {
    /// Classifies an entry by its path.
    ///
    /// ```
    /// use pagezip::bootstrap::EntryKind;
    ///
    /// assert_eq!(EntryKind::classify("frames/0/index.html"), EntryKind::Document);
    /// assert_eq!(EntryKind::classify("stylesheet_12.css"), EntryKind::Stylesheet);
    /// assert_eq!(EntryKind::classify("scripts/3.js"), EntryKind::Script);
    /// assert_eq!(EntryKind::classify("fonts/0.woff2"), EntryKind::Binary);
    /// ```
    pub fn classify(filename: &str) -> Self {
        if SCRIPT_ENTRY.is_match(filename) {
            Self::Script
        } else if STYLESHEET_ENTRY.is_match(filename) {
            Self::Stylesheet
        } else if DOCUMENT_ENTRY.is_match(filename) {
            Self::Document
        } else {
            Self::Binary
        }
    }

    /// Returns true if entries of this kind are decoded as text.
    pub fn is_text(self) -> bool {
        !matches!(self, Self::Binary)
    }

    /// Returns the MIME type used when materializing `filename`.
    pub fn mime_type(self, filename: &str) -> &'static str {
        match self {
            Self::Stylesheet => "text/css",
            Self::Script => "text/javascript",
            Self::Document => "text/html",
            Self::Binary if SVG_ENTRY.is_match(filename) => SVG_MIME_TYPE,
            Self::Binary => BINARY_MIME_TYPE,
        }
    }
}

/// A resource being reconstructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Entry path.
    pub filename: String,
    /// Classification of the entry.
    pub kind: EntryKind,
    /// Materialized form, usable as a resource source. `None` until a
    /// textual resource has been resolved.
    pub content: Option<String>,
    /// Text of a textual resource, rewritten in place during resolution.
    pub text_content: Option<String>,
}

impl Resource {
    /// Directory part of the path, with its trailing `/`.
    pub fn prefix(&self) -> &str {
        match self.filename.rfind('/') {
            Some(slash) => &self.filename[..=slash],
            None => "",
        }
    }
}

/// Counters from one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Number of resources loaded.
    pub resources: usize,
    /// Number of textual resources.
    pub text_resources: usize,
    /// Number of references replaced.
    pub substitutions: usize,
    /// Number of references left in place because the sibling had no
    /// content yet.
    pub unresolved: usize,
}

/// Encodes `data` as a base64 data URI.
///
/// ```
/// use pagezip::bootstrap::data_uri;
///
/// assert_eq!(data_uri("text/css;charset=utf-8", b"a{}"), "data:text/css;charset=utf-8;base64,YXt9");
/// ```
pub fn data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(data))
}

/// Reads and materializes every entry of `archive`.
///
/// Textual entries keep their text for resolution. Binary entries inside a
/// `frames/` directory become data URIs, since a frame document must be
/// self-contained; other binary entries become object URLs from `host`.
pub fn load_resources<H: DocumentHost + ?Sized>(
    archive: &Archive,
    host: &mut H,
) -> Result<Vec<Resource>> {
    let mut resources = Vec::with_capacity(archive.len());
    for entry in archive.entries() {
        let filename = entry.path.as_str().to_string();
        let kind = EntryKind::classify(&filename);
        let resource = if kind.is_text() {
            Resource {
                text_content: Some(archive.read_entry_text(entry)?),
                content: None,
                filename,
                kind,
            }
        } else {
            let data = archive.read_entry_bytes(entry)?;
            let mime_type = kind.mime_type(&filename);
            let content = if FRAME_ENTRY.is_match(&filename) {
                data_uri(mime_type, &data)
            } else {
                host.create_object_url(data, mime_type)
            };
            Resource {
                content: Some(content),
                text_content: None,
                filename,
                kind,
            }
        };
        resources.push(resource);
    }
    Ok(resources)
}

/// Substitutes sibling references in every textual resource.
///
/// Resources are sorted by descending name length, stable for equal
/// lengths. Each textual resource other than a script has every sibling
/// name in its directory replaced with that sibling's content; it is then
/// turned into a data URI itself, except the root document, whose text is
/// returned.
///
/// # Errors
///
/// Returns [`Error::EntryNotFound`] if there is no root `index.html`.
pub fn resolve_references(resources: &mut [Resource]) -> Result<(String, ResolutionStats)> {
    resources.sort_by(|left, right| right.filename.len().cmp(&left.filename.len()));

    let mut stats = ResolutionStats {
        resources: resources.len(),
        ..Default::default()
    };
    let mut document = None;

    for index in 0..resources.len() {
        let Some(mut text) = resources[index].text_content.take() else {
            continue;
        };
        stats.text_resources += 1;
        let filename = resources[index].filename.clone();
        let kind = resources[index].kind;
        let prefix = resources[index].prefix().to_string();

        if kind != EntryKind::Script {
            for (sibling_index, sibling) in resources.iter().enumerate() {
                if sibling_index == index || !sibling.filename.starts_with(&prefix) {
                    continue;
                }
                let name = &sibling.filename[prefix.len()..];
                let occurrences = text.matches(name).count();
                if occurrences == 0 {
                    continue;
                }
                match &sibling.content {
                    Some(content) => {
                        text = text.replace(name, content);
                        stats.substitutions += occurrences;
                    }
                    None => {
                        log::warn!("{filename}: reference to {name} left unresolved");
                        stats.unresolved += occurrences;
                    }
                }
            }
        }

        if filename == INDEX_FILE {
            document = Some(text.clone());
        } else {
            let mime_type = format!("{};charset=utf-8", kind.mime_type(&filename));
            resources[index].content = Some(data_uri(&mime_type, text.as_bytes()));
        }
        resources[index].text_content = Some(text);
    }

    log::debug!(
        "resolved {} references across {} textual resources",
        stats.substitutions,
        stats.text_resources
    );
    let document = document.ok_or_else(|| Error::EntryNotFound {
        path: INDEX_FILE.to_string(),
    })?;
    Ok((document, stats))
}
