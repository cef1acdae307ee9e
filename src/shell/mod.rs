//! HTML shell encoding for page archives.
//!
//! A page archive is one byte buffer with two readings. A document
//! renderer sees a short HTML page: the original doctype, a title, two
//! hidden messages and the bootstrap script, ending in an opened CDATA
//! section that swallows the binary container. A ZIP reader sees an
//! archive whose end record comment, [`TRAILER`], closes that section and
//! the document.
//!
//! ```text
//! [ shell: "<!doctype html><html data-pagezip>...</body><![CDATA[" ]
//! [ local headers + payloads ]
//! [ central directory ]
//! [ end record, comment length = TRAILER.len() ][ "]]></html>" ]
//! ```
//!
//! # Example
//!
//! ```rust
//! use pagezip::shell::{ShellBuilder, SHELL_END};
//!
//! let shell = ShellBuilder::new()
//!     .doctype_from("<!DOCTYPE html>\n<html><body>Hi</body></html>")
//!     .title("Greeting")
//!     .build()
//!     .unwrap();
//! assert!(shell.starts_with("<!DOCTYPE html>\n<html data-pagezip>"));
//! assert!(shell.ends_with(SHELL_END));
//! ```

pub mod config;

pub use config::ShellOptions;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::escape_text;
use crate::format::parser::{ReadLimits, read_central_directory};
use crate::{Error, Result};

/// Script embedded in every shell; reconstructs the page in a browser.
pub const BOOTSTRAP_SCRIPT: &str = include_str!("bootstrap.js");

/// Last bytes of the shell; opens the section that hides the container.
pub const SHELL_END: &str = "</body><![CDATA[";

/// End record comment; closes the shell's CDATA section and document.
pub const TRAILER: &str = "]]></html>";

/// Id of the placeholder element shown while reconstructing.
pub const WAIT_MESSAGE_ID: &str = "pagezip-wait-message";

/// Id of the fallback element shown when the archive cannot be opened.
pub const ERROR_MESSAGE_ID: &str = "pagezip-error-message";

static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^<!doctype[^>]*>\s").expect("Invalid doctype regex"));

static CLOSING_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</script").expect("Invalid closing script regex"));

/// Returns the leading doctype declaration of `content`, if any.
///
/// The declaration runs up to its first `>` and includes exactly one
/// following whitespace character. A doctype not followed by whitespace
/// is not preserved.
///
/// ```
/// use pagezip::shell::extract_doctype;
///
/// assert_eq!(extract_doctype("<!doctype html>\n<html>"), Some("<!doctype html>\n"));
/// assert_eq!(extract_doctype("<html>"), None);
/// ```
pub fn extract_doctype(content: &str) -> Option<&str> {
    DOCTYPE.find(content).map(|m| m.as_str())
}

/// Builder for the HTML shell placed in front of the container.
#[derive(Debug, Clone, Default)]
pub struct ShellBuilder {
    options: ShellOptions,
    doctype: Option<String>,
    title: String,
    text_body: Option<String>,
}

impl ShellBuilder {
    /// Creates a builder with the default messages and bootstrap script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the shell configuration.
    pub fn options(mut self, options: ShellOptions) -> Self {
        self.options = options;
        self
    }

    /// Preserves the doctype of the captured document `content`.
    pub fn doctype_from(mut self, content: &str) -> Self {
        self.doctype = extract_doctype(content).map(str::to_string);
        self
    }

    /// Sets the document title. It is escaped when written.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Embeds plain text as a hidden `main` element. It is escaped when
    /// written.
    pub fn text_body(mut self, text: impl Into<String>) -> Self {
        self.text_body = Some(text.into());
        self
    }

    /// Builds the shell markup, ending in [`SHELL_END`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the bootstrap script contains a
    /// closing script tag, which would end the script early.
    pub fn build(&self) -> Result<String> {
        let script = &self.options.bootstrap_script;
        if CLOSING_SCRIPT.is_match(script) {
            return Err(Error::InvalidState(
                "bootstrap script contains a closing script tag",
            ));
        }

        let mut markup = String::with_capacity(script.len() + 1024);
        if let Some(doctype) = &self.doctype {
            markup.push_str(doctype);
        }
        markup.push_str("<html data-pagezip><meta charset='utf-8'><title>");
        markup.push_str(&escape_text(&self.title));
        markup.push_str("</title><body hidden>");
        markup.push_str(&format!(
            "<div id='{WAIT_MESSAGE_ID}'>{}</div>",
            self.options.wait_message
        ));
        markup.push_str(&format!(
            "<div id='{ERROR_MESSAGE_ID}'>{}</div>",
            self.options.error_message
        ));
        markup.push_str("<script>");
        markup.push_str(script);
        markup.push_str("</script>");
        if let Some(text) = &self.text_body {
            markup.push_str("\n<main hidden>\n");
            markup.push_str(&escape_text(text));
            markup.push_str("\n</main>\n");
        }
        markup.push_str(SHELL_END);
        Ok(markup)
    }
}

/// Sizes of the three layers of a page archive.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellLayout {
    /// Size of the HTML shell in bytes.
    pub prefix_size: u64,
    /// Size of the container (entries, directory, end record) in bytes.
    pub container_size: u64,
    /// Size of the trailer in bytes.
    pub trailer_size: u64,
    /// Size of the whole buffer in bytes.
    pub total_size: u64,
}

impl ShellLayout {
    /// Measures a page archive buffer.
    ///
    /// # Errors
    ///
    /// Returns a format error when `data` holds no container.
    pub fn inspect(data: &[u8]) -> Result<Self> {
        let directory = read_central_directory(data, &ReadLimits::default())?;
        let prefix_size = directory
            .headers
            .iter()
            .map(|h| u64::from(h.local_header_offset) + directory.delta)
            .min()
            .unwrap_or(directory.start as u64);
        let trailer_size = directory.end.record.comment.len() as u64;
        let total_size = data.len() as u64;
        Ok(Self {
            prefix_size,
            container_size: total_size.saturating_sub(prefix_size + trailer_size),
            trailer_size,
            total_size,
        })
    }

    /// Returns the shell and trailer as a percentage of the total size.
    pub fn overhead_percent(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            ((self.prefix_size + self.trailer_size) as f64 / self.total_size as f64) * 100.0
        }
    }
}

/// Returns true if `data` ends like a page archive and holds a container.
pub fn is_page_archive(data: &[u8]) -> bool {
    data.ends_with(TRAILER.as_bytes())
        && read_central_directory(data, &ReadLimits::default())
            .is_ok_and(|directory| directory.end.record.comment == TRAILER.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{EntryOptions, Writer};
    use crate::ArchivePath;

    #[test]
    fn test_doctype_extraction() {
        assert_eq!(extract_doctype("<!DOCTYPE html> <p>"), Some("<!DOCTYPE html> "));
        assert_eq!(extract_doctype("<!doctype html><p>"), None);
        assert_eq!(extract_doctype(" <!doctype html>\n"), None);
        assert_eq!(
            extract_doctype("<!DocType html PUBLIC \"x\">\r\n<html>"),
            Some("<!DocType html PUBLIC \"x\">\r")
        );
    }

    #[test]
    fn test_shell_layout() {
        let shell = ShellBuilder::new().title("Page").build().unwrap();
        assert!(shell.starts_with("<html data-pagezip><meta charset='utf-8'><title>Page</title><body hidden>"));
        assert!(shell.contains("<div id='pagezip-wait-message'>Please wait...</div>"));
        assert!(shell.contains("<div id='pagezip-error-message'><strong>Error</strong>"));
        assert!(shell.contains("window.pagezipBootstrap"));
        assert!(!shell.contains("<main hidden>"));
        assert!(shell.ends_with("</script></body><![CDATA["));
    }

    #[test]
    fn test_title_and_text_body_are_escaped() {
        let shell = ShellBuilder::new()
            .title("a < b & c")
            .text_body("<script>alert(1)</script>")
            .build()
            .unwrap();
        assert!(shell.contains("<title>a &lt; b &amp; c</title>"));
        assert!(shell.contains("\n<main hidden>\n&lt;script&gt;alert(1)&lt;/script&gt;\n</main>\n</body>"));
    }

    #[test]
    fn test_embedded_script_has_no_closing_tag() {
        assert!(!CLOSING_SCRIPT.is_match(BOOTSTRAP_SCRIPT));
        assert!(!BOOTSTRAP_SCRIPT.contains("<!--"));
    }

    #[test]
    fn test_rejects_script_with_closing_tag() {
        let err = ShellBuilder::new()
            .options(ShellOptions::new().bootstrap_script("x = '</SCRIPT>'"))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_inspect_layout() {
        let shell = ShellBuilder::new().build().unwrap();
        let mut writer = Writer::in_memory_with_prefix(shell.as_bytes()).unwrap();
        writer
            .add_text(
                ArchivePath::new("index.html").unwrap(),
                "<p>hi</p>",
                &EntryOptions::new(),
            )
            .unwrap();
        let (_, bytes) = writer.finish_to_vec(TRAILER.as_bytes()).unwrap();

        assert!(is_page_archive(&bytes));
        let layout = ShellLayout::inspect(&bytes).unwrap();
        assert_eq!(layout.prefix_size, shell.len() as u64);
        assert_eq!(layout.trailer_size, TRAILER.len() as u64);
        assert_eq!(layout.total_size, bytes.len() as u64);
        assert!(layout.overhead_percent() > 50.0);
    }

    #[test]
    fn test_plain_zip_is_not_page_archive() {
        let writer = Writer::in_memory().unwrap();
        let (_, bytes) = writer.finish_to_vec(b"").unwrap();
        assert!(!is_page_archive(&bytes));
        assert!(!is_page_archive(b"<html></html>"));
    }
}
