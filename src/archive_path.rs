//! Entry path type with validation.
//!
//! Every entry in a page archive is addressed by a relative, `/`-separated
//! path. Frame documents live under the directory assigned to their frame
//! (for example `frames/0/index.html`), so the directory part of a path is
//! what groups an entry with its siblings during reference resolution.

use crate::{Error, Result};
use std::fmt;

/// Maximum length for entry paths (in bytes).
///
/// The ZIP name field is a 16-bit length, so anything longer cannot be
/// stored anyway; 32 KiB keeps the limit well inside that.
const MAX_PATH_LENGTH: usize = 32768;

/// A validated entry path.
///
/// `ArchivePath` validates that:
/// - No NUL bytes are present
/// - The path is not absolute (does not start with `/`)
/// - No empty segments exist (no `//` or trailing `/`)
/// - No `.` or `..` segments are present
///
/// # Examples
///
/// ```
/// use pagezip::ArchivePath;
///
/// let path = ArchivePath::new("frames/0/index.html").unwrap();
/// assert_eq!(path.directory(), "frames/0/");
/// assert_eq!(path.file_name(), "index.html");
///
/// assert!(ArchivePath::new("../secret").is_err());
/// assert!(ArchivePath::new("/absolute/path").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Creates a new `ArchivePath` from a string, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchivePath`] if the path is empty, absolute,
    /// contains NUL bytes, or contains empty, `.` or `..` segments.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    /// Builds the path of `name` inside the frame directory `prefix`.
    ///
    /// `prefix` is either empty (the root frame) or the concatenation of
    /// ancestor frame names, each ending in `/`.
    ///
    /// ```
    /// use pagezip::ArchivePath;
    ///
    /// let path = ArchivePath::with_prefix("frames/0/", "images/1.png").unwrap();
    /// assert_eq!(path.as_str(), "frames/0/images/1.png");
    /// ```
    pub fn with_prefix(prefix: &str, name: &str) -> Result<Self> {
        let mut joined = String::with_capacity(prefix.len() + name.len());
        joined.push_str(prefix);
        joined.push_str(name);
        Self::try_from(joined)
    }

    fn validate(s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }

        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }

        if s.len() > MAX_PATH_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_PATH_LENGTH
            )));
        }

        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }

        if s.ends_with('/') {
            return Err(Error::InvalidArchivePath(
                "trailing slash not allowed".into(),
            ));
        }

        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(Error::InvalidArchivePath(
                    "empty segment (consecutive slashes)".into(),
                ));
            }
            if segment == "." {
                return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
            }
            if segment == ".." {
                return Err(Error::InvalidArchivePath(
                    "'..' segment not allowed (path traversal)".into(),
                ));
            }
        }

        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the file name (last segment) of this path.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// Returns the directory part of this path including its trailing `/`.
    ///
    /// Entries at the archive root return an empty string.
    ///
    /// ```
    /// use pagezip::ArchivePath;
    ///
    /// assert_eq!(ArchivePath::new("index.html").unwrap().directory(), "");
    /// assert_eq!(ArchivePath::new("a/b/c.css").unwrap().directory(), "a/b/");
    /// ```
    pub fn directory(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..=idx],
            None => "",
        }
    }

    /// Returns the remainder of the path after `prefix`, if it starts with it.
    ///
    /// This is a plain string prefix match, mirroring how sibling resources
    /// are addressed from a document in the same directory.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Returns the file extension including the leading dot, if any.
    ///
    /// ```
    /// use pagezip::ArchivePath;
    ///
    /// assert_eq!(ArchivePath::new("img/0.png").unwrap().extension(), Some(".png"));
    /// assert_eq!(ArchivePath::new("img/.hidden").unwrap().extension(), None);
    /// assert_eq!(ArchivePath::new("README").unwrap().extension(), None);
    /// ```
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.file_name();
        match file_name.rfind('.') {
            Some(0) | None => None,
            Some(dot_pos) => Some(&file_name[dot_pos..]),
        }
    }

    /// Returns the number of bytes in the path.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: validated paths are never empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
