//! Shell page configuration types.

use std::borrow::Cow;

use super::BOOTSTRAP_SCRIPT;

/// Message shown while the archive is being reconstructed.
pub const DEFAULT_WAIT_MESSAGE: &str = "Please wait...";

/// Message shown when the archive cannot read its own bytes.
pub const DEFAULT_ERROR_MESSAGE: &str = concat!(
    "<strong>Error</strong>: Cannot open the page from the filesystem.",
    "<ul style='line-height:20px;'>",
    "<li style='margin-bottom:10px'><strong>Chrome</strong>: Start the browser with the switch ",
    "\"--allow-file-access-from-files\".</li>",
    "<li><strong>Safari</strong>: Select \"Disable Local File Restrictions\" in the ",
    "\"Develop\" menu.</li></ul>",
);

/// Configuration for the HTML shell that precedes the container.
///
/// Messages are HTML fragments inserted as-is; they are shown only by
/// renderers that run the bootstrap script, after a short delay.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    /// Markup of the "please wait" placeholder.
    pub wait_message: Cow<'static, str>,

    /// Markup of the fallback shown when the archive cannot be opened.
    pub error_message: Cow<'static, str>,

    /// Script that reconstructs the page from the archive bytes.
    pub bootstrap_script: Cow<'static, str>,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            wait_message: Cow::Borrowed(DEFAULT_WAIT_MESSAGE),
            error_message: Cow::Borrowed(DEFAULT_ERROR_MESSAGE),
            bootstrap_script: Cow::Borrowed(BOOTSTRAP_SCRIPT),
        }
    }
}

impl ShellOptions {
    /// Creates the default shell configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the placeholder markup.
    pub fn wait_message(mut self, markup: impl Into<Cow<'static, str>>) -> Self {
        self.wait_message = markup.into();
        self
    }

    /// Sets the fallback markup.
    pub fn error_message(mut self, markup: impl Into<Cow<'static, str>>) -> Self {
        self.error_message = markup.into();
        self
    }

    /// Replaces the embedded bootstrap script.
    pub fn bootstrap_script(mut self, script: impl Into<Cow<'static, str>>) -> Self {
        self.bootstrap_script = script.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_use_embedded_script() {
        let options = ShellOptions::default();
        assert_eq!(options.wait_message, DEFAULT_WAIT_MESSAGE);
        assert!(options.error_message.contains("--allow-file-access-from-files"));
        assert_eq!(options.bootstrap_script, BOOTSTRAP_SCRIPT);
    }

    #[test]
    fn test_builder_setters() {
        let options = ShellOptions::new()
            .wait_message("Loading")
            .error_message(String::from("<b>Failed</b>"))
            .bootstrap_script("console.log(1)");
        assert_eq!(options.wait_message, "Loading");
        assert_eq!(options.error_message, "<b>Failed</b>");
        assert_eq!(options.bootstrap_script, "console.log(1)");
    }
}
