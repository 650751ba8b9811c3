//! Error rendering using miette
//!
//! This module renders sequence errors as diagnostics: error code, message,
//! help text, and the chain of underlying causes for rule failures.

use crate::Error;
use miette::{GraphicalReportHandler, GraphicalTheme, ThemeCharacters, ThemeStyles};
use std::io::{self, Write};

/// Character set for rendering error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharSet {
    /// Use Unicode characters for rich visual output.
    #[default]
    Unicode,
    /// Use ASCII-only characters for compatibility.
    Ascii,
}

/// Configuration for error rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Whether to use ANSI color codes in output.
    pub color: bool,
    /// The character set to use for rendering.
    /// Defaults to Unicode for rich visual output.
    pub charset: CharSet,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig::default()
    }
}

impl RenderConfig {
    const fn default() -> Self {
        Self {
            color: true,
            charset: CharSet::Unicode,
        }
    }

    fn handler(&self) -> GraphicalReportHandler {
        let characters = match self.charset {
            CharSet::Unicode => ThemeCharacters::unicode(),
            CharSet::Ascii => ThemeCharacters::ascii(),
        };
        let styles = if self.color {
            ThemeStyles::ansi()
        } else {
            ThemeStyles::none()
        };
        GraphicalReportHandler::new_themed(GraphicalTheme { characters, styles }).with_links(false)
    }
}

/// Render an error to stderr using default config.
///
/// # Example
/// ```no_run
/// use lazyseq::{LazySequence, render_error};
///
/// let seq = LazySequence::<u64>::new(Vec::new(), |i, seq| Ok(seq.get(i)?));
/// if let Err(e) = seq.get(3) {
///     render_error(&e);
/// }
/// ```
pub fn render_error(error: &Error) {
    render_error_to(error, &mut io::stderr(), &RenderConfig::default()).ok();
}

/// Render an error to a writer with the given configuration.
///
/// # Example
/// ```
/// use lazyseq::{LazySequence, RenderConfig, render_error_to};
///
/// let seq = LazySequence::bounded([0u64], 9, |i, _| Ok(i as u64)).unwrap();
/// let err = seq.get(10).unwrap_err();
///
/// let mut buf = Vec::new();
/// let config = RenderConfig { color: false, ..Default::default() };
/// render_error_to(&err, &mut buf, &config).unwrap();
/// assert!(String::from_utf8_lossy(&buf).contains("lazyseq::domain"));
/// ```
pub fn render_error_to(
    error: &Error,
    writer: &mut dyn Write,
    config: &RenderConfig,
) -> io::Result<()> {
    let mut out = String::new();
    config
        .handler()
        .render_report(&mut out, error)
        .map_err(|_| io::Error::other("failed to render diagnostic"))?;
    writer.write_all(out.as_bytes())
}
