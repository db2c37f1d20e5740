//! Format elements for building formatted output
//!
//! The layout engine describes its output as a flat list of elements; the
//! [`Printer`](super::printer::Printer) turns them into text. Static
//! ASCII-only pieces (punctuation, the `:` after a keyword) use [`token`],
//! text taken from the source uses [`text`], and lines that were laid out
//! with absolute columns already use [`verbatim`].
//!
//! ```rust,ignore
//! use smkfmt_core::format::format_element::{hard_line_break, indent, text, token};
//!
//! let elements = vec![
//!     text("rule all"),
//!     token(":"),
//!     hard_line_break(),
//!     indent(),
//!     text("threads"),
//!     token(": "),
//!     text("4"),
//! ];
//! ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatElement {
    /// Static compile-time text: punctuation and fixed separators
    ///
    /// ASCII only, no line breaks or tabs.
    Token(&'static str),

    /// Dynamic single-line text such as names, values and comments
    Text(Box<str>),

    /// Text that already carries its own indentation; lines inside it are
    /// never re-indented
    Verbatim(Box<str>),

    /// Always inserts a newline
    HardLineBreak,

    /// Increase indentation level
    Indent,

    /// Decrease indentation level
    Dedent,
}

/// Builder API: Create token for static, ASCII-only text
///
/// # Panics
///
/// In debug builds, panics if `text` contains non-ASCII characters, newlines,
/// tabs, or carriage returns.
pub fn token(text: &'static str) -> FormatElement {
    debug_assert!(text.is_ascii(), "Token must be ASCII only, got: {text:?}");
    debug_assert!(
        !text.contains(['\n', '\r', '\t']),
        "Token cannot contain newlines/tabs, use HardLineBreak instead: {text:?}"
    );
    FormatElement::Token(text)
}

/// Builder API: Create text element from dynamic content
pub fn text(text: impl Into<Box<str>>) -> FormatElement {
    FormatElement::Text(text.into())
}

/// Builder API: Create a pre-indented text element
pub fn verbatim(text: impl Into<Box<str>>) -> FormatElement {
    FormatElement::Verbatim(text.into())
}

/// Builder API: Create a hard line break
pub fn hard_line_break() -> FormatElement {
    FormatElement::HardLineBreak
}

/// Builder API: Increase indentation
pub fn indent() -> FormatElement {
    FormatElement::Indent
}

/// Builder API: Decrease indentation
pub fn dedent() -> FormatElement {
    FormatElement::Dedent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        assert_eq!(token("rule"), FormatElement::Token("rule"));
    }

    #[test]
    #[should_panic(expected = "Token must be ASCII")]
    fn test_token_rejects_unicode() {
        token("règle");
    }

    #[test]
    #[should_panic(expected = "Token cannot contain newlines")]
    fn test_token_rejects_newlines() {
        token("rule\n");
    }

    #[test]
    fn test_builders() {
        assert_eq!(text("input"), FormatElement::Text("input".into()));
        assert_eq!(verbatim("    x"), FormatElement::Verbatim("    x".into()));
        assert_eq!(indent(), FormatElement::Indent);
        assert_eq!(dedent(), FormatElement::Dedent);
    }
}
