//! Error types and handling for Snakefile formatting

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for formatting operations
#[derive(Debug, Error)]
pub enum SmkfmtError {
    /// Bad token or inconsistent indentation
    #[error("Lex error: {message} at line {line}, column {column}")]
    LexError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Keyword found with a structurally invalid body
    #[error("Parse error: {message} at line {line}, column {column}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// The external code formatter rejected a generic code span
    #[error("Formatter error: {message} (span starting at line {line}, column {column})")]
    FormatterError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Invariant broken inside the engine itself
    #[error("Internal invariant violated: {message}")]
    InternalInvariantError { message: String },

    /// Configuration loading or validation errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Parse,
    Formatter,
    Internal,
    Config,
    Io,
}

impl SmkfmtError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SmkfmtError::LexError { .. } => ErrorKind::Lex,
            SmkfmtError::ParseError { .. } => ErrorKind::Parse,
            SmkfmtError::FormatterError { .. } => ErrorKind::Formatter,
            SmkfmtError::InternalInvariantError { .. } => ErrorKind::Internal,
            SmkfmtError::ConfigError { .. } => ErrorKind::Config,
            SmkfmtError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Source location (1-based line, 0-based column) if the error carries one
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            SmkfmtError::LexError { line, column, .. }
            | SmkfmtError::ParseError { line, column, .. }
            | SmkfmtError::FormatterError { line, column, .. } => Some((*line, *column)),
            _ => None,
        }
    }

    /// Check if this error only concerns the file being processed, so a batch
    /// run can move on to other files
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Lex | ErrorKind::Parse | ErrorKind::Formatter | ErrorKind::Io
        )
    }

    /// Create a lex error
    pub fn lex_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::LexError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create a formatter error for the span starting at `line`/`column`
    pub fn formatter_error(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::FormatterError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Create an internal invariant error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalInvariantError {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for SmkfmtError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            path: PathBuf::new(),
            source: err,
        }
    }
}
