//! smkfmt Core
//!
//! Formatting engine for Snakemake workflow files: host-language code with
//! declarative workflow keywords (`rule`, `input:`, `shell:`, ...) mixed in.
//! Keyword blocks are laid out here; plain host-language spans are handed to
//! a pluggable [`CodeFormatter`].
//!
//! ```rust,ignore
//! use smkfmt_core::{FormatOptions, format_str};
//!
//! let formatted = format_str("rule a:\n  input: 'x'\n", &FormatOptions::default())?;
//! assert_eq!(formatted, "rule a:\n    input:\n        \"x\",\n");
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod format;
pub mod result;
pub mod syntax;

pub use config::{ConfigLoader, FormatterConfiguration};
pub use discovery::{FileDiscovery, is_workflow_file};
pub use error::{ErrorKind, SmkfmtError};
pub use format::{
    CodeFormatter, CommandFormatter, DiffChange, DiffChangeType, FormatDiff, FormatMode,
    FormatOptions, FormatResult, Formatter, FormatterManager, SnakefileFormatter,
    VerbatimFormatter, format_source,
};
pub use result::{Result, ResultExt};
pub use syntax::{Block, KeywordCategory, KeywordTable, Scope, parse, tokenize};

/// Format `source` with the standard keyword table, leaving host-language
/// code as written
pub fn format_str(source: &str, options: &FormatOptions) -> Result<String> {
    format_source(source, &KeywordTable::snakemake(), options, &VerbatimFormatter)
}

/// Initialize the tracing subscriber for logging
///
/// `RUST_LOG` takes precedence over `default_filter` (e.g. `smkfmt=warn`).
/// Logs go to stderr, leaving stdout to formatted output.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
