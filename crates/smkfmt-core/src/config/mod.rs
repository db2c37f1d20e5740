//! Configuration system for smkfmt
//!
//! Settings come from TOML files, found by walking up from the formatted
//! path:
//!
//! - `smkfmt.toml`
//! - `.smkfmt.toml`
//! - `pyproject.toml`, `[tool.smkfmt]` table
//!
//! ## Example Configuration
//!
//! ```toml
//! indentSize = 4
//! lineWidth = 88
//! formatterCommand = "black -q -l {width} -"
//! exclude = [".snakemake/**"]
//! ```
//!
//! Command line flags are merged on top with
//! [`FormatterConfiguration::merge_with`].

mod formatter_config;
mod loader;

pub use formatter_config::FormatterConfiguration;
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
