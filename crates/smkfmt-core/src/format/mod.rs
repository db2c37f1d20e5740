//! Layout and printing
//!
//! ```text
//! blocks ──engine──▶ format elements ──printer──▶ text
//!            │
//!   value / strings / code_formatter
//! ```

pub mod code_formatter;
pub mod engine;
pub mod format_element;
pub mod manager;
pub mod printer;
pub mod strings;
pub mod value;

pub use code_formatter::{CodeFormatter, CommandFormatter, VerbatimFormatter};
pub use engine::{FormatOptions, format_blocks, format_source};
pub use format_element::FormatElement;
pub use manager::{
    DiffChange, DiffChangeType, FormatDiff, FormatMode, FormatResult, Formatter,
    FormatterManager, SnakefileFormatter,
};
pub use printer::{Printer, PrinterOptions};
pub use value::ValueLayout;
