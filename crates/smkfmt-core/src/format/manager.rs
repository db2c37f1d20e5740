//! Snakefile formatting facade
//!
//! [`SnakefileFormatter`] bundles the keyword table and the host-language
//! code formatter behind the [`Formatter`] trait; [`FormatterManager`] adds
//! the check and diff modes used by the command line.

use std::path::Path;

use similar::{ChangeTag, TextDiff};
use tracing::debug;

use super::code_formatter::{CodeFormatter, VerbatimFormatter};
use super::engine::{FormatOptions, format_source};
use crate::syntax::keywords::KeywordTable;
use crate::{Result, SmkfmtError};

/// Formatting mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatMode {
    /// Format and return the result
    Format,
    /// Check if formatting is needed without applying changes
    Check,
    /// Show diff of proposed changes
    Diff,
}

/// Result of a formatting operation
#[derive(Debug, Clone)]
pub struct FormatResult {
    /// The formatted content
    pub content: String,
    /// Whether any changes were made
    pub changed: bool,
    /// Original content for comparison
    pub original: String,
}

/// Diff information for formatting changes
#[derive(Debug, Clone)]
pub struct FormatDiff {
    /// Original content
    pub original: String,
    /// Formatted content
    pub formatted: String,
    /// Line-by-line diff information
    pub changes: Vec<DiffChange>,
}

/// Individual diff change
#[derive(Debug, Clone)]
pub struct DiffChange {
    /// Line number in original (1-based, 0 for added lines)
    pub original_line: usize,
    /// Line number in formatted (1-based, 0 for removed lines)
    pub formatted_line: usize,
    /// Type of change
    pub change_type: DiffChangeType,
    /// Content of the line, without its newline
    pub content: String,
}

/// Type of diff change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffChangeType {
    /// Line was added
    Added,
    /// Line was removed
    Removed,
    /// Line is unchanged (context)
    Unchanged,
}

/// Formatter for Snakefile content
pub trait Formatter {
    /// Format a string and return the result
    fn format_string(&self, content: &str, options: &FormatOptions) -> Result<FormatResult>;

    /// Check if content needs formatting
    fn check_format(&self, content: &str, options: &FormatOptions) -> Result<bool>;

    /// Generate diff for formatting changes
    fn format_diff(&self, content: &str, options: &FormatOptions) -> Result<FormatDiff>;
}

/// Formats Snakefiles with a keyword table and a host-language code formatter
pub struct SnakefileFormatter {
    table: KeywordTable,
    code_formatter: Box<dyn CodeFormatter>,
}

impl SnakefileFormatter {
    /// Create a formatter with the standard keyword table
    pub fn new(code_formatter: impl CodeFormatter + 'static) -> Self {
        Self {
            table: KeywordTable::snakemake(),
            code_formatter: Box::new(code_formatter),
        }
    }

    /// Replace the keyword table
    pub fn with_table(mut self, table: KeywordTable) -> Self {
        self.table = table;
        self
    }
}

impl Default for SnakefileFormatter {
    fn default() -> Self {
        Self::new(VerbatimFormatter)
    }
}

impl Formatter for SnakefileFormatter {
    fn format_string(&self, content: &str, options: &FormatOptions) -> Result<FormatResult> {
        let formatted = format_source(content, &self.table, options, self.code_formatter.as_ref())?;
        let changed = formatted != content;
        Ok(FormatResult::new(formatted, changed, content.to_string()))
    }

    fn check_format(&self, content: &str, options: &FormatOptions) -> Result<bool> {
        let result = self.format_string(content, options)?;
        Ok(result.changed)
    }

    fn format_diff(&self, content: &str, options: &FormatOptions) -> Result<FormatDiff> {
        let result = self.format_string(content, options)?;
        Ok(FormatDiff::between(content, &result.content))
    }
}

/// Formatter manager that provides high-level formatting operations
pub struct FormatterManager {
    formatter: SnakefileFormatter,
}

impl FormatterManager {
    pub fn new(formatter: SnakefileFormatter) -> Self {
        Self { formatter }
    }

    /// Format content according to the specified mode
    ///
    /// Check mode reports whether a change is needed but hands back the
    /// original content.
    pub fn format_with_mode(
        &self,
        content: &str,
        options: &FormatOptions,
        mode: FormatMode,
    ) -> Result<FormatResult> {
        match mode {
            FormatMode::Format => self.formatter.format_string(content, options),
            FormatMode::Check => {
                let needs_formatting = self.formatter.check_format(content, options)?;
                Ok(FormatResult::new(
                    content.to_string(),
                    needs_formatting,
                    content.to_string(),
                ))
            }
            FormatMode::Diff => {
                let diff = self.formatter.format_diff(content, options)?;
                let changed = diff.has_changes();
                Ok(FormatResult::new(diff.formatted, changed, diff.original))
            }
        }
    }

    /// Format a file with the specified mode
    pub fn format_file_with_mode(
        &self,
        path: &Path,
        options: &FormatOptions,
        mode: FormatMode,
    ) -> Result<FormatResult> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SmkfmtError::io_error(path, e))?;
        debug!("formatting {}", path.display());
        self.format_with_mode(&content, options, mode)
    }
}

impl FormatResult {
    pub fn new(content: String, changed: bool, original: String) -> Self {
        Self {
            content,
            changed,
            original,
        }
    }

    pub fn has_changes(&self) -> bool {
        self.changed
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn original(&self) -> &str {
        &self.original
    }
}

impl FormatDiff {
    /// Line diff between two versions of a file
    pub fn between(original: &str, formatted: &str) -> Self {
        let diff = TextDiff::from_lines(original, formatted);
        let changes = diff
            .iter_all_changes()
            .map(|change| DiffChange {
                original_line: change.old_index().map_or(0, |i| i + 1),
                formatted_line: change.new_index().map_or(0, |i| i + 1),
                change_type: match change.tag() {
                    ChangeTag::Equal => DiffChangeType::Unchanged,
                    ChangeTag::Delete => DiffChangeType::Removed,
                    ChangeTag::Insert => DiffChangeType::Added,
                },
                content: change.value().trim_end_matches('\n').to_string(),
            })
            .collect();

        Self {
            original: original.to_string(),
            formatted: formatted.to_string(),
            changes,
        }
    }

    /// Get the number of changed lines
    pub fn change_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|change| change.change_type != DiffChangeType::Unchanged)
            .count()
    }

    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }

    /// Unified diff text with three lines of context
    pub fn unified(&self, label: &str) -> String {
        TextDiff::from_lines(&self.original, &self.formatted)
            .unified_diff()
            .context_radius(3)
            .header(&format!("{label} (original)"), &format!("{label} (formatted)"))
            .to_string()
    }
}
