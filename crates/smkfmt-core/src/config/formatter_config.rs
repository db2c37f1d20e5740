//! Formatter configuration types

use serde::{Deserialize, Serialize};

use crate::format::code_formatter::CommandFormatter;
use crate::format::engine::FormatOptions;
use crate::{Result, SmkfmtError};

/// Formatter configuration
///
/// Every field is optional so that files, command line flags and defaults can
/// be layered with [`FormatterConfiguration::merge_with`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormatterConfiguration {
    /// Indentation size in spaces
    #[serde(alias = "indent_size")]
    pub indent_size: Option<usize>,

    /// Maximum line width
    #[serde(alias = "line_width", alias = "line_length", alias = "lineLength")]
    pub line_width: Option<usize>,

    /// External command for host-language code, e.g. `black -q -l {width} -`
    #[serde(alias = "formatter_command")]
    pub formatter_command: Option<String>,

    /// Glob patterns for files to include
    pub include: Option<Vec<String>>,

    /// Glob patterns for files to exclude
    pub exclude: Option<Vec<String>>,
}

impl FormatterConfiguration {
    /// Merge another config into this one (current takes precedence)
    pub fn merge_with(&mut self, other: FormatterConfiguration) {
        if self.indent_size.is_none() {
            self.indent_size = other.indent_size;
        }
        if self.line_width.is_none() {
            self.line_width = other.line_width;
        }
        if self.formatter_command.is_none() {
            self.formatter_command = other.formatter_command;
        }

        // Pattern lists are appended, not overridden
        merge_patterns(&mut self.include, other.include);
        merge_patterns(&mut self.exclude, other.exclude);
    }

    /// Reject values the layout engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.indent_size == Some(0) {
            return Err(SmkfmtError::config_error("indentSize must be greater than 0"));
        }
        if self.line_width == Some(0) {
            return Err(SmkfmtError::config_error("lineWidth must be greater than 0"));
        }
        if let Some(command) = &self.formatter_command
            && command.trim().is_empty()
        {
            return Err(SmkfmtError::config_error("formatterCommand must not be empty"));
        }
        Ok(())
    }

    /// The configured external formatter, if any
    pub fn command_formatter(&self) -> Option<CommandFormatter> {
        self.formatter_command
            .as_deref()
            .and_then(CommandFormatter::from_command_line)
    }
}

impl From<&FormatterConfiguration> for FormatOptions {
    fn from(config: &FormatterConfiguration) -> Self {
        let defaults = FormatOptions::default();
        Self {
            indent_size: config.indent_size.unwrap_or(defaults.indent_size),
            line_width: config.line_width.unwrap_or(defaults.line_width),
        }
    }
}

fn merge_patterns(current: &mut Option<Vec<String>>, other: Option<Vec<String>>) {
    let Some(other) = other else {
        return;
    };
    match current {
        Some(patterns) => {
            for pattern in other {
                if !patterns.contains(&pattern) {
                    patterns.push(pattern);
                }
            }
        }
        None => *current = Some(other),
    }
}
