//! Printer for converting FormatElement IR to formatted strings
//!
//! Indentation is written lazily: a line break only marks the next line as
//! pending, and the indent is emitted before its first character. Empty lines
//! therefore never carry trailing whitespace.

use super::format_element::FormatElement;
use unicode_width::UnicodeWidthStr;

/// Display width of a single line of text
pub fn display_width(text: &str) -> usize {
    text.width()
}

#[derive(Debug, Clone)]
pub struct PrinterOptions {
    /// Number of spaces per indentation level
    pub indent_size: usize,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self { indent_size: 4 }
    }
}

pub struct Printer {
    options: PrinterOptions,
    buffer: String,
    indent_level: usize,
    line_number: usize,
    at_line_start: bool,
}

impl Printer {
    pub fn new(options: PrinterOptions) -> Self {
        Self {
            options,
            buffer: String::with_capacity(4096),
            indent_level: 0,
            line_number: 1,
            at_line_start: true,
        }
    }

    /// Print a sequence of format elements to a string
    pub fn print(&mut self, elements: &[FormatElement]) -> String {
        for element in elements {
            self.print_element(element);
        }
        std::mem::take(&mut self.buffer)
    }

    fn print_element(&mut self, element: &FormatElement) {
        match element {
            FormatElement::Token(token) => {
                self.start_content();
                self.buffer.push_str(token);
            }

            FormatElement::Text(text) => {
                self.start_content();
                self.push_text(text);
            }

            FormatElement::Verbatim(text) => {
                self.at_line_start = false;
                self.push_text(text);
            }

            FormatElement::HardLineBreak => self.new_line(),

            FormatElement::Indent => self.indent_level += 1,

            FormatElement::Dedent => {
                self.indent_level = self.indent_level.saturating_sub(1);
            }
        }
    }

    /// Text may contain newlines (multi-line strings); what follows a newline
    /// is printed as-is
    fn push_text(&mut self, text: &str) {
        for c in text.chars() {
            match c {
                '\n' => {
                    self.buffer.push('\n');
                    self.line_number += 1;
                }
                '\r' => {}
                c => self.buffer.push(c),
            }
        }
    }

    fn new_line(&mut self) {
        self.buffer.push('\n');
        self.line_number += 1;
        self.at_line_start = true;
    }

    fn start_content(&mut self) {
        if self.at_line_start {
            self.at_line_start = false;
            self.write_indent();
        }
    }

    /// Write current indentation to buffer
    fn write_indent(&mut self) {
        let width = self.indent_level * self.options.indent_size;
        self.buffer.push_str(&" ".repeat(width));
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
