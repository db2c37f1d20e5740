//! Layout engine
//!
//! Walks the block list and describes the output as [`FormatElement`]s, which
//! the [`Printer`] turns into text. Keyword lines and comments are printed at
//! the current indentation; values laid out by [`ValueLayout`] and formatted
//! host-language code already carry absolute columns and are emitted verbatim.
//!
//! Blank lines are decided here and nowhere else:
//!
//! - none before the first block
//! - two before any block at module level
//! - one between blocks nested in host-language suites
//! - none between the children of a structural keyword, and none between
//!   header comments and their keyword

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::code_formatter::CodeFormatter;
use super::format_element::{
    FormatElement, dedent, hard_line_break, indent, text, token, verbatim,
};
use super::printer::{Printer, PrinterOptions};
use super::value::{Line, ValueLayout};
use crate::syntax::block::{
    Block, BlockBody, Comment, CommentBlock, Docstring, ExpressionKeyword, GenericCode,
    InlineKeyword, KeywordHeader, ListKeyword, StructuralKeyword,
};
use crate::syntax::keywords::KeywordTable;
use crate::syntax::lexer::tokenize;
use crate::syntax::params::positional_first;
use crate::syntax::parser::parse;
use crate::syntax::trivia::{normalize_comment, trailing_suffix};
use crate::{Result, SmkfmtError};

/// Header put in front of a span starting with `else`/`elif`
const CONDITION_PLACEHOLDER: &str = "if __smkfmt_placeholder__:\n    pass\n";

/// Header put in front of a span starting with `except`/`finally`
const TRY_PLACEHOLDER: &str = "try:\n    pass\n";

/// Body given to a span ending with a compound statement header
const BODY_PLACEHOLDER: &str = "    pass\n";

/// Layout options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    /// Spaces per indentation level
    pub indent_size: usize,
    /// Maximum line width
    pub line_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            line_width: 88,
        }
    }
}

/// Format a whole source file
pub fn format_source(
    source: &str,
    table: &KeywordTable,
    options: &FormatOptions,
    code_formatter: &dyn CodeFormatter,
) -> Result<String> {
    let source = normalize_newlines(source);
    let tokens = tokenize(&source)?;
    debug!("scanned {} tokens", tokens.len());
    let blocks = parse(&source, &tokens, table)?;
    format_blocks(&blocks, options, code_formatter)
}

/// Render an already built block list
pub fn format_blocks(
    blocks: &[Block<'_>],
    options: &FormatOptions,
    code_formatter: &dyn CodeFormatter,
) -> Result<String> {
    let mut engine = LayoutEngine::new(options, code_formatter);
    engine.format_sequence(blocks, false)?;

    let mut printer = Printer::new(PrinterOptions {
        indent_size: options.indent_size,
    });
    let printed = printer.print(&engine.elements);
    trace!("printed {} lines", printer.line_number() - 1);

    let mut output = printed.trim_end_matches('\n').to_string();
    if !output.is_empty() {
        output.push('\n');
    }
    Ok(output)
}

fn normalize_newlines(source: &str) -> String {
    if source.contains('\r') {
        source.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        source.to_string()
    }
}

/// Blank lines to put between two consecutive blocks of a flat sequence
fn blank_lines_between(prev: Option<&Block<'_>>, next: &Block<'_>) -> usize {
    match prev {
        None => 0,
        Some(_) if next.indent_level() == 0 => 2,
        Some(_) => 1,
    }
}

struct LayoutEngine<'a> {
    options: &'a FormatOptions,
    code_formatter: &'a dyn CodeFormatter,
    layout: ValueLayout,
    elements: Vec<FormatElement>,
    level: usize,
}

impl<'a> LayoutEngine<'a> {
    fn new(options: &'a FormatOptions, code_formatter: &'a dyn CodeFormatter) -> Self {
        Self {
            options,
            code_formatter,
            layout: ValueLayout::new(options.line_width, options.indent_size),
            elements: Vec::new(),
            level: 0,
        }
    }

    fn column(&self, level: usize) -> usize {
        level * self.options.indent_size
    }

    /// `nested` sequences are structural children and get no blank lines
    fn format_sequence(&mut self, blocks: &[Block<'_>], nested: bool) -> Result<()> {
        let mut prev = None;
        for block in blocks {
            let blanks = if nested {
                0
            } else {
                blank_lines_between(prev, block)
            };
            self.blank_lines(blanks);
            self.format_block(block)?;
            prev = Some(block);
        }
        Ok(())
    }

    fn format_block(&mut self, block: &Block<'_>) -> Result<()> {
        self.move_to(block.indent_level());
        for comment in block.header_comments() {
            self.comment_line(comment);
        }

        match block {
            Block::GenericCode(code) => self.format_code(code)?,
            Block::InlineKeyword(inline) => self.format_inline(inline),
            Block::ListKeyword(list) => self.format_list(list),
            Block::ExpressionKeyword(expression) => self.format_expression(expression),
            Block::StructuralKeyword(structural) => self.format_structural(structural)?,
            Block::BlockBody(body) => self.format_block_body(body)?,
            Block::Docstring(docstring) => self.format_docstring(docstring),
            Block::Comments(comments) => self.format_comments(comments),
        }
        Ok(())
    }

    fn format_inline(&mut self, inline: &InlineKeyword<'_>) {
        let column = self.column(inline.header.indent_level);
        let prefix = format!("{}: ", inline.header.keyword);
        let mut lines = self
            .layout
            .single_line()
            .layout(&inline.value, column, &prefix, "", None);
        append_comment(&mut lines, inline.header.trailing_comment.as_ref());
        self.absolute_lines(lines);
    }

    fn format_list(&mut self, list: &ListKeyword<'_>) {
        self.keyword_line(&list.header, &list.header.keyword);
        let inner = self.column(list.header.indent_level + 1);

        for param in positional_first(&list.params) {
            self.body_comments(&param.leading_comments, inner);
            let prefix = param
                .name
                .as_ref()
                .map_or_else(String::new, |name| format!("{name}="));
            let mut lines = self
                .layout
                .layout(&param.value, inner, &prefix, ",", Some("("));
            append_comment(&mut lines, param.trailing_comment.as_ref());
            self.absolute_lines(lines);
        }
        self.body_comments(&list.dangling_comments, inner);
    }

    fn format_expression(&mut self, expression: &ExpressionKeyword<'_>) {
        self.keyword_line(&expression.header, &expression.header.keyword);
        let inner = self.column(expression.header.indent_level + 1);

        for chunk in &expression.chunks {
            self.body_comments(&chunk.leading_comments, inner);
            let mut lines = self.layout.layout(&chunk.tokens, inner, "", "", None);
            append_comment(&mut lines, chunk.trailing_comment.as_ref());
            self.absolute_lines(lines);
        }
        self.body_comments(&expression.dangling_comments, inner);
    }

    fn format_structural(&mut self, structural: &StructuralKeyword<'_>) -> Result<()> {
        let head = match &structural.name {
            Some(name) => format!("{} {}", structural.header.keyword, name.text),
            None => structural.header.keyword.clone(),
        };
        self.keyword_line(&structural.header, &head);
        self.format_sequence(&structural.children, true)
    }

    fn format_block_body(&mut self, block: &BlockBody) -> Result<()> {
        self.keyword_line(&block.header, &block.header.keyword);
        self.move_to(block.body.indent_level);
        self.format_code(&block.body)
    }

    fn format_docstring(&mut self, docstring: &Docstring<'_>) {
        let column = self.column(docstring.indent_level);
        let mut lines = self.layout.layout(&docstring.tokens, column, "", "", None);
        append_comment(&mut lines, docstring.trailing_comment.as_ref());
        self.absolute_lines(lines);
    }

    fn format_comments(&mut self, block: &CommentBlock) {
        for (i, comment) in block.comments.iter().enumerate() {
            if i > 0 && comment.blank_before {
                self.blank_lines(1);
            }
            self.comment_line(comment);
        }
    }

    /// Hand a host-language span to the code formatter and re-indent the result
    fn format_code(&mut self, code: &GenericCode) -> Result<()> {
        let indent = self.column(code.indent_level);
        let width = self.options.line_width.saturating_sub(indent).max(1);
        let header = code
            .continues_clause
            .as_deref()
            .map(|clause| match clause {
                "except" | "finally" => TRY_PLACEHOLDER,
                _ => CONDITION_PLACEHOLDER,
            });

        let mut input = String::from(header.unwrap_or_default());
        input.push_str(&code.code);
        input.push('\n');
        if code.opens_suite {
            input.push_str(BODY_PLACEHOLDER);
        }
        debug!(
            "formatting {} lines of code from line {} at width {}",
            code.code.lines().count(),
            code.line,
            width
        );

        let formatted = self.code_formatter.format(&input, width).map_err(|message| {
            warn!("code formatter failed on span at line {}: {}", code.line, message);
            SmkfmtError::formatter_error(message, code.line, code.column)
        })?;
        let body = strip_placeholders(&formatted, header, code.opens_suite).ok_or_else(|| {
            SmkfmtError::formatter_error(
                "code formatter did not preserve the placeholder statements",
                code.line,
                code.column,
            )
        })?;

        for line in reindent_code(&body, indent).lines() {
            self.elements.push(verbatim(line));
            self.elements.push(hard_line_break());
        }
        Ok(())
    }

    /// `head:` plus the keyword line's own comment
    fn keyword_line(&mut self, header: &KeywordHeader, head: &str) {
        self.elements.push(text(head));
        self.elements.push(token(":"));
        if let Some(comment) = &header.trailing_comment {
            self.elements.push(text(trailing_suffix(comment)));
        }
        self.elements.push(hard_line_break());
    }

    fn comment_line(&mut self, comment: &Comment) {
        self.elements.push(text(normalize_comment(&comment.text)));
        self.elements.push(hard_line_break());
    }

    /// Standalone comments of a keyword body; a blank line before one in the
    /// source is kept
    fn body_comments(&mut self, comments: &[Comment], column: usize) {
        for comment in comments {
            if comment.blank_before {
                self.blank_lines(1);
            }
            self.absolute_comment(comment, column);
        }
    }

    fn absolute_comment(&mut self, comment: &Comment, column: usize) {
        let line = Line {
            column,
            text: normalize_comment(&comment.text),
        };
        self.absolute_lines(vec![line]);
    }

    fn absolute_lines(&mut self, lines: Vec<Line>) {
        for line in lines {
            self.elements.push(verbatim(line.render()));
            self.elements.push(hard_line_break());
        }
    }

    fn blank_lines(&mut self, count: usize) {
        for _ in 0..count {
            self.elements.push(hard_line_break());
        }
    }

    fn move_to(&mut self, level: usize) {
        while self.level < level {
            self.elements.push(indent());
            self.level += 1;
        }
        while self.level > level {
            self.elements.push(dedent());
            self.level -= 1;
        }
    }
}

fn append_comment(lines: &mut [Line], comment: Option<&Comment>) {
    if let (Some(comment), Some(last)) = (comment, lines.last_mut()) {
        last.text.push_str(&trailing_suffix(comment));
    }
}

/// Remove the placeholder header and body added around a span
///
/// `None` when the formatter changed them.
fn strip_placeholders(formatted: &str, header: Option<&str>, opens_suite: bool) -> Option<String> {
    let text = match header {
        Some(header) => formatted.strip_prefix(header)?,
        None => formatted,
    };
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    if opens_suite {
        if lines.last()?.trim() != "pass" {
            return None;
        }
        lines.pop();
    }
    let leading_blank = lines
        .iter()
        .take_while(|line| line.trim().is_empty())
        .count();
    Some(lines[leading_blank..].join("\n"))
}

/// Shift formatted code right by `indent` columns
///
/// Empty lines stay empty and lines continuing a multi-line string stay as
/// the formatter wrote them.
fn reindent_code(code: &str, indent: usize) -> String {
    if indent == 0 {
        return code.to_string();
    }
    let string_lines: HashSet<usize> = match tokenize(code) {
        Ok(tokens) => tokens
            .iter()
            .filter(|t| t.is_multiline_string())
            .flat_map(|t| t.line + 1..=t.end_line)
            .collect(),
        Err(err) => {
            warn!("could not rescan formatted code: {}", err);
            HashSet::new()
        }
    };

    let prefix = " ".repeat(indent);
    code.lines()
        .enumerate()
        .map(|(i, line)| {
            if line.is_empty() || string_lines.contains(&(i + 1)) {
                line.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
