//! Block tree builder
//!
//! Works in two passes over the token stream:
//!
//! 1. group tokens into logical lines, each with its (optional) indented suite
//!    and the standalone comments around it
//! 2. walk those lines with a [`KeywordTable`], turning keyword lines into
//!    keyword blocks and accumulating everything else into generic code spans
//!
//! Host-language compound statements whose suite contains a keyword line are
//! split: the span ends at the statement header and the suite is built one
//! level deeper, so workflow blocks can live inside `if`/`for`/`def` bodies.
//!
//! Logical lines are slices of the scanner's token vector and blocks keep
//! references into it; no token is copied.

use std::collections::HashSet;

use tracing::debug;

use super::block::{
    Block, BlockBody, Comment, CommentBlock, Docstring, ExpressionKeyword, GenericCode,
    InlineKeyword, KeywordHeader, ListKeyword, StructuralKeyword,
};
use super::keywords::{KeywordCategory, KeywordTable, Scope};
use super::params::{split_chunks, split_parameters};
use super::token::{Token, TokenKind};
use super::trivia::{bind_header_comments, outer_level_start};
use crate::{Result, SmkfmtError};

/// First words of statements that continue a compound statement
const CONTINUATION_CLAUSES: &[&str] = &["else", "elif", "except", "finally"];

/// Build the block tree for `source` from its tokens
pub fn parse<'t>(
    source: &str,
    tokens: &'t [Token],
    table: &KeywordTable,
) -> Result<Vec<Block<'t>>> {
    let items = LineReader::new(tokens).read_suite(None)?;
    let builder = Builder::new(source, tokens, table);
    let blocks = builder.build_global(&items, 0)?;
    debug!(
        "built {} blocks ({} top-level)",
        blocks.iter().map(Block::count).sum::<usize>(),
        blocks.len()
    );
    Ok(blocks)
}

/// A standalone comment line or a logical line of code
#[derive(Debug, Clone)]
enum Item<'t> {
    Comment { token: &'t Token, blank_before: bool },
    Line(LogicalLine<'t>),
}

#[derive(Debug, Clone)]
struct LogicalLine<'t> {
    /// Code tokens, including comments that sit inside brackets
    tokens: &'t [Token],
    trailing_comment: Option<&'t Token>,
    blank_before: bool,
    suite: Vec<Item<'t>>,
}

impl Item<'_> {
    fn first_line(&self) -> usize {
        match self {
            Item::Comment { token, .. } => token.line,
            Item::Line(line) => line.first_line(),
        }
    }

    fn last_line(&self) -> usize {
        match self {
            Item::Comment { token, .. } => token.line,
            Item::Line(line) => line
                .suite
                .last()
                .map_or_else(|| line.own_last_line(), Item::last_line),
        }
    }

    fn to_comment(&self) -> Option<Comment> {
        match self {
            Item::Comment {
                token,
                blank_before,
            } => Some(Comment::from_token(token, *blank_before)),
            Item::Line(_) => None,
        }
    }
}

impl<'t> LogicalLine<'t> {
    fn first_line(&self) -> usize {
        self.tokens.first().map_or(0, |t| t.line)
    }

    /// Last physical line of the line itself, ignoring its suite
    fn own_last_line(&self) -> usize {
        self.trailing_comment
            .iter()
            .copied()
            .chain(self.tokens)
            .map(|t| t.end_line)
            .max()
            .unwrap_or(0)
    }

    fn first(&self) -> Option<&'t Token> {
        self.tokens.first()
    }

    fn ends_with_colon(&self) -> bool {
        self.tokens.last().is_some_and(|t| t.is_op(":"))
    }

    fn has_code_suite(&self) -> bool {
        self.suite.iter().any(|item| matches!(item, Item::Line(_)))
    }
}

/// Groups tokens into logical lines with nested suites
struct LineReader<'t> {
    tokens: &'t [Token],
    pos: usize,
    last_line: usize,
    /// Comments that left a closed suite and belong after its header line
    carry: Vec<Item<'t>>,
}

impl<'t> LineReader<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            last_line: 0,
            carry: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn blank_before(&self, line: usize) -> bool {
        self.last_line > 0 && line > self.last_line + 1
    }

    fn read_comment(&mut self, token: &'t Token) -> Item<'t> {
        let blank_before = self.blank_before(token.line);
        self.last_line = token.end_line;
        self.pos += 1;
        Item::Comment {
            token,
            blank_before,
        }
    }

    /// Read items until the suite's DEDENT (or end of input at top level)
    fn read_suite(&mut self, column: Option<usize>) -> Result<Vec<Item<'t>>> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::End => break,
                TokenKind::Dedent => {
                    self.pos += 1;
                    let Some(column) = column else {
                        // closes an indented first line
                        continue;
                    };
                    self.release_outer_comments(&mut items, column);
                    break;
                }
                TokenKind::Comment => {
                    let item = self.read_comment(token);
                    items.push(item);
                }
                // A file whose first line is indented is shifted back to column zero
                TokenKind::Indent
                    if column.is_none()
                        && items.iter().all(|item| matches!(item, Item::Comment { .. })) =>
                {
                    self.pos += 1;
                }
                TokenKind::Indent => {
                    let next = self.tokens.get(self.pos + 1).unwrap_or(token);
                    return Err(SmkfmtError::parse_error(
                        "unexpected indent",
                        next.line,
                        next.column,
                    ));
                }
                TokenKind::Newline => self.pos += 1,
                _ => {
                    let line = self.read_line()?;
                    items.push(Item::Line(line));
                    items.append(&mut self.carry);
                }
            }
        }
        Ok(items)
    }

    /// Move comments left of `column` at the end of a suite out to the parent
    fn release_outer_comments(&mut self, items: &mut Vec<Item<'t>>, column: usize) {
        let run_start = items
            .iter()
            .rposition(|item| matches!(item, Item::Line(_)))
            .map_or(0, |i| i + 1);
        let columns: Vec<usize> = items[run_start..]
            .iter()
            .map(|item| match item {
                Item::Comment { token, .. } => token.column,
                Item::Line(_) => column,
            })
            .collect();
        if let Some(offset) = outer_level_start(&columns, column) {
            self.carry = items.split_off(run_start + offset);
        }
    }

    fn read_line(&mut self) -> Result<LogicalLine<'t>> {
        let blank_before = self.peek().is_some_and(|t| self.blank_before(t.line));
        let start = self.pos;
        let mut end = start;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Newline => {
                    self.pos += 1;
                    break;
                }
                TokenKind::End | TokenKind::Indent | TokenKind::Dedent => break,
                _ => {
                    self.last_line = token.end_line;
                    self.pos += 1;
                    end = self.pos;
                }
            }
        }

        let all = self.tokens;
        let (tokens, trailing_comment) = match all[start..end].split_last() {
            Some((last, rest)) if last.is_comment() => (rest, Some(last)),
            _ => (&all[start..end], None),
        };

        // Comment lines between a header and its first indented line belong to the suite
        let mut lookahead = self.pos;
        while self
            .tokens
            .get(lookahead)
            .is_some_and(|t| t.kind == TokenKind::Comment)
        {
            lookahead += 1;
        }

        let mut suite = Vec::new();
        if self
            .tokens
            .get(lookahead)
            .is_some_and(|t| t.kind == TokenKind::Indent)
        {
            while self.pos < lookahead {
                let item = self.read_comment(&all[self.pos]);
                suite.push(item);
            }
            self.pos += 1;
            let column = self.peek().map_or(0, |t| t.column);
            suite.extend(self.read_suite(Some(column))?);
        }

        Ok(LogicalLine {
            tokens,
            trailing_comment,
            blank_before,
            suite,
        })
    }
}

struct Builder<'a> {
    lines: Vec<&'a str>,
    /// Physical lines that continue a multi-line string literal
    string_lines: HashSet<usize>,
    table: &'a KeywordTable,
}

impl<'a> Builder<'a> {
    fn new(source: &'a str, tokens: &[Token], table: &'a KeywordTable) -> Self {
        let string_lines = tokens
            .iter()
            .filter(|t| t.is_multiline_string())
            .flat_map(|t| t.line + 1..=t.end_line)
            .collect();
        Self {
            lines: source.lines().collect(),
            string_lines,
            table,
        }
    }

    fn keyword_of(&self, line: &LogicalLine<'_>, scope: Scope) -> Option<KeywordCategory> {
        let first = line.first()?;
        if first.kind != TokenKind::KeywordCandidate {
            return None;
        }
        let category = self.table.lookup(scope, &first.text)?;
        let colon_at = |i: usize| line.tokens.get(i).is_some_and(|t| t.is_op(":"));
        let matches = match category {
            KeywordCategory::Structural => {
                colon_at(1)
                    || (line.tokens.get(1).is_some_and(|t| t.kind.is_name()) && colon_at(2))
            }
            _ => colon_at(1),
        };
        matches.then_some(category)
    }

    fn suite_has_keyword(&self, items: &[Item<'_>]) -> bool {
        items.iter().any(|item| match item {
            Item::Line(line) => {
                self.keyword_of(line, Scope::Global).is_some()
                    || self.suite_has_keyword(&line.suite)
            }
            Item::Comment { .. } => false,
        })
    }

    /// Module level and host-language suites
    fn build_global<'t>(&self, items: &[Item<'t>], level: usize) -> Result<Vec<Block<'t>>> {
        let mut blocks = Vec::new();
        let mut span: Vec<&Item<'t>> = Vec::new();

        for item in items {
            let Item::Line(line) = item else {
                span.push(item);
                continue;
            };

            if let Some(category) = self.keyword_of(line, Scope::Global) {
                let run_start = span
                    .iter()
                    .rposition(|i| matches!(i, Item::Line(_)))
                    .map_or(0, |i| i + 1);
                let run: Vec<Comment> = span[run_start..]
                    .iter()
                    .filter_map(|i| i.to_comment())
                    .collect();
                span.truncate(run_start);

                let (standalone, header) = bind_header_comments(run, line.blank_before);
                if !span.is_empty() {
                    blocks.push(self.generic(&span, level, false)?);
                    span.clear();
                }
                if !standalone.is_empty() {
                    blocks.push(Block::Comments(CommentBlock {
                        comments: standalone,
                        indent_level: level,
                    }));
                }
                blocks.push(self.keyword_block(line, category, header, level)?);
            } else if line.ends_with_colon()
                && line.has_code_suite()
                && self.suite_has_keyword(&line.suite)
            {
                span.push(item);
                blocks.push(self.generic(&span, level, true)?);
                span.clear();
                blocks.extend(self.build_global(&line.suite, level + 1)?);
            } else {
                span.push(item);
            }
        }

        if span.iter().any(|i| matches!(i, Item::Line(_))) {
            blocks.push(self.generic(&span, level, false)?);
        } else if !span.is_empty() {
            blocks.push(Block::Comments(CommentBlock {
                comments: span.iter().filter_map(|i| i.to_comment()).collect(),
                indent_level: level,
            }));
        }
        Ok(blocks)
    }

    /// Children of a structural keyword: keywords, comments and an optional docstring
    fn build_structural_body<'t>(
        &self,
        owner: &Token,
        items: &[Item<'t>],
        level: usize,
    ) -> Result<Vec<Block<'t>>> {
        let mut children = Vec::new();
        let mut run: Vec<Comment> = Vec::new();
        let mut seen_code = false;

        for item in items {
            let Item::Line(line) = item else {
                run.extend(item.to_comment());
                continue;
            };

            let is_docstring = !line.tokens.is_empty()
                && line.tokens.iter().all(|t| t.kind == TokenKind::String);
            if !seen_code && is_docstring && line.suite.is_empty() {
                if !run.is_empty() {
                    children.push(Block::Comments(CommentBlock {
                        comments: std::mem::take(&mut run),
                        indent_level: level,
                    }));
                }
                children.push(Block::Docstring(Docstring {
                    tokens: line.tokens.iter().collect(),
                    indent_level: level,
                    trailing_comment: line
                        .trailing_comment
                        .map(|t| Comment::from_token(t, false)),
                }));
                seen_code = true;
                continue;
            }

            let Some(category) = self.keyword_of(line, Scope::Rule) else {
                let at = line.first().unwrap_or(owner);
                return Err(SmkfmtError::parse_error(
                    format!(
                        "expected a keyword inside '{}' body, found '{}'",
                        owner.text, at.text
                    ),
                    at.line,
                    at.column,
                ));
            };

            let (standalone, header) =
                bind_header_comments(std::mem::take(&mut run), line.blank_before);
            if !standalone.is_empty() {
                children.push(Block::Comments(CommentBlock {
                    comments: standalone,
                    indent_level: level,
                }));
            }
            children.push(self.keyword_block(line, category, header, level)?);
            seen_code = true;
        }

        if !run.is_empty() {
            children.push(Block::Comments(CommentBlock {
                comments: run,
                indent_level: level,
            }));
        }
        Ok(children)
    }

    fn keyword_block<'t>(
        &self,
        line: &LogicalLine<'t>,
        category: KeywordCategory,
        header_comments: Vec<Comment>,
        level: usize,
    ) -> Result<Block<'t>> {
        let tokens = line.tokens;
        let keyword = &tokens[0];
        let colon = tokens
            .iter()
            .position(|t| t.is_op(":"))
            .unwrap_or(tokens.len());
        let after = tokens.get(colon + 1..).unwrap_or(&[]);
        let line_comment = line
            .trailing_comment
            .map(|t| Comment::from_token(t, false));

        let mut header = KeywordHeader {
            keyword: keyword.text.clone(),
            line: keyword.line,
            column: keyword.column,
            indent_level: level,
            header_comments,
            trailing_comment: None,
        };

        // A comment right after the colon describes the keyword itself
        let mut stream: Vec<&'t Token> = after.iter().collect();
        if after.is_empty() {
            header.trailing_comment = line_comment;
        } else {
            stream.extend(line.trailing_comment);
        }

        match category {
            KeywordCategory::Structural => {
                if let Some(extra) = after.first() {
                    return Err(SmkfmtError::parse_error(
                        format!("unexpected '{}' after '{}' header", extra.text, keyword.text),
                        extra.line,
                        extra.column,
                    ));
                }
                if !line.has_code_suite() {
                    return Err(SmkfmtError::parse_error(
                        format!("'{}' requires an indented body", keyword.text),
                        keyword.line,
                        keyword.column,
                    ));
                }
                let name = (colon == 2).then(|| &tokens[1]);
                let children = self.build_structural_body(keyword, &line.suite, level + 1)?;
                Ok(Block::StructuralKeyword(StructuralKeyword {
                    header,
                    name,
                    children,
                }))
            }
            KeywordCategory::BlockBody => {
                let body = self.block_body(line, after, keyword, level + 1)?;
                Ok(Block::BlockBody(BlockBody { header, body }))
            }
            KeywordCategory::Inline => {
                flatten_tokens(&line.suite, &mut stream);
                let mut depth = 0usize;
                let mut value = Vec::new();
                let mut comments = Vec::new();
                for token in stream {
                    if token.is_open_bracket() {
                        depth += 1;
                    } else if token.is_close_bracket() {
                        depth = depth.saturating_sub(1);
                    }
                    if token.is_comment() && depth == 0 {
                        comments.push(token);
                    } else {
                        value.push(token);
                    }
                }
                let Some(value_end) = value.last().map(|t| t.end_line) else {
                    return Err(SmkfmtError::parse_error(
                        format!("'{}' requires a value", keyword.text),
                        keyword.line,
                        keyword.column,
                    ));
                };
                for token in comments {
                    let comment = Comment::from_token(token, false);
                    if token.line == value_end && header.trailing_comment.is_none() {
                        header.trailing_comment = Some(comment);
                    } else {
                        header.header_comments.push(comment);
                    }
                }
                Ok(Block::InlineKeyword(InlineKeyword { header, value }))
            }
            KeywordCategory::List => {
                flatten_tokens(&line.suite, &mut stream);
                let (params, dangling_comments) = split_parameters(&stream);
                Ok(Block::ListKeyword(ListKeyword {
                    header,
                    params,
                    dangling_comments,
                }))
            }
            KeywordCategory::Expression => {
                let mut lines = Vec::new();
                if !stream.is_empty() {
                    lines.push(stream);
                }
                flatten_lines(&line.suite, &mut lines);
                let (chunks, dangling_comments) = split_chunks(&lines);
                if chunks.is_empty() {
                    return Err(SmkfmtError::parse_error(
                        format!("'{}' requires a value", keyword.text),
                        keyword.line,
                        keyword.column,
                    ));
                }
                Ok(Block::ExpressionKeyword(ExpressionKeyword {
                    header,
                    chunks,
                    dangling_comments,
                }))
            }
        }
    }

    /// Generic body of `run:`-like keywords: code after the colon, then the suite
    fn block_body(
        &self,
        line: &LogicalLine<'_>,
        after: &[Token],
        keyword: &Token,
        level: usize,
    ) -> Result<GenericCode> {
        let mut parts = Vec::new();
        let mut column = keyword.column;
        let mut first_line = keyword.line;

        if let Some(first) = after.first() {
            let text = self.lines.get(first.line - 1).copied().unwrap_or_default();
            let rest: String = text.chars().skip(first.column).collect();
            parts.push(rest.trim_end().to_string());
            column = first.column;
            first_line = first.line;
        }
        if let (Some(first), Some(last)) = (line.suite.first(), line.suite.last()) {
            let base = code_column(&line.suite);
            parts.push(self.dedent(first.first_line(), last.last_line(), base));
            if after.is_empty() {
                column = base;
                first_line = first.first_line();
            }
        }
        if parts.is_empty() {
            return Err(SmkfmtError::parse_error(
                format!("'{}' requires a body", keyword.text),
                keyword.line,
                keyword.column,
            ));
        }

        Ok(GenericCode {
            code: parts.join("\n"),
            line: first_line,
            column,
            indent_level: level,
            opens_suite: false,
            continues_clause: None,
        })
    }

    /// Generic code block for a run of items
    fn generic<'t>(
        &self,
        span: &[&Item<'_>],
        level: usize,
        opens_suite: bool,
    ) -> Result<Block<'t>> {
        let (Some(first), Some(last)) = (span.first(), span.last()) else {
            return Err(SmkfmtError::internal_error("empty generic code span"));
        };
        let last_line = match last {
            Item::Line(line) if opens_suite => line.own_last_line(),
            other => other.last_line(),
        };
        let first_code = span.iter().find_map(|item| match item {
            Item::Line(line) => Some(line),
            Item::Comment { .. } => None,
        });
        let base = first_code
            .and_then(|line| line.first())
            .map_or(0, |t| t.column);
        let continues_clause = first_code
            .and_then(|line| line.first())
            .filter(|t| CONTINUATION_CLAUSES.contains(&t.text.as_str()))
            .map(|t| t.text.clone());

        let code = self.dedent(first.first_line(), last_line, base);
        tracing::trace!(
            "generic span at line {} ({} lines, level {})",
            first.first_line(),
            code.lines().count(),
            level
        );
        Ok(Block::GenericCode(GenericCode {
            code,
            line: first.first_line(),
            column: base,
            indent_level: level,
            opens_suite,
            continues_clause,
        }))
    }

    /// Source lines `first..=last`, shifted left by `base` columns
    ///
    /// Lines inside multi-line strings are kept exactly as written.
    fn dedent(&self, first: usize, last: usize, base: usize) -> String {
        let mut out: Vec<String> = Vec::new();
        for number in first..=last {
            let Some(text) = self.lines.get(number.wrapping_sub(1)) else {
                break;
            };
            if self.string_lines.contains(&number) {
                out.push((*text).to_string());
                continue;
            }
            let strip: usize = text
                .chars()
                .take(base)
                .take_while(|c| c.is_whitespace())
                .map(char::len_utf8)
                .sum();
            out.push(text[strip..].trim_end().to_string());
        }
        while out.last().is_some_and(|l| l.is_empty()) {
            out.pop();
        }
        let leading_blank = out.iter().take_while(|l| l.is_empty()).count();
        out.drain(..leading_blank);
        out.join("\n")
    }
}

/// Column of the first code line among `items`, or of the first comment
fn code_column(items: &[Item<'_>]) -> usize {
    items
        .iter()
        .find_map(|item| match item {
            Item::Line(line) => line.first().map(|t| t.column),
            Item::Comment { .. } => None,
        })
        .or_else(|| match items.first() {
            Some(Item::Comment { token, .. }) => Some(token.column),
            _ => None,
        })
        .unwrap_or(0)
}

/// All tokens of a keyword suite in source order, comments included
fn flatten_tokens<'t>(items: &[Item<'t>], out: &mut Vec<&'t Token>) {
    for item in items {
        match item {
            Item::Comment { token, .. } => out.push(*token),
            Item::Line(line) => {
                out.extend(line.tokens);
                out.extend(line.trailing_comment);
                flatten_tokens(&line.suite, out);
            }
        }
    }
}

/// Logical lines of a keyword suite; standalone comments are one-token lines
fn flatten_lines<'t>(items: &[Item<'t>], out: &mut Vec<Vec<&'t Token>>) {
    for item in items {
        match item {
            Item::Comment { token, .. } => out.push(vec![*token]),
            Item::Line(line) => {
                let mut tokens: Vec<&'t Token> = line.tokens.iter().collect();
                tokens.extend(line.trailing_comment);
                out.push(tokens);
                flatten_lines(&line.suite, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;

    fn build(source: &str) -> Result<Vec<Block<'static>>> {
        let tokens = Vec::leak(tokenize(source)?);
        parse(source, tokens, &KeywordTable::snakemake())
    }

    fn kinds(blocks: &[Block<'_>]) -> Vec<&'static str> {
        blocks
            .iter()
            .map(|b| match b {
                Block::GenericCode(_) => "generic",
                Block::InlineKeyword(_) => "inline",
                Block::ListKeyword(_) => "list",
                Block::ExpressionKeyword(_) => "expression",
                Block::StructuralKeyword(_) => "structural",
                Block::BlockBody(_) => "block-body",
                Block::Docstring(_) => "docstring",
                Block::Comments(_) => "comments",
            })
            .collect()
    }

    #[test]
    fn test_rule_with_children() {
        let blocks = build("rule a:\n    input: \"x\"\n    threads: 2\n    shell: \"cmd\"\n")
            .unwrap();
        assert_eq!(kinds(&blocks), vec!["structural"]);
        let Block::StructuralKeyword(rule) = &blocks[0] else {
            panic!("expected rule");
        };
        assert_eq!(rule.name.as_ref().unwrap().text, "a");
        assert_eq!(kinds(&rule.children), vec!["list", "inline", "expression"]);
        assert!(rule.children.iter().all(|c| c.indent_level() == 1));
    }

    #[test]
    fn test_blocks_reference_scanner_tokens() {
        let source = "rule a:\n    \"\"\"Doc\"\"\"\n    input: \"x\", y=f(1)  # note\n    threads: 2\n    shell: \"cmd\"\n        \"more\"\n";
        let tokens = tokenize(source).unwrap();
        let blocks = parse(source, &tokens, &KeywordTable::snakemake()).unwrap();
        let range = tokens.as_ptr_range();
        let owned = |t: &Token| range.contains(&std::ptr::from_ref(t));

        let Block::StructuralKeyword(rule) = &blocks[0] else {
            panic!("expected rule");
        };
        assert!(rule.name.is_some_and(owned));
        let mut seen = 0;
        for child in &rule.children {
            let borrowed: Vec<&Token> = match child {
                Block::Docstring(doc) => doc.tokens.clone(),
                Block::ListKeyword(list) => {
                    list.params.iter().flat_map(|p| p.value.iter().copied()).collect()
                }
                Block::InlineKeyword(inline) => inline.value.clone(),
                Block::ExpressionKeyword(expr) => {
                    expr.chunks.iter().flat_map(|c| c.tokens.iter().copied()).collect()
                }
                other => panic!("unexpected child {other:?}"),
            };
            assert!(!borrowed.is_empty());
            assert!(borrowed.iter().all(|&t| owned(t)));
            seen += borrowed.len();
        }
        // docstring, "x", f ( 1 ), 2, two strings
        assert_eq!(seen, 1 + 1 + 4 + 1 + 2);
    }

    #[test]
    fn test_generic_code_between_keywords() {
        let blocks = build("x = 1\ny = 2\ninclude: \"a.smk\"\nz = 3\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["generic", "inline", "generic"]);
        let Block::GenericCode(code) = &blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.code, "x = 1\ny = 2");
    }

    #[test]
    fn test_keyword_inside_lambda_is_not_a_keyword() {
        let blocks = build(
            "rule a:\n    resources:\n        mem_mb=lambda wildcards, input: 1000,\n",
        )
        .unwrap();
        let Block::StructuralKeyword(rule) = &blocks[0] else {
            panic!("expected rule");
        };
        let Block::ListKeyword(list) = &rule.children[0] else {
            panic!("expected list");
        };
        assert_eq!(list.params.len(), 1);
        assert_eq!(list.params[0].name.as_deref(), Some("mem_mb"));
    }

    #[test]
    fn test_nested_keywords_split_host_code() {
        let blocks = build(
            "if config:\n    rule a:\n        input: \"x\"\nelse:\n    y = 2\n",
        )
        .unwrap();
        assert_eq!(kinds(&blocks), vec!["generic", "structural", "generic"]);
        let Block::GenericCode(header) = &blocks[0] else {
            panic!("expected code");
        };
        assert!(header.opens_suite);
        assert_eq!(header.code, "if config:");
        assert_eq!(blocks[1].indent_level(), 1);
        let Block::GenericCode(tail) = &blocks[2] else {
            panic!("expected code");
        };
        assert_eq!(tail.continues_clause.as_deref(), Some("else"));
        assert_eq!(tail.code, "else:\n    y = 2");
    }

    #[test]
    fn test_suite_without_keywords_stays_in_span() {
        let blocks = build("def f(x):\n    return x\n\n\nrule a:\n    threads: 1\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["generic", "structural"]);
        let Block::GenericCode(code) = &blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.code, "def f(x):\n    return x");
    }

    #[test]
    fn test_header_comments_bind_to_keyword() {
        let blocks = build("# first\n# second\nrule a:\n    threads: 1\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["structural"]);
        assert_eq!(blocks[0].header_comments().len(), 2);
    }

    #[test]
    fn test_blank_line_unbinds_comment() {
        let blocks = build("# standalone\n\nrule a:\n    threads: 1\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["comments", "structural"]);
        assert!(blocks[1].header_comments().is_empty());
    }

    #[test]
    fn test_comment_after_last_keyword_is_standalone() {
        let blocks = build("include: \"a\"\n# A comment\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["inline", "comments"]);
    }

    #[test]
    fn test_comment_left_of_suite_belongs_outside() {
        let blocks =
            build("rule a:\n    threads: 1\n# about b\nrule b:\n    threads: 2\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["structural", "structural"]);
        assert_eq!(blocks[1].header_comments()[0].text, "# about b");
        let Block::StructuralKeyword(rule) = &blocks[0] else {
            panic!("expected rule");
        };
        assert_eq!(rule.children.len(), 1);
    }

    #[test]
    fn test_comments_inside_python_stay_in_span() {
        let blocks = build("# lead\nx = 1\n# between\ny = 2\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["generic"]);
        let Block::GenericCode(code) = &blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.code, "# lead\nx = 1\n# between\ny = 2");
    }

    #[test]
    fn test_docstring_and_run_block() {
        let blocks = build(
            "rule a:\n    \"\"\"Doc\"\"\"\n    run:\n        if x:\n            print(x)\n",
        )
        .unwrap();
        let Block::StructuralKeyword(rule) = &blocks[0] else {
            panic!("expected rule");
        };
        assert_eq!(kinds(&rule.children), vec!["docstring", "block-body"]);
        let Block::BlockBody(run) = &rule.children[1] else {
            panic!("expected run");
        };
        assert_eq!(run.body.code, "if x:\n    print(x)");
        assert_eq!(run.body.indent_level, 2);
    }

    #[test]
    fn test_keyword_trailing_comment() {
        let blocks = build("rule a: # A comment \n    threads: 4\n").unwrap();
        assert_eq!(
            blocks[0]
                .header()
                .and_then(|h| h.trailing_comment.as_ref())
                .map(|c| c.text.as_str()),
            Some("# A comment")
        );
    }

    #[test]
    fn test_inline_value_on_next_line() {
        let blocks = build("configfile: \n    \"foo.yaml\"\n").unwrap();
        let Block::InlineKeyword(inline) = &blocks[0] else {
            panic!("expected inline");
        };
        assert_eq!(inline.value.len(), 1);
        assert_eq!(inline.value[0].text, "\"foo.yaml\"");
    }

    #[test]
    fn test_code_inside_rule_is_parse_error() {
        let err = build("rule a:\n    x = 1\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
        assert_eq!(err.location(), Some((2, 4)));
    }

    #[test]
    fn test_rule_without_body_is_parse_error() {
        let err = build("rule a:\ninclude: \"x\"\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn test_empty_inline_is_parse_error() {
        let err = build("rule a:\n    threads:\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Parse);
    }

    #[test]
    fn test_empty_list_is_allowed() {
        let blocks = build("rule a:\n    input:\n    threads: 1\n").unwrap();
        let Block::StructuralKeyword(rule) = &blocks[0] else {
            panic!("expected rule");
        };
        let Block::ListKeyword(list) = &rule.children[0] else {
            panic!("expected list");
        };
        assert!(list.params.is_empty());
    }

    #[test]
    fn test_multiline_string_lines_are_not_dedented() {
        let source = "if x:\n    y = \"\"\"\n  keep\n\"\"\"\n    rule a:\n        threads: 1\n";
        let blocks = build(source).unwrap();
        let Block::GenericCode(code) = &blocks[0] else {
            panic!("expected code");
        };
        assert_eq!(code.code, "if x:");
        let Block::GenericCode(inner) = &blocks[1] else {
            panic!("expected code");
        };
        assert_eq!(inner.code, "y = \"\"\"\n  keep\n\"\"\"");
    }

    #[test]
    fn test_indented_first_line_is_shifted_to_column_zero() {
        let blocks = build("    rule a:\n        wrapper:\n            \"a\"\n").unwrap();
        assert_eq!(kinds(&blocks), vec!["structural"]);
        assert_eq!(blocks[0].indent_level(), 0);
    }
}
