//! Indentation-aware scanner for Snakefiles
//!
//! Turns raw text into a flat token stream. The scanner follows the host
//! language's lexical rules closely enough to find block boundaries:
//!
//! - bracket depth is tracked so newlines inside `()`, `[]` and `{}` are
//!   ignored, and commas/colons inside them stay ordinary operators
//! - string literals of every flavour (single, double, triple-quoted, with any
//!   `r`/`f`/`b`/`u` prefix) are scanned as single tokens, escapes included
//! - indentation changes at bracket depth zero become explicit INDENT/DEDENT
//!   tokens using the off-side rule
//!
//! Blank lines and comment-only lines never produce NEWLINE, INDENT or DEDENT;
//! comments are still emitted so that later stages can bind them.

use super::token::{Span, StringStyle, Token, TokenKind};
use crate::{Result, SmkfmtError};

/// Tab stops for indentation measurement
const TAB_SIZE: usize = 8;

/// Operators, longest first so that the first match wins
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "->", ":=", "**", "//", "<<", ">>", "<=", ">=", "==", "!=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "@=", "+", "-", "*", "/", "%", "@", "&", "|",
    "^", "~", "<", ">", "=", ".", ",", ":", ";", "!",
];

/// String prefixes accepted before a quote (compared case-insensitively)
const STRING_PREFIXES: &[&str] = &["r", "u", "f", "b", "br", "rb", "fr", "rf"];

/// Scan `input` into tokens, ending with a single [`TokenKind::End`]
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let tokens = Scanner::new(input).run()?;
    tracing::trace!("scanned {} tokens", tokens.len());
    Ok(tokens)
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
    tokens: Vec<Token>,
    /// Open brackets with the line/column where they were opened
    brackets: Vec<(char, usize, usize)>,
    /// Indentation stack as (width with tab stops of 8, width with tabs counted as 1)
    indents: Vec<(usize, usize)>,
    at_line_start: bool,
    first_of_line: bool,
    line_has_code: bool,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            line_start: 0,
            tokens: Vec::new(),
            brackets: Vec::new(),
            indents: vec![(0, 0)],
            at_line_start: true,
            first_of_line: false,
            line_has_code: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while self.pos < self.input.len() {
            if self.at_line_start {
                self.at_line_start = false;
                if self.brackets.is_empty() && !self.start_line()? {
                    continue;
                }
            }

            let Some((current, size)) = next_char(self.input, self.pos) else {
                break;
            };
            let start = self.pos;

            match current {
                ' ' | '\t' | '\x0c' => self.pos += size,
                '\\' => {
                    let after = start + size;
                    match next_char(self.input, after) {
                        Some(('\n', _)) | Some(('\r', _)) => {
                            self.pos = newline_end(self.input, after);
                            self.new_physical_line();
                        }
                        _ => {
                            return Err(self.error_at(start, "unexpected character after '\\'"));
                        }
                    }
                }
                '\n' | '\r' => {
                    if self.brackets.is_empty() && self.line_has_code {
                        self.push(TokenKind::Newline, start, start + size);
                        self.line_has_code = false;
                    }
                    self.pos = newline_end(self.input, start);
                    self.new_physical_line();
                    if self.brackets.is_empty() {
                        self.at_line_start = true;
                    }
                }
                '#' => {
                    let end = line_end(self.input, start);
                    self.push(TokenKind::Comment, start, end);
                    self.pos = end;
                }
                '"' | '\'' => self.lex_string(start, 0)?,
                c if is_ident_start(c) => {
                    let end = ident_end(self.input, start);
                    let word = &self.input[start..end];
                    let is_prefix = STRING_PREFIXES
                        .iter()
                        .any(|p| p.eq_ignore_ascii_case(word));
                    if is_prefix && matches!(next_char(self.input, end), Some(('"' | '\'', _))) {
                        self.lex_string(start, end - start)?;
                    } else {
                        self.push(TokenKind::Name, start, end);
                        self.pos = end;
                    }
                }
                c if c.is_ascii_digit() => self.lex_number(start),
                '.' if matches!(next_char(self.input, start + 1), Some((d, _)) if d.is_ascii_digit()) => {
                    self.lex_number(start)
                }
                '(' | '[' | '{' => {
                    let column = self.column_of(start);
                    self.brackets.push((current, self.line, column));
                    self.push(TokenKind::Op, start, start + size);
                    self.pos = start + size;
                }
                ')' | ']' | '}' => {
                    let expected = match current {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match self.brackets.pop() {
                        Some((open, _, _)) if open == expected => {}
                        Some((open, line, column)) => {
                            return Err(self.error_at(
                                start,
                                format!(
                                    "closing '{current}' does not match '{open}' opened at line {line}, column {column}"
                                ),
                            ));
                        }
                        None => {
                            return Err(self.error_at(start, format!("unmatched '{current}'")));
                        }
                    }
                    self.push(TokenKind::Op, start, start + size);
                    self.pos = start + size;
                }
                _ => {
                    let rest = &self.input[start..];
                    match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
                        Some(op) => {
                            self.push(TokenKind::Op, start, start + op.len());
                            self.pos = start + op.len();
                        }
                        None => {
                            return Err(
                                self.error_at(start, format!("unexpected character {current:?}"))
                            );
                        }
                    }
                }
            }
        }

        self.finish()
    }

    /// Handle the start of a physical line outside brackets
    ///
    /// Returns `false` when the line held nothing but whitespace or a comment
    /// (and has been consumed), `true` when code follows at `self.pos`.
    fn start_line(&mut self) -> Result<bool> {
        let ws_end = self.input[self.pos..]
            .find(|c: char| !matches!(c, ' ' | '\t' | '\x0c'))
            .map_or(self.input.len(), |offset| self.pos + offset);

        if ws_end >= self.input.len() {
            self.pos = ws_end;
            return Ok(false);
        }

        match next_char(self.input, ws_end) {
            Some(('\n' | '\r', _)) => {
                self.pos = newline_end(self.input, ws_end);
                self.new_physical_line();
                self.at_line_start = true;
                Ok(false)
            }
            Some(('#', _)) => {
                let end = line_end(self.input, ws_end);
                self.push(TokenKind::Comment, ws_end, end);
                self.pos = end;
                Ok(false)
            }
            _ => {
                let (wide, narrow) = indent_widths(&self.input[self.pos..ws_end]);
                self.indent_to(wide, narrow, ws_end)?;
                self.pos = ws_end;
                self.first_of_line = true;
                Ok(true)
            }
        }
    }

    /// Apply the off-side rule for a code line starting at `at`
    fn indent_to(&mut self, wide: usize, narrow: usize, at: usize) -> Result<()> {
        let (top_wide, top_narrow) = self.indents.last().copied().unwrap_or((0, 0));

        if wide > top_wide {
            if narrow <= top_narrow {
                return Err(self.error_at(at, "inconsistent use of tabs and spaces in indentation"));
            }
            self.indents.push((wide, narrow));
            self.push(TokenKind::Indent, self.line_start, at);
            return Ok(());
        }

        while let Some(&(level, _)) = self.indents.last() {
            if wide >= level {
                break;
            }
            self.indents.pop();
            self.push(TokenKind::Dedent, at, at);
        }

        let (level_wide, level_narrow) = self.indents.last().copied().unwrap_or((0, 0));
        if wide != level_wide {
            return Err(self.error_at(
                at,
                "unindent does not match any outer indentation level",
            ));
        }
        if narrow != level_narrow {
            return Err(self.error_at(at, "inconsistent use of tabs and spaces in indentation"));
        }
        Ok(())
    }

    /// Scan a string literal whose prefix (possibly empty) starts at `start`
    fn lex_string(&mut self, start: usize, prefix_len: usize) -> Result<()> {
        let quote_at = start + prefix_len;
        let bytes = self.input.as_bytes();
        let quote = bytes[quote_at];
        let triple = bytes.get(quote_at + 1) == Some(&quote) && bytes.get(quote_at + 2) == Some(&quote);

        let mut i = quote_at + if triple { 3 } else { 1 };
        let end = loop {
            let Some(&b) = bytes.get(i) else {
                return Err(self.error_at(start, "unterminated string literal"));
            };
            match b {
                b'\\' => {
                    // An escaped CRLF must be skipped as a unit
                    i += 1;
                    if bytes.get(i) == Some(&b'\r') && bytes.get(i + 1) == Some(&b'\n') {
                        i += 1;
                    }
                    i += 1;
                }
                b'\n' | b'\r' if !triple => {
                    return Err(self.error_at(start, "unterminated string literal"));
                }
                _ if b == quote => {
                    if !triple {
                        break i + 1;
                    }
                    if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                        break i + 3;
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        };

        let prefix = self.input[start..quote_at].to_ascii_lowercase();
        let style = StringStyle {
            quote: quote as char,
            triple,
            raw: prefix.contains('r'),
            formatted: prefix.contains('f'),
            bytes: prefix.contains('b'),
            prefix_len,
        };

        self.push(TokenKind::String, start, end);
        let text = &self.input[start..end];
        let newlines = text.matches('\n').count();
        if let Some(token) = self.tokens.last_mut() {
            token.string_style = Some(style);
            token.end_line = token.line + newlines;
        }
        if newlines > 0 {
            self.line += newlines;
            if let Some(offset) = text.rfind('\n') {
                self.line_start = start + offset + 1;
            }
        }
        self.pos = end;
        Ok(())
    }

    fn lex_number(&mut self, start: usize) {
        let bytes = self.input.as_bytes();
        let is_hex = bytes.get(start) == Some(&b'0')
            && matches!(bytes.get(start + 1), Some(b'x' | b'X'));
        let mut i = start;
        while let Some(&b) = bytes.get(i) {
            let exponent_sign = (b == b'+' || b == b'-')
                && !is_hex
                && i > start
                && matches!(bytes[i - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }
        self.push(TokenKind::Number, start, i);
        self.pos = i;
    }

    fn finish(mut self) -> Result<Vec<Token>> {
        if let Some(&(open, line, column)) = self.brackets.last() {
            return Err(SmkfmtError::internal_error(format!(
                "bracket '{open}' opened at line {line}, column {column} is never closed"
            )));
        }

        let end = self.input.len();
        if self.line_has_code {
            self.push(TokenKind::Newline, end, end);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end, end);
        }
        self.push(TokenKind::End, end, end);
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let kind = match kind {
            TokenKind::Name if self.first_of_line => TokenKind::KeywordCandidate,
            other => other,
        };
        if !kind.is_trivia() && kind != TokenKind::End {
            self.first_of_line = false;
            self.line_has_code = true;
        }
        let column = self.column_of(start);
        self.tokens.push(Token::new(
            kind,
            &self.input[start..end],
            self.line,
            column,
            span(start, end),
        ));
    }

    fn new_physical_line(&mut self) {
        self.line += 1;
        self.line_start = self.pos;
    }

    fn column_of(&self, offset: usize) -> usize {
        self.input[self.line_start.min(offset)..offset].chars().count()
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> SmkfmtError {
        SmkfmtError::lex_error(message, self.line, self.column_of(offset))
    }
}

/// Indentation width with tab stops of [`TAB_SIZE`], and with tabs counted as one column
fn indent_widths(whitespace: &str) -> (usize, usize) {
    let mut wide = 0;
    let mut narrow = 0;
    for c in whitespace.chars() {
        match c {
            '\t' => {
                wide = (wide / TAB_SIZE + 1) * TAB_SIZE;
                narrow += 1;
            }
            '\x0c' => {
                wide = 0;
                narrow = 0;
            }
            _ => {
                wide += 1;
                narrow += 1;
            }
        }
    }
    (wide, narrow)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn ident_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(|c: char| !(c == '_' || c.is_alphanumeric()))
        .map_or(input.len(), |offset| start + offset)
}

/// Offset of the next `\n`/`\r` at or after `start`, or end of input
fn line_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(['\n', '\r'])
        .map_or(input.len(), |offset| start + offset)
}

/// Offset just past the newline sequence starting at `start`
fn newline_end(input: &str, start: usize) -> usize {
    let bytes = input.as_bytes();
    match bytes.get(start) {
        Some(b'\r') if bytes.get(start + 1) == Some(&b'\n') => start + 2,
        Some(b'\r' | b'\n') => start + 1,
        _ => start,
    }
}

fn next_char(input: &str, pos: usize) -> Option<(char, usize)> {
    input.get(pos..)?.chars().next().map(|c| (c, c.len_utf8()))
}

fn span(start: usize, end: usize) -> Span {
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keyword_candidate_only_at_line_start() {
        let tokens = tokenize("rule a:\n    input: x\n").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::KeywordCandidate);
        assert_eq!(tokens[1].kind, TokenKind::Name);
        assert_eq!(tokens[1].text, "a");
        let input = tokens.iter().find(|t| t.text == "input").unwrap();
        assert_eq!(input.kind, TokenKind::KeywordCandidate);
        let x = tokens.iter().find(|t| t.text == "x").unwrap();
        assert_eq!(x.kind, TokenKind::Name);
    }

    #[test]
    fn test_indent_and_dedent() {
        use TokenKind::*;
        assert_eq!(
            kinds("if a:\n    b\nc\n"),
            vec![
                KeywordCandidate, Name, Op, Newline, Indent, KeywordCandidate, Newline, Dedent,
                KeywordCandidate, Newline, End
            ]
        );
    }

    #[test]
    fn test_newlines_inside_brackets_are_ignored() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = [\n    1,\n    2,\n]\n"),
            vec![KeywordCandidate, Op, Op, Number, Op, Number, Op, Op, Newline, End]
        );
    }

    #[test]
    fn test_blank_and_comment_lines_produce_no_layout_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("a\n\n    # indented comment\nb\n"),
            vec![KeywordCandidate, Newline, Comment, KeywordCandidate, Newline, End]
        );
    }

    #[test]
    fn test_trailing_comment_precedes_newline() {
        let tokens = tokenize("threads: 4  # cores\n").unwrap();
        let comment = tokens.iter().position(|t| t.is_comment()).unwrap();
        assert_eq!(tokens[comment].text, "# cores");
        assert_eq!(tokens[comment].column, 12);
        assert_eq!(tokens[comment + 1].kind, TokenKind::Newline);
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let tokens = tokenize("shell:\n    \"\"\"a\n  b\n    \"\"\"\nx\n").unwrap();
        let string = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.line, 2);
        assert_eq!(string.end_line, 4);
        assert!(string.is_multiline_string());
        let style = string.string_style.unwrap();
        assert!(style.triple);
        assert_eq!(style.quote, '"');
        let x = tokens.iter().find(|t| t.text == "x").unwrap();
        assert_eq!(x.line, 5);
    }

    #[test]
    fn test_string_prefixes() {
        let tokens = tokenize("x = rb'\\d' + f\"{a}\" + R'''r'''\n").unwrap();
        let styles: Vec<_> = tokens
            .iter()
            .filter_map(|t| t.string_style)
            .collect();
        assert_eq!(styles.len(), 3);
        assert!(styles[0].raw && styles[0].bytes && styles[0].prefix_len == 2);
        assert!(styles[1].formatted && !styles[1].raw);
        assert!(styles[2].raw && styles[2].triple && styles[2].quote == '\'');
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let tokens = tokenize("x = 'it\\'s'\n").unwrap();
        let string = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.text, "'it\\'s'");
    }

    #[test]
    fn test_multi_char_operators() {
        let tokens = tokenize("a == b != c ** d // e -> f\n").unwrap();
        let ops: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Op)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(ops, vec!["==", "!=", "**", "//", "->"]);
    }

    #[test]
    fn test_line_continuation_joins_lines() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = 1 + \\\n    2\n"),
            vec![KeywordCandidate, Op, Number, Op, Number, Newline, End]
        );
    }

    #[test]
    fn test_unterminated_string_is_lex_error() {
        let err = tokenize("x = \"abc\ny = 1\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Lex);
        assert_eq!(err.location(), Some((1, 4)));
    }

    #[test]
    fn test_unterminated_triple_string_is_lex_error() {
        let err = tokenize("x = '''abc\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Lex);
    }

    #[test]
    fn test_bad_dedent_is_lex_error() {
        let err = tokenize("if a:\n        b\n    c\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Lex);
        assert_eq!(err.location(), Some((3, 4)));
    }

    #[test]
    fn test_ambiguous_tabs_and_spaces() {
        let err = tokenize("if a:\n\tb\n        c\n").unwrap_err();
        assert!(err.to_string().contains("inconsistent use of tabs"));
    }

    #[test]
    fn test_unclosed_bracket_is_internal_error() {
        let err = tokenize("x = (1,\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Internal);
    }

    #[test]
    fn test_mismatched_bracket_is_lex_error() {
        let err = tokenize("x = (1]\n").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Lex);
    }

    #[test]
    fn test_dedents_emitted_at_end_of_input() {
        let tokens = tokenize("rule a:\n    threads: 1").unwrap();
        let tail: Vec<_> = tokens.iter().rev().take(3).map(|t| t.kind).collect();
        assert_eq!(
            tail,
            vec![TokenKind::End, TokenKind::Dedent, TokenKind::Newline]
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let tokens = tokenize("a\r\nb\r\n").unwrap();
        let b = tokens.iter().find(|t| t.text == "b").unwrap();
        assert_eq!(b.line, 2);
        assert_eq!(b.column, 0);
    }
}
