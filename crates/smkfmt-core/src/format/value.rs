//! Value rendering
//!
//! Turns the tokens of a parameter, chunk or inline value into text:
//! whitespace between tokens is rebuilt from scratch, string literals are
//! normalized, and values that do not fit are split at their last top-level
//! bracket pair in the style of the host language's standard formatter.

use super::printer::display_width;
use super::strings::format_string;
use crate::syntax::block::Comment;
use crate::syntax::params::split_top_level;
use crate::syntax::token::{Token, TokenKind};
use crate::syntax::trivia::{normalize_comment, trailing_suffix};

/// Host-language keywords that never call or subscript what follows them
const WORD_OPERATORS: &[&str] = &[
    "and", "as", "assert", "async", "await", "del", "elif", "else", "for", "from", "if", "import",
    "in", "is", "lambda", "not", "or", "return", "with", "yield",
];

/// One rendered line at an absolute column
///
/// `text` holds more than one physical line only when it contains a
/// multi-line string; those lines carry their own indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub column: usize,
    pub text: String,
}

impl Line {
    fn new(column: usize, text: impl Into<String>) -> Self {
        Self {
            column,
            text: text.into(),
        }
    }

    /// The line with its indentation
    pub fn render(&self) -> String {
        format!("{}{}", " ".repeat(self.column), self.text)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValueLayout {
    pub line_width: usize,
    pub indent_size: usize,
    /// A comma before a closing bracket forces that bracket to explode
    pub magic_trailing_comma: bool,
}

impl ValueLayout {
    pub fn new(line_width: usize, indent_size: usize) -> Self {
        Self {
            line_width,
            indent_size,
            magic_trailing_comma: true,
        }
    }

    /// Keep values on one line unless comments inside them forbid it
    pub fn single_line(self) -> Self {
        Self {
            line_width: usize::MAX,
            magic_trailing_comma: false,
            ..self
        }
    }

    /// Lay out `prefix + value + suffix` starting at `column`
    ///
    /// `enclosing` is the bracket the value sits in, if any; it decides
    /// whether a top-level `=` is a keyword argument and a top-level `:` a
    /// slice.
    pub fn layout(
        &self,
        tokens: &[&Token],
        column: usize,
        prefix: &str,
        suffix: &str,
        enclosing: Option<&str>,
    ) -> Vec<Line> {
        let has_comments = tokens.iter().any(|t| t.is_comment());
        let flat = format!(
            "{prefix}{}{suffix}",
            join_tokens(tokens, column, enclosing, self.indent_size)
        );
        let magic = self.magic_trailing_comma && has_magic_trailing_comma(tokens);
        if !has_comments && !magic && self.fits(column, &flat) {
            return vec![Line::new(column, flat)];
        }

        let Some((open, close)) = split_point(tokens) else {
            return vec![Line::new(column, flat)];
        };
        let body = &tokens[open + 1..close];
        if body.is_empty() {
            return vec![Line::new(column, flat)];
        }

        let opener = tokens[open].text.as_str();
        let head = format!(
            "{prefix}{}",
            join_tokens(&tokens[..=open], column, enclosing, self.indent_size)
        );
        let tail = format!(
            "{}{suffix}",
            join_tokens(&tokens[close..], column, enclosing, self.indent_size)
        );
        let inner = column + self.indent_size;
        let split = split_top_level(body);
        let body_comments = split.has_comments();
        let body_magic = self.magic_trailing_comma && split.magic_trailing_comma;

        if !is_collection(tokens, open) && !body_comments && !body_magic {
            let hugged = join_tokens(body, inner, Some(opener), self.indent_size);
            if self.fits(inner, &hugged) && self.fits(column, &head) {
                return vec![
                    Line::new(column, head),
                    Line::new(inner, hugged),
                    Line::new(column, tail),
                ];
            }
        }

        let mut items = split.items;
        let mut head_line = Line::new(column, head);
        if let Some(first) = items.first_mut()
            && first
                .leading_comments
                .first()
                .is_some_and(|c| c.line == tokens[open].line)
        {
            let comment = first.leading_comments.remove(0);
            head_line.text.push_str(&trailing_suffix(&comment));
        }

        let add_commas = items.len() > 1 || split.magic_trailing_comma;
        let item_suffix = if add_commas { "," } else { "" };
        let mut lines = vec![head_line];
        for item in &items {
            for comment in &item.leading_comments {
                lines.push(Line::new(inner, normalize_comment(&comment.text)));
            }
            let mut item_lines = self.layout(&item.tokens, inner, "", item_suffix, Some(opener));
            if let (Some(comment), Some(last)) = (&item.trailing_comment, item_lines.last_mut()) {
                last.text.push_str(&trailing_suffix(comment));
            }
            lines.extend(item_lines);
        }
        for comment in &split.dangling_comments {
            lines.push(Line::new(inner, normalize_comment(&comment.text)));
        }
        lines.push(Line::new(column, tail));
        lines
    }

    /// Check the first physical line at `column`, and the last one of a
    /// multi-line string at its own position
    fn fits(&self, column: usize, text: &str) -> bool {
        let mut segments = text.split('\n');
        let first_fits = segments
            .next()
            .is_none_or(|first| column + display_width(first) <= self.line_width);
        first_fits
            && segments
                .last()
                .is_none_or(|last| display_width(last) <= self.line_width)
    }
}

/// Render tokens on one line with normalized spacing
pub fn join_tokens(
    tokens: &[&Token],
    column: usize,
    enclosing: Option<&str>,
    indent_size: usize,
) -> String {
    let mut out = String::new();
    let mut brackets: Vec<&str> = enclosing.into_iter().collect();
    let base_depth = brackets.len();
    let mut lambdas: Vec<usize> = Vec::new();
    let mut prev: Option<&Token> = None;
    let mut prev_unary = false;
    let mut prev_slice_colon = false;
    let mut hug_next = false;

    for (i, &token) in tokens.iter().enumerate() {
        let innermost = brackets.last().copied();
        let unary = is_unary(token, prev);
        let power_hug = token.is_op("**")
            && !unary
            && prev.is_some_and(is_simple_operand)
            && tokens.get(i + 1).is_some_and(|t| is_simple_operand(t))
            && !tokens
                .get(i + 2)
                .is_some_and(|t| t.is_op("(") || t.is_op("[") || t.is_op("."));
        let kwarg_equals = innermost == Some("(") || !lambdas.is_empty();

        let space = match prev {
            None => false,
            Some(_) if hug_next || power_hug => false,
            Some(p) => needs_space(
                p,
                token,
                prev_unary,
                prev_slice_colon,
                kwarg_equals,
            ),
        };
        if space {
            out.push(' ');
        }

        if token.is_comment() {
            out.push_str(&trailing_suffix(&Comment::from_token(token, false)));
            out.push('\n');
            out.push_str(&" ".repeat(column + indent_size));
            prev = None;
            continue;
        }

        match token.kind {
            TokenKind::String => out.push_str(&format_string(&token.text, column, indent_size)),
            _ => out.push_str(&token.text),
        }

        prev_slice_colon = false;
        if token.is_name("lambda") {
            lambdas.push(brackets.len());
        } else if token.is_op(":") {
            if lambdas.last() == Some(&brackets.len()) {
                lambdas.pop();
            } else {
                prev_slice_colon = innermost == Some("[");
            }
        } else if token.is_open_bracket() {
            brackets.push(token.text.as_str());
        } else if token.is_close_bracket() && brackets.len() > base_depth {
            brackets.pop();
            while lambdas.last().is_some_and(|&d| d > brackets.len()) {
                lambdas.pop();
            }
        }

        hug_next = power_hug;
        prev_unary = unary;
        prev = Some(token);
    }
    out
}

fn needs_space(
    prev: &Token,
    next: &Token,
    prev_unary: bool,
    prev_slice_colon: bool,
    kwarg_equals: bool,
) -> bool {
    if next.is_close_bracket() || next.is_op(",") || next.is_op(";") || next.is_op(":") {
        return false;
    }
    if prev.is_open_bracket() || prev.is_op(".") || next.is_op(".") {
        return false;
    }
    if prev.is_op(":") {
        return !prev_slice_colon;
    }
    if prev_unary {
        return false;
    }
    if (prev.is_op("=") || next.is_op("=")) && kwarg_equals {
        return false;
    }
    if next.is_op("(") || next.is_op("[") {
        return !is_callable(prev);
    }
    true
}

/// Token that can be called or subscripted by a directly following bracket
fn is_callable(token: &Token) -> bool {
    match token.kind {
        TokenKind::Name | TokenKind::KeywordCandidate => {
            !WORD_OPERATORS.contains(&token.text.as_str())
        }
        TokenKind::String => true,
        _ => token.is_close_bracket(),
    }
}

/// `-`, `+`, `~`, `*` and `**` in prefix position
fn is_unary(token: &Token, prev: Option<&Token>) -> bool {
    if !matches!(token.text.as_str(), "-" | "+" | "~" | "*" | "**") || token.kind != TokenKind::Op {
        return false;
    }
    match prev {
        None => true,
        Some(p) if p.kind == TokenKind::Op => !p.is_close_bracket(),
        Some(p) if p.kind.is_name() => WORD_OPERATORS.contains(&p.text.as_str()),
        Some(_) => false,
    }
}

/// Operand that `**` hugs: a plain name or number
fn is_simple_operand(token: &Token) -> bool {
    match token.kind {
        TokenKind::Number => true,
        TokenKind::Name | TokenKind::KeywordCandidate => {
            !WORD_OPERATORS.contains(&token.text.as_str())
        }
        _ => false,
    }
}

/// A bracket pair that opens a literal rather than a call or subscript
fn is_collection(tokens: &[&Token], open: usize) -> bool {
    open == 0 || !is_callable(tokens[open - 1])
}

/// Any bracket pair whose last item is followed by a comma
fn has_magic_trailing_comma(tokens: &[&Token]) -> bool {
    tokens
        .windows(2)
        .any(|pair| pair[0].is_op(",") && pair[1].is_close_bracket())
}

/// The bracket pair to split at: the last top-level pair, or the last one
/// holding a comment when there are comments
fn split_point(tokens: &[&Token]) -> Option<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut depth = 0usize;
    let mut open = 0;
    for (i, &token) in tokens.iter().enumerate() {
        if token.is_open_bracket() {
            if depth == 0 {
                open = i;
            }
            depth += 1;
        } else if token.is_close_bracket() && depth > 0 {
            depth -= 1;
            if depth == 0 {
                pairs.push((open, i));
            }
        }
    }
    pairs
        .iter()
        .rev()
        .find(|(open, close)| tokens[*open..*close].iter().any(|t| t.is_comment()))
        .or_else(|| pairs.last())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .filter(|t| {
                !matches!(
                    t.kind,
                    TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::End
                )
            })
            .collect()
    }

    fn refs(tokens: &[Token]) -> Vec<&Token> {
        tokens.iter().collect()
    }

    fn join(source: &str) -> String {
        join_tokens(&refs(&tokens(source)), 0, None, 4)
    }

    fn render(lines: &[Line]) -> String {
        lines
            .iter()
            .map(Line::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_spacing_normalization() {
        assert_eq!(
            join("expand( \"{f}/{p}\" ,f = [1,2], p = ['1','2'] )"),
            "expand(\"{f}/{p}\", f=[1, 2], p=[\"1\", \"2\"])"
        );
        assert_eq!(join("a+b*c"), "a + b * c");
        assert_eq!(join("x[1:2] , d['k']"), "x[1:2], d[\"k\"]");
        assert_eq!(join("{ 'a' :1 }"), "{\"a\": 1}");
        assert_eq!(join("os.path.join( a , b )"), "os.path.join(a, b)");
    }

    #[test]
    fn test_lambda_and_unary_spacing() {
        assert_eq!(
            join("lambda wildcards,attempt:attempt*1000"),
            "lambda wildcards, attempt: attempt * 1000"
        );
        assert_eq!(join("f(* args, ** kw)"), "f(*args, **kw)");
        assert_eq!(join("-1"), "-1");
        assert_eq!(join("a - -1"), "a - -1");
        assert_eq!(join("x if not y else -z"), "x if not y else -z");
        assert_eq!(join("lambda w, x=1: x"), "lambda w, x=1: x");
        assert_eq!(join("x ** 2"), "x**2");
        assert_eq!(join("f(x) ** 2"), "f(x) ** 2");
    }

    #[test]
    fn test_comparisons_keep_spaces() {
        assert_eq!(join("f(a==b, c = d)"), "f(a == b, c=d)");
        assert_eq!(join("a in (1, 2)"), "a in (1, 2)");
    }

    #[test]
    fn test_fitting_value_stays_flat() {
        let layout = ValueLayout::new(88, 4);
        let lines = layout.layout(&refs(&tokens("[1, 2, 3]")), 8, "x=", ",", Some("("));
        assert_eq!(render(&lines), "        x=[1, 2, 3],");
    }

    #[test]
    fn test_collection_explodes_one_item_per_line() {
        let layout = ValueLayout::new(30, 4);
        let lines = layout.layout(
            &refs(&tokens("[1, 2, 3, 4, 5]")),
            8,
            "list_of_lots_of_things=",
            ",",
            Some("("),
        );
        assert_eq!(
            render(&lines),
            "        list_of_lots_of_things=[\n            1,\n            2,\n            3,\n            4,\n            5,\n        ],"
        );
    }

    #[test]
    fn test_call_arguments_hug_when_they_fit() {
        let layout = ValueLayout::new(40, 4);
        let lines = layout.layout(
            &refs(&tokens("some_function_name(argument_one, argument_two)")),
            0,
            "",
            "",
            None,
        );
        assert_eq!(
            render(&lines),
            "some_function_name(\n    argument_one, argument_two\n)"
        );
    }

    #[test]
    fn test_comments_force_explode() {
        let layout = ValueLayout::new(88, 4);
        let lines = layout.layout(
            &refs(&tokens("[\n    elem1, #elem1,\n    elem2,#elem2,\n]")),
            8,
            "list_of_things=",
            ",",
            Some("("),
        );
        assert_eq!(
            render(&lines),
            "        list_of_things=[\n            elem1,  # elem1,\n            elem2,  # elem2,\n        ],"
        );
    }

    #[test]
    fn test_magic_trailing_comma_explodes() {
        let layout = ValueLayout::new(88, 4);
        let lines = layout.layout(&refs(&tokens("dict(a=1,)")), 0, "", "", None);
        assert_eq!(render(&lines), "dict(\n    a=1,\n)");
        let single = layout
            .single_line()
            .layout(&refs(&tokens("dict(a=1,)")), 0, "", "", None);
        assert_eq!(render(&single), "dict(a=1,)");
    }

    #[test]
    fn test_multiline_string_is_reindented_to_line_column() {
        let layout = ValueLayout::new(88, 4);
        let lines = layout.layout(&refs(&tokens("'''\n  a\n'''")), 8, "", "", None);
        assert_eq!(render(&lines), "        \"\"\"\n        a\n        \"\"\"");
    }
}
