//! Parameter splitting
//!
//! Splits a keyword body (or the inside of a bracket pair) into its top-level
//! items. Commas only separate items at bracket depth zero and outside a
//! lambda's parameter list; string literals are single tokens already, so
//! commas inside them never show up here.
//!
//! Items hold references into the scanner's tokens.

use super::block::{Chunk, Comment, Parameter};
use super::token::Token;

/// One top-level item with the comments bound to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitItem<'t> {
    pub tokens: Vec<&'t Token>,
    pub leading_comments: Vec<Comment>,
    pub trailing_comment: Option<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Split<'t> {
    pub items: Vec<SplitItem<'t>>,
    /// Comments after the last item
    pub dangling_comments: Vec<Comment>,
    /// The last item is followed by a comma
    pub magic_trailing_comma: bool,
}

impl Split<'_> {
    pub fn has_comments(&self) -> bool {
        !self.dangling_comments.is_empty()
            || self.items.iter().any(|item| {
                item.trailing_comment.is_some()
                    || !item.leading_comments.is_empty()
                    || item.tokens.iter().any(|t| t.is_comment())
            })
    }
}

/// Split `tokens` (code and comment tokens in source order) at top-level commas
pub fn split_top_level<'t>(tokens: &[&'t Token]) -> Split<'t> {
    let mut split = Split::default();
    let mut current: Vec<&'t Token> = Vec::new();
    let mut leading: Vec<Comment> = Vec::new();
    let mut inside: Vec<Comment> = Vec::new();
    let mut trailing: Option<Comment> = None;
    let mut depth = 0usize;
    let mut lambdas: Vec<usize> = Vec::new();
    let mut last_line: Option<usize> = None;
    let mut comma_line: Option<usize> = None;
    let mut last_was_comma = false;

    for &token in tokens {
        let blank_before = last_line.is_some_and(|line| token.line > line + 1);
        last_line = Some(token.end_line);

        if token.is_comment() {
            let comment = Comment::from_token(token, blank_before);
            if depth > 0 {
                current.push(token);
            } else if current.last().is_some_and(|t| t.end_line == token.line) && trailing.is_none() {
                trailing = Some(comment);
            } else if current.is_empty()
                && comma_line == Some(token.line)
                && split
                    .items
                    .last()
                    .is_some_and(|item| item.trailing_comment.is_none())
            {
                if let Some(item) = split.items.last_mut() {
                    item.trailing_comment = Some(comment);
                }
            } else if current.is_empty() {
                leading.push(comment);
            } else {
                inside.push(comment);
            }
            continue;
        }

        if depth == 0 && token.is_op(",") && lambdas.last() != Some(&0) {
            if !current.is_empty() {
                split.items.push(SplitItem {
                    tokens: std::mem::take(&mut current),
                    leading_comments: std::mem::take(&mut leading),
                    trailing_comment: trailing.take(),
                });
            }
            leading.append(&mut inside);
            comma_line = Some(token.line);
            last_was_comma = true;
            continue;
        }

        if token.is_name("lambda") {
            lambdas.push(depth);
        } else if token.is_op(":") && lambdas.last() == Some(&depth) {
            lambdas.pop();
        } else if token.is_open_bracket() {
            depth += 1;
        } else if token.is_close_bracket() {
            depth = depth.saturating_sub(1);
            while lambdas.last().is_some_and(|&d| d > depth) {
                lambdas.pop();
            }
        }
        current.push(token);
        last_was_comma = false;
    }

    split.magic_trailing_comma = last_was_comma && !split.items.is_empty();
    if !current.is_empty() {
        split.items.push(SplitItem {
            tokens: current,
            leading_comments: leading,
            trailing_comment: trailing,
        });
        split.dangling_comments = inside;
    } else {
        leading.append(&mut inside);
        split.dangling_comments = leading;
    }
    split
}

/// Split a list keyword body into parameters
///
/// Returns the parameters in source order plus the dangling comments.
pub fn split_parameters<'t>(tokens: &[&'t Token]) -> (Vec<Parameter<'t>>, Vec<Comment>) {
    let split = split_top_level(tokens);
    let params = split
        .items
        .into_iter()
        .map(|item| {
            let named = item.tokens.len() > 2
                && item.tokens[0].kind.is_name()
                && item.tokens[1].is_op("=");
            let (name, value, is_positional) = if named {
                (Some(item.tokens[0].text.clone()), item.tokens[2..].to_vec(), false)
            } else {
                let unpacked = item.tokens[0].is_op("**");
                (None, item.tokens, !unpacked)
            };
            Parameter {
                name,
                value,
                trailing_comment: item.trailing_comment,
                leading_comments: item.leading_comments,
                is_positional,
            }
        })
        .collect();
    (params, split.dangling_comments)
}

/// Stable reordering: positional parameters first, then named ones
pub fn positional_first<'p, 't>(params: &'p [Parameter<'t>]) -> Vec<&'p Parameter<'t>> {
    let (mut positional, named): (Vec<_>, Vec<_>) = params.iter().partition(|p| p.is_positional);
    positional.extend(named);
    positional
}

/// Turn the logical lines of an expression body into chunks
///
/// A line holding a single comment token is a standalone comment; it leads the
/// next chunk, or dangles after the last one.
pub fn split_chunks<'t>(lines: &[Vec<&'t Token>]) -> (Vec<Chunk<'t>>, Vec<Comment>) {
    let mut chunks = Vec::new();
    let mut leading = Vec::new();
    let mut last_line: Option<usize> = None;

    for line in lines {
        let Some(first) = line.first() else {
            continue;
        };
        let blank_before = last_line.is_some_and(|l| first.line > l + 1);
        last_line = line.last().map(|t| t.end_line);

        if line.len() == 1 && first.is_comment() {
            leading.push(Comment::from_token(first, blank_before));
            continue;
        }

        let mut tokens = line.clone();
        let trailing_comment = match tokens.last() {
            Some(last) if last.is_comment() => tokens.pop().map(|t| Comment::from_token(t, false)),
            _ => None,
        };
        chunks.push(Chunk {
            tokens,
            trailing_comment,
            leading_comments: std::mem::take(&mut leading),
        });
    }

    (chunks, leading)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::tokenize;
    use crate::syntax::token::TokenKind;

    fn scan(source: &str) -> Vec<Token> {
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

    fn texts(tokens: &[&Token]) -> String {
        tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_commas_inside_brackets_do_not_split() {
        let tokens = scan("f(a, b), [1, 2], {\"k\": (3, 4)}\n");
        let split = split_top_level(&refs(&tokens));
        assert_eq!(split.items.len(), 3);
        assert_eq!(texts(&split.items[0].tokens), "f ( a , b )");
        assert!(!split.magic_trailing_comma);
    }

    #[test]
    fn test_items_reference_input_tokens() {
        let tokens = scan("\"a\", b=f(1),  # note\n");
        let split = split_top_level(&refs(&tokens));
        let range = tokens.as_ptr_range();
        assert!(
            split
                .items
                .iter()
                .flat_map(|item| item.tokens.iter())
                .all(|&t| range.contains(&std::ptr::from_ref(t)))
        );
        assert!(std::ptr::eq(split.items[0].tokens[0], &tokens[0]));
    }

    #[test]
    fn test_lambda_parameters_do_not_split() {
        let tokens = scan("mem_mb=lambda wildcards, attempt: attempt * 1000, x=1\n");
        let (params, _) = split_parameters(&refs(&tokens));
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name.as_deref(), Some("mem_mb"));
        assert_eq!(
            texts(&params[0].value),
            "lambda wildcards , attempt : attempt * 1000"
        );
        assert_eq!(params[1].name.as_deref(), Some("x"));
    }

    #[test]
    fn test_named_and_positional_detection() {
        let tokens = scan("\"a\", b=\"c\", **extra, *rest, d == e\n");
        let (params, _) = split_parameters(&refs(&tokens));
        let kinds: Vec<_> = params
            .iter()
            .map(|p| (p.name.clone(), p.is_positional))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (None, true),
                (Some("b".to_string()), false),
                (None, false),
                (None, true),
                (None, true),
            ]
        );
    }

    #[test]
    fn test_positional_first_keeps_relative_order() {
        let tokens = scan("a=\"1\", \"x\", b=\"2\", \"y\"\n");
        let (params, _) = split_parameters(&refs(&tokens));
        let rendered: Vec<_> = positional_first(&params)
            .iter()
            .map(|p| match &p.name {
                Some(name) => format!("{name}={}", texts(&p.value)),
                None => texts(&p.value),
            })
            .collect();
        assert_eq!(rendered, vec!["\"x\"", "\"y\"", "a=\"1\"", "b=\"2\""]);
    }

    #[test]
    fn test_trailing_comments_before_and_after_comma() {
        let tokens = scan("\"a\",  # first\n\"b\"  # second\n, \"c\"\n");
        let (params, dangling) = split_parameters(&refs(&tokens));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].trailing_comment.as_ref().unwrap().text, "# first");
        assert_eq!(params[1].trailing_comment.as_ref().unwrap().text, "# second");
        assert!(params[2].trailing_comment.is_none());
        assert!(dangling.is_empty());
    }

    #[test]
    fn test_leading_and_dangling_comments() {
        let tokens = scan("# about a\n\"a\",\n\n# about b\n\"b\",\n# the end\n");
        let (params, dangling) = split_parameters(&refs(&tokens));
        assert_eq!(params[0].leading_comments.len(), 1);
        assert_eq!(params[1].leading_comments[0].text, "# about b");
        assert!(params[1].leading_comments[0].blank_before);
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].text, "# the end");
    }

    #[test]
    fn test_comments_inside_brackets_stay_in_value() {
        let tokens = scan("x=[\n    a,  # a\n    b,\n]\n");
        let split = split_top_level(&refs(&tokens));
        assert_eq!(split.items.len(), 1);
        assert!(split.items[0].tokens.iter().any(|t| t.is_comment()));
        assert!(split.has_comments());
    }

    #[test]
    fn test_magic_trailing_comma() {
        assert!(split_top_level(&refs(&scan("a, b,\n"))).magic_trailing_comma);
        assert!(!split_top_level(&refs(&scan("a, b\n"))).magic_trailing_comma);
    }

    #[test]
    fn test_split_chunks() {
        let tokens = scan("\"Hello\"\n# note\n\"World\"  # trailing\n# end\n");
        let mut lines: Vec<Vec<&Token>> = Vec::new();
        let mut line_no = 0;
        for token in &tokens {
            if token.line != line_no {
                lines.push(Vec::new());
                line_no = token.line;
            }
            if let Some(line) = lines.last_mut() {
                line.push(token);
            }
        }
        let (chunks, dangling) = split_chunks(&lines);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].leading_comments[0].text, "# note");
        assert_eq!(chunks[1].trailing_comment.as_ref().unwrap().text, "# trailing");
        assert_eq!(dangling[0].text, "# end");
    }
}
