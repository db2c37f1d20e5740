//! String literal normalization
//!
//! Two rewrites are applied to string literals found in keyword values:
//! quote normalization (prefer `"` and `"""` when that adds no escapes) and
//! re-indentation of triple-quoted strings spanning several lines.

/// Prefer double quotes where that does not add escaping
///
/// The prefix (`r`, `f`, `rb`, ...) is kept as written.
pub fn normalize_quotes(literal: &str) -> String {
    let Some(prefix_len) = literal.find(['"', '\'']) else {
        return literal.to_string();
    };
    let (prefix, rest) = literal.split_at(prefix_len);
    let raw = prefix.to_ascii_lowercase().contains('r');

    if rest.len() >= 6 && rest.starts_with("'''") && rest.ends_with("'''") {
        let body = &rest[3..rest.len() - 3];
        if body.contains("\"\"\"") || body.ends_with('"') {
            return literal.to_string();
        }
        return format!("{prefix}\"\"\"{body}\"\"\"");
    }

    if rest.len() >= 2 && rest.starts_with('\'') && rest.ends_with('\'') && !rest.starts_with("'''")
    {
        let body = &rest[1..rest.len() - 1];
        if body.contains('"') {
            return literal.to_string();
        }
        let body = if raw {
            body.to_string()
        } else {
            unescape_single_quotes(body)
        };
        return format!("{prefix}\"{body}\"");
    }

    literal.to_string()
}

/// Drop the backslash of `\'`, leaving every other escape alone
fn unescape_single_quotes(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push('\''),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Width of leading whitespace, counting a tab as one indentation unit
fn indent_width(line: &str, unit: usize) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { unit } else { 1 })
        .sum()
}

/// Re-indent the continuation lines of a multi-line string literal
///
/// The first line stays where it is. The other lines keep their indentation
/// relative to the smallest one among them, which is moved to `target`. A
/// last line holding only the closing delimiter is put at `target` as well;
/// whitespace-only lines become empty.
pub fn reindent_multiline(literal: &str, target: usize, unit: usize) -> String {
    let mut lines = literal.split('\n');
    let Some(first) = lines.next() else {
        return literal.to_string();
    };
    let rest: Vec<&str> = lines.collect();
    let Some(last) = rest.last() else {
        return literal.to_string();
    };

    let delimiter = if literal.ends_with("\"\"\"") || literal.ends_with("'''") {
        &literal[literal.len() - 3..]
    } else {
        &literal[literal.len() - 1..]
    };
    let closing_only = last.trim() == delimiter;
    let content = if closing_only {
        &rest[..rest.len() - 1]
    } else {
        &rest[..]
    };

    let base = content
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line, unit))
        .min()
        .unwrap_or(0);

    let mut out = String::from(first);
    for (i, line) in rest.iter().enumerate() {
        out.push('\n');
        let trimmed = line.trim_start();
        if trimmed.trim_end().is_empty() {
            continue;
        }
        let column = if closing_only && i == rest.len() - 1 {
            target
        } else {
            target + indent_width(line, unit) - base
        };
        out.push_str(&" ".repeat(column));
        out.push_str(trimmed);
    }
    out
}

/// Quote normalization, then re-indentation when a triple-quoted literal spans lines
pub fn format_string(literal: &str, target: usize, unit: usize) -> String {
    let normalized = normalize_quotes(literal);
    let triple = normalized.ends_with("\"\"\"") || normalized.ends_with("'''");
    if triple && normalized.contains('\n') {
        reindent_multiline(&normalized, target, unit)
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_quotes_become_double() {
        assert_eq!(normalize_quotes("'a'"), "\"a\"");
        assert_eq!(normalize_quotes("''"), "\"\"");
        assert_eq!(normalize_quotes("f'{x}.txt'"), "f\"{x}.txt\"");
        assert_eq!(normalize_quotes("'it\\'s'"), "\"it's\"");
        assert_eq!(normalize_quotes("'tab\\t'"), "\"tab\\t\"");
    }

    #[test]
    fn test_quotes_kept_when_escapes_would_be_added() {
        assert_eq!(normalize_quotes("'say \"hi\"'"), "'say \"hi\"'");
        assert_eq!(normalize_quotes("f'{d[\"k\"]}'"), "f'{d[\"k\"]}'");
    }

    #[test]
    fn test_raw_strings_keep_backslashes() {
        assert_eq!(normalize_quotes("r'\\d+\\''"), "r\"\\d+\\'\"");
    }

    #[test]
    fn test_triple_quotes() {
        assert_eq!(normalize_quotes("'''    a string'''"), "\"\"\"    a string\"\"\"");
        assert_eq!(normalize_quotes("'''ends with \"'''"), "'''ends with \"'''");
        assert_eq!(normalize_quotes("\"\"\"already\"\"\""), "\"\"\"already\"\"\"");
    }

    #[test]
    fn test_reindent_keeps_relative_indentation() {
        let literal = "\"\"\"Starts here\n  Hello\n    World\n  \t\tTabbed\n    \"\"\"";
        let expected = "\"\"\"Starts here\n        Hello\n          World\n                Tabbed\n        \"\"\"";
        assert_eq!(reindent_multiline(literal, 8, 4), expected);
    }

    #[test]
    fn test_reindent_docstring() {
        let literal = "\"\"\"\n  The rule\n        a\n\"\"\"";
        let expected = "\"\"\"\n    The rule\n          a\n    \"\"\"";
        assert_eq!(reindent_multiline(literal, 4, 4), expected);
    }

    #[test]
    fn test_reindent_blank_lines_are_emptied() {
        let literal = "\"\"\"\n  a\n   \n  b\"\"\"";
        assert_eq!(reindent_multiline(literal, 4, 4), "\"\"\"\n    a\n\n    b\"\"\"");
    }

    #[test]
    fn test_reindent_is_stable() {
        let literal = "\"\"\"\n        Hello\n          World\n        \"\"\"";
        assert_eq!(reindent_multiline(literal, 8, 4), literal);
    }

    #[test]
    fn test_format_string_single_line() {
        assert_eq!(format_string("'x'", 8, 4), "\"x\"");
    }
}
