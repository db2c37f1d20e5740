//! Comment binding and normalization
//!
//! Comments are either *trailing* (sharing a line with code before them) or
//! *standalone* (alone on their line). Standalone comments directly above a
//! keyword, with no blank line in between, become that keyword's header
//! comments and always stay glued to it. Everything else is either part of a
//! host-language span or an independent comment unit.

use super::block::Comment;

/// Comment as emitted: `# text`, with `#!` and `#:` left alone
pub fn normalize_comment(text: &str) -> String {
    let text = text.trim_end();
    let Some(body) = text.strip_prefix('#') else {
        return text.to_string();
    };
    if body.is_empty() || body.starts_with(['!', ':', '#', ' ', '\t']) {
        return text.to_string();
    }
    format!("# {body}")
}

/// Trailing comment suffix, two spaces after the code
pub fn trailing_suffix(comment: &Comment) -> String {
    format!("  {}", normalize_comment(&comment.text))
}

/// Split a run of standalone comments that precedes a keyword line
///
/// Returns `(standalone, header)`: the header part is the longest suffix of the
/// run with no blank line inside it nor between it and the keyword.
pub fn bind_header_comments(
    mut run: Vec<Comment>,
    keyword_blank_before: bool,
) -> (Vec<Comment>, Vec<Comment>) {
    if keyword_blank_before || run.is_empty() {
        return (run, Vec::new());
    }

    let mut start = run.len() - 1;
    while start > 0 && !run[start].blank_before {
        start -= 1;
    }
    let mut header = run.split_off(start);
    if let Some(first) = header.first_mut() {
        first.blank_before = false;
    }
    (run, header)
}

/// Index of the first comment in a suite's trailing comment run that belongs
/// to an enclosing level: everything from there on sits left of the suite
pub fn outer_level_start(columns: &[usize], suite_column: usize) -> Option<usize> {
    columns.iter().position(|&column| column < suite_column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(text: &str, blank_before: bool) -> Comment {
        Comment {
            text: text.to_string(),
            line: 1,
            column: 0,
            blank_before,
        }
    }

    #[test]
    fn test_normalize_comment() {
        assert_eq!(normalize_comment("#x"), "# x");
        assert_eq!(normalize_comment("# x  "), "# x");
        assert_eq!(normalize_comment("#!/usr/bin/env python"), "#!/usr/bin/env python");
        assert_eq!(normalize_comment("#: doc"), "#: doc");
        assert_eq!(normalize_comment("#"), "#");
        assert_eq!(normalize_comment("## section"), "## section");
    }

    #[test]
    fn test_trailing_suffix_uses_two_spaces() {
        assert_eq!(trailing_suffix(&comment("#elem1,", false)), "  # elem1,");
    }

    #[test]
    fn test_header_binding_without_blank_lines() {
        let run = vec![comment("# a", false), comment("# b", false)];
        let (standalone, header) = bind_header_comments(run, false);
        assert!(standalone.is_empty());
        assert_eq!(header.len(), 2);
    }

    #[test]
    fn test_blank_line_before_keyword_unbinds_everything() {
        let run = vec![comment("# a", false)];
        let (standalone, header) = bind_header_comments(run, true);
        assert_eq!(standalone.len(), 1);
        assert!(header.is_empty());
    }

    #[test]
    fn test_header_binding_stops_at_blank_line() {
        let run = vec![
            comment("# a", false),
            comment("# b", true),
            comment("# c", false),
        ];
        let (standalone, header) = bind_header_comments(run, false);
        assert_eq!(standalone.len(), 1);
        assert_eq!(standalone[0].text, "# a");
        assert_eq!(header.len(), 2);
        assert_eq!(header[0].text, "# b");
        assert!(!header[0].blank_before);
    }

    #[test]
    fn test_outer_level_start() {
        assert_eq!(outer_level_start(&[4, 4, 0], 4), Some(2));
        assert_eq!(outer_level_start(&[4, 8], 4), None);
        assert_eq!(outer_level_start(&[0, 4], 4), Some(0));
    }
}
