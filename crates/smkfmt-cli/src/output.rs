//! Terminal output for format runs

use std::time::Duration;

use colored::Colorize;

/// Counts collected over one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FormatSummary {
    pub files_checked: usize,
    /// Files that were (or in check and diff mode would be) rewritten
    pub reformatted: usize,
    pub failed: usize,
}

impl FormatSummary {
    pub fn unchanged(&self) -> usize {
        self.files_checked - self.reformatted - self.failed
    }

    /// One-line report, e.g. `2 files reformatted, 1 file left unchanged`
    pub fn report(&self, dry_run: bool) -> String {
        let mut parts = Vec::new();
        if self.reformatted > 0 {
            let verb = if dry_run { "would be reformatted" } else { "reformatted" };
            parts.push(format!("{} {verb}", files(self.reformatted)).bold().to_string());
        }
        if self.unchanged() > 0 {
            let verb = if dry_run { "would be left unchanged" } else { "left unchanged" };
            parts.push(format!("{} {verb}", files(self.unchanged())));
        }
        if self.failed > 0 {
            let verb = if dry_run { "would fail to reformat" } else { "failed to reformat" };
            parts.push(format!("{} {verb}", files(self.failed)).red().to_string());
        }
        if parts.is_empty() {
            return "No workflow files found".to_string();
        }
        parts.join(", ")
    }
}

fn files(count: usize) -> String {
    format!("{count} file{}", if count == 1 { "" } else { "s" })
}

/// Color the lines of a unified diff
pub fn colorize_diff(diff: &str) -> String {
    let mut out = String::with_capacity(diff.len());
    for line in diff.split_inclusive('\n') {
        let (text, newline) = match line.strip_suffix('\n') {
            Some(text) => (text, "\n"),
            None => (line, ""),
        };
        let colored = if text.starts_with("+++") || text.starts_with("---") {
            text.bold().to_string()
        } else if text.starts_with("@@") {
            text.cyan().to_string()
        } else if text.starts_with('+') {
            text.green().to_string()
        } else if text.starts_with('-') {
            text.red().to_string()
        } else {
            text.to_string()
        };
        out.push_str(&colored);
        out.push_str(newline);
    }
    out
}

pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.1}s", total_ms as f64 / 1000.0)
    } else {
        let minutes = total_ms / 60_000;
        let seconds = (total_ms % 60_000) as f64 / 1000.0;
        format!("{minutes}m {seconds:.1}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report() {
        colored::control::set_override(false);
        let summary = FormatSummary {
            files_checked: 4,
            reformatted: 1,
            failed: 1,
        };
        assert_eq!(
            summary.report(false),
            "1 file reformatted, 2 files left unchanged, 1 file failed to reformat"
        );
        assert_eq!(
            summary.report(true),
            "1 file would be reformatted, 2 files would be left unchanged, 1 file would fail to reformat"
        );
        assert_eq!(FormatSummary::default().report(false), "No workflow files found");
    }

    #[test]
    fn test_colorize_diff_keeps_text() {
        colored::control::set_override(false);
        let diff = "--- a\n+++ b\n@@ -1 +1 @@\n-x\n+y\n";
        assert_eq!(colorize_diff(diff), diff);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(61_000)), "1m 1.0s");
    }
}
