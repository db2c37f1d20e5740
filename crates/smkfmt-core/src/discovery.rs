//! Workflow file discovery
//!
//! Walks directories for `Snakefile`, `*.smk` and `*.snakefile` files, or for
//! whatever the configured `include` globs select, minus `exclude` globs.
//! Patterns are matched against paths relative to the discovery root.

use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::FormatterConfiguration;
use crate::{Result, ResultExt, SmkfmtError};

/// File names recognized without any configuration
pub const WORKFLOW_FILE_NAMES: &[&str] = &["Snakefile", "snakefile"];

/// Extensions recognized without any configuration
pub const WORKFLOW_EXTENSIONS: &[&str] = &["smk", "snakefile"];

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".snakemake", "__pycache__", "node_modules"];

/// Whether `path` looks like a workflow file by name alone
pub fn is_workflow_file(path: &Path) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| WORKFLOW_FILE_NAMES.contains(&name));
    let extension_matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            WORKFLOW_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        });
    name_matches || extension_matches
}

/// Directory walker honoring include and exclude globs
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root_dir: PathBuf,
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl FileDiscovery {
    /// Create a discovery rooted at `root_dir` with the patterns of `config`
    pub fn new(root_dir: impl Into<PathBuf>, config: &FormatterConfiguration) -> Result<Self> {
        Ok(Self {
            root_dir: root_dir.into(),
            include: compile_patterns(config.include.as_deref(), "include")?,
            exclude: compile_patterns(config.exclude.as_deref(), "exclude")?,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// All matching files under the root, sorted
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        info!("Discovering workflow files in {}", self.root_dir.display());

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root_dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
        for entry in walker {
            // Unreadable entries are skipped with a warning
            let Some(entry) = entry
                .map_err(|e| {
                    let path = e.path().map_or_else(|| self.root_dir.clone(), Path::to_path_buf);
                    SmkfmtError::io_error(path, std::io::Error::other(e.to_string()))
                })
                .log_and_continue()
            else {
                continue;
            };
            if entry.file_type().is_file() && self.should_include(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        info!("Discovered {} workflow files", files.len());
        debug!("Files: {:?}", files);
        Ok(files)
    }

    /// Check a single file against the include and exclude patterns
    pub fn should_include(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root_dir).unwrap_or(path);
        let relative = relative.to_string_lossy();

        let included = if self.include.is_empty() {
            is_workflow_file(path)
        } else {
            self.include.iter().any(|p| p.matches(&relative))
        };
        included && !self.exclude.iter().any(|p| p.matches(&relative))
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn compile_patterns(patterns: Option<&[String]>, what: &str) -> Result<Vec<Pattern>> {
    patterns
        .unwrap_or_default()
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| {
                SmkfmtError::config_error(format!("Invalid {what} pattern '{p}': {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "rule a:\n    threads: 1\n").unwrap();
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_is_workflow_file() {
        assert!(is_workflow_file(Path::new("Snakefile")));
        assert!(is_workflow_file(Path::new("workflow/rules/align.smk")));
        assert!(is_workflow_file(Path::new("common.snakefile")));
        assert!(is_workflow_file(Path::new("UPPER.SMK")));
        assert!(!is_workflow_file(Path::new("script.py")));
        assert!(!is_workflow_file(Path::new("config.yaml")));
    }

    #[test]
    fn test_discover_default_names() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "Snakefile");
        touch(root, "rules/a.smk");
        touch(root, "scripts/run.py");
        touch(root, ".snakemake/cache/b.smk");

        let discovery = FileDiscovery::new(root, &FormatterConfiguration::default()).unwrap();
        let files = discovery.discover_files().unwrap();
        assert_eq!(names(root, &files), vec!["Snakefile", "rules/a.smk"]);
    }

    #[test]
    fn test_include_and_exclude_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "rules/a.smk");
        touch(root, "rules/b.rules");
        touch(root, "legacy/c.smk");

        let config = FormatterConfiguration {
            include: Some(vec!["**/*.smk".to_string(), "**/*.rules".to_string()]),
            exclude: Some(vec!["legacy/**".to_string()]),
            ..Default::default()
        };
        let discovery = FileDiscovery::new(root, &config).unwrap();
        let files = discovery.discover_files().unwrap();
        assert_eq!(names(root, &files), vec!["rules/a.smk", "rules/b.rules"]);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let config = FormatterConfiguration {
            exclude: Some(vec!["[".to_string()]),
            ..Default::default()
        };
        let err = FileDiscovery::new(".", &config).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }
}
