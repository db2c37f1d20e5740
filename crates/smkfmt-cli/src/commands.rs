//! Format command implementation

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use rayon::prelude::*;
use smkfmt_core::{
    ConfigLoader, FileDiscovery, FormatDiff, FormatMode, FormatOptions, FormatResult,
    FormatterConfiguration, FormatterManager, SmkfmtError, SnakefileFormatter, is_workflow_file,
};
use tracing::{debug, info, warn};

use crate::output::{FormatSummary, colorize_diff, format_duration};

/// `--check` found files that would be reformatted
pub const EXIT_CHANGES: u8 = 1;
/// At least one file could not be formatted
pub const EXIT_ERROR: u8 = 2;

const STDIN_PATH: &str = "-";
const STDIN_LABEL: &str = "<stdin>";

/// Options of one format run, as given on the command line
#[derive(Debug, Clone, Default)]
pub struct FormatArgs {
    pub paths: Vec<PathBuf>,
    pub check: bool,
    pub diff: bool,
    pub line_length: Option<usize>,
    pub indent_size: Option<usize>,
    pub config: Option<PathBuf>,
    pub formatter_command: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub quiet: bool,
}

impl FormatArgs {
    fn mode(&self) -> FormatMode {
        if self.diff {
            FormatMode::Diff
        } else if self.check {
            FormatMode::Check
        } else {
            FormatMode::Format
        }
    }

    fn dry_run(&self) -> bool {
        self.check || self.diff
    }

    fn reads_stdin(&self) -> bool {
        self.paths.iter().any(|p| p.as_os_str() == STDIN_PATH)
    }
}

pub fn format_command(args: FormatArgs) -> Result<ExitCode> {
    debug!("Running format command on paths: {:?}", args.paths);

    let config = resolve_config(&args)?;
    let options = FormatOptions::from(&config);
    let formatter = match config.command_formatter() {
        Some(command) => {
            debug!("Delegating Python code to '{}'", command.program());
            SnakefileFormatter::new(command)
        }
        None => SnakefileFormatter::default(),
    };
    let manager = FormatterManager::new(formatter);

    if args.reads_stdin() {
        if args.paths.len() > 1 {
            bail!("'{STDIN_PATH}' cannot be combined with other paths");
        }
        return format_stdin(&manager, &options, &args);
    }

    let start_time = Instant::now();
    let files = collect_files(&args.paths, &config)?;
    debug!("Found {} workflow files to format", files.len());

    let mode = args.mode();
    let outcomes: Vec<(PathBuf, smkfmt_core::Result<FormatResult>)> = files
        .into_par_iter()
        .map(|path| {
            let result = format_file(&manager, &path, &options, mode);
            (path, result)
        })
        .collect();

    let mut summary = FormatSummary {
        files_checked: outcomes.len(),
        ..Default::default()
    };
    for (path, result) in &outcomes {
        match result {
            Ok(result) if result.has_changes() => {
                summary.reformatted += 1;
                match mode {
                    FormatMode::Diff => {
                        let label = path.display().to_string();
                        let diff = FormatDiff::between(result.original(), result.content());
                        print!("{}", colorize_diff(&diff.unified(&label)));
                    }
                    FormatMode::Check if !args.quiet => {
                        eprintln!("would reformat {}", path.display());
                    }
                    _ => info!("Reformatted {}", path.display()),
                }
            }
            Ok(_) => debug!("{} is already formatted", path.display()),
            Err(e) => {
                summary.failed += 1;
                eprintln!("error: cannot format {}: {}", path.display(), e);
            }
        }
    }

    if !args.quiet {
        eprintln!("{}", summary.report(args.dry_run()));
    }
    debug!("Completed in {}", format_duration(start_time.elapsed()));

    Ok(ExitCode::from(exit_code(&summary, args.check)))
}

fn exit_code(summary: &FormatSummary, check: bool) -> u8 {
    if summary.failed > 0 {
        EXIT_ERROR
    } else if check && summary.reformatted > 0 {
        EXIT_CHANGES
    } else {
        0
    }
}

/// Format one file, writing it back in format mode
fn format_file(
    manager: &FormatterManager,
    path: &Path,
    options: &FormatOptions,
    mode: FormatMode,
) -> smkfmt_core::Result<FormatResult> {
    let result = manager.format_file_with_mode(path, options, mode)?;
    if mode == FormatMode::Format && result.has_changes() {
        std::fs::write(path, result.content()).map_err(|e| SmkfmtError::io_error(path, e))?;
    }
    Ok(result)
}

/// Read stdin, write the formatted text (or a diff) to stdout
fn format_stdin(
    manager: &FormatterManager,
    options: &FormatOptions,
    args: &FormatArgs,
) -> Result<ExitCode> {
    let mut content = String::new();
    std::io::stdin()
        .read_to_string(&mut content)
        .context("failed to read stdin")?;

    let mode = args.mode();
    let result = manager.format_with_mode(&content, options, mode)?;
    match mode {
        FormatMode::Format => print!("{}", result.content()),
        FormatMode::Diff if result.has_changes() => {
            let diff = FormatDiff::between(result.original(), result.content());
            print!("{}", colorize_diff(&diff.unified(STDIN_LABEL)));
        }
        FormatMode::Check if result.has_changes() && !args.quiet => {
            eprintln!("would reformat {STDIN_LABEL}");
        }
        _ => {}
    }

    let summary = FormatSummary {
        files_checked: 1,
        reformatted: usize::from(result.has_changes()),
        failed: 0,
    };
    Ok(ExitCode::from(exit_code(&summary, args.check)))
}

/// Command line settings layered over the discovered configuration file
fn resolve_config(args: &FormatArgs) -> Result<FormatterConfiguration> {
    let mut config = FormatterConfiguration {
        indent_size: args.indent_size,
        line_width: args.line_length,
        formatter_command: args.formatter_command.clone(),
        include: (!args.include.is_empty()).then(|| args.include.clone()),
        exclude: (!args.exclude.is_empty()).then(|| args.exclude.clone()),
    };

    let start_dir = config_start_dir(&args.paths);
    let file_config = ConfigLoader::load(args.config.as_deref(), Some(start_dir))?;
    config.merge_with(file_config);
    config.validate()?;

    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

/// Directory where configuration discovery starts
fn config_start_dir(paths: &[PathBuf]) -> &Path {
    let current = Path::new(".");
    match paths.first() {
        Some(path) if path.as_os_str() == STDIN_PATH => current,
        Some(path) if path.is_file() => match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => current,
        },
        Some(path) if path.is_dir() => path,
        _ => current,
    }
}

/// Expand the command line paths into workflow files
///
/// Files named explicitly are always formatted; directories and glob
/// patterns only contribute workflow files.
fn collect_files(paths: &[PathBuf], config: &FormatterConfiguration) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let discovery = FileDiscovery::new(path, config)?;
            files.extend(discovery.discover_files()?);
        } else if path.to_string_lossy().contains('*') {
            let pattern = path.to_string_lossy();
            let entries = glob::glob(&pattern)
                .with_context(|| format!("invalid glob pattern '{pattern}'"))?;
            for entry in entries {
                match entry {
                    Ok(p) if p.is_file() && is_workflow_file(&p) => files.push(p),
                    Ok(_) => {}
                    Err(e) => warn!("Glob entry error: {}", e),
                }
            }
        } else {
            bail!("{}: no such file or directory", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_mode_selection() {
        let mut args = FormatArgs::default();
        assert_eq!(args.mode(), FormatMode::Format);
        args.check = true;
        assert_eq!(args.mode(), FormatMode::Check);
        args.diff = true;
        assert_eq!(args.mode(), FormatMode::Diff);
        assert!(args.dry_run());
    }

    #[test]
    fn test_exit_codes() {
        let clean = FormatSummary {
            files_checked: 2,
            ..Default::default()
        };
        let changed = FormatSummary {
            files_checked: 2,
            reformatted: 1,
            failed: 0,
        };
        let failed = FormatSummary {
            files_checked: 2,
            reformatted: 0,
            failed: 1,
        };
        assert_eq!(exit_code(&clean, true), 0);
        assert_eq!(exit_code(&changed, false), 0);
        assert_eq!(exit_code(&changed, true), EXIT_CHANGES);
        assert_eq!(exit_code(&failed, false), EXIT_ERROR);
    }

    #[test]
    fn test_collect_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("rules")).unwrap();
        fs::write(root.join("Snakefile"), "").unwrap();
        fs::write(root.join("rules/a.smk"), "").unwrap();
        fs::write(root.join("notes.txt"), "").unwrap();

        let config = FormatterConfiguration::default();
        let files = collect_files(&[root.to_path_buf()], &config).unwrap();
        assert_eq!(files.len(), 2);

        let explicit = collect_files(&[root.join("notes.txt")], &config).unwrap();
        assert_eq!(explicit, vec![root.join("notes.txt")]);

        assert!(collect_files(&[root.join("missing.smk")], &config).is_err());
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("smkfmt.toml"),
            "lineWidth = 100\nindentSize = 2\n",
        )
        .unwrap();

        let args = FormatArgs {
            paths: vec![temp_dir.path().to_path_buf()],
            line_length: Some(60),
            ..Default::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.line_width, Some(60));
        assert_eq!(config.indent_size, Some(2));
    }
}
