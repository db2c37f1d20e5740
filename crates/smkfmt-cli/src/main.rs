//! smkfmt CLI
//!
//! Formats Snakemake workflow files in place, or checks and diffs them.

mod commands;
mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use smkfmt_core::init_tracing;
use tracing::error;

use crate::commands::FormatArgs;

#[derive(Parser)]
#[command(name = "smkfmt")]
#[command(about = "Formatter for Snakemake workflow files")]
#[command(version = smkfmt_core::VERSION)]
#[command(
    long_about = "smkfmt lays out Snakemake keywords (rules, parameters, directives) and hands\n\
plain Python code to an external formatter when one is configured.\n\
\n\
Examples:\n  \
smkfmt .                         # Format every workflow file below the current directory\n  \
smkfmt --check Snakefile         # Exit with 1 if Snakefile would change\n  \
smkfmt --diff workflow/rules     # Show the changes without writing them\n  \
cat Snakefile | smkfmt -         # Format stdin to stdout\n  \
smkfmt --formatter-command 'black -q -l {width} -' ."
)]
struct Cli {
    /// Files or directories to format, `-` for stdin
    #[arg(help = "Files or directories to format (default: current directory)")]
    paths: Vec<PathBuf>,

    /// Check formatting without modifying files
    #[arg(
        long,
        help = "Exit with 1 if any file would be reformatted, without writing"
    )]
    check: bool,

    /// Show diff of proposed changes without applying them
    #[arg(long, help = "Print a unified diff of the changes, without writing")]
    diff: bool,

    /// Line width for formatting
    #[arg(short = 'l', long, visible_alias = "line-width", help = "Maximum line width")]
    line_length: Option<usize>,

    /// Indentation size
    #[arg(long, help = "Number of spaces per indentation level")]
    indent_size: Option<usize>,

    /// Configuration file path
    #[arg(
        short,
        long,
        help = "Path to configuration file (smkfmt.toml/.smkfmt.toml/pyproject.toml)"
    )]
    config: Option<PathBuf>,

    /// External formatter for plain Python code
    #[arg(
        long,
        env = "SMKFMT_FORMATTER_COMMAND",
        help = "Command reading Python code on stdin, `{width}` is replaced by the line width"
    )]
    formatter_command: Option<String>,

    /// Include patterns (glob syntax)
    #[arg(
        long,
        help = "Include files matching pattern (can be used multiple times)"
    )]
    include: Vec<String>,

    /// Exclude patterns (glob syntax)
    #[arg(
        long,
        help = "Exclude files matching pattern (can be used multiple times)"
    )]
    exclude: Vec<String>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return ExitCode::SUCCESS;
    }

    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let log_level = match cli.verbose {
        0 => "smkfmt=warn",
        1 => "smkfmt=info",
        2 => "smkfmt=debug",
        _ => "smkfmt=trace",
    };
    init_tracing(log_level);

    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        return ExitCode::from(commands::EXIT_ERROR);
    }

    let paths = if cli.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cli.paths
    };
    let args = FormatArgs {
        paths,
        check: cli.check,
        diff: cli.diff,
        line_length: cli.line_length,
        indent_size: cli.indent_size,
        config: cli.config,
        formatter_command: cli.formatter_command,
        include: cli.include,
        exclude: cli.exclude,
        quiet: cli.quiet,
    };

    match commands::format_command(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(commands::EXIT_ERROR)
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
