//! Formatting of host-language code spans
//!
//! Generic code is handed to an external formatter through [`CodeFormatter`].
//! Closures with the right signature implement the trait, which keeps tests
//! and embedders free to plug in anything.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// External formatter for host-language code
///
/// Receives a span dedented to column zero and the width available to it.
/// Errors are plain messages; the caller attaches source positions.
pub trait CodeFormatter: Send + Sync {
    fn format(&self, code: &str, line_width: usize) -> Result<String, String>;
}

impl<F> CodeFormatter for F
where
    F: Fn(&str, usize) -> Result<String, String> + Send + Sync,
{
    fn format(&self, code: &str, line_width: usize) -> Result<String, String> {
        self(code, line_width)
    }
}

/// Leaves code as written apart from trailing whitespace
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimFormatter;

impl CodeFormatter for VerbatimFormatter {
    fn format(&self, code: &str, _line_width: usize) -> Result<String, String> {
        let mut out = code
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        Ok(out)
    }
}

/// Pipes code through an external program
///
/// Arguments may contain `{width}`, replaced by the available line width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Parse a whitespace-separated command line such as `black -q -l {width} -`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn args_for(&self, line_width: usize) -> Vec<String> {
        let width = line_width.to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{width}", &width))
            .collect()
    }
}

impl CodeFormatter for CommandFormatter {
    fn format(&self, code: &str, line_width: usize) -> Result<String, String> {
        let args = self.args_for(line_width);
        debug!("running {} {:?} on {} bytes", self.program, args, code.len());

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| format!("failed to start '{}': {err}", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| format!("no stdin for '{}'", self.program))?;
        let input = code.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child
            .wait_with_output()
            .map_err(|err| format!("failed to run '{}': {err}", self.program))?;
        writer
            .join()
            .map_err(|_| format!("writer thread for '{}' panicked", self.program))?
            .map_err(|err| format!("failed to write to '{}': {err}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}", self.program, output.status);
            return Err(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ));
        }
        String::from_utf8(output.stdout)
            .map_err(|err| format!("'{}' produced invalid UTF-8: {err}", self.program))
    }
}
