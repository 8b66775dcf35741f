//! External tool invocation with timeout and cancellation.
//!
//! Command construction ([`ToolCommand`]) is separate from execution
//! ([`ToolRunner`]) so probing, transcoding and subtitle conversion can be
//! driven by a fake runner in tests.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Process exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run that printed `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// A fully described external tool invocation.
///
/// # Example
///
/// ```
/// use ghostforge_av::ToolCommand;
/// use std::time::Duration;
///
/// let cmd = ToolCommand::new("ffprobe")
///     .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
///     .arg("/path/to/video.mkv")
///     .timeout(Duration::from_secs(30));
/// assert_eq!(cmd.tool_name(), "ffprobe");
/// assert_eq!(cmd.get_args().last().map(String::as_str), Some("/path/to/video.mkv"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
    current_dir: Option<PathBuf>,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            current_dir: None,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, s: impl Into<String>) -> Self {
        self.args.push(s.into());
        self
    }

    /// Append a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Append multiple arguments.
    pub fn args(mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Run the process from `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// File name of the program, used in errors and logs.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Shell-like rendering for debug logs.
    pub fn display(&self) -> String {
        let mut out = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            out.push(' ');
            if arg.contains(' ') {
                out.push('"');
                out.push_str(arg);
                out.push('"');
            } else {
                out.push_str(arg);
            }
        }
        out
    }
}

/// Executes [`ToolCommand`]s.
///
/// Implementations must return `Err` for non-zero exits so callers only see
/// `Ok` for usable output.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand, cancel: &CancellationToken) -> Result<ToolOutput>;
}

/// Runs commands as real child processes.
///
/// The child is killed when its timeout elapses, when `cancel` fires, or when
/// the returned future is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, command: &ToolCommand, cancel: &CancellationToken) -> Result<ToolOutput> {
        let tool = command.tool_name();
        tracing::debug!(command = %command.display(), "Running tool");

        let mut cmd = Command::new(command.program());
        cmd.args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = command.get_current_dir() {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(&tool)
            } else {
                Error::tool_failed(&tool, format!("failed to spawn: {e}"))
            }
        })?;

        let output = tokio::select! {
            result = child.wait_with_output() => result
                .map_err(|e| Error::tool_failed(&tool, format!("I/O error waiting for process: {e}")))?,
            _ = tokio::time::sleep(command.get_timeout()) => {
                return Err(Error::Timeout { tool, timeout: command.get_timeout() });
            }
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled { tool });
            }
        };

        let tool_output = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool_failed(
                tool,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    tool_output.stderr.trim()
                ),
            ));
        }

        Ok(tool_output)
    }
}
