//! External process invocation.
//!
//! The pipeline never spawns processes directly; every stage hands an
//! [`Invocation`] to the [`ToolInvoker`] carried by the build context. The
//! default [`SystemInvoker`] runs the tool with `tokio::process`, streams its
//! output into the log and captures it for diagnostics.

use crate::bundler::error::{Error, Result};
use std::{
    fmt,
    future::Future,
    path::{Path, PathBuf},
    pin::Pin,
    process::Stdio,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of trailing output lines kept in a tool failure message.
const FAILURE_DETAIL_LINES: usize = 20;

/// One external tool invocation: argv, working directory and extra environment.
///
/// The first argument is the program. Environment values are never rendered
/// by `Debug`, which is how secrets reach signing tools without appearing in
/// logs.
#[derive(Clone)]
pub struct Invocation {
    args: Vec<String>,
    cwd: PathBuf,
    env: Vec<(String, String)>,
}

impl Invocation {
    /// Creates an invocation from a finalized argument vector.
    pub fn new(args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            args,
            cwd: cwd.into(),
            env: Vec::new(),
        }
    }

    /// Adds an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Full argument vector, program first.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Working directory of the child.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Extra environment of the child.
    pub fn env_vars(&self) -> &[(String, String)] {
        &self.env
    }

    /// Short tool name (file name of the program).
    pub fn tool_name(&self) -> String {
        self.args
            .first()
            .map(|program| {
                Path::new(program)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| program.clone())
            })
            .unwrap_or_default()
    }

    /// Space-joined command line for logging.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env: Vec<String> = self.env.iter().map(|(k, _)| format!("{k}=***")).collect();
        f.debug_struct("Invocation")
            .field("args", &self.args)
            .field("cwd", &self.cwd)
            .field("env", &env)
            .finish()
    }
}

/// Exit status and captured output of a finished tool.
#[derive(Clone, Debug, Default)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Whether the process reported success
    pub success: bool,
    /// Captured stdout lines
    pub stdout: Vec<String>,
    /// Captured stderr lines
    pub stderr: Vec<String>,
}

impl ToolOutput {
    /// A successful run with no output.
    pub fn succeeded() -> Self {
        Self {
            code: Some(0),
            success: true,
            ..Default::default()
        }
    }

    /// A failed run with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            success: false,
            stderr: stderr.into().lines().map(String::from).collect(),
            ..Default::default()
        }
    }

    /// First stderr line the tool flagged as an error.
    ///
    /// `aapt` can print `ERROR` lines and still exit 0.
    pub fn reported_error(&self) -> Option<&str> {
        self.stderr
            .iter()
            .map(String::as_str)
            .find(|line| line.trim_start().starts_with("ERROR"))
    }

    /// Last lines of stderr (falling back to stdout) for failure messages.
    pub fn failure_detail(&self) -> String {
        let source = if self.stderr.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let start = source.len().saturating_sub(FAILURE_DETAIL_LINES);
        source[start..].join("\n")
    }
}

/// Future returned by [`ToolInvoker::invoke`].
pub type InvokeFuture<'a> = Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + 'a>>;

/// Process-invocation facility consumed by pipeline stages.
///
/// Implementations return `Err` only when the process could not be run at
/// all; a non-zero exit is reported through [`ToolOutput`].
pub trait ToolInvoker: Send + Sync {
    /// Runs the invocation to completion.
    fn invoke<'a>(&'a self, invocation: &'a Invocation) -> InvokeFuture<'a>;
}

/// Runs tools as child processes of this process.
#[derive(Clone, Debug, Default)]
pub struct SystemInvoker {
    verbose: bool,
}

impl SystemInvoker {
    /// Creates an invoker; `verbose` promotes tool output to info level.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput> {
        let (program, args) = invocation
            .args
            .split_first()
            .ok_or_else(|| Error::Configuration("empty tool invocation".into()))?;

        log::debug!("Running {} in {}", invocation.command_line(), invocation.cwd.display());

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| Error::CommandFailed {
                command: invocation.tool_name(),
                error,
            })?;

        let verbose = self.verbose;

        // Both streams must be drained concurrently or a chatty tool blocks on a full pipe
        let (stdout, stderr) = tokio::join!(
            async {
                let mut captured = Vec::new();
                if let Some(stdout) = child.stdout.take() {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if verbose {
                            log::info!("{}", line);
                        } else {
                            log::debug!("{}", line);
                        }
                        captured.push(line);
                    }
                }
                captured
            },
            async {
                let mut captured = Vec::new();
                if let Some(stderr) = child.stderr.take() {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        if line.trim_start().starts_with("ERROR") {
                            log::warn!("{}", line);
                        } else if verbose {
                            log::info!("{}", line);
                        } else {
                            log::debug!("{}", line);
                        }
                        captured.push(line);
                    }
                }
                captured
            }
        );

        let status = child.wait().await.map_err(|error| Error::CommandFailed {
            command: invocation.tool_name(),
            error,
        })?;

        log::debug!("{} exit code {:?}", invocation.tool_name(), status.code());

        Ok(ToolOutput {
            code: status.code(),
            success: status.success(),
            stdout,
            stderr,
        })
    }
}

impl ToolInvoker for SystemInvoker {
    fn invoke<'a>(&'a self, invocation: &'a Invocation) -> InvokeFuture<'a> {
        Box::pin(self.run(invocation))
    }
}

/// Invokes a tool and turns a non-success exit into [`Error::ToolFailed`].
pub async fn run_tool(invoker: &dyn ToolInvoker, invocation: &Invocation) -> Result<ToolOutput> {
    let output = invoker.invoke(invocation).await?;
    if !output.success {
        return Err(Error::ToolFailed {
            tool: invocation.tool_name(),
            code: output.code,
            detail: output.failure_detail(),
        });
    }
    Ok(output)
}
