//! External Command Execution
//!
//! Every collaborator tool (`lspci`, `ibdev2netdev`, `dmidecode`, `mlxlink`)
//! is reached through the [`CommandRunner`] trait so that the collection cycle
//! can run against scripted output in tests.
//!
//! # Execution Model
//!
//! - One-shot: a command is started once, never retried at this layer
//! - Bounded: [`SystemCommandRunner`] enforces a timeout and kills the child
//!   when the timeout fires
//! - Non-zero exits are not errors here; callers decide what a failed tool
//!   run means by inspecting [`CommandOutput`]

use crate::error::{ExporterError, Result};
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command that exited with status 0
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Output of a command that exited with `code`
    pub fn failure(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            return self.stdout.clone();
        }
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// stdout of a successful run, or a [`ExporterError::ToolFailed`]
    pub fn into_stdout(self, program: &str) -> Result<String> {
        if self.is_success() {
            Ok(self.stdout)
        } else {
            Err(ExporterError::ToolFailed {
                program: program.to_string(),
                code: self.code,
                message: self.combined().trim().to_string(),
            })
        }
    }
}

/// Abstraction over process execution.
///
/// Implementations must be shareable across the per-adapter tasks of a
/// collection cycle.
pub trait CommandRunner: Send + Sync + 'static {
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Runs real processes with `tokio::process`
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Running {} {}", program, args.join(" "));

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(ExporterError::Spawn {
                    program: program.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(ExporterError::Timeout {
                    program: program.to_string(),
                    seconds: self.timeout.as_secs(),
                })
            }
        };

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
