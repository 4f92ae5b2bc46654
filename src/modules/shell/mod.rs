use crate::core::context::Context;
use crate::runner::task::{Task, TaskResult};
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug)]
pub enum ShellError {
    Spawn { command: String, source: io::Error },
    Wait { command: String, source: io::Error },
    Status { command: String, status: ExitStatus },
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Spawn { command, source } => {
                write!(f, "failed to start '{}': {}", command, source)
            }
            ShellError::Wait { command, source } => {
                write!(f, "failed to wait for '{}': {}", command, source)
            }
            ShellError::Status { command, status } => {
                write!(f, "'{}' exited with {}", command, status)
            }
        }
    }
}

impl std::error::Error for ShellError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShellError::Spawn { source, .. } | ShellError::Wait { source, .. } => Some(source),
            ShellError::Status { .. } => None,
        }
    }
}

/// Runs a command line through `sh -c`. A non-zero exit status is a failure.
///
/// The child is killed when the context is done before it exits; the task then
/// fails with the context's error.
#[derive(Debug, Clone)]
pub struct ShellTask {
    command: String,
}

impl ShellTask {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Task for ShellTask {
    async fn run(&self, ctx: Context) -> TaskResult {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ShellError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        debug!(command = %self.command, pid = ?child.id(), "started command");
        let outcome = ctx.until_done(child.wait()).await;
        let status = match outcome {
            Ok(waited) => waited.map_err(|source| ShellError::Wait {
                command: self.command.clone(),
                source,
            })?,
            Err(err) => {
                match child.kill().await {
                    Ok(()) => debug!(command = %self.command, reason = %err, "killed command"),
                    Err(kill_err) => debug!(
                        command = %self.command,
                        reason = %err,
                        error = %kill_err,
                        "failed to kill command"
                    ),
                }
                return Err(err.into());
            }
        };

        if !status.success() {
            return Err(ShellError::Status {
                command: self.command.clone(),
                status,
            }
            .into());
        }
        Ok(())
    }
}
