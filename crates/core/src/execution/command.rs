//! Command execution utilities
//!
//! This module provides a unified interface for executing different types of commands
//! (shell commands, scripts, executable with args) with consistent error handling and logging.
//! Commands always run from the project root and are killed if the task driving them
//! is dropped.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use sluice_plugin_protocol::CollaboratorError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::types::{SluiceError, SluiceResult};

/// Unified command executor that handles common setup and execution patterns
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    root: PathBuf,
    env: Vec<(String, String)>,
}

impl CommandExecutor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable passed to every command
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn prepare(&self, command: &mut Command) {
        command.current_dir(&self.root).kill_on_drop(true);
        for (key, value) in &self.env {
            command.env(key, value);
        }
    }

    /// Execute a command with common setup and error handling
    async fn execute_command(
        &self,
        command: &mut Command,
        execution_error_message: &str,
        failure_error_message: &str,
    ) -> SluiceResult<()> {
        self.prepare(command);

        let status = command
            .status()
            .await
            .map_err(|e| SluiceError::Task(format!("{}: {}", execution_error_message, e)))?;

        if !status.success() {
            return Err(SluiceError::Task(format!(
                "{}: {}",
                failure_error_message,
                status.code().unwrap_or(-1)
            )));
        }

        Ok(())
    }

    /// Execute a script file
    pub async fn execute_script(&self, script_path: &str) -> SluiceResult<()> {
        let script_path_buf = PathBuf::from(script_path);

        // Relative scripts live under the project root
        let full_script_path = if script_path_buf.is_relative() {
            self.root.join(script_path_buf)
        } else {
            script_path_buf
        };

        if !full_script_path.exists() {
            return Err(SluiceError::Task(format!(
                "Script file '{}' not found",
                full_script_path.display()
            )));
        }

        let mut command = Command::new(&full_script_path);
        self.execute_command(
            &mut command,
            &format!("Failed to execute script: {}", full_script_path.display()),
            "Script execution failed with exit code",
        )
        .await
    }

    /// Execute a command with arguments
    pub async fn execute_command_with_args(
        &self,
        command_path: &str,
        args: &[String],
    ) -> SluiceResult<()> {
        let mut command = Command::new(command_path);
        command.args(args);
        self.execute_command(
            &mut command,
            &format!("Failed to execute command '{}'", command_path),
            &format!("Command '{}' failed with exit code", command_path),
        )
        .await
    }

    /// Execute a single shell command
    pub async fn execute_shell_command(&self, cmd: &str) -> SluiceResult<()> {
        let mut command = Command::new("sh");
        command.arg("-c").arg(cmd);
        self.execute_command(
            &mut command,
            &format!("Failed to execute command '{}'", cmd),
            &format!("Command '{}' failed with exit code", cmd),
        )
        .await
    }

    /// Run a tool, feed it `stdin` and capture its output.
    ///
    /// A tool that cannot be spawned is [`CollaboratorError::Unavailable`]; a
    /// non-zero exit is [`CollaboratorError::Rejected`] carrying its stderr.
    pub async fn capture(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&[u8]>,
    ) -> Result<Output, CollaboratorError> {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        self.prepare(&mut command);
        debug!(program, ?args, "running collaborator command");

        let mut child = command
            .spawn()
            .map_err(|e| CollaboratorError::unavailable(program, e.to_string()))?;

        // stdin is written while output is collected so large inputs cannot fill both pipes
        let pipe = child.stdin.take();
        let feed = async move {
            if let (Some(input), Some(mut pipe)) = (stdin, pipe) {
                pipe.write_all(input).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with code {}", output.status.code().unwrap_or(-1))
            } else {
                stderr
            };
            return Err(CollaboratorError::rejected(program, message));
        }
        fed?;
        Ok(output)
    }
}
