//! Shell command execution, gated on human confirmation.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::{required_str, Tool};
use crate::console::Console;

pub const DENIED_MESSAGE: &str = "Command execution denied by user.";

const MAX_OUTPUT_BYTES: usize = 10_000;

/// Run a shell command after the user approves it.
pub struct RunBashCommand {
    console: Arc<dyn Console>,
    timeout_secs: u64,
}

impl RunBashCommand {
    pub fn new(console: Arc<dyn Console>, timeout_secs: u64) -> Self {
        Self {
            console,
            timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for RunBashCommand {
    fn name(&self) -> &str {
        "run_bash_command"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace directory (tests, builds, installing dependencies). The user is asked to confirm before it runs; explain why the command is needed. Returns the return code, stdout and stderr."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let command = required_str(&args, "command")?;

        tracing::info!("Requesting permission to run command: {}", command);
        let answer = self
            .console
            .prompt(&format!(
                "Allow execution of command? [y/N]: '{}'\n> ",
                command
            ))
            .await?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            tracing::warn!("User denied command execution: {}", command);
            return Ok(DENIED_MESSAGE.to_string());
        }

        tracing::info!("Executing command: {}", command);

        // Determine shell based on OS
        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let output = tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            Command::new(shell)
                .arg(shell_arg)
                .arg(command)
                .current_dir(workspace)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Command timed out after {} seconds", self.timeout_secs))?
        .map_err(|e| anyhow::anyhow!("Failed to execute command '{}': {}", command, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut result = format!("Command: {}\nReturn Code: {}\n", command, exit_code);

        if !stdout.trim().is_empty() {
            tracing::debug!("Command stdout: {}", stdout.trim());
            result.push_str(&format!("STDOUT:\n{}\n", stdout.trim()));
        }

        if !stderr.trim().is_empty() {
            tracing::warn!("Command stderr: {}", stderr.trim());
            result.push_str(&format!("STDERR:\n{}\n", stderr.trim()));
        }

        Ok(truncate_output(result))
    }
}

fn truncate_output(mut result: String) -> String {
    if result.len() > MAX_OUTPUT_BYTES {
        let mut cut = MAX_OUTPUT_BYTES;
        while !result.is_char_boundary(cut) {
            cut -= 1;
        }
        result.truncate(cut);
        result.push_str("\n... [output truncated]");
    }
    result
}
