//! Core agent loop implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::dir_tree::{render_tree, TreeOptions};
use crate::llm::{ChatMessage, LlmClient, Role, ToolCall};
use crate::tools::ToolRegistry;

use super::prompt::build_system_prompt;

/// Kind of an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    ToolCall,
    ToolResult,
    Response,
}

/// A single entry in the execution log.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,
    pub entry_type: LogEntryType,
    pub content: String,
}

impl LogEntry {
    fn new(entry_type: LogEntryType, content: String) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            entry_type,
            content,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// The model's final summary.
    pub summary: String,
    pub iterations: usize,
    pub log: Vec<LogEntry>,
}

/// The coding agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    model: String,
    workspace: PathBuf,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent from configuration and its collaborators.
    pub fn new(config: &Config, llm: Arc<dyn LlmClient>, tools: ToolRegistry) -> Self {
        Self {
            llm,
            tools,
            model: config.default_model.clone(),
            workspace: config.workspace_path.clone(),
            max_iterations: config.max_iterations,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Run a request to completion and return the final summary with the
    /// execution log.
    pub async fn run_task(&self, task: &str) -> anyhow::Result<AgentRun> {
        let mut log = Vec::new();

        let tree = render_tree(&self.workspace, &TreeOptions::default());
        let system_prompt = build_system_prompt(&self.tools, &tree);
        let mut messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(task)];

        let tool_schemas = self.tools.get_tool_schemas();

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let response = self
                .llm
                .chat_completion(&self.model, &messages, Some(tool_schemas.as_slice()))
                .await?;

            if let Some(tool_calls) = response.tool_calls.filter(|c| !c.is_empty()) {
                messages.push(ChatMessage {
                    role: Role::Assistant,
                    content: response.content.clone(),
                    tool_calls: Some(tool_calls.clone()),
                    tool_call_id: None,
                });

                for tool_call in &tool_calls {
                    log.push(LogEntry::new(
                        LogEntryType::ToolCall,
                        format!(
                            "Calling tool: {} with args: {}",
                            tool_call.function.name, tool_call.function.arguments
                        ),
                    ));

                    let result_str = match self.execute_tool_call(tool_call).await {
                        Ok(output) => output,
                        Err(e) => {
                            tracing::warn!("Tool {} failed: {}", tool_call.function.name, e);
                            format!("Error: {}", e)
                        }
                    };

                    log.push(LogEntry::new(
                        LogEntryType::ToolResult,
                        truncate_for_log(&result_str, 1000),
                    ));

                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result_str));
                }

                continue;
            }

            // No tool calls - this is the final response
            if let Some(content) = response.content {
                log.push(LogEntry::new(
                    LogEntryType::Response,
                    truncate_for_log(&content, 2000),
                ));
                return Ok(AgentRun {
                    summary: content,
                    iterations: iteration + 1,
                    log,
                });
            }

            return Err(anyhow::anyhow!("LLM returned empty response"));
        }

        Err(anyhow::anyhow!(
            "Max iterations ({}) reached without completion",
            self.max_iterations
        ))
    }

    /// Execute a single tool call. Unparseable arguments are passed as null
    /// so the tool reports which argument is missing.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> anyhow::Result<String> {
        let args: serde_json::Value = serde_json::from_str(&tool_call.function.arguments)
            .unwrap_or(serde_json::Value::Null);

        tracing::info!("Dispatching tool: {}", tool_call.function.name);
        self.tools
            .execute(&tool_call.function.name, args, &self.workspace)
            .await
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... [truncated]", &s[..cut])
}
