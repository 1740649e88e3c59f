//! Host-side tools the model can call.
//!
//! Each tool describes itself with a JSON schema and runs against the
//! workspace directory. The registry owns the tool set and dispatches calls
//! by name.

mod file;
mod human;
mod patch;
mod search;
mod terminal;

pub use file::ReadFile;
pub use human::AskHuman;
pub use patch::ApplyPatchToFile;
pub use search::Grep;
pub use terminal::{RunBashCommand, DENIED_MESSAGE};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::console::Console;
use crate::llm::{FunctionSchema, LlmClient, ToolSchema};

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Collaborators the tools need beyond the workspace path.
#[derive(Clone)]
pub struct ToolContext {
    pub llm: Arc<dyn LlmClient>,
    pub patch_model: String,
    pub console: Arc<dyn Console>,
    pub command_timeout_secs: u64,
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Registry with every coding tool.
    pub fn new(ctx: ToolContext) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ReadFile));
        registry.register(Arc::new(Grep));
        registry.register(Arc::new(ApplyPatchToFile::new(
            ctx.llm.clone(),
            ctx.patch_model.clone(),
        )));
        registry.register(Arc::new(RunBashCommand::new(
            ctx.console.clone(),
            ctx.command_timeout_secs,
        )));
        registry.register(Arc::new(AskHuman::new(ctx.console)));
        registry
    }

    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Tools in registration order.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.ordered()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.ordered()
            .map(|t| ToolSchema {
                tool_type: "function".to_string(),
                function: FunctionSchema {
                    name: t.name().to_string(),
                    description: t.description().to_string(),
                    parameters: t.parameters_schema(),
                },
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;
        tool.execute(args, workspace).await
    }

    fn ordered(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.order.iter().filter_map(|n| self.tools.get(n))
    }
}

/// Resolve a tool-supplied path against the workspace.
pub(crate) fn resolve_path(workspace: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}
