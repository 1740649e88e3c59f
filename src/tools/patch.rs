//! File writing tool backed by the patch model.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, resolve_path, Tool};
use crate::llm::LlmClient;
use crate::patcher::{apply_patch, PatchOutcome};

/// Create or overwrite a file with model-produced content.
pub struct ApplyPatchToFile {
    llm: Arc<dyn LlmClient>,
    model: String,
}

impl ApplyPatchToFile {
    pub fn new(llm: Arc<dyn LlmClient>, model: String) -> Self {
        Self { llm, model }
    }
}

#[async_trait]
impl Tool for ApplyPatchToFile {
    fn name(&self) -> &str {
        "apply_patch_to_file"
    }

    fn description(&self) -> &str {
        "Write a file. Provide the complete, final content of the file in `new_content`. Missing files are created (with parent directories); existing files are overwritten."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file to write, relative to the workspace"
                },
                "new_content": {
                    "type": "string",
                    "description": "The entire intended content of the file after the change"
                }
            },
            "required": ["file_path", "new_content"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = required_str(&args, "file_path")?;
        let new_content = required_str(&args, "new_content")?;
        let path = resolve_path(workspace, file_path);

        let outcome = apply_patch(self.llm.as_ref(), &self.model, &path, new_content).await?;
        Ok(match outcome {
            PatchOutcome::Created { bytes } => {
                format!("Created {} ({} bytes)", file_path, bytes)
            }
            PatchOutcome::Rewritten { bytes } => {
                format!("Updated {} ({} bytes)", file_path, bytes)
            }
        })
    }
}
