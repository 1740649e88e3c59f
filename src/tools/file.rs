//! File reading tool.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, resolve_path, Tool};

/// Read a file's contents.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the full contents of a file. Use this to examine existing code before planning or changing it."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Path to the file, relative to the workspace"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let file_path = required_str(&args, "file_path")?;
        let path = resolve_path(workspace, file_path);

        tracing::info!("Reading file: {}", path.display());

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                tracing::debug!("Read {} characters from {}", content.len(), path.display());
                Ok(content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(anyhow::anyhow!(
                "File not found at path '{}'",
                file_path
            )),
            Err(e) => Err(anyhow::anyhow!("Failed to read file '{}': {}", file_path, e)),
        }
    }
}
