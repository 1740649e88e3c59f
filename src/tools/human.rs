//! Ask the human for input.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, Tool};
use crate::console::Console;

/// Put a question to the user and return their answer.
pub struct AskHuman {
    console: Arc<dyn Console>,
}

impl AskHuman {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }
}

#[async_trait]
impl Tool for AskHuman {
    fn name(&self) -> &str {
        "ask_human_for_help"
    }

    fn description(&self) -> &str {
        "Ask the human user a question when you need input or clarification. Returns their reply."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question or request for clarification"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let question = required_str(&args, "question")?;
        tracing::info!("Asking human for help: {}", question);

        let answer = self
            .console
            .prompt(&format!("\n[Agent is asking]: {}\n> ", question))
            .await
            .map_err(|e| anyhow::anyhow!("Error obtaining user input: {}", e))?;

        tracing::debug!("Human replied with {} characters", answer.len());
        Ok(answer)
    }
}
