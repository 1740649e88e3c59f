//! OpenRouter (OpenAI-compatible) chat completions client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ChatMessage, ChatResponse, LlmClient, TokenUsage, ToolCall, ToolSchema};

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";

/// Client for any endpoint exposing `POST /chat/completions`.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base(api_key, DEFAULT_API_BASE.to_string())
    }

    pub fn with_base(api_key: String, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_base,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

fn request_body(model: &str, messages: &[ChatMessage], tools: Option<&[ToolSchema]>) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if let Some(tools) = tools.filter(|t| !t.is_empty()) {
        body["tools"] = json!(tools);
        body["tool_choice"] = json!("auto");
    }

    body
}

fn parse_response(raw: &str) -> anyhow::Result<ChatResponse> {
    let parsed: CompletionResponse = serde_json::from_str(raw)
        .map_err(|e| anyhow::anyhow!("Invalid completion response: {} (body: {})", e, raw))?;

    let message = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Completion response contained no choices"))?
        .message;

    Ok(ChatResponse {
        content: message.content.filter(|c| !c.is_empty()),
        tool_calls: message.tool_calls,
        usage: parsed.usage,
    })
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> anyhow::Result<ChatResponse> {
        let body = request_body(model, messages, tools);

        tracing::debug!(
            "Requesting completion from {} ({} messages)",
            model,
            messages.len()
        );

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to reach LLM endpoint: {}", e))?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "LLM request failed with status {}: {}",
                status,
                text
            ));
        }

        let response = parse_response(&text)?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                "Token usage: prompt={} completion={}",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }
        Ok(response)
    }
}
