//! Configuration management for coder.
//!
//! Configuration is read once at startup (after loading `.env`, if present)
//! and passed explicitly to every component that needs it:
//! - `OPENROUTER_API_KEY` - Required for commands that call a model.
//! - `LLM_API_BASE` - Optional. OpenAI-compatible endpoint. Defaults to `https://openrouter.ai/api/v1`.
//! - `DEFAULT_MODEL` - Optional. Model driving the agent. Defaults to `google/gemini-2.5-pro-preview`.
//! - `PATCH_MODEL` - Optional. Model used to apply patches. Defaults to `google/gemini-2.0-flash-001`.
//! - `WORKSPACE_PATH` - Optional. The workspace directory. Defaults to current directory.
//! - `MAX_ITERATIONS` - Optional. Maximum agent loop iterations. Defaults to `50`.
//! - `COMMAND_TIMEOUT_SECS` - Optional. Timeout for confirmed shell commands. Defaults to `120`.

use std::path::PathBuf;
use thiserror::Error;

use crate::llm::DEFAULT_API_BASE;

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-pro-preview";
pub const DEFAULT_PATCH_MODEL: &str = "google/gemini-2.0-flash-001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the chat completions endpoint
    pub api_key: String,

    /// Base URL of the chat completions endpoint
    pub api_base: String,

    /// Model driving the agent loop
    pub default_model: String,

    /// Model that rewrites files for `apply_patch_to_file`
    pub patch_model: String,

    /// Workspace directory for file operations
    pub workspace_path: PathBuf,

    /// Maximum iterations for the agent loop
    pub max_iterations: usize,

    /// Timeout for shell commands run by the agent
    pub command_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENROUTER_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".to_string()))?;

        let api_base =
            std::env::var("LLM_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let patch_model =
            std::env::var("PATCH_MODEL").unwrap_or_else(|_| DEFAULT_PATCH_MODEL.to_string());

        let workspace_path = std::env::var("WORKSPACE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

        let max_iterations = parse_env("MAX_ITERATIONS", 50)?;
        let command_timeout_secs = parse_env("COMMAND_TIMEOUT_SECS", 120)?;

        Ok(Self {
            api_key,
            api_base,
            default_model,
            patch_model,
            workspace_path,
            max_iterations,
            command_timeout_secs,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String, workspace_path: PathBuf) -> Self {
        Self {
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            default_model,
            patch_model: DEFAULT_PATCH_MODEL.to_string(),
            workspace_path,
            max_iterations: 50,
            command_timeout_secs: 120,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}
