//! # coder
//!
//! A command-line coding agent with host-side tools.
//!
//! This library provides:
//! - A tool-based agent loop that turns a development request into file
//!   edits and confirmed shell commands
//! - An OpenAI-compatible LLM client (OpenRouter by default)
//! - A gitignore-style path filter and a whole-repository prompt builder
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a request from the command line
//! 2. Build context with system prompt, workspace tree and available tools
//! 3. Call LLM, parse response, execute any tool calls
//! 4. Feed results back to LLM, repeat until it returns a summary
//!
//! ## Example
//!
//! ```rust,ignore
//! use coder_agent::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config, llm, tools);
//! let run = agent.run_task("Add a --verbose flag").await?;
//! println!("{}", run.summary);
//! ```

pub mod agent;
pub mod config;
pub mod console;
pub mod dir_tree;
pub mod llm;
pub mod patcher;
pub mod path_filter;
pub mod prompt_builder;
pub mod tools;

pub use config::Config;
