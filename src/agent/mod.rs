//! Agent module - the core autonomous agent logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt (workflow, tools, workspace tree) and user request
//! 2. Call LLM with available tools
//! 3. If LLM requests tool calls, execute them and feed results back
//! 4. Repeat until LLM produces a final summary or max iterations reached

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, AgentRun, LogEntry, LogEntryType};
pub use prompt::build_system_prompt;
