//! Human-in-the-loop input.
//!
//! Tools that need a person (command confirmation, clarifying questions) go
//! through [`Console`] so they can be driven by a script in tests.

use std::io::{BufRead, Write};
use std::sync::Mutex;

use async_trait::async_trait;

#[async_trait]
pub trait Console: Send + Sync {
    /// Show `message` and return one line typed by the user, without the
    /// trailing newline.
    async fn prompt(&self, message: &str) -> anyhow::Result<String>;
}

/// Reads answers from stdin, prompting on stdout.
pub struct StdioConsole;

#[async_trait]
impl Console for StdioConsole {
    async fn prompt(&self, message: &str) -> anyhow::Result<String> {
        let message = message.to_string();
        tokio::task::spawn_blocking(move || {
            let mut stdout = std::io::stdout().lock();
            write!(stdout, "{}", message)?;
            stdout.flush()?;
            drop(stdout);

            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line)?;
            if read == 0 {
                return Err(anyhow::anyhow!("stdin closed while waiting for input"));
            }
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
        .await
        .map_err(|e| anyhow::anyhow!("Input task failed: {}", e))?
    }
}

/// Replays canned answers in order and records every prompt shown.
#[derive(Default)]
pub struct ScriptedConsole {
    answers: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Console for ScriptedConsole {
    async fn prompt(&self, message: &str) -> anyhow::Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(message.to_string());
        }
        self.answers
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted console poisoned"))?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("scripted console has no more answers"))
    }
}
