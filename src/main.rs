//! coder - command-line entry point.
//!
//! Runs the coding agent on a request given inline or in a file, or one of
//! the helper commands (repository prompt, tree, single-file patch).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use coder_agent::agent::Agent;
use coder_agent::config::Config;
use coder_agent::console::StdioConsole;
use coder_agent::dir_tree::{render_tree, TreeOptions};
use coder_agent::llm::{LlmClient, OpenRouterClient};
use coder_agent::patcher::apply_patch;
use coder_agent::prompt_builder::build_repository_prompt;
use coder_agent::tools::{ToolContext, ToolRegistry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coder", version)]
#[command(about = "AI software developer agent. Provide a prompt directly or via a file.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    /// The development task/instruction for the agent
    prompt: Option<String>,

    /// Path to a file containing the prompt for the agent
    #[arg(short = 'p', long = "prompt-file", conflicts_with = "prompt")]
    prompt_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a whole-repository prompt for a problem (pipe it to your clipboard)
    Prompt {
        /// Problem statement
        problem: Option<String>,

        /// Read the problem statement from a file
        #[arg(long, conflicts_with = "problem")]
        problem_file: Option<PathBuf>,

        /// Repository root
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },

    /// Print a directory tree
    Tree {
        /// Directory to start from
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Maximum depth to descend
        #[arg(short = 'L')]
        level: Option<usize>,

        /// Comma-separated names to leave out
        #[arg(short = 'I', value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Apply patch instructions (or full content) to a single file
    Patch {
        /// File to patch
        file: PathBuf,

        /// Patch instructions or description
        patch: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coder_agent=info,coder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Tree {
            dir,
            level,
            exclude,
        }) => {
            let options = TreeOptions {
                max_level: level,
                exclude,
            };
            println!("{}", render_tree(&dir, &options));
        }
        Some(Command::Prompt {
            problem,
            problem_file,
            root,
        }) => {
            let problem = match (problem, problem_file) {
                (Some(problem), _) => problem,
                (None, Some(path)) => read_text_file(&path)?,
                (None, None) => {
                    return Err(anyhow::anyhow!("Provide a problem statement or --problem-file"))
                }
            };
            println!("{}", build_repository_prompt(&root, &problem)?);
        }
        Some(Command::Patch { file, patch }) => {
            let config = Config::from_env()?;
            let llm = OpenRouterClient::with_base(config.api_key.clone(), config.api_base.clone());
            let path = if file.is_absolute() {
                file
            } else {
                config.workspace_path.join(file)
            };
            let outcome = apply_patch(&llm, &config.patch_model, &path, &patch).await?;
            println!("{}: {}", path.display(), outcome);
        }
        None => {
            let prompt = match (cli.run.prompt, cli.run.prompt_file) {
                (Some(prompt), _) => prompt,
                (None, Some(path)) => read_text_file(&path)?,
                (None, None) => String::new(),
            };
            if prompt.trim().is_empty() {
                tracing::error!("No prompt provided.");
                Cli::command().print_help()?;
                std::process::exit(1);
            }

            let config = Config::from_env()?;
            info!(
                "Loaded configuration: model={} workspace={}",
                config.default_model,
                config.workspace_path.display()
            );

            tokio::select! {
                ok = process_request(&config, &prompt) => {
                    if !ok {
                        std::process::exit(1);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Process interrupted by user.");
                }
            }
        }
    }

    Ok(())
}

/// Run the agent on one request and print the outcome. Returns whether the
/// run succeeded.
async fn process_request(config: &Config, user_query: &str) -> bool {
    let llm: Arc<dyn LlmClient> = Arc::new(OpenRouterClient::with_base(
        config.api_key.clone(),
        config.api_base.clone(),
    ));
    let tools = ToolRegistry::new(ToolContext {
        llm: llm.clone(),
        patch_model: config.patch_model.clone(),
        console: Arc::new(StdioConsole),
        command_timeout_secs: config.command_timeout_secs,
    });
    let agent = Agent::new(config, llm, tools);

    let preview: String = user_query.chars().take(100).collect();
    info!("Received user query: '{}...'", preview);
    info!("Running agent in {}", agent.workspace().display());

    match agent.run_task(user_query).await {
        Ok(run) => {
            info!(
                "Agent finished after {} iterations ({} log entries)",
                run.iterations,
                run.log.len()
            );
            println!("\n--- Agent Summary ---");
            println!("{}", run.summary);
            println!("---------------------\n");
            true
        }
        Err(e) => {
            tracing::error!("Agent run failed: {:#}", e);
            eprintln!("\n--- Agent Error ---\n{:#}\n-------------------\n", e);
            false
        }
    }
}

fn read_text_file(path: &Path) -> anyhow::Result<String> {
    info!("Reading prompt from file: {}", path.display());
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Error reading prompt file '{}': {}", path.display(), e))
}
