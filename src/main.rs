use anyhow::Result;
use clap::Parser;
use deepgem::chat::{self, ChatRequest};
use deepgem::config::Config;
use deepgem::console::Console;
use deepgem::gemini::{self, GeminiRequest};
use deepgem::router::{Engine, RoutingPolicy};
use deepgem::setup::{self, PersistTargets, TerminalPrompter};
use deepgem::{doctor, error::exit};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "deepgem", version, about = "DeepSeek ↔ Gemini CLI agent")]
struct Cli {
    /// Path to an optional config file
    #[arg(long, global = true, default_value = "deepgem.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Talk to DeepSeek (OpenAI-compatible)
    Chat {
        /// Your message
        prompt: String,

        /// deepseek-chat or deepseek-reasoner (defaults to the configured chat model)
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt
        #[arg(short, long)]
        system: Option<String>,

        /// Disable token streaming
        #[arg(long)]
        no_stream: bool,
    },

    /// Delegate to Gemini CLI (great for coding, shell tools, MCP, web)
    Gem {
        /// Prompt to run non-interactively
        #[arg(short, long)]
        prompt: Option<String>,

        /// Gemini model, e.g. gemini-2.5-pro
        #[arg(short, long)]
        model: Option<String>,

        /// Comma-separated dirs to include as context
        #[arg(long)]
        include_directories: Option<String>,

        /// Pass-through args to `gemini`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Smart router: Gemini CLI for code/tool tasks; DeepSeek for chat/reasoning
    Ask {
        /// Your request
        prompt: String,

        /// 'gemini' | 'deepseek-chat' | 'deepseek-reasoner'
        #[arg(short, long)]
        force: Option<String>,

        /// System prompt for DeepSeek
        #[arg(short, long)]
        system: Option<String>,

        /// Override Gemini model
        #[arg(long)]
        gem_model: Option<String>,

        /// Dirs gemini should scan (comma-separated)
        #[arg(long)]
        include_directories: Option<String>,
    },

    /// Interactive setup wizard: installs Gemini CLI and configures API keys
    Setup,

    /// Check your deepgem setup and diagnose common issues
    Doctor,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("deepgem=warn")),
        )
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config =
        Config::load_or_default(&cli.config)?.with_env_overrides(|k| std::env::var(k).ok());

    let mut console = Console::stdout();
    if config.ui.banner {
        console.banner();
    }

    let code = match cli.command {
        None => {
            console.dim("Use 'deepgem --help' to see commands.");
            exit::SUCCESS
        }
        Some(Command::Chat {
            prompt,
            model,
            system,
            no_stream,
        }) => {
            let model = model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| config.deepseek.chat_model.clone());
            let request = ChatRequest {
                prompt: &prompt,
                model: &model,
                system: system.as_deref(),
                stream: !no_stream,
            };
            chat::send(&config.deepseek, &request, &mut console).await
        }
        Some(Command::Gem {
            prompt,
            model,
            include_directories,
            extra,
        }) => {
            let request = GeminiRequest {
                prompt: prompt.as_deref(),
                model: model.as_deref(),
                include_directories: include_directories.as_deref(),
                extra: &extra,
            };
            gemini::invoke(&config.gemini, &request, &mut console).await
        }
        Some(Command::Ask {
            prompt,
            force,
            system,
            gem_model,
            include_directories,
        }) => {
            let engine = RoutingPolicy::from_config(&config.router)
                .classify(&prompt, force.as_deref());
            info!(%engine, "routed");
            console.dim(format!("engine: {engine}"));
            match engine {
                Engine::Gemini => {
                    let request = GeminiRequest {
                        prompt: Some(&prompt),
                        model: gem_model.as_deref(),
                        include_directories: include_directories.as_deref(),
                        extra: &[],
                    };
                    gemini::invoke(&config.gemini, &request, &mut console).await
                }
                Engine::DeepSeekChat | Engine::DeepSeekReasoner => {
                    let model = if engine == Engine::DeepSeekReasoner {
                        &config.deepseek.reasoner_model
                    } else {
                        &config.deepseek.chat_model
                    };
                    let request = ChatRequest {
                        prompt: &prompt,
                        model,
                        system: system.as_deref(),
                        stream: true,
                    };
                    chat::send(&config.deepseek, &request, &mut console).await
                }
            }
        }
        Some(Command::Setup) => {
            let targets = PersistTargets::for_current_user()?;
            setup::run_setup(config, &targets, &mut TerminalPrompter, &mut console).await
        }
        Some(Command::Doctor) => doctor::run_doctor(&config, &mut console).await,
    };

    Ok(to_exit_code(code))
}

/// Codes outside 0..=255 (Windows) collapse to a generic failure.
fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
