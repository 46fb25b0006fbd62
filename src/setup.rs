//! `deepgem setup`: interactive first-run wizard.
//!
//! Installs the Gemini CLI when npm is available, collects and validates API
//! keys, persists them, then finishes with a doctor run.

use crate::config::Config;
use crate::console::Console;
use crate::doctor;
use crate::envfile;
use crate::error::{Result, exit};
use crate::gemini::NPM_PACKAGE;
use crate::llm::ChatClient;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Source of answers for the wizard.
pub trait Prompter {
    /// Free-form question. An empty answer yields `default`.
    fn ask(&mut self, question: &str, default: &str) -> Result<String>;
    /// Hidden input for secrets.
    fn secret(&mut self, question: &str) -> Result<String>;
}

/// Reads answers from the terminal; secrets are read without echo.
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str, default: &str) -> Result<String> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{question} [{default}]: ")?;
        stdout.flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer.to_string()
        })
    }

    fn secret(&mut self, question: &str) -> Result<String> {
        let answer = rpassword::prompt_password(format!("{question}: "))?;
        Ok(answer.trim().to_string())
    }
}

fn confirm(prompter: &mut dyn Prompter, question: &str, default_yes: bool) -> Result<bool> {
    let default = if default_yes { "Y" } else { "N" };
    let answer = prompter.ask(question, default)?.to_lowercase();
    Ok(if default_yes {
        answer != "n"
    } else {
        answer == "y"
    })
}

/// Where keys are written.
#[derive(Debug, Clone)]
pub struct PersistTargets {
    pub env_file: PathBuf,
    /// Shell startup file that receives an `export` line (never on Windows).
    pub shell_rc: Option<PathBuf>,
    /// Offer `setx` to store the key as a Windows user variable.
    pub windows_user_env: bool,
}

impl PersistTargets {
    pub fn for_current_user() -> Result<Self> {
        let env_file = std::env::current_dir()?.join(".env");
        let shell_rc = if cfg!(windows) {
            None
        } else {
            let shell = std::env::var("SHELL").unwrap_or_default();
            dirs::home_dir().map(|home| envfile::shell_rc_path(&shell, &home))
        };
        Ok(Self {
            env_file,
            shell_rc,
            windows_user_env: cfg!(windows),
        })
    }
}

/// Run the wizard, then doctor. Returns doctor's exit status.
pub async fn run_setup<W: Write>(
    config: Config,
    targets: &PersistTargets,
    prompter: &mut dyn Prompter,
    console: &mut Console<W>,
) -> i32 {
    match wizard(config, targets, prompter, console).await {
        Ok(code) => code,
        Err(e) => {
            console.error("Setup failed:", e.to_string());
            exit::FAILURE
        }
    }
}

async fn wizard<W: Write>(
    mut config: Config,
    targets: &PersistTargets,
    prompter: &mut dyn Prompter,
    console: &mut Console<W>,
) -> Result<i32> {
    console.blank();
    console.heading("Welcome to deepgem setup wizard!");
    console.line("This will help you install dependencies and configure API keys.");
    console.blank();

    let mut configured: Vec<&str> = Vec::new();

    if ensure_gemini_cli(&config, prompter, console).await? {
        configured.push("Gemini CLI");
    }
    if configure_deepseek_key(&mut config, targets, prompter, console).await? {
        configured.push("DeepSeek API key");
    }
    if configure_gemini_key(&mut config, targets, prompter, console).await? {
        configured.push("Gemini API key");
    }

    console.blank();
    console.line("═".repeat(60));
    console.heading("Setup Summary");
    console.blank();
    if !configured.is_empty() {
        console.success("Successfully configured:");
        for item in &configured {
            console.line(format!("  ✅ {item}"));
        }
    }

    console.blank();
    console.line("Running system check...");
    console.line("─".repeat(60));
    Ok(doctor::run_doctor(&config, console).await)
}

/// Returns true when the CLI was installed by this run.
async fn ensure_gemini_cli<W: Write>(
    config: &Config,
    prompter: &mut dyn Prompter,
    console: &mut Console<W>,
) -> Result<bool> {
    if let Ok(path) = which::which(&config.gemini.bin) {
        console.success(format!("✅ Gemini CLI: found at {}", path.display()));
        return Ok(false);
    }

    console.blank();
    console.error("❌ Gemini CLI not found", "");

    if which::which("npm").is_err() {
        console.warn("npm not found. Node.js is required for Gemini CLI.");
        print_node_instructions(console);
        console.blank();
        console.dim("Note: Gemini CLI is optional. DeepSeek features will still work.");
        return Ok(false);
    }

    if !confirm(prompter, "Would you like to install Gemini CLI now? (Y/n)", true)? {
        return Ok(false);
    }

    console.dim(format!("Installing {NPM_PACKAGE}..."));
    let output = Command::new("npm")
        .args(["install", "-g", NPM_PACKAGE])
        .output()
        .await;
    match output {
        Ok(output) if output.status.success() => {
            console.success("✅ Gemini CLI installed successfully!");
            Ok(true)
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(%stderr, "npm install failed");
            console.warn("⚠️  Failed to install Gemini CLI");
            if stderr.contains("EACCES") || stderr.to_lowercase().contains("permission") {
                console.warn("Try running with admin privileges or use:");
                console.line(format!("sudo npm install -g {NPM_PACKAGE}"));
            }
            Ok(false)
        }
        Err(e) => {
            warn!("could not run npm: {e}");
            console.warn("npm is not installed. Node.js is required for Gemini CLI.");
            print_node_instructions(console);
            Ok(false)
        }
    }
}

fn print_node_instructions<W: Write>(console: &mut Console<W>) {
    console.blank();
    console.line("To install Node.js:");
    if cfg!(windows) {
        console.line(format!(
            "  Option 1: {}",
            console.highlight("winget install OpenJS.NodeJS")
        ));
        console.line(format!(
            "  Option 2: Download from {}",
            console.highlight("https://nodejs.org/")
        ));
        console.blank();
        console.warn(
            "After installing Node.js, restart your terminal and run 'deepgem setup' again.",
        );
    } else {
        console.line(format!("  macOS:   {}", console.highlight("brew install node")));
        console.line(format!(
            "  Linux:   {}",
            console.highlight("sudo apt install nodejs npm")
        ));
    }
}

/// Returns true when a validated key was stored.
async fn configure_deepseek_key<W: Write>(
    config: &mut Config,
    targets: &PersistTargets,
    prompter: &mut dyn Prompter,
    console: &mut Console<W>,
) -> Result<bool> {
    console.blank();
    console.heading("DeepSeek API Configuration");

    if config.deepseek.api_key.is_some() {
        console.success("✅ DeepSeek API key: already configured");
        if !confirm(prompter, "Would you like to update it? (y/N)", false)? {
            return Ok(false);
        }
    }

    console.blank();
    console.line(format!(
        "Get your API key at: {}",
        console.highlight("https://platform.deepseek.com/")
    ));
    let key = prompter.secret("Enter your DeepSeek API key (sk-...)")?;
    if key.is_empty() {
        return Ok(false);
    }
    if !key.starts_with("sk-") {
        console.warn("⚠️  Warning: Key should start with 'sk-'");
    }

    console.dim("Testing API key...");
    let key_env = config.deepseek.api_key_env.clone();
    let validation = match ChatClient::new(
        key.clone(),
        &config.deepseek.base_url,
        Duration::from_secs(config.deepseek.timeout_secs),
    ) {
        Ok(client) => client.list_models().await.map(|_| ()),
        Err(e) => Err(e),
    };

    match validation {
        Ok(()) => {
            console.success("✅ API key validated successfully!");
            save_key(&key_env, &key, targets, prompter, console).await?;
            config.deepseek.api_key = Some(key);
            Ok(true)
        }
        Err(e) => {
            console.error("❌ API key validation failed:", e.to_string());
            if confirm(prompter, "Save anyway? (y/N)", false)? {
                save_key(&key_env, &key, targets, prompter, console).await?;
                config.deepseek.api_key = Some(key);
            }
            Ok(false)
        }
    }
}

async fn configure_gemini_key<W: Write>(
    config: &mut Config,
    targets: &PersistTargets,
    prompter: &mut dyn Prompter,
    console: &mut Console<W>,
) -> Result<bool> {
    console.blank();
    console.heading("Gemini API Configuration (Optional)");

    if config.gemini.api_key.is_some() {
        console.success("✅ Gemini API key: already configured");
        return Ok(false);
    }

    console.line("Gemini CLI can use OAuth or API key authentication.");
    console.line(format!(
        "Get API key at: {}",
        console.highlight("https://makersuite.google.com/app/apikey")
    ));
    if !confirm(prompter, "Would you like to add a Gemini API key? (y/N)", false)? {
        return Ok(false);
    }

    let key = prompter.secret("Enter your Gemini API key")?;
    if key.is_empty() {
        return Ok(false);
    }
    let key_env = config.gemini.api_key_env.clone();
    save_key(&key_env, &key, targets, prompter, console).await?;
    config.gemini.api_key = Some(key);
    Ok(true)
}

/// Write `name=value` to the env file, then the shell profile or Windows user env.
async fn save_key<W: Write>(
    name: &str,
    value: &str,
    targets: &PersistTargets,
    prompter: &mut dyn Prompter,
    console: &mut Console<W>,
) -> Result<()> {
    envfile::upsert(&targets.env_file, name, value)?;
    console.success("✅ Saved to .env file");

    if let Some(rc) = &targets.shell_rc {
        if envfile::append_export(rc, name, value)? {
            let file = rc.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();
            console.success(format!("✅ Added to {file}"));
        }
    }

    if targets.windows_user_env
        && confirm(prompter, "Save as Windows environment variable? (Y/n)", true)?
    {
        match Command::new("setx").args([name, value]).output().await {
            Ok(output) if output.status.success() => {
                console.success("✅ Saved as Windows user environment variable");
                console.warn("Note: Restart your terminal for this to take effect");
            }
            Ok(output) => console.warn(format!(
                "⚠️  setx failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )),
            Err(e) => console.warn(format!("⚠️  could not run setx: {e}")),
        }
    }
    Ok(())
}
