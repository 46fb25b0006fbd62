//! `deepgem doctor`: diagnose the local setup.
//!
//! Each check yields Pass, Warn or Fail. Failures make the command exit 1;
//! warnings are reported but do not.

use crate::config::{Config, DeepSeekConfig, GeminiConfig};
use crate::console::Console;
use crate::error::exit;
use crate::gemini::NPM_PACKAGE;
use crate::llm::ChatClient;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    /// What to do about a warning or failure.
    pub advice: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Pass,
            message: message.into(),
            advice: None,
        }
    }

    fn warn(name: &'static str, message: impl Into<String>, advice: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Warn,
            message: message.into(),
            advice: Some(advice.into()),
        }
    }

    fn fail(name: &'static str, message: impl Into<String>, advice: impl Into<String>) -> Self {
        Self {
            name,
            status: CheckStatus::Fail,
            message: message.into(),
            advice: Some(advice.into()),
        }
    }
}

/// Run every applicable check.
///
/// The Gemini key is only checked when the CLI is installed, and the network
/// probe only runs when a DeepSeek key exists and nothing has failed so far.
pub async fn collect_checks(config: &Config) -> Vec<CheckResult> {
    let mut results = vec![check_deepseek_key(&config.deepseek)];

    let (cli, gemini_path) = check_gemini_cli(&config.gemini);
    results.push(cli);
    if gemini_path.is_some() {
        results.push(check_gemini_key(&config.gemini));
    }

    let any_failed = results.iter().any(|r| r.status == CheckStatus::Fail);
    if config.deepseek.api_key.is_some() && !any_failed {
        results.push(check_deepseek_connectivity(&config.deepseek).await);
    }
    results
}

fn check_deepseek_key(config: &DeepSeekConfig) -> CheckResult {
    const NAME: &str = "DeepSeek API key";
    match config.api_key.as_deref() {
        Some(key) if key.starts_with("sk-") => CheckResult::pass(NAME, "configured"),
        Some(_) => CheckResult::warn(
            NAME,
            "found but may be invalid",
            format!("{} should start with 'sk-'", config.api_key_env),
        ),
        None => CheckResult::fail(
            NAME,
            "not found",
            format!("Set {} environment variable", config.api_key_env),
        ),
    }
}

fn check_gemini_cli(config: &GeminiConfig) -> (CheckResult, Option<PathBuf>) {
    const NAME: &str = "Gemini CLI";
    match which::which(&config.bin) {
        Ok(path) => (
            CheckResult::pass(NAME, format!("found at {}", path.display())),
            Some(path),
        ),
        Err(e) => {
            debug!(bin = %config.bin, "gemini lookup failed: {e}");
            (
                CheckResult::fail(
                    NAME,
                    "not found",
                    format!("Install with: npm install -g {NPM_PACKAGE}"),
                ),
                None,
            )
        }
    }
}

fn check_gemini_key(config: &GeminiConfig) -> CheckResult {
    const NAME: &str = "Gemini API key";
    if config.api_key.is_some() {
        CheckResult::pass(NAME, "configured")
    } else {
        CheckResult::warn(
            NAME,
            "not found",
            format!("{} not set - Gemini may require OAuth instead", config.api_key_env),
        )
    }
}

async fn check_deepseek_connectivity(config: &DeepSeekConfig) -> CheckResult {
    const NAME: &str = "DeepSeek API";
    let outcome = match ChatClient::from_config(config) {
        Ok(client) => client.list_models().await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(models) => {
            debug!(count = models.len(), "models listed");
            CheckResult::pass(NAME, "connected successfully")
        }
        Err(e) => {
            let detail: String = e.to_string().chars().take(100).collect();
            CheckResult::warn(
                NAME,
                "connection failed",
                format!("DeepSeek connection error: {detail}"),
            )
        }
    }
}

/// Run the checks, print a report and return the exit status.
pub async fn run_doctor<W: Write>(config: &Config, console: &mut Console<W>) -> i32 {
    console.blank();
    console.heading("deepgem doctor - Checking your setup...");
    console.blank();

    let results = collect_checks(config).await;
    for result in &results {
        print_check(console, result);
    }
    print_summary(console, &results, config);

    if results.iter().any(|r| r.status == CheckStatus::Fail) {
        exit::FAILURE
    } else {
        exit::SUCCESS
    }
}

fn print_check<W: Write>(console: &mut Console<W>, result: &CheckResult) {
    let line = format!("{}: {}", result.name, result.message);
    match result.status {
        CheckStatus::Pass => console.success(format!("✅ {line}")),
        CheckStatus::Warn => console.warn(format!("⚠️  {line}")),
        CheckStatus::Fail => console.error(&format!("❌ {}:", result.name), &result.message),
    }
}

fn advice_for(results: &[CheckResult], status: CheckStatus) -> Vec<&str> {
    results
        .iter()
        .filter(|r| r.status == status)
        .filter_map(|r| r.advice.as_deref())
        .collect()
}

fn print_summary<W: Write>(console: &mut Console<W>, results: &[CheckResult], config: &Config) {
    let issues = advice_for(results, CheckStatus::Fail);
    let warnings = advice_for(results, CheckStatus::Warn);

    console.blank();
    console.line("─".repeat(50));
    console.blank();

    if issues.is_empty() && warnings.is_empty() {
        console.success("✨ All systems operational!");
        console.blank();
        console.line("Try these commands:");
        console.line("  deepgem chat \"Hello, world!\"");
        console.line("  deepgem ask \"Write a Python hello world script\"");
        if which::which(&config.gemini.bin).is_ok() {
            console.line("  deepgem gem -p \"List files in current directory\"");
        }
    } else if !issues.is_empty() {
        console.error(&format!("Found {} issue(s) to fix:", issues.len()), "");
        for (i, issue) in issues.iter().enumerate() {
            console.line(format!("  {}. {issue}", i + 1));
        }
        if !warnings.is_empty() {
            console.blank();
            console.warn(format!("Also {} warning(s):", warnings.len()));
            for warning in &warnings {
                console.line(format!("  ⚠️  {warning}"));
            }
        }
    } else {
        console.warn(format!(
            "Setup looks good with {} warning(s):",
            warnings.len()
        ));
        for warning in &warnings {
            console.line(format!("  ⚠️  {warning}"));
        }
        console.blank();
        console.success("You should be ready to use deepgem!");
    }
    console.blank();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deepseek(key: Option<&str>) -> DeepSeekConfig {
        DeepSeekConfig {
            api_key: key.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn deepseek_key_statuses() {
        assert_eq!(check_deepseek_key(&deepseek(None)).status, CheckStatus::Fail);
        assert_eq!(
            check_deepseek_key(&deepseek(Some("abc"))).status,
            CheckStatus::Warn
        );
        assert_eq!(
            check_deepseek_key(&deepseek(Some("sk-abc"))).status,
            CheckStatus::Pass
        );
    }

    #[test]
    fn missing_gemini_cli_fails_with_install_advice() {
        let config = GeminiConfig {
            bin: "definitely-not-a-real-gemini-binary".into(),
            ..Default::default()
        };
        let (result, path) = check_gemini_cli(&config);
        assert_eq!(result.status, CheckStatus::Fail);
        assert!(path.is_none());
        assert!(result.advice.unwrap().contains("npm install -g @google/gemini-cli"));
    }

    #[test]
    fn gemini_key_missing_is_only_a_warning() {
        let result = check_gemini_key(&GeminiConfig::default());
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.advice.unwrap().contains("OAuth"));
    }

    #[tokio::test]
    async fn connectivity_skipped_without_key() {
        let config = Config {
            gemini: GeminiConfig {
                bin: "definitely-not-a-real-gemini-binary".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let results = collect_checks(&config).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.name != "DeepSeek API"));
    }

    #[test]
    fn advice_is_grouped_by_status() {
        let results = vec![
            CheckResult::fail("a", "x", "fix a"),
            CheckResult::warn("b", "y", "mind b"),
            CheckResult::pass("c", "ok"),
        ];
        assert_eq!(advice_for(&results, CheckStatus::Fail), vec!["fix a"]);
        assert_eq!(advice_for(&results, CheckStatus::Warn), vec!["mind b"]);
    }
}
