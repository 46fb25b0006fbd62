//! `gem`: delegate a request to the Gemini CLI as a child process.
//!
//! The child inherits our stdio and we block until it exits. Its exit code is
//! returned untouched; only a failure to start it is treated as our error.

use crate::config::GeminiConfig;
use crate::console::Console;
use crate::error::{Error, Result, exit};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::process::Command;
use tracing::{debug, info};

pub const NPM_PACKAGE: &str = "@google/gemini-cli";

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiRequest<'a> {
    pub prompt: Option<&'a str>,
    pub model: Option<&'a str>,
    /// Comma-separated directories passed through as context.
    pub include_directories: Option<&'a str>,
    /// Forwarded verbatim after our own flags.
    pub extra: &'a [String],
}

/// Argument vector (without the program) for a request.
///
/// An explicit model beats `default_model`. Empty values are treated as absent.
pub fn build_args(request: &GeminiRequest<'_>, default_model: Option<&str>) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(prompt) = present(request.prompt) {
        args.extend(["-p".to_string(), prompt.to_string()]);
    }
    if let Some(model) = present(request.model).or(present(default_model)) {
        args.extend(["-m".to_string(), model.to_string()]);
    }
    if let Some(dirs) = present(request.include_directories) {
        args.extend(["--include-directories".to_string(), dirs.to_string()]);
    }
    args.extend(request.extra.iter().cloned());
    args
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Where npm drops the `gemini.cmd` shim on Windows.
pub fn npm_shim_candidates(appdata: Option<&str>, userprofile: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(appdata) = appdata.filter(|s| !s.is_empty()) {
        candidates.push(Path::new(appdata).join("npm").join("gemini.cmd"));
    }
    if let Some(profile) = userprofile.filter(|s| !s.is_empty()) {
        candidates.push(
            Path::new(profile)
                .join("AppData")
                .join("Roaming")
                .join("npm")
                .join("gemini.cmd"),
        );
    }
    candidates.push(PathBuf::from("gemini.cmd"));
    candidates
}

/// Locate the binary on PATH, falling back to npm shim locations on Windows.
pub fn resolve_binary(bin: &str) -> PathBuf {
    if let Ok(path) = which::which(bin) {
        return path;
    }
    if cfg!(windows) {
        let appdata = std::env::var("APPDATA").ok();
        let profile = std::env::var("USERPROFILE").ok();
        if let Some(shim) = npm_shim_candidates(appdata.as_deref(), profile.as_deref())
            .into_iter()
            .find(|p| p.exists())
        {
            return shim;
        }
    }
    PathBuf::from(bin)
}

/// True when neither an API key nor a non-empty `settings.json` is available.
pub fn needs_authentication(api_key: Option<&str>, settings_path: Option<&Path>) -> bool {
    if api_key.is_some_and(|k| !k.is_empty()) {
        return false;
    }
    settings_path
        .and_then(|p| std::fs::read_to_string(p).ok())
        .is_none_or(|s| s.trim().is_empty())
}

fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gemini").join("settings.json"))
}

pub fn print_install_hint<W: Write>(console: &mut Console<W>) {
    let npm = console.highlight(&format!("npm i -g {NPM_PACKAGE}"));
    let brew = console.highlight("brew install gemini-cli");
    console.line(format!("Install with {npm} or {brew}."));
}

/// Run the Gemini CLI for `request` and return its exit code.
pub async fn invoke<W: Write>(
    config: &GeminiConfig,
    request: &GeminiRequest<'_>,
    console: &mut Console<W>,
) -> i32 {
    if needs_authentication(config.api_key.as_deref(), settings_path().as_deref()) {
        console.warn("Gemini CLI may need authentication.");
        console.line(format!(
            "Set {} or run {} to configure a key; otherwise Gemini CLI will ask you to sign in.",
            config.api_key_env,
            console.highlight("deepgem setup")
        ));
    }

    let program = resolve_binary(&config.bin);
    let args = build_args(request, config.default_model.as_deref());

    match run(&program, &args).await {
        Ok(code) => code,
        Err(e) => {
            console.error("Gemini CLI not found or error:", e.to_string());
            print_install_hint(console);
            e.exit_code()
        }
    }
}

async fn run(program: &Path, args: &[String]) -> Result<i32> {
    debug!(program = %program.display(), ?args, "spawning gemini");
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|e| Error::tool_not_found(program.display().to_string(), e))?;
    let code = exit_status_code(status);
    info!(code, "gemini exited");
    Ok(code)
}

fn exit_status_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    exit::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_follow_flag_order() {
        let extra = vec!["--yolo".to_string(), "--debug".to_string()];
        let request = GeminiRequest {
            prompt: Some("list files"),
            model: Some("gemini-2.5-pro"),
            include_directories: Some("src,docs"),
            extra: &extra,
        };
        assert_eq!(
            build_args(&request, None),
            vec![
                "-p",
                "list files",
                "-m",
                "gemini-2.5-pro",
                "--include-directories",
                "src,docs",
                "--yolo",
                "--debug"
            ]
        );
    }

    #[test]
    fn explicit_model_beats_default() {
        let request = GeminiRequest {
            model: Some("gemini-2.5-pro"),
            ..Default::default()
        };
        assert_eq!(
            build_args(&request, Some("gemini-2.5-flash")),
            vec!["-m", "gemini-2.5-pro"]
        );
    }

    #[test]
    fn default_model_used_when_no_override() {
        let request = GeminiRequest {
            prompt: Some("hi"),
            ..Default::default()
        };
        assert_eq!(
            build_args(&request, Some("gemini-2.5-flash")),
            vec!["-p", "hi", "-m", "gemini-2.5-flash"]
        );
    }

    #[test]
    fn empty_request_passes_only_extra() {
        let extra = vec!["--version".to_string()];
        let request = GeminiRequest {
            prompt: Some(""),
            extra: &extra,
            ..Default::default()
        };
        assert_eq!(build_args(&request, Some("")), vec!["--version"]);
    }

    #[test]
    fn shim_candidates_in_order() {
        let candidates = npm_shim_candidates(Some("C:/Users/a/AppData/Roaming"), Some("C:/Users/a"));
        assert_eq!(candidates.len(), 3);
        assert!(candidates[0].ends_with("npm/gemini.cmd"));
        assert!(candidates[1].starts_with("C:/Users/a/AppData/Roaming"));
        assert_eq!(candidates[2], PathBuf::from("gemini.cmd"));
        assert_eq!(npm_shim_candidates(None, Some("")).len(), 1);
    }

    #[test]
    fn authentication_notice_logic() {
        let dir = tempfile::tempdir().unwrap();
        let settings = dir.path().join("settings.json");

        assert!(!needs_authentication(Some("key"), None));
        assert!(needs_authentication(None, None));
        assert!(needs_authentication(Some(""), Some(&settings)));

        std::fs::write(&settings, "  \n").unwrap();
        assert!(needs_authentication(None, Some(&settings)));

        std::fs::write(&settings, r#"{"selectedAuthType":"oauth-personal"}"#).unwrap();
        assert!(!needs_authentication(None, Some(&settings)));
    }

    #[test]
    fn resolve_binary_keeps_unknown_name() {
        let path = resolve_binary("definitely-not-a-real-gemini-binary");
        if !cfg!(windows) {
            assert_eq!(path, PathBuf::from("definitely-not-a-real-gemini-binary"));
        }
    }
}
