use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const GEMINI_BIN: &str = "GEMINI_BIN";
pub const DEFAULT_GEMINI_MODEL: &str = "DEEPGEM_DEFAULT_GEMINI_MODEL";
pub const NO_BANNER: &str = "DEEPGEM_NO_BANNER";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub deepseek: DeepSeekConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// OpenAI-compatible chat-completion backend.
#[derive(Debug, Clone, Deserialize)]
pub struct DeepSeekConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_deepseek_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_reasoner_model")]
    pub reasoner_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Resolved from `api_key_env`; never read from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_deepseek_key_env(),
            chat_model: default_chat_model(),
            reasoner_model: default_reasoner_model(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_bin")]
    pub bin: String,
    #[serde(default)]
    pub default_model: Option<String>,
    #[serde(default = "default_gemini_key_env")]
    pub api_key_env: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            bin: default_gemini_bin(),
            default_model: None,
            api_key_env: default_gemini_key_env(),
            api_key: None,
        }
    }
}

/// Tuning constants for the prompt classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_long_prompt_chars")]
    pub long_prompt_chars: usize,
    #[serde(default = "default_reasoning_phrases")]
    pub reasoning_phrases: Vec<String>,
    #[serde(default = "default_code_hints")]
    pub code_hints: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            long_prompt_chars: default_long_prompt_chars(),
            reasoning_phrases: default_reasoning_phrases(),
            code_hints: default_code_hints(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub banner: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { banner: true }
    }
}

// Defaults
fn default_base_url() -> String {
    "https://api.deepseek.com".into()
}
fn default_deepseek_key_env() -> String {
    DEEPSEEK_API_KEY.into()
}
fn default_chat_model() -> String {
    "deepseek-chat".into()
}
fn default_reasoner_model() -> String {
    "deepseek-reasoner".into()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_gemini_bin() -> String {
    "gemini".into()
}
fn default_gemini_key_env() -> String {
    GEMINI_API_KEY.into()
}
fn default_long_prompt_chars() -> usize {
    1200
}
fn default_reasoning_phrases() -> Vec<String> {
    vec!["think step by step".into(), "chain-of-thought".into()]
}
fn default_code_hints() -> Vec<String> {
    [
        "code",
        "bug",
        "test",
        "compile",
        "stack trace",
        "build",
        "function",
        "class",
        "typescript",
        "python",
        "node",
        "react",
        "docker",
        "sql",
        "write a script",
        "refactor",
        "fix",
        "unit test",
        "terminal",
        "shell",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides on top of file values.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`. Empty values count as unset.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        self.deepseek.api_key = get(&self.deepseek.api_key_env);
        self.gemini.api_key = get(&self.gemini.api_key_env);
        if let Some(bin) = get(GEMINI_BIN) {
            self.gemini.bin = bin;
        }
        if let Some(model) = get(DEFAULT_GEMINI_MODEL) {
            self.gemini.default_model = Some(model);
        }
        if get(NO_BANNER).is_some() {
            self.ui.banner = false;
        }
        self
    }
}
