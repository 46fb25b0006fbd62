//! Heuristic engine selection.
//!
//! A prompt is matched against an ordered list of rules; the first rule whose
//! condition holds picks the engine. An explicit override naming a known
//! engine skips the rules entirely.

use crate::config::RouterConfig;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Backend that answers a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Gemini CLI subprocess (code and tooling work).
    Gemini,
    /// DeepSeek chat model.
    DeepSeekChat,
    /// DeepSeek reasoning model.
    DeepSeekReasoner,
}

impl Engine {
    pub const ALL: [Engine; 3] = [Self::Gemini, Self::DeepSeekChat, Self::DeepSeekReasoner];

    pub fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::DeepSeekChat => "deepseek-chat",
            Self::DeepSeekReasoner => "deepseek-reasoner",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEngine(pub String);

impl fmt::Display for UnknownEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown engine '{}' (expected gemini, deepseek-chat or deepseek-reasoner)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEngine {}

impl FromStr for Engine {
    type Err = UnknownEngine;

    /// Exact, case-sensitive match on the engine identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|e| e.id() == s)
            .ok_or_else(|| UnknownEngine(s.to_string()))
    }
}

/// Test applied to the lower-cased prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Prompt contains any of these substrings (already lower-cased).
    ContainsAny(Vec<String>),
    /// Prompt is strictly longer than this many characters.
    LongerThan(usize),
}

impl Condition {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Self::ContainsAny(needles) => needles.iter().any(|n| lowered.contains(n.as_str())),
            Self::LongerThan(limit) => lowered.chars().count() > *limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub when: Condition,
    pub engine: Engine,
}

/// Ordered rules plus the engine used when none match.
#[derive(Debug, Clone)]
pub struct RoutingPolicy {
    rules: Vec<Rule>,
    fallback: Engine,
}

impl RoutingPolicy {
    /// Code keywords first, then the length and reasoning-phrase checks.
    pub fn from_config(config: &RouterConfig) -> Self {
        let lowered = |items: &[String]| -> Vec<String> {
            items
                .iter()
                .map(|s| s.to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            rules: vec![
                Rule {
                    when: Condition::ContainsAny(lowered(&config.code_hints)),
                    engine: Engine::Gemini,
                },
                Rule {
                    when: Condition::LongerThan(config.long_prompt_chars),
                    engine: Engine::DeepSeekReasoner,
                },
                Rule {
                    when: Condition::ContainsAny(lowered(&config.reasoning_phrases)),
                    engine: Engine::DeepSeekReasoner,
                },
            ],
            fallback: Engine::DeepSeekChat,
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Pick the engine for `prompt`. A `force` naming a known engine wins outright;
    /// anything else is ignored and the rules decide.
    pub fn classify(&self, prompt: &str, force: Option<&str>) -> Engine {
        if let Some(forced) = force {
            match forced.parse::<Engine>() {
                Ok(engine) => {
                    debug!(%engine, "engine forced by caller");
                    return engine;
                }
                Err(e) => warn!("ignoring override: {e}"),
            }
        }

        let lowered = prompt.to_lowercase();
        let picked = self
            .rules
            .iter()
            .find(|rule| rule.when.matches(&lowered))
            .map(|rule| rule.engine)
            .unwrap_or(self.fallback);
        debug!(engine = %picked, chars = lowered.chars().count(), "prompt classified");
        picked
    }
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

/// Classify with the built-in thresholds and keyword lists.
pub fn pick_engine(prompt: &str, force: Option<&str>) -> Engine {
    RoutingPolicy::default().classify(prompt, force)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_ids_round_trip() {
        for engine in Engine::ALL {
            assert_eq!(engine.id().parse::<Engine>().unwrap(), engine);
            assert_eq!(engine.to_string(), engine.id());
        }
    }

    #[test]
    fn engine_parse_is_case_sensitive() {
        assert!("Gemini".parse::<Engine>().is_err());
        assert!("deepseek".parse::<Engine>().is_err());
        assert!("".parse::<Engine>().is_err());
    }

    #[test]
    fn keyword_rule_comes_first() {
        let policy = RoutingPolicy::default();
        assert_eq!(policy.rules()[0].engine, Engine::Gemini);
        assert_eq!(policy.rules()[1].when, Condition::LongerThan(1200));
    }

    #[test]
    fn unknown_override_falls_through_to_rules() {
        assert_eq!(pick_engine("hello there", Some("gpt-4")), Engine::DeepSeekChat);
        assert_eq!(pick_engine("fix my bug", Some("GEMINI")), Engine::Gemini);
    }

    #[test]
    fn keywords_match_inside_words() {
        // "class" inside "classical" still counts as a code hint.
        assert_eq!(pick_engine("Tell me about classical music", None), Engine::Gemini);
    }

    #[test]
    fn configured_lists_are_lowercased() {
        let config = RouterConfig {
            long_prompt_chars: 10,
            reasoning_phrases: vec!["PONDER".into()],
            code_hints: vec!["Cargo".into(), String::new()],
        };
        let policy = RoutingPolicy::from_config(&config);
        assert_eq!(policy.classify("run CARGO please", None), Engine::Gemini);
        assert_eq!(policy.classify("ponder", None), Engine::DeepSeekReasoner);
        assert_eq!(policy.classify("eleven char", None), Engine::DeepSeekReasoner);
        assert_eq!(policy.classify("hi", None), Engine::DeepSeekChat);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // 1200 two-byte characters: 2400 bytes but not "long".
        let prompt = "é".repeat(1200);
        assert_eq!(pick_engine(&prompt, None), Engine::DeepSeekChat);
        let prompt = "é".repeat(1201);
        assert_eq!(pick_engine(&prompt, None), Engine::DeepSeekReasoner);
    }
}
