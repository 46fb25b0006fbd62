use deepgem::config::RouterConfig;
use deepgem::router::{Engine, RoutingPolicy, pick_engine};

const PROMPTS: &[&str] = &[
    "",
    "hello",
    "What is the capital of France?",
    "Please fix the failing unit test in my Python project",
    "think step by step about the trolley problem",
    "Explain chain-of-thought prompting",
];

#[test]
fn recognized_override_always_wins() {
    let long = "a".repeat(5000);
    let mut prompts: Vec<&str> = PROMPTS.to_vec();
    prompts.push(&long);

    for prompt in prompts {
        for engine in Engine::ALL {
            assert_eq!(
                pick_engine(prompt, Some(engine.id())),
                engine,
                "override {engine} ignored for {prompt:?}"
            );
        }
    }
}

#[test]
fn every_code_keyword_routes_to_gemini() {
    for hint in RouterConfig::default().code_hints {
        let upper = format!("Could you {} please", hint.to_uppercase());
        assert_eq!(pick_engine(&upper, None), Engine::Gemini, "hint {hint:?}");
    }
}

#[test]
fn keyword_beats_length_and_reasoning_phrases() {
    let prompt = format!(
        "think step by step: {} then refactor it",
        "lorem ipsum ".repeat(200)
    );
    assert!(prompt.chars().count() > 1200);
    assert_eq!(pick_engine(&prompt, None), Engine::Gemini);
}

#[test]
fn plain_short_prompts_go_to_chat() {
    assert_eq!(pick_engine("hello", None), Engine::DeepSeekChat);
    assert_eq!(pick_engine("What is the capital of France?", None), Engine::DeepSeekChat);
    assert_eq!(pick_engine("", None), Engine::DeepSeekChat);
    assert_eq!(pick_engine(&"a".repeat(1200), None), Engine::DeepSeekChat);
}

#[test]
fn just_over_threshold_goes_to_reasoner() {
    let prompt = "a".repeat(1201);
    assert_eq!(pick_engine(&prompt, None), Engine::DeepSeekReasoner);
}

#[test]
fn reasoning_phrases_go_to_reasoner() {
    assert_eq!(
        pick_engine("Think Step By Step: why is the sky blue?", None),
        Engine::DeepSeekReasoner
    );
    assert_eq!(
        pick_engine("Use Chain-of-Thought on this riddle", None),
        Engine::DeepSeekReasoner
    );
}

#[test]
fn thresholds_are_configurable() {
    let config = RouterConfig {
        long_prompt_chars: 20,
        ..RouterConfig::default()
    };
    let policy = RoutingPolicy::from_config(&config);
    assert_eq!(
        policy.classify("a fairly ordinary sentence", None),
        Engine::DeepSeekReasoner
    );
    assert_eq!(policy.classify("short", None), Engine::DeepSeekChat);
}
