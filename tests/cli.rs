use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `deepgem` in an empty directory with no credentials and no banner.
fn deepgem(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("deepgem").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DEEPSEEK_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("DEEPGEM_DEFAULT_GEMINI_MODEL")
        .env("GEMINI_BIN", "deepgem-test-no-such-gemini")
        .env("DEEPGEM_NO_BANNER", "1");
    cmd
}

#[test]
fn no_subcommand_prints_hint() {
    let dir = tempfile::tempdir().unwrap();
    deepgem(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("deepgem --help"))
        .stdout(predicate::str::contains("eeko systems").not());
}

#[test]
fn banner_shown_unless_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    deepgem(&dir)
        .env_remove("DEEPGEM_NO_BANNER")
        .assert()
        .success()
        .stdout(predicate::str::contains("deepgem by eeko systems"));
}

#[test]
fn chat_without_key_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    deepgem(&dir)
        .args(["chat", "hello"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("DEEPSEEK_API_KEY not set"));
}

#[test]
fn gem_without_binary_exits_127() {
    let dir = tempfile::tempdir().unwrap();
    deepgem(&dir)
        .args(["gem", "-p", "list files"])
        .assert()
        .code(127)
        .stdout(predicate::str::contains("npm i -g @google/gemini-cli"));
}

#[test]
fn ask_routes_code_prompt_to_gemini() {
    let dir = tempfile::tempdir().unwrap();
    deepgem(&dir)
        .args(["ask", "refactor this function"])
        .assert()
        .code(127)
        .stdout(predicate::str::contains("engine: gemini"));
}

#[test]
fn ask_force_overrides_router() {
    let dir = tempfile::tempdir().unwrap();
    deepgem(&dir)
        .args(["ask", "refactor this function", "--force", "deepseek-reasoner"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("engine: deepseek-reasoner"));
}

#[test]
fn key_from_dotenv_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "DEEPSEEK_API_KEY=sk-from-dotenv\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("deepgem.toml"),
        "[deepseek]\nbase_url = \"http://127.0.0.1:1\"\ntimeout_secs = 2\n",
    )
    .unwrap();

    // The key is found, so the failure is the unreachable backend (1), not a missing key (2).
    deepgem(&dir)
        .args(["chat", "hello", "--no-stream"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DeepSeek error:"));
}

#[test]
fn malformed_config_is_a_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("deepgem.toml"), "[router\n").unwrap();
    deepgem(&dir).args(["doctor"]).assert().failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_model_falls_back_to_configured_chat_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "deepseek-chat"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "pong"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("deepgem.toml"),
        format!("[deepseek]\nbase_url = \"{}\"\n", server.uri()),
    )
    .unwrap();

    deepgem(&dir)
        .env("DEEPSEEK_API_KEY", "sk-test")
        .args(["chat", "ping", "-m", "", "--no-stream"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("pong"));
}
