use crate::config::DeepSeekConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use eventsource_stream::Eventsource;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// Text fragments of a streamed completion, in arrival order.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// System instruction first (when non-empty), then the user prompt.
pub fn build_messages(prompt: &str, system: Option<&str>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system.filter(|s| !s.is_empty()) {
        messages.push(Message {
            role: Role::System,
            content: system.to_string(),
        });
    }
    messages.push(Message {
        role: Role::User,
        content: prompt.to_string(),
    });
    messages
}

// -- OpenAI-compatible wire format --

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

/// `{"error": {...}}` object sent in place of a completion.
#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl ApiErrorBody {
    fn into_error(self) -> Error {
        let message = if self.message.is_empty() {
            "unknown error".to_string()
        } else {
            self.message
        };
        Error::api("deepseek", message)
    }
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// One decoded `data:` payload of the completion stream.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamData {
    Fragment(String),
    /// Chunk without text (role header, usage, empty delta).
    Empty,
    Done,
}

pub fn parse_stream_data(data: &str) -> Result<StreamData> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(StreamData::Done);
    }
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| Error::parse(format!("parse stream chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(error.into_error());
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty())
        .map(StreamData::Fragment)
        .unwrap_or(StreamData::Empty))
}

fn decode_completion(text: &str) -> Result<String> {
    let resp: CompletionResponse = serde_json::from_str(text)
        .map_err(|e| Error::parse(format!("parse completion response: {e}")))?;
    if let Some(error) = resp.error {
        return Err(error.into_error());
    }
    resp.choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| Error::parse("empty response from LLM"))
}

/// Client for an OpenAI-compatible chat-completion API.
pub struct ChatClient {
    api_key: String,
    base_url: String,
    http: HttpClient,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::new(concat!("deepgem/", env!("CARGO_PKG_VERSION")), timeout)?;
        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Build from config. Fails before any network traffic when no key is configured.
    pub fn from_config(config: &DeepSeekConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::missing_credential(&config.api_key_env))?;
        Self::new(
            api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub async fn complete(&self, model: &str, messages: &[Message]) -> Result<String> {
        debug!(%model, messages = messages.len(), "sending completion request");
        let request = CompletionRequest {
            model,
            messages,
            stream: false,
        };
        let url = format!("{}/chat/completions", self.base_url);
        let text = self.http.post_json(&url, &request, &self.api_key).await?;
        decode_completion(&text)
    }

    /// Start a streamed completion. Fragments are yielded as the server sends them.
    pub async fn complete_stream(&self, model: &str, messages: &[Message]) -> Result<FragmentStream> {
        debug!(%model, messages = messages.len(), "sending streaming completion request");
        let request = CompletionRequest {
            model,
            messages,
            stream: true,
        };
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post_json_stream(&url, &request, &self.api_key)
            .await?;

        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("text/event-stream"));
        if !is_event_stream {
            // Server answered with a plain JSON body: an error or a whole completion.
            warn!("expected an event stream, got a plain response");
            let text = response.text().await.map_err(|e| Error::http(e.to_string()))?;
            let content = decode_completion(&text)?;
            return Ok(Box::pin(stream::iter(
                (!content.is_empty()).then_some(Ok(content)),
            )));
        }

        let events = response.bytes_stream().eventsource();
        let fragments = events
            .map(|event| match event {
                Ok(event) => parse_stream_data(&event.data),
                Err(e) => {
                    warn!("stream error: {e}");
                    Err(Error::http(format!("SSE stream error: {e}")))
                }
            })
            .take_while(|item| futures::future::ready(!matches!(item, Ok(StreamData::Done))))
            .filter_map(|item| async move {
                match item {
                    Ok(StreamData::Fragment(text)) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                }
            });
        Ok(Box::pin(fragments))
    }

    /// List model ids. Used to validate a key.
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let text = self.http.get_text_authed(&url, &self.api_key).await?;
        let list: ModelList = serde_json::from_str(&text)
            .map_err(|e| Error::parse(format!("parse model list: {e}")))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}
