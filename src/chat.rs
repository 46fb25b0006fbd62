//! `chat`: send one prompt to the DeepSeek chat-completion API.

use crate::config::DeepSeekConfig;
use crate::console::Console;
use crate::error::{Error, Result, exit};
use crate::llm::{ChatClient, build_messages};
use futures::StreamExt;
use std::io::Write;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub prompt: &'a str,
    pub model: &'a str,
    pub system: Option<&'a str>,
    pub stream: bool,
}

/// Run the request and report any failure on `console`. Returns the exit status.
pub async fn send<W: Write>(
    config: &DeepSeekConfig,
    request: &ChatRequest<'_>,
    console: &mut Console<W>,
) -> i32 {
    match run(config, request, console).await {
        Ok(()) => exit::SUCCESS,
        Err(e) => {
            match &e {
                Error::MissingCredential { .. } => console.error(&e.to_string(), ""),
                _ => console.error("DeepSeek error:", e.to_string()),
            }
            e.exit_code()
        }
    }
}

async fn run<W: Write>(
    config: &DeepSeekConfig,
    request: &ChatRequest<'_>,
    console: &mut Console<W>,
) -> Result<()> {
    let client = ChatClient::from_config(config)?;
    let messages = build_messages(request.prompt, request.system);
    info!(model = request.model, stream = request.stream, "chat request");

    if request.stream {
        let mut fragments = client.complete_stream(request.model, &messages).await?;
        let mut partial = false;
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    console.fragment(&text)?;
                    partial = true;
                }
                Err(e) => {
                    // Keep the error report off the partial answer's line.
                    if partial {
                        console.fragment("\n")?;
                    }
                    return Err(e);
                }
            }
        }
        console.fragment("\n")?;
    } else {
        let text = client.complete(request.model, &messages).await?;
        console.line(text);
    }
    Ok(())
}
