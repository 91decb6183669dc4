//! OpenAI-compatible streaming completion client.
//!
//! The request is opened eagerly so that transport and HTTP status failures
//! surface before any body bytes are relayed. The SSE body is then parsed
//! lazily into [`StreamChunk`]s.

use std::pin::Pin;

use doki_core::{Error, Result};
use futures::Stream;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, error};

use crate::config::{LLMConfig, MAX_TOKENS, MODEL, TEMPERATURE};
use crate::types::{ChatMessage, Usage};

/// Boxed stream type for relayed chunks.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token, the end marker, or an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Token(String),
    Done {
        finish_reason: Option<String>,
        usage: Option<Usage>,
    },
    Error(String),
}

/// JSON body for a streamed completion over `messages`.
pub fn completion_body(messages: &[ChatMessage]) -> serde_json::Value {
    json!({
        "model": MODEL,
        "messages": messages,
        "temperature": TEMPERATURE,
        "max_tokens": MAX_TOKENS,
        "stream": true,
        "stream_options": { "include_usage": true },
    })
}

/// Send the completion request and check the status.
pub async fn open_completion(
    client: &Client,
    config: &LLMConfig,
    messages: &[ChatMessage],
) -> Result<Response> {
    let api_key = config
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| Error::Config("DEEPSEEK_API_KEY is not set".into()))?;

    let url = config.completions_url();
    debug!("Streaming from {} with model {}", url, MODEL);

    let response = client
        .post(&url)
        .bearer_auth(api_key)
        .json(&completion_body(messages))
        .send()
        .await
        .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Provider { status, body });
    }

    Ok(response)
}

/// Parse an opened completion response into chunks.
pub fn completion_stream(response: Response) -> BoxedStream {
    sse_chunks(response.bytes_stream())
}

/// Parse a raw SSE byte stream into chunks.
///
/// A read error or an `error` payload yields one [`StreamChunk::Error`] and
/// ends the stream without a `Done`.
pub fn sse_chunks<S, B, E>(body: S) -> BoxedStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut bytes = Box::pin(body);
        let mut buffer = SseBuffer::default();
        let mut finish_reason: Option<String> = None;
        let mut usage: Option<Usage> = None;
        let mut upstream_done = false;

        loop {
            let line = match buffer.next_line() {
                Some(line) => line,
                None if upstream_done => match buffer.take_remainder() {
                    Some(line) => line,
                    None => break,
                },
                None => {
                    match bytes.next().await {
                        Some(Ok(b)) => buffer.push(b.as_ref()),
                        Some(Err(e)) => {
                            error!("Stream read error: {}", e);
                            yield StreamChunk::Error(format!("Stream read error: {}", e));
                            return;
                        }
                        None => upstream_done = true,
                    }
                    continue;
                }
            };

            match parse_data_line(&line) {
                None => {}
                Some(SseData::Done) => break,
                Some(SseData::Chunk(chunk)) => {
                    if let Some(err) = chunk.error {
                        error!("Provider stream error: {}", err);
                        yield StreamChunk::Error(err.to_string());
                        return;
                    }
                    if let Some(u) = chunk.usage {
                        usage = Some(u.into());
                    }
                    for choice in chunk.choices {
                        if let Some(reason) = choice.finish_reason {
                            finish_reason = Some(reason);
                        }
                        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
                            yield StreamChunk::Token(content);
                        }
                    }
                }
            }
        }

        yield StreamChunk::Done { finish_reason, usage };
    })
}

/// Accumulates raw body bytes and yields complete lines.
///
/// Splitting happens on bytes so multi-byte characters spanning two network
/// chunks are decoded intact.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buf: Vec<u8>,
}

impl SseBuffer {
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Next complete line, trimmed. `None` until a newline arrives.
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    /// Whatever is left after the body ended without a trailing newline.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

/// Payload of one `data:` line.
#[derive(Debug)]
pub enum SseData {
    Chunk(CompletionChunk),
    Done,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<ApiUsage>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl From<ApiUsage> for Usage {
    fn from(u: ApiUsage) -> Self {
        Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
        }
    }
}

/// Parse one SSE line. Comments, blank lines, other fields and undecodable
/// payloads yield `None`.
pub fn parse_data_line(line: &str) -> Option<SseData> {
    let data = line.strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseData::Done);
    }
    match serde_json::from_str::<CompletionChunk>(data) {
        Ok(chunk) => Some(SseData::Chunk(chunk)),
        Err(e) => {
            debug!("Skipping undecodable SSE payload: {}", e);
            None
        }
    }
}
