use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Future, Stream};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use quill_core::{Agent, AgentError, AgentStream};

use crate::sse::{self, SseFrame};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const SSE_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Connection and sampling settings for one agent.
#[derive(Clone, Debug)]
pub struct ChatAgentConfig {
    /// Label used in logs ("summary", "writing").
    pub name: String,
    pub model: String,
    /// OpenAI-compatible base URL, e.g. `https://host/compatible-mode/v1`.
    pub base_url: String,
    pub api_key: SecretString,
    pub system_message: String,
    pub top_p: Option<f64>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Agent backed by a streaming `/chat/completions` endpoint.
///
/// Yields the full accumulated answer after every content delta.
pub struct ChatCompletionsAgent {
    client: Client,
    config: ChatAgentConfig,
    endpoint: String,
    idle_timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl ChatCompletionsAgent {
    pub fn new(config: ChatAgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| AgentError::InvalidRequest(format!("http client: {e}")))?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            config,
            endpoint,
            idle_timeout: SSE_IDLE_TIMEOUT,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if !self.config.system_message.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &self.config.system_message,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        ChatRequest {
            model: &self.config.model,
            messages,
            stream: true,
            top_p: self.config.top_p,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }
}

#[async_trait]
impl Agent for ChatCompletionsAgent {
    fn name(&self) -> &str {
        &self.config.name
    }

    #[instrument(skip(self, prompt), fields(agent = %self.config.name, model = %self.config.model, prompt_chars = prompt.chars().count()))]
    async fn run(&self, prompt: &str) -> Result<AgentStream, AgentError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.config.api_key.expose_secret())
            .header("accept", "text/event-stream")
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| AgentError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentError::from_status(status, body));
        }

        Ok(Box::pin(ChatStream::new(resp.bytes_stream(), self.idle_timeout)))
    }
}

/// Turns raw SSE bytes into accumulated-text updates.
#[derive(Default)]
struct ChatStreamParser {
    buffer: Vec<u8>,
    accumulated: String,
    finished: bool,
}

impl ChatStreamParser {
    fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns the updates completed by them.
    ///
    /// Bytes are buffered until a full event (`\n\n`) arrives so multi-byte
    /// characters split across network reads decode correctly.
    fn feed(&mut self, bytes: &[u8]) -> Vec<Result<String, AgentError>> {
        // CR bytes only ever appear as line-ending noise; JSON escapes them.
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
        let mut out = Vec::new();

        while !self.finished {
            let Some(pos) = find_event_boundary(&self.buffer) else {
                break;
            };
            let event: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            self.ingest(&String::from_utf8_lossy(&event), &mut out);
        }

        out
    }

    /// Flush whatever is left once the byte stream ends.
    fn finish(&mut self) -> Vec<Result<String, AgentError>> {
        let mut out = Vec::new();
        if !self.finished && !self.buffer.is_empty() {
            let remaining = std::mem::take(&mut self.buffer);
            self.ingest(&String::from_utf8_lossy(&remaining), &mut out);
        }
        self.finished = true;
        out
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn ingest(&mut self, raw: &str, out: &mut Vec<Result<String, AgentError>>) {
        for frame in sse::parse_sse_lines(raw) {
            match frame {
                SseFrame::Done => {
                    self.finished = true;
                    return;
                }
                SseFrame::Data(data) => match sse::extract_delta(&data) {
                    Ok(Some(delta)) if !delta.is_empty() => {
                        self.accumulated.push_str(&delta);
                        out.push(Ok(self.accumulated.clone()));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.finished = true;
                        out.push(Err(e));
                        return;
                    }
                },
            }
        }
    }
}

fn find_event_boundary(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

/// Wraps a byte stream from reqwest and yields accumulated-text updates.
/// Includes an idle timeout: if no data arrives within `idle_duration`, emits an error.
struct ChatStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    parser: ChatStreamParser,
    pending: VecDeque<Result<String, AgentError>>,
    idle_deadline: Pin<Box<tokio::time::Sleep>>,
    idle_duration: Duration,
    done: bool,
}

impl ChatStream {
    fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            parser: ChatStreamParser::new(),
            pending: VecDeque::new(),
            idle_deadline: Box::pin(tokio::time::sleep(idle_timeout)),
            idle_duration: idle_timeout,
            done: false,
        }
    }
}

impl Stream for ChatStream {
    type Item = Result<String, AgentError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(item) = self.pending.pop_front() {
            return Poll::Ready(Some(item));
        }
        if self.done || self.parser.is_finished() {
            self.done = true;
            return Poll::Ready(None);
        }

        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    // Data received, reset idle timer
                    let new_deadline = tokio::time::Instant::now() + self.idle_duration;
                    self.idle_deadline.as_mut().reset(new_deadline);

                    let updates = self.parser.feed(&bytes);
                    self.pending.extend(updates);

                    if let Some(item) = self.pending.pop_front() {
                        return Poll::Ready(Some(item));
                    }
                    if self.parser.is_finished() {
                        self.done = true;
                        return Poll::Ready(None);
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(AgentError::StreamInterrupted(e.to_string()))));
                }
                Poll::Ready(None) => {
                    let updates = self.parser.finish();
                    self.pending.extend(updates);
                    self.done = true;
                    return Poll::Ready(self.pending.pop_front());
                }
                Poll::Pending => {
                    if self.idle_deadline.as_mut().poll(cx).is_ready() {
                        self.done = true;
                        return Poll::Ready(Some(Err(AgentError::Timeout(self.idle_duration))));
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}
