//! Calls a single backend model over one credential.
//!
//! Grounded in the teacher's `parse_sse_stream` (`utils.rs`): the backend
//! speaks the same `data: <json>\n\n` / `data: [DONE]` SSE framing as the
//! teacher's upstream, simplified here to text-only deltas since this engine
//! never issues backend tool calls.

use crate::error::{Error, Result};
use crate::protocol::Frame;
use crate::types::{BackendChunk, BackendMessage, BackendRequest, Message, ModelSpec};
use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

const DEFAULT_BASE_URL: &str = "https://api.cerebras.ai/v1/chat/completions";

pub struct ModelClient<'a> {
    http: &'a reqwest::Client,
    base_url: String,
}

impl<'a> ModelClient<'a> {
    /// `CEREBRAS_BASE_URL` overrides the default endpoint, used by tests to
    /// point at a `wiremock` server instead of the real backend.
    pub fn new(http: &'a reqwest::Client) -> Self {
        let base_url =
            std::env::var("CEREBRAS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self { http, base_url }
    }

    /// Accumulates the entire token stream into a string. Aborts the in-flight
    /// call as soon as `cancellation` fires rather than draining it to completion.
    pub async fn call_buffered(
        &self,
        key: &str,
        spec: &ModelSpec,
        messages: &[Message],
        cancellation: &CancellationToken,
    ) -> Result<String> {
        let mut text = String::new();
        let mut stream = self.open_stream(key, spec, messages, cancellation).await?;
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return Err(Error::Cancelled),
                next = stream.next() => {
                    let Some(chunk) = next else { break };
                    let chunk = chunk?;
                    for choice in chunk.choices {
                        if let Some(content) = choice.delta.content {
                            text.push_str(&content);
                        }
                    }
                }
            }
        }
        Ok(text)
    }

    /// Forwards each token to `sink` as a `DATA` frame while also accumulating
    /// the full text, returned on normal completion. Aborts the in-flight call
    /// as soon as `cancellation` fires.
    pub async fn call_streaming(
        &self,
        key: &str,
        spec: &ModelSpec,
        messages: &[Message],
        sink: &UnboundedSender<Frame>,
        cancellation: &CancellationToken,
    ) -> Result<String> {
        let mut text = String::new();
        let mut stream = self.open_stream(key, spec, messages, cancellation).await?;
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return Err(Error::Cancelled),
                next = stream.next() => {
                    let Some(chunk) = next else { break };
                    let chunk = chunk?;
                    for choice in chunk.choices {
                        if let Some(content) = choice.delta.content {
                            text.push_str(&content);
                            let _ = sink.send(Frame::Data(content));
                        }
                    }
                }
            }
        }
        Ok(text)
    }

    async fn open_stream(
        &self,
        key: &str,
        spec: &ModelSpec,
        messages: &[Message],
        cancellation: &CancellationToken,
    ) -> Result<
        std::pin::Pin<Box<dyn futures::Stream<Item = Result<BackendChunk>> + Send>>,
    > {
        let request = BackendRequest {
            model: spec.model_name.clone(),
            messages: messages.iter().map(BackendMessage::from).collect(),
            stream: true,
            max_tokens: spec.max_output_tokens,
            temperature: Some(spec.temperature),
        };

        let response = tokio::select! {
            _ = cancellation.cancelled() => return Err(Error::Cancelled),
            result = self.http.post(&self.base_url).bearer_auth(key).json(&request).send() => {
                result.map_err(|e| {
                    Error::api(
                        e.status().map(|s| s.as_u16()).unwrap_or(500),
                        key,
                        spec.model_name.as_str(),
                    )
                })?
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(Error::api(status, key, spec.model_name.as_str()));
        }

        Ok(parse_sse_stream(response))
    }
}

/// Splits the response body into `data: <json>` lines, buffering text split
/// across reads and yielding every `data:` line in a chunk (not just the
/// first) so a TCP read batching multiple token events never truncates the
/// accumulated reply.
fn parse_sse_stream(
    response: reqwest::Response,
) -> std::pin::Pin<Box<dyn futures::Stream<Item = Result<BackendChunk>> + Send>> {
    struct State {
        body: reqwest::Response,
        buffer: String,
        body_exhausted: bool,
    }

    let state = State {
        body: response,
        buffer: String::new(),
        body_exhausted: false,
    };

    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(newline) = state.buffer.find('\n') {
                let line = state.buffer[..newline].trim_end_matches('\r').to_string();
                state.buffer.drain(..=newline);
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    continue;
                }
                let parsed = serde_json::from_str::<BackendChunk>(data).map_err(Error::Json);
                return Some((parsed, state));
            }

            if state.body_exhausted {
                return None;
            }

            match state.body.chunk().await {
                Ok(Some(bytes)) => state.buffer.push_str(&String::from_utf8_lossy(&bytes)),
                Ok(None) => state.body_exhausted = true,
                Err(e) => return Some((Err(Error::Http(e)), state)),
            }
        }
    });
    Box::pin(stream)
}
