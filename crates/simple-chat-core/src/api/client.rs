//! The completion service seam and its HTTP implementation.

use super::chunk::{SseDecoder, SseEvent, StreamChunk};
use super::logging::{log_request, log_response_meta};
use super::request::{RequestOptions, build_request_body};
use crate::conversation::Message;
use crate::error::{Error, Result};
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

/// Boxed, Send future returned by backends.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Decoded reply chunks, in arrival order.
pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send + 'a>>;

/// Something that can turn a message log into a streamed reply.
///
/// Returns boxed futures so the session can hold any backend, including
/// scripted ones in tests.
pub trait CompletionBackend {
    /// Send the full message log and start streaming the reply.
    ///
    /// Errors before the first chunk (transport failure, non-200 status) are
    /// returned here; errors mid-stream come through the stream.
    fn stream_chat<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Result<ChunkStream<'a>>>;
}

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: String,
    pub options: RequestOptions,
    pub request_log: Option<PathBuf>,
}

/// Streams chat completions from `<base_url>/chat/completions`.
pub struct OpenAiClient {
    http: Client,
    settings: ApiSettings,
}

impl OpenAiClient {
    pub fn new(settings: ApiSettings) -> Self {
        Self {
            http: Client::new(),
            settings,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    async fn send(&self, messages: &[Message]) -> Result<reqwest::Response> {
        let request_body = build_request_body(&self.settings.options, messages);
        let log_path = self.settings.request_log.as_deref();
        log_request(log_path, &request_body);
        log::debug!(
            "requesting completion from {} (model {}, {} message(s))",
            self.endpoint(),
            self.settings.options.model,
            messages.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(request_body.to_string())
            .send()
            .await
            .map_err(|e| Error::collaborator(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        log_response_meta(log_path, &json!({ "status": status.as_u16() }));
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::collaborator(format!(
                "API error ({}): {}",
                status, body
            )));
        }
        Ok(response)
    }
}

impl CompletionBackend for OpenAiClient {
    fn stream_chat<'a>(&'a self, messages: &'a [Message]) -> BoxFuture<'a, Result<ChunkStream<'a>>> {
        Box::pin(async move {
            let response = self.send(messages).await?;
            let chunks: ChunkStream<'a> = Box::pin(decode_sse_stream(response.bytes_stream()));
            Ok(chunks)
        })
    }
}

struct SseState<S> {
    bytes: S,
    decoder: SseDecoder,
    ready: VecDeque<StreamChunk>,
    finished: bool,
}

/// Turn a raw SSE byte stream into reply chunks, stopping at `[DONE]`.
pub fn decode_sse_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<StreamChunk>>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let state = SseState {
        bytes,
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.ready.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }
            let events = match state.bytes.next().await {
                Some(Ok(bytes)) => state.decoder.feed(bytes.as_ref()),
                Some(Err(e)) => Err(Error::collaborator(format!("Stream error: {}", e))),
                None => {
                    state.finished = true;
                    state.decoder.finish().map(|event| event.into_iter().collect())
                }
            };
            match events {
                Ok(events) => {
                    for event in events {
                        match event {
                            SseEvent::Chunk(chunk) => state.ready.push_back(chunk),
                            SseEvent::Done => {
                                state.finished = true;
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    state.finished = true;
                    state.ready.clear();
                    return Some((Err(e), state));
                }
            }
        }
    })
}
