//! Talking to the chat completion service.

pub mod chunk;
pub mod client;
pub mod logging;
pub mod request;

pub use chunk::{SseDecoder, SseEvent, StreamChunk, decode_line};
pub use client::{ApiSettings, BoxFuture, ChunkStream, CompletionBackend, OpenAiClient, decode_sse_stream};
pub use request::{RequestOptions, build_request_body};
