//! Server-sent event decoding for streamed chat completions.

use crate::error::{Error, Result};
use serde::Deserialize;

/// One decoded delta of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// The opening delta naming the speaker. Carries no text.
    RoleAnnouncement,
    Content(String),
}

/// What a single `data:` line turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Chunk(StreamChunk),
    Done,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    role: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Decode one SSE line.
///
/// Comments, blank lines and non-data fields yield `None`, as do deltas that
/// carry neither a role nor content (the closing `finish_reason` delta).
pub fn decode_line(line: &str) -> Result<Option<SseEvent>> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }
    if data.is_empty() {
        return Ok(None);
    }

    let chunk: CompletionChunk = serde_json::from_str(data)
        .map_err(|e| Error::collaborator(format!("JSON parse error: {}", e)))?;
    if let Some(error) = chunk.error {
        return Err(Error::collaborator(error.message));
    }
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };
    let event = match choice.delta {
        Delta { role: Some(_), .. } => Some(SseEvent::Chunk(StreamChunk::RoleAnnouncement)),
        Delta {
            content: Some(content),
            ..
        } => Some(SseEvent::Chunk(StreamChunk::Content(content))),
        Delta { .. } => None,
    };
    Ok(event)
}

/// Reassembles SSE lines split across network reads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and decode every line they complete.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>> {
        self.pending.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if let Some(event) = decode_bytes(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Decode whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Result<Option<SseEvent>> {
        let rest = std::mem::take(&mut self.pending);
        decode_bytes(&rest)
    }
}

fn decode_bytes(line: &[u8]) -> Result<Option<SseEvent>> {
    let line = std::str::from_utf8(line)
        .map_err(|e| Error::collaborator(format!("UTF-8 error: {}", e)))?;
    decode_line(line.trim_end_matches(['\r', '\n']))
}
