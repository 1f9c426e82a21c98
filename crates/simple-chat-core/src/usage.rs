//! Token usage counters.
//!
//! The lifetime totals are read from the token usage file at startup and are
//! never written back; accounting only logs what the session counted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Read the first line of the usage file as a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Couldn't read {}: {}", path.display(), e)))?;
        let line = contents.lines().next().unwrap_or("");
        serde_json::from_str(line)
            .map_err(|e| Error::config(format!("Malformed json in {}: {}", path.display(), e)))
    }

    pub fn add_completion(&mut self, tokens: u64) {
        self.completion_tokens += tokens;
        self.total_tokens += tokens;
    }
}

/// Fold a session's usage into the lifetime totals. Only logs for now.
pub fn account_token_usage(session: &TokenUsage, lifetime: &TokenUsage) {
    log::debug!(
        "session used {} completion token(s); lifetime total on record is {}",
        session.completion_tokens,
        lifetime.total_tokens
    );
}
