//! Optional JSONL log of API requests and response metadata.
//!
//! Enabled by the `request_log` config key. Each line is
//! `{"timestamp": <unix seconds>, "<key>": <data>}`. Failures to open or write
//! the log are ignored so logging can never break a chat.

use serde_json::json;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Append `data` under `data_key` to the log at `log_path`, if one is configured.
pub fn log_to_jsonl(log_path: Option<&Path>, data_key: &str, data: &serde_json::Value) {
    let Some(log_path) = log_path else {
        return;
    };

    let log_entry = json!({
        "timestamp": now_timestamp(),
        data_key: data,
    });

    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path)
        && let Ok(json) = serde_json::to_string(&log_entry)
    {
        let _ = writeln!(file, "{}", json);
    }
}

pub fn log_request(log_path: Option<&Path>, request_body: &serde_json::Value) {
    log_to_jsonl(log_path, "request", request_body);
}

pub fn log_response_meta(log_path: Option<&Path>, response_meta: &serde_json::Value) {
    log_to_jsonl(log_path, "response", response_meta);
}
