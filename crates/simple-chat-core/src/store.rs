//! Named prompts and chats kept as files in a directory.
//!
//! A prompt is `<prompts_dir>/<name>.prompt` holding raw text. A chat is
//! `<chats_dir>/<name>.chat` holding the message log as one line of JSON.
//! Names are cached when the store is opened and extended as the session
//! saves new entries.

use crate::conversation::Conversation;
use crate::safe_io::atomic_write;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

pub const PROMPT_EXTENSION: &str = "prompt";
pub const CHAT_EXTENSION: &str = "chat";

/// One directory of named artifacts sharing an extension.
#[derive(Debug, Clone)]
pub struct NamedStore {
    dir: PathBuf,
    extension: &'static str,
    names: Vec<String>,
}

impl NamedStore {
    /// Open `dir` and cache the names of every `*.<extension>` file in it.
    ///
    /// A missing directory is an error rather than an empty store.
    pub fn open(dir: impl Into<PathBuf>, extension: &'static str) -> io::Result<Self> {
        let dir = dir.into();
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == extension)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        log::debug!(
            "found {} .{} file(s) in {}",
            names.len(),
            extension,
            dir.display()
        );
        Ok(Self {
            dir,
            extension,
            names,
        })
    }

    pub fn prompts(dir: impl Into<PathBuf>) -> io::Result<Self> {
        Self::open(dir, PROMPT_EXTENSION)
    }

    pub fn chats(dir: impl Into<PathBuf>) -> io::Result<Self> {
        Self::open(dir, CHAT_EXTENSION)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// `<name>.<extension>`
    pub fn file_name(&self, name: &str) -> String {
        format!("{}.{}", name, self.extension)
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(self.file_name(name))
    }

    pub fn read(&self, name: &str) -> io::Result<String> {
        fs::read_to_string(self.path_for(name))
    }

    /// Write `contents` under `name`, replacing any existing entry.
    pub fn write(&mut self, name: &str, contents: &str) -> io::Result<PathBuf> {
        validate_name(name)?;
        let path = self.path_for(name);
        atomic_write(&path, contents.as_bytes())?;
        log::debug!("wrote {}", path.display());
        if !self.contains(name) {
            self.names.push(name.to_string());
        }
        Ok(path)
    }
}

/// Names become file names, so they must stay inside the store directory.
fn validate_name(name: &str) -> io::Result<()> {
    let invalid = |reason: &str| {
        io::Error::new(
            ErrorKind::InvalidInput,
            format!("invalid name '{}': {}", name, reason),
        )
    };
    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(invalid("name must not contain path separators"));
    }
    Ok(())
}

/// Read a chat file: a JSON array of `{role, content}` messages.
pub fn read_chat_file(path: &Path) -> io::Result<Conversation> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| {
        io::Error::new(
            ErrorKind::InvalidData,
            format!("Malformed json in {}: {}", path.display(), e),
        )
    })
}

/// Serialize a conversation the way chat files store it.
pub fn chat_to_json(conversation: &Conversation) -> io::Result<String> {
    serde_json::to_string(conversation).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
}
