//! simple-chat-core: conversation state, command matching and streamed
//! rendering for an interactive chat-completion client.
//!
//! The binary crate supplies a [`Terminal`] and a [`CompletionBackend`] and
//! drives a [`Session`].

pub mod api;
pub mod color;
pub mod commands;
pub mod config;
pub mod conversation;
pub mod error;
pub mod fuzzy;
pub mod render;
pub mod safe_io;
pub mod session;
pub mod store;
pub mod terminal;
pub mod usage;
pub mod wrap;

pub use api::{CompletionBackend, OpenAiClient, StreamChunk};
pub use color::Palette;
pub use commands::{Command, CommandTable};
pub use config::ResolvedConfig;
pub use conversation::{Conversation, Message, Role};
pub use error::{Error, Result};
pub use render::{StreamRenderer, render_stream};
pub use session::{Flow, Session};
pub use terminal::Terminal;
