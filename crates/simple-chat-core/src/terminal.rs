//! The interactive surface the session reads from and writes to.

use std::io::{self, Write};

/// Line-oriented terminal with a clipboard.
pub trait Terminal {
    /// Read one line without its line ending. `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Where all session output goes.
    fn writer(&mut self) -> &mut dyn Write;

    /// Replace the system clipboard contents.
    fn set_clipboard(&mut self, text: &str) -> io::Result<()>;
}
