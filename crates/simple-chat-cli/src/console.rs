// Terminal backed by stdin/stdout, with xclip for the clipboard

use simple_chat_core::Terminal;
use std::io::{self, BufRead, Stdin, Stdout, Write};
use std::process::{Command, Stdio};

pub struct StdTerminal {
    stdin: Stdin,
    stdout: Stdout,
}

impl StdTerminal {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            stdout: io::stdout(),
        }
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the trailing `\n` or `\r\n` and nothing else.
fn strip_line_ending(line: &mut String) {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
}

impl Terminal for StdTerminal {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.stdout.flush()?;
        let mut line = String::new();
        if self.stdin.lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        strip_line_ending(&mut line);
        Ok(Some(line))
    }

    fn writer(&mut self) -> &mut dyn Write {
        &mut self.stdout
    }

    fn set_clipboard(&mut self, text: &str) -> io::Result<()> {
        let mut xclip = Command::new("xclip");
        xclip.args(["-selection", "clipboard"]);
        pipe_to(xclip, text)
    }
}

/// Run `command` with `text` on its stdin and wait for it to exit.
///
/// The child is always waited on, even when writing fails. A write error is
/// reported ahead of a bad exit status.
fn pipe_to(mut command: Command, text: &str) -> io::Result<()> {
    let mut child = command.stdin(Stdio::piped()).spawn()?;
    let written = match child.stdin.take() {
        Some(mut stdin) => stdin.write_all(text.as_bytes()),
        None => Ok(()),
    };
    let status = child.wait()?;
    written?;
    if !status.success() {
        return Err(io::Error::other(format!(
            "{:?} exited with {}",
            command.get_program(),
            status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_ending() {
        for (raw, expected) in [
            ("hello\n", "hello"),
            ("hello\r\n", "hello"),
            ("hello", "hello"),
            ("  spaced  \n", "  spaced  "),
            ("\n", ""),
        ] {
            let mut line = raw.to_string();
            strip_line_ending(&mut line);
            assert_eq!(line, expected);
        }
    }

    #[cfg(unix)]
    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.args(["-c", script]);
        command
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_delivers_text() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("clip.txt");
        let script = format!("cat > '{}'", out.display());
        pipe_to(shell(&script), "copied reply").unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "copied reply");
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_reports_exit_status() {
        let err = pipe_to(shell("cat > /dev/null; exit 3"), "x").unwrap_err();
        assert!(err.to_string().contains("exited with"));
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_to_reaps_child_after_write_error() {
        // Larger than a pipe buffer, to a child that never reads.
        let text = "x".repeat(4 * 1024 * 1024);
        let err = pipe_to(shell("exit 0"), &text).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_pipe_to_missing_program() {
        let err = pipe_to(Command::new("simple-chat-no-such-clipboard-tool"), "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
