//! Truecolor styling helpers and width measurement that ignores escape codes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::LazyLock;
use unicode_width::UnicodeWidthStr;

/// Basic ANSI colors, usable before the configured palette is known.
pub mod ansi {
    pub const RED: &str = "\x1b[31m";
    pub const RESET: &str = "\x1b[0m";

    pub fn paint(text: &str, color: &str) -> String {
        format!("{}{}{}", color, text, RESET)
    }
}

static ESCAPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[\d;]*[A-Za-z]").expect("escape pattern is a valid regex")
});

/// Remove CSI escape sequences.
pub fn strip_escapes(text: &str) -> String {
    ESCAPE_PATTERN.replace_all(text, "").into_owned()
}

/// Display width of `text` in columns, not counting escape sequences.
pub fn visible_len(text: &str) -> usize {
    strip_escapes(text).width()
}

/// Center `text` in `width` columns by visible width. Text at least as wide
/// as the window is returned unchanged.
pub fn center(text: &str, width: usize) -> String {
    let length = visible_len(text);
    if length >= width {
        return text.to_string();
    }
    let padding = " ".repeat((width - length) / 2);
    format!("{}{}{}", padding, text, padding)
}

/// Right-justify `text` in `width` columns by visible width.
pub fn rjust(text: &str, width: usize) -> String {
    let length = visible_len(text);
    if length >= width {
        return text.to_string();
    }
    format!("{}{}", " ".repeat(width - length), text)
}

/// Parse `#rrggbb` into its components.
pub fn parse_hex(color: &str) -> io::Result<(u8, u8, u8)> {
    let invalid = || {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid hex color '{}' (expected #rrggbb)", color),
        )
    };
    let hex = color.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
    };
    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Foreground truecolor escape for a hex color. Invalid colors produce no escape.
pub fn truecolor_escape(color: &str) -> String {
    match parse_hex(color) {
        Ok((r, g, b)) => format!("\x1b[38;2;{};{};{}m", r, g, b),
        Err(_) => String::new(),
    }
}

pub fn truecolor(text: &str, color: &str) -> String {
    format!("{}{}{}", truecolor_escape(color), text, ansi::RESET)
}

fn default_black() -> String {
    "#bdae93".to_string()
}
fn default_red() -> String {
    "#9d0006".to_string()
}
fn default_green() -> String {
    "#79740e".to_string()
}
fn default_yellow() -> String {
    "#b57614".to_string()
}
fn default_blue() -> String {
    "#076678".to_string()
}
fn default_magenta() -> String {
    "#8f3f71".to_string()
}
fn default_cyan() -> String {
    "#427b58".to_string()
}
fn default_white() -> String {
    "#ffffff".to_string()
}

/// The eight named colors from the `colors` config key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default = "default_black")]
    pub black: String,
    #[serde(default = "default_red")]
    pub red: String,
    #[serde(default = "default_green")]
    pub green: String,
    #[serde(default = "default_yellow")]
    pub yellow: String,
    #[serde(default = "default_blue")]
    pub blue: String,
    #[serde(default = "default_magenta")]
    pub magenta: String,
    #[serde(default = "default_cyan")]
    pub cyan: String,
    #[serde(default = "default_white")]
    pub white: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            black: default_black(),
            red: default_red(),
            green: default_green(),
            yellow: default_yellow(),
            blue: default_blue(),
            magenta: default_magenta(),
            cyan: default_cyan(),
            white: default_white(),
        }
    }
}

impl Palette {
    /// Check every entry parses as `#rrggbb`.
    pub fn validate(&self) -> io::Result<()> {
        for color in [
            &self.black,
            &self.red,
            &self.green,
            &self.yellow,
            &self.blue,
            &self.magenta,
            &self.cyan,
            &self.white,
        ] {
            parse_hex(color)?;
        }
        Ok(())
    }

    /// Command names.
    pub fn command(&self, text: &str) -> String {
        truecolor(text, &self.blue)
    }

    /// Config keys and paths.
    pub fn config(&self, text: &str) -> String {
        truecolor(text, &self.green)
    }

    pub fn error(&self, text: &str) -> String {
        truecolor(text, &self.red)
    }

    /// The `   >>> ` input marker.
    pub fn prompt_marker(&self) -> String {
        truecolor("   >>> ", &self.yellow)
    }
}
