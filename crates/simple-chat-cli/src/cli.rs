// Command-line flags for simple-chat

use clap::Parser;
use std::path::PathBuf;

/// Every flag takes a path, and the path has to exist.
fn existing_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("the path '{}' doesn't exist", value))
    }
}

/// simple-chat - chat with a completion model from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "simple-chat",
    version,
    about = "Chat with a completion model from the terminal"
)]
pub struct Cli {
    /// Config file to use instead of $XDG_CONFIG_HOME/simple-chat/config.json
    #[arg(short = 'f', long = "config", value_name = "PATH", value_parser = existing_path)]
    pub config: Option<PathBuf>,

    /// Chat file to resume
    #[arg(short = 'c', long = "chat", value_name = "PATH", value_parser = existing_path)]
    pub chat: Option<PathBuf>,

    /// Prompt file to use as the system message
    #[arg(short = 'p', long = "prompt", value_name = "PATH", value_parser = existing_path)]
    pub prompt: Option<PathBuf>,

    /// File holding the API key (first line)
    #[arg(short = 'k', long = "key", value_name = "PATH", value_parser = existing_path)]
    pub key: Option<PathBuf>,
}

impl Cli {
    /// Parse from an argument list (testable version).
    pub fn parse_from_args<I, S>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use tempfile::NamedTempFile;

    #[test]
    fn test_no_flags() {
        let cli = Cli::parse_from_args(["simple-chat"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.chat.is_none());
        assert!(cli.prompt.is_none());
        assert!(cli.key.is_none());
    }

    #[test]
    fn test_short_and_long_flags() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();

        let short = Cli::parse_from_args(["simple-chat", "-f", path, "-c", path, "-p", path, "-k", path])
            .unwrap();
        assert_eq!(short.config.as_deref(), Some(file.path()));
        assert_eq!(short.key.as_deref(), Some(file.path()));

        let long = Cli::parse_from_args(["simple-chat", "--chat", path, "--prompt", path]).unwrap();
        assert_eq!(long.chat.as_deref(), Some(file.path()));
        assert_eq!(long.prompt.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_missing_path_rejected() {
        let err = Cli::parse_from_args(["simple-chat", "-c", "/definitely/not/here.chat"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("doesn't exist"));
    }

    #[test]
    fn test_missing_value_rejected() {
        let err = Cli::parse_from_args(["simple-chat", "--key"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = Cli::parse_from_args(["simple-chat", "--model", "x"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }
}
