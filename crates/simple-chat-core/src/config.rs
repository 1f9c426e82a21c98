//! Configuration loading and resolution.
//!
//! The config file is JSON. [`RawConfig`] mirrors the file; [`ResolvedConfig`]
//! is what the session runs on: paths made absolute against the data
//! directory, the terminal width clamped to the real terminal, the API key
//! read, and the palette validated.
//!
//! Directory precedence follows XDG: `$XDG_CONFIG_HOME` / `$XDG_DATA_HOME`
//! when set to an absolute path, else `~/.config` / `~/.local/share`, each
//! with a `simple-chat` subdirectory.

use crate::api::{ApiSettings, RequestOptions};
use crate::color::Palette;
use crate::error::{Error, Result};
use dirs_next::home_dir;
use serde::Deserialize;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "simple-chat";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Width used when none is configured.
pub const DEFAULT_TERM_WIDTH: usize = 80;

/// Per-user directories for config and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppDirs {
    pub fn from_env() -> io::Result<Self> {
        Ok(Self {
            config_dir: xdg_dir("XDG_CONFIG_HOME", ".config")?,
            data_dir: xdg_dir("XDG_DATA_HOME", ".local/share")?,
        })
    }

    pub fn default_config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

fn xdg_dir(var: &str, fallback: &str) -> io::Result<PathBuf> {
    if let Ok(value) = std::env::var(var) {
        let path = PathBuf::from(value);
        if path.is_absolute() {
            return Ok(path.join(APP_NAME));
        }
    }
    let home =
        home_dir().ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Home directory not found"))?;
    Ok(home.join(fallback).join(APP_NAME))
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f64 {
    0.0
}

/// The config file as written.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub api_key_file: Option<PathBuf>,
    #[serde(default = "default_model")]
    pub model: String,
    pub prompts_dir: Option<PathBuf>,
    pub chats_dir: Option<PathBuf>,
    pub token_usage_file: Option<PathBuf>,
    /// `0` means "use the real terminal width".
    pub term_width: Option<usize>,
    #[serde(default)]
    pub colors: Palette,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// JSONL log of requests and response metadata.
    pub request_log: Option<PathBuf>,
}

impl RawConfig {
    pub fn from_json(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            Error::config(format!("Malformed json in {}: {}", origin.display(), e))
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Couldn't read config file {}: {}", path.display(), e))
        })?;
        Self::from_json(&json, path)
    }
}

/// Settings that come from outside the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Value of `OPENAI_API_KEY`, if set and non-empty.
    pub env_api_key: Option<String>,
    /// Key file given with `-k/--key`.
    pub key_file: Option<PathBuf>,
    /// Columns of the attached terminal, if there is one.
    pub terminal_width: Option<usize>,
}

impl Overrides {
    /// Read the environment and probe the terminal.
    pub fn detect(key_file: Option<PathBuf>) -> Self {
        Self {
            env_api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            key_file,
            terminal_width: probe_terminal_width(),
        }
    }
}

pub fn probe_terminal_width() -> Option<usize> {
    crossterm::terminal::size()
        .ok()
        .map(|(columns, _)| usize::from(columns))
        .filter(|&columns| columns > 0)
}

/// An absent width defaults to 80. A configured width of 0, or one wider
/// than the real terminal, becomes the real terminal width.
pub fn clamp_term_width(configured: Option<usize>, real: Option<usize>) -> usize {
    let Some(configured) = configured else {
        return DEFAULT_TERM_WIDTH;
    };
    match real {
        Some(real) if configured == 0 || configured > real => real,
        None if configured == 0 => DEFAULT_TERM_WIDTH,
        _ => configured,
    }
}

/// Read the API key: the first line of the file, trimmed.
pub fn read_key_file(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Couldn't read API key file {}: {}", path.display(), e))
    })?;
    let key = contents.lines().next().unwrap_or("").trim();
    if key.is_empty() {
        return Err(Error::config(format!(
            "API key file {} is empty",
            path.display()
        )));
    }
    Ok(key.to_string())
}

fn missing_key_message() -> String {
    format!(
        "Must include either an api_key_file in config file, have the {} environment \
         variable set, or have specified the key path with the --key or -k command line options.",
        API_KEY_ENV
    )
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub model: String,
    pub prompts_dir: PathBuf,
    pub chats_dir: PathBuf,
    pub token_usage_file: PathBuf,
    pub term_width: usize,
    pub palette: Palette,
    pub base_url: String,
    pub temperature: f64,
    pub request_log: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Load the config at `config_path` (or the default location) against the
    /// live environment.
    pub fn load(config_path: Option<&Path>, key_file: Option<PathBuf>) -> Result<Self> {
        let dirs = AppDirs::from_env()?;
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dirs.default_config_path());
        log::debug!("loading config from {}", config_path.display());
        let raw = RawConfig::load(&config_path)?;
        Self::resolve(raw, &dirs, &Overrides::detect(key_file))
    }

    /// Key precedence: `OPENAI_API_KEY`, then `-k/--key`, then `api_key_file`.
    pub fn resolve(raw: RawConfig, dirs: &AppDirs, overrides: &Overrides) -> Result<Self> {
        let api_key = match (&overrides.env_api_key, &overrides.key_file, &raw.api_key_file) {
            (Some(key), _, _) => key.clone(),
            (None, Some(path), _) | (None, None, Some(path)) => read_key_file(path)?,
            (None, None, None) => return Err(Error::config(missing_key_message())),
        };

        raw.colors
            .validate()
            .map_err(|e| Error::config(format!("Bad color in config: {}", e)))?;

        let data_path = |configured: Option<PathBuf>, default: &str| match configured {
            Some(path) if path.is_absolute() => path,
            Some(path) => dirs.data_dir.join(path),
            None => dirs.data_dir.join(default),
        };

        let config = Self {
            api_key,
            model: raw.model,
            prompts_dir: data_path(raw.prompts_dir, "prompts"),
            chats_dir: data_path(raw.chats_dir, "chats"),
            token_usage_file: data_path(raw.token_usage_file, "token_usage.json"),
            term_width: clamp_term_width(raw.term_width, overrides.terminal_width),
            palette: raw.colors,
            base_url: raw.base_url,
            temperature: raw.temperature,
            request_log: raw.request_log.map(|p| data_path(Some(p), "")),
        };
        log::debug!(
            "resolved config: model={} prompts_dir={} chats_dir={} term_width={}",
            config.model,
            config.prompts_dir.display(),
            config.chats_dir.display(),
            config.term_width
        );
        Ok(config)
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            options: RequestOptions {
                model: self.model.clone(),
                temperature: self.temperature,
            },
            request_log: self.request_log.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn dirs(root: &Path) -> AppDirs {
        AppDirs {
            config_dir: root.join("config").join(APP_NAME),
            data_dir: root.join("data").join(APP_NAME),
        }
    }

    fn env_key() -> Overrides {
        Overrides {
            env_api_key: Some("sk-env".to_string()),
            ..Overrides::default()
        }
    }

    fn raw(json: &str) -> RawConfig {
        RawConfig::from_json(json, Path::new("config.json")).unwrap()
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs(tmp.path());
        let config = ResolvedConfig::resolve(raw("{}"), &dirs, &env_key()).unwrap();

        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.prompts_dir, dirs.data_dir.join("prompts"));
        assert_eq!(config.chats_dir, dirs.data_dir.join("chats"));
        assert_eq!(config.token_usage_file, dirs.data_dir.join("token_usage.json"));
        assert_eq!(config.term_width, 80);
        assert_eq!(config.palette, Palette::default());
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.temperature, 0.0);
        assert!(config.request_log.is_none());
    }

    #[test]
    fn test_relative_paths_join_data_dir() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs(tmp.path());
        let config = ResolvedConfig::resolve(
            raw(r#"{"prompts_dir": "my/prompts/", "chats_dir": "/abs/chats", "token_usage_file": "usage.json"}"#),
            &dirs,
            &env_key(),
        )
        .unwrap();

        assert_eq!(config.prompts_dir, dirs.data_dir.join("my/prompts"));
        assert_eq!(config.chats_dir, PathBuf::from("/abs/chats"));
        assert_eq!(config.token_usage_file, dirs.data_dir.join("usage.json"));
    }

    #[test]
    fn test_clamp_term_width() {
        assert_eq!(clamp_term_width(None, Some(200)), 80);
        assert_eq!(clamp_term_width(None, Some(40)), 80);
        assert_eq!(clamp_term_width(Some(0), Some(120)), 120);
        assert_eq!(clamp_term_width(Some(150), Some(120)), 120);
        assert_eq!(clamp_term_width(Some(100), Some(120)), 100);
        assert_eq!(clamp_term_width(Some(0), None), 80);
        assert_eq!(clamp_term_width(Some(100), None), 100);
    }

    #[test]
    fn test_key_precedence() {
        let tmp = TempDir::new().unwrap();
        let dirs = dirs(tmp.path());
        let cli_key = tmp.path().join("cli.key");
        let cfg_key = tmp.path().join("cfg.key");
        fs::write(&cli_key, "  sk-cli  \nsecond line\n").unwrap();
        fs::write(&cfg_key, "sk-cfg\n").unwrap();
        let json = format!(r#"{{"api_key_file": "{}"}}"#, cfg_key.display());

        let from_file = ResolvedConfig::resolve(raw(&json), &dirs, &Overrides::default()).unwrap();
        assert_eq!(from_file.api_key, "sk-cfg");

        let cli = Overrides {
            key_file: Some(cli_key.clone()),
            ..Overrides::default()
        };
        let from_cli = ResolvedConfig::resolve(raw(&json), &dirs, &cli).unwrap();
        assert_eq!(from_cli.api_key, "sk-cli");

        let env = Overrides {
            key_file: Some(cli_key),
            ..env_key()
        };
        let from_env = ResolvedConfig::resolve(raw(&json), &dirs, &env).unwrap();
        assert_eq!(from_env.api_key, "sk-env");
    }

    #[test]
    fn test_missing_key_source() {
        let tmp = TempDir::new().unwrap();
        let err = ResolvedConfig::resolve(raw("{}"), &dirs(tmp.path()), &Overrides::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("api_key_file"));
    }

    #[test]
    fn test_unreadable_or_empty_key_file() {
        let tmp = TempDir::new().unwrap();
        let empty = tmp.path().join("empty.key");
        fs::write(&empty, "\n").unwrap();
        assert!(read_key_file(&empty).is_err());
        assert!(read_key_file(&tmp.path().join("missing.key")).is_err());
    }

    #[test]
    fn test_bad_color_rejected() {
        let tmp = TempDir::new().unwrap();
        let err = ResolvedConfig::resolve(
            raw(r#"{"colors": {"red": "crimson"}}"#),
            &dirs(tmp.path()),
            &env_key(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("crimson"));
    }

    #[test]
    fn test_malformed_json() {
        let err = RawConfig::from_json("{\"model\": ", Path::new("/x/config.json")).unwrap_err();
        assert!(err.to_string().starts_with("Malformed json in /x/config.json"));
        assert!(RawConfig::load(Path::new("/nonexistent/config.json")).is_err());
    }

    #[test]
    #[serial]
    fn test_xdg_absolute_override() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/xdg-config");
            std::env::set_var("XDG_DATA_HOME", "/tmp/xdg-data");
        }
        let dirs = AppDirs::from_env().unwrap();
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
            std::env::remove_var("XDG_DATA_HOME");
        }
        assert_eq!(dirs.config_dir, PathBuf::from("/tmp/xdg-config/simple-chat"));
        assert_eq!(dirs.data_dir, PathBuf::from("/tmp/xdg-data/simple-chat"));
        assert_eq!(
            dirs.default_config_path(),
            PathBuf::from("/tmp/xdg-config/simple-chat/config.json")
        );
    }

    #[test]
    #[serial]
    fn test_xdg_relative_value_ignored() {
        // SAFETY: serialized with the other env-mutating tests
        unsafe {
            std::env::set_var("XDG_DATA_HOME", "relative/data");
        }
        let dirs = AppDirs::from_env();
        unsafe {
            std::env::remove_var("XDG_DATA_HOME");
        }
        let home = home_dir().unwrap();
        assert_eq!(dirs.unwrap().data_dir, home.join(".local/share/simple-chat"));
    }
}
