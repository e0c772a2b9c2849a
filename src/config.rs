//! Run configuration and the local credentials file
//!
//! [`RunConfig`] is built once per process and passed by reference into the
//! sync engine. [`Credentials`] are persisted as a small JSON file holding the
//! two API keys; keys missing from both the file and the environment are asked
//! for once and written back.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// Delay between passes in continuous mode.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Nodes edited longer ago than this are skipped in realtime mode.
pub const STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Default location of the credentials file.
pub const DEFAULT_CREDENTIALS_FILE: &str = "note.json";

pub const GOOGLE_KEY_ENV: &str = "GOOGLE_TRANSLATE_API_KEY";
pub const NOTION_KEY_ENV: &str = "NOTION_API_KEY";

/// Error types for configuration loading
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(String),
    MissingKey(&'static str),
    InvalidInput(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Parse(msg) => write!(f, "Invalid credentials file: {}", msg),
            ConfigError::MissingKey(key) => write!(f, "Missing credential: {}", key),
            ConfigError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Whether a run produces translations or removes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create {
        /// `None` lets the translator detect the source language.
        source: Option<String>,
        target: Option<String>,
    },
    Revert,
}

/// Immutable parameters for one process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub mode: Mode,
    pub include_subpages: bool,
    /// Only touch recently edited nodes and keep polling.
    pub realtime: bool,
    pub poll_interval: Duration,
    pub stale_after: Duration,
}

impl RunConfig {
    pub fn create(source: Option<String>, target: Option<String>) -> Self {
        Self {
            mode: Mode::Create { source, target },
            include_subpages: false,
            realtime: false,
            poll_interval: POLL_INTERVAL,
            stale_after: STALE_AFTER,
        }
    }

    /// Revert runs never poll and ignore languages.
    pub fn revert() -> Self {
        Self {
            mode: Mode::Revert,
            include_subpages: false,
            realtime: false,
            poll_interval: POLL_INTERVAL,
            stale_after: STALE_AFTER,
        }
    }

    pub fn with_subpages(mut self, include_subpages: bool) -> Self {
        self.include_subpages = include_subpages;
        self
    }

    /// Realtime only applies to create runs; it is dropped for revert.
    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime && self.is_create();
        self
    }

    pub fn is_create(&self) -> bool {
        matches!(self.mode, Mode::Create { .. })
    }

    /// Continuous polling is only meaningful for realtime create runs.
    pub fn is_continuous(&self) -> bool {
        self.is_create() && self.realtime
    }

    pub fn languages(&self) -> (Option<&str>, Option<&str>) {
        match &self.mode {
            Mode::Create { source, target } => (source.as_deref(), target.as_deref()),
            Mode::Revert => (None, None),
        }
    }
}

/// The two API keys, as stored in the credentials file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_cloud_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notion_api_key: Option<String>,
}

impl Credentials {
    /// Read the credentials file; a missing file yields empty credentials.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("'{}': {}", path.display(), e)))
    }

    /// Write the credentials file with four-space indentation.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        out.push(b'\n');
        fs::write(path, out)?;
        Ok(())
    }

    /// Keys set in `GOOGLE_TRANSLATE_API_KEY` / `NOTION_API_KEY`.
    pub fn from_env() -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            google_cloud_api_key: read(GOOGLE_KEY_ENV),
            notion_api_key: read(NOTION_KEY_ENV),
        }
    }

    /// `other`'s keys win where present.
    pub fn overridden_by(&self, other: &Credentials) -> Credentials {
        Credentials {
            google_cloud_api_key: other
                .google_cloud_api_key
                .clone()
                .or_else(|| self.google_cloud_api_key.clone()),
            notion_api_key: other
                .notion_api_key
                .clone()
                .or_else(|| self.notion_api_key.clone()),
        }
    }

    pub fn google_key(&self) -> ConfigResult<&str> {
        self.google_cloud_api_key
            .as_deref()
            .ok_or(ConfigError::MissingKey("googleCloudApiKey"))
    }

    pub fn notion_key(&self) -> ConfigResult<&str> {
        self.notion_api_key
            .as_deref()
            .ok_or(ConfigError::MissingKey("notionApiKey"))
    }

    /// Load the file at `path`, apply `env`, and prompt for whatever is still
    /// missing. Answers are saved back to the file; environment values never
    /// are. Blank answers leave the key unset.
    pub fn resolve_with<F>(path: &Path, env: &Credentials, mut prompt: F) -> ConfigResult<Self>
    where
        F: FnMut(&str) -> io::Result<String>,
    {
        let mut stored = Self::load(path)?;
        let mut modified = false;

        if stored.google_cloud_api_key.is_none() && env.google_cloud_api_key.is_none() {
            let answer = prompt("Enter your Google Cloud API key")?;
            if !answer.trim().is_empty() {
                stored.google_cloud_api_key = Some(answer.trim().to_string());
                modified = true;
            }
        }
        if stored.notion_api_key.is_none() && env.notion_api_key.is_none() {
            let answer = prompt("Enter your Notion API key")?;
            if !answer.trim().is_empty() {
                stored.notion_api_key = Some(answer.trim().to_string());
                modified = true;
            }
        }

        if modified {
            stored.save(path)?;
        }
        Ok(stored.overridden_by(env))
    }
}

/// Trailing page id: 32 hex digits or a dashed UUID.
static PAGE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([0-9a-f]{32}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$",
    )
    .expect("page id pattern is valid")
});

/// Page id from a raw id or a Notion page URL.
///
/// Accepts `https://www.notion.so/ws/My-Page-0123456789abcdef0123456789abcdef`,
/// URLs with a query string, dashed UUIDs and bare ids.
pub fn page_id_from_url(input: &str) -> Option<String> {
    let input = input.trim().trim_end_matches('/');
    let path = input.split(['?', '#']).next().unwrap_or(input);
    if path.is_empty() {
        return None;
    }

    if let Some(found) = PAGE_ID.captures(path).and_then(|caps| caps.get(1)) {
        return Some(found.as_str().to_string());
    }

    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment
        .rsplit('-')
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Interpret a `y/n` style answer; anything unrecognised is "no".
pub fn parse_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

/// Interpret a `c/r` answer: `true` for create.
pub fn parse_create_mode(answer: &str) -> ConfigResult<bool> {
    match answer.trim().to_lowercase().as_str() {
        "c" | "create" => Ok(true),
        "r" | "revert" | "remove" => Ok(false),
        other => Err(ConfigError::InvalidInput(format!(
            "expected 'c' or 'r', got '{}'",
            other
        ))),
    }
}
