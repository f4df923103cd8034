//! Client configuration.
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `~/.docchat/config.toml`
//! 3. Environment (`DOCCHAT_BACKEND_URL`, `DOCCHAT_SESSION_FILE`)
//! 4. Command-line flags

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

/// Backend address used when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

const CONFIG_DIR: &str = ".docchat";
const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session";

const ENV_BACKEND_URL: &str = "DOCCHAT_BACKEND_URL";
const ENV_SESSION_FILE: &str = "DOCCHAT_SESSION_FILE";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    backend_url: Option<String>,
    session_file: Option<PathBuf>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub session_file: Option<PathBuf>,
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base address of the backend, without a trailing slash.
    pub backend_url: String,
    /// Where the session token is persisted.
    pub session_file: PathBuf,
}

impl Config {
    /// Load configuration from disk, the environment and `overrides`.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let dir = config_dir()?;
        let file = read_file_config(&dir.join(CONFIG_FILE))?;
        Self::resolve(&dir, file, |key| std::env::var(key).ok(), overrides)
    }

    fn resolve(
        dir: &Path,
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let backend_url = overrides
            .backend_url
            .clone()
            .or_else(|| env(ENV_BACKEND_URL))
            .or(file.backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        let session_file = overrides
            .session_file
            .clone()
            .or_else(|| env(ENV_SESSION_FILE).map(PathBuf::from))
            .or(file.session_file)
            .unwrap_or_else(|| dir.join(SESSION_FILE));

        Ok(Self {
            backend_url: normalize_backend_url(&backend_url)?,
            session_file,
        })
    }
}

/// `~/.docchat`.
pub fn config_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .context("Could not find home directory")?
        .join(CONFIG_DIR))
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    debug!(path = %path.display(), "reading config file");
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
}

/// Check the URL is http(s) and strip any trailing slash.
fn normalize_backend_url(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw.trim())
        .with_context(|| format!("Invalid backend URL: {raw}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("Backend URL must use http or https: {raw}");
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}
