//! Credential pool parsing and sources.
//!
//! A pool is parsed from one raw string of comma-separated tokens. The raw
//! string is fetched from a [`CredentialSource`] on every lookup, so edits
//! to the environment or the secrets file take effect without a restart.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::{AcebotError, Result};

/// Tokens shorter than this are treated as placeholders and dropped.
pub const DEFAULT_MIN_CREDENTIAL_LEN: usize = 10;

/// Default environment variable holding the comma-separated keys.
pub const DEFAULT_ENV_VAR: &str = "API_KEY";

/// Parse a raw comma-separated credential string into an ordered pool.
///
/// Each token is trimmed and stripped of quote and invisible characters.
/// Tokens shorter than `min_len` are discarded and duplicates keep only
/// their first position.
///
/// ```rust
/// # use acebot::credentials::parse_pool;
/// let pool = parse_pool(" \"AIzaSyA-first-key\", short ,AIzaSyB-second\u{200B}key", 10);
/// assert_eq!(pool, vec!["AIzaSyA-first-key", "AIzaSyB-secondkey"]);
/// ```
pub fn parse_pool(raw: &str, min_len: usize) -> Vec<String> {
    let mut pool: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let cleaned: String = token
            .chars()
            .filter(|c| !is_stripped(*c))
            .collect::<String>()
            .trim()
            .to_string();
        if cleaned.chars().count() < min_len {
            continue;
        }
        if !pool.contains(&cleaned) {
            pool.push(cleaned);
        }
    }
    pool
}

fn is_stripped(c: char) -> bool {
    matches!(
        c,
        '"' | '\'' | '`' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
    ) || c.is_control()
}

/// Where the raw credential string comes from.
///
/// Implementations must not cache: [`raw`](CredentialSource::raw) is called
/// before every attempt.
pub trait CredentialSource: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Current raw value, or `None` when the source has nothing configured.
    fn raw(&self) -> Option<String>;
}

/// Reads an environment variable at call time.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_VAR)
    }
}

impl CredentialSource for EnvCredentials {
    fn name(&self) -> &str {
        &self.var
    }

    fn raw(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// A fixed raw string.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    raw: String,
}

impl StaticCredentials {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

impl CredentialSource for StaticCredentials {
    fn name(&self) -> &str {
        "static"
    }

    fn raw(&self) -> Option<String> {
        Some(self.raw.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    api_keys: Option<String>,
}

/// Re-reads a secrets TOML file (`api_keys = "k1,k2"`) on every lookup.
///
/// The file must not be readable by group or others on unix. A missing,
/// unreadable, or insecure file yields `None` and logs a warning.
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and validate the secrets file.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        check_permissions(&self.path)?;
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AcebotError::Configuration(format!(
                "Failed to read secrets file {:?}: {e}",
                self.path
            ))
        })?;
        let secrets: SecretsFile = toml::from_str(&content).map_err(|e| {
            AcebotError::Configuration(format!(
                "Failed to parse secrets file {:?}: {e}",
                self.path
            ))
        })?;
        Ok(secrets.api_keys)
    }
}

impl CredentialSource for FileCredentials {
    fn name(&self) -> &str {
        "secrets-file"
    }

    fn raw(&self) -> Option<String> {
        match self.load() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring secrets file");
                None
            }
        }
    }
}

/// Check that the secrets file has secure permissions (0600 or 0400).
#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path).map_err(|e| {
        AcebotError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
    })?;

    let mode = metadata.permissions().mode();
    if mode & 0o077 != 0 {
        return Err(AcebotError::Configuration(format!(
            "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
            mode & 0o777
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Tries each source in order; the first non-blank value wins.
pub struct FallbackCredentials {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl FallbackCredentials {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }
}

impl CredentialSource for FallbackCredentials {
    fn name(&self) -> &str {
        "fallback"
    }

    fn raw(&self) -> Option<String> {
        self.sources
            .iter()
            .filter_map(|s| s.raw())
            .find(|raw| !raw.trim().is_empty())
    }
}
