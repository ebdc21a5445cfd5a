//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.acebot/config.toml` (user)
//! 3. `/etc/acebot/config.toml` (system)
//!
//! Credentials never live in the config file. They are read on every
//! request from the environment variable named in `[credentials]`, falling
//! back to an optional secrets file that must be 0600.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{CacheConfig, CachePolicy, ResponseCache};
use crate::credentials::{
    DEFAULT_ENV_VAR, DEFAULT_MIN_CREDENTIAL_LEN, EnvCredentials, FallbackCredentials,
    FileCredentials,
};
use crate::gateway::{Acebot, StudyGateway};
use crate::providers::GeminiConfig;
use crate::rotation::RetryConfig;
use crate::{AcebotError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Where credentials come from.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    /// Environment variable holding comma-separated keys (default: API_KEY).
    #[serde(default = "default_env")]
    pub env: String,
    /// Secrets file consulted when the variable is unset or blank.
    /// Default: `~/.acebot/secrets.toml`.
    #[serde(default)]
    pub secrets_file: Option<PathBuf>,
    /// Tokens shorter than this are ignored (default: 10).
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            secrets_file: None,
            min_length: default_min_length(),
        }
    }
}

fn default_env() -> String {
    DEFAULT_ENV_VAR.to_string()
}

fn default_min_length() -> usize {
    DEFAULT_MIN_CREDENTIAL_LEN
}

/// Rotation loop settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts across all credentials (default: 20).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait after a 503 in milliseconds (default: 800).
    #[serde(default = "default_overload_delay_ms")]
    pub overload_delay_ms: u64,
    /// Start at a random credential (default: false).
    #[serde(default)]
    pub random_start: bool,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            overload_delay_ms: default_overload_delay_ms(),
            random_start: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    20
}

fn default_overload_delay_ms() -> u64 {
    800
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// "wipe-on-quota" (default) or "lru".
    #[serde(default)]
    pub policy: CachePolicy,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: usize,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: default_namespace(),
            policy: CachePolicy::default(),
            path: None,
            quota_bytes: default_quota_bytes(),
            max_entries: default_max_entries(),
            ttl_secs: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    crate::cache::response::DEFAULT_NAMESPACE.to_string()
}

fn default_quota_bytes() -> usize {
    crate::cache::store::DEFAULT_QUOTA_BYTES
}

fn default_max_entries() -> u64 {
    1_000
}

/// Upstream API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_audio_model")]
    pub audio_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// Per-request timeout in seconds (default: 60).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            text_model: default_text_model(),
            audio_model: default_audio_model(),
            image_model: default_image_model(),
            chat_model: default_chat_model(),
            voice: default_voice(),
            aspect_ratio: default_aspect_ratio(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    GeminiConfig::default().base_url
}

fn default_text_model() -> String {
    GeminiConfig::default().text_model
}

fn default_audio_model() -> String {
    GeminiConfig::default().audio_model
}

fn default_image_model() -> String {
    GeminiConfig::default().image_model
}

fn default_chat_model() -> String {
    GeminiConfig::default().chat_model
}

fn default_voice() -> String {
    GeminiConfig::default().voice
}

fn default_aspect_ratio() -> String {
    GeminiConfig::default().aspect_ratio
}

fn default_timeout() -> u64 {
    60
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.acebot/config.toml`
    /// 3. `/etc/acebot/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Like [`load`](Self::load), but falls back to defaults when no file
    /// exists and no explicit path was given.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        if explicit_path.is_some() {
            return Self::load(explicit_path);
        }
        match Self::find_config_path() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AcebotError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            AcebotError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(AcebotError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(AcebotError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Self::find_config_path().ok_or_else(|| {
            AcebotError::Configuration(
                "No config file found. Create ~/.acebot/config.toml or /etc/acebot/config.toml"
                    .to_string(),
            )
        })
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".acebot").join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/acebot/config.toml");
        system_config.exists().then_some(system_config)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.retry.max_attempts)
            .overload_delay(Duration::from_millis(self.retry.overload_delay_ms))
            .random_start(self.retry.random_start)
            .min_credential_len(self.credentials.min_length)
    }

    /// `None` when caching is disabled.
    pub fn cache_config(&self) -> Option<CacheConfig> {
        if !self.cache.enabled {
            return None;
        }
        let mut config = CacheConfig::new()
            .namespace(self.cache.namespace.clone())
            .policy(self.cache.policy)
            .quota_bytes(self.cache.quota_bytes)
            .max_entries(self.cache.max_entries);
        if let Some(ref path) = self.cache.path {
            config = config.path(path);
        }
        if let Some(secs) = self.cache.ttl_secs {
            config = config.ttl(Duration::from_secs(secs));
        }
        Some(config)
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.upstream.base_url.clone(),
            text_model: self.upstream.text_model.clone(),
            audio_model: self.upstream.audio_model.clone(),
            image_model: self.upstream.image_model.clone(),
            chat_model: self.upstream.chat_model.clone(),
            voice: self.upstream.voice.clone(),
            aspect_ratio: self.upstream.aspect_ratio.clone(),
            timeout: Duration::from_secs(self.upstream.timeout_secs),
        }
    }

    fn secrets_path(&self) -> Option<PathBuf> {
        self.credentials.secrets_file.clone().or_else(|| {
            dirs::home_dir().map(|home| home.join(".acebot").join("secrets.toml"))
        })
    }

    /// Build a [`StudyGateway`] backed by the Gemini client.
    pub fn build_gateway(&self) -> Result<StudyGateway> {
        let mut sources: Vec<Box<dyn crate::credentials::CredentialSource>> =
            vec![Box::new(EnvCredentials::new(&self.credentials.env))];
        if let Some(path) = self.secrets_path() {
            sources.push(Box::new(FileCredentials::new(path)));
        }

        let mut builder = Acebot::builder()
            .credentials(FallbackCredentials::new(sources))
            .retry(self.retry_config())
            .gemini(self.gemini_config());

        if let Some(cache) = self.cache_config() {
            builder = builder.cache(ResponseCache::new(&cache));
        }

        builder.build()
    }
}
