//! Builder for configuring gateway instances

use std::sync::Arc;

use super::StudyGateway;
use crate::cache::ResponseCache;
use crate::credentials::{CredentialSource, EnvCredentials};
use crate::providers::{ContentProvider, GeminiClient, GeminiConfig};
use crate::rotation::{KeyRotator, RetryConfig};
use crate::{AcebotError, Result};

/// Main entry point for creating gateway instances.
pub struct Acebot;

impl Acebot {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> AcebotBuilder {
        AcebotBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// ```rust,no_run
/// use acebot::{Acebot, StudyService};
/// use acebot::providers::GeminiConfig;
///
/// # async fn run() -> acebot::Result<()> {
/// let gateway = Acebot::builder()
///     .env("GEMINI_API_KEYS")
///     .gemini(GeminiConfig::default())
///     .build()?;
///
/// let notes = gateway.generate_notes("Physics", "Electric Charges and Fields").await?;
/// println!("{notes}");
/// # Ok(())
/// # }
/// ```
pub struct AcebotBuilder {
    credentials: Option<Arc<dyn CredentialSource>>,
    retry: RetryConfig,
    cache: Option<ResponseCache>,
    provider: Option<Arc<dyn ContentProvider>>,
    gemini: Option<GeminiConfig>,
}

impl AcebotBuilder {
    pub fn new() -> Self {
        Self {
            credentials: None,
            retry: RetryConfig::default(),
            cache: None,
            provider: None,
            gemini: None,
        }
    }

    /// Use a custom credential source (default: the `API_KEY` env var).
    pub fn credentials(mut self, source: impl CredentialSource + 'static) -> Self {
        self.credentials = Some(Arc::new(source));
        self
    }

    /// Read credentials from the named environment variable.
    pub fn env(self, var: impl Into<String>) -> Self {
        self.credentials(EnvCredentials::new(var))
    }

    /// Set the rotation/retry configuration.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Enable response caching for text requests.
    pub fn cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a custom upstream provider. Takes precedence over [`gemini`](Self::gemini).
    pub fn provider(mut self, provider: Arc<dyn ContentProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use the bundled Gemini client.
    pub fn gemini(mut self, config: GeminiConfig) -> Self {
        self.gemini = Some(config);
        self
    }

    pub fn build(self) -> Result<StudyGateway> {
        let provider: Arc<dyn ContentProvider> = match (self.provider, self.gemini) {
            (Some(provider), _) => provider,
            (None, Some(config)) => Arc::new(GeminiClient::new(config)?),
            (None, None) => {
                return Err(AcebotError::Configuration(
                    "no content provider configured".to_string(),
                ));
            }
        };

        let credentials = self
            .credentials
            .unwrap_or_else(|| Arc::new(EnvCredentials::default()));
        let rotator = KeyRotator::new(credentials, self.retry);

        Ok(StudyGateway::new(rotator, self.cache, provider))
    }
}

impl Default for AcebotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
