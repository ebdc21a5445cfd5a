//! Acebot error types and failure classification

use std::time::Duration;

/// Acebot error types
#[derive(Debug, thiserror::Error)]
pub enum AcebotError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("upstream overloaded: {0}")]
    Overloaded(String),

    /// The credential itself was rejected (bad key, revoked, wrong project).
    #[error("invalid credential ({status}): {message}")]
    InvalidCredential { status: u16, message: String },

    // Rotation errors
    #[error("no credentials available")]
    NoCredentialsAvailable,

    #[error("retries exhausted after {attempts} attempts: {source}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        source: Box<AcebotError>,
    },

    // Cache errors
    #[error("cache storage quota exceeded")]
    CacheQuotaExceeded,

    #[error("cache error: {0}")]
    Cache(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty response from model")]
    EmptyResponse,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// How the rotator should react to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The credential will never succeed: blacklist it and move on.
    InvalidCredential,
    /// Rate limit or overload: rotate, and wait first when `overloaded`.
    Transient { overloaded: bool },
    /// Anything else: rotate anyway.
    Unclassified,
}

impl FailureClass {
    /// Map an HTTP status code to a retry policy.
    ///
    /// A bare 404 is unclassified: it usually names a missing model, not a
    /// bad key.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 401 | 403 => FailureClass::InvalidCredential,
            429 => FailureClass::Transient { overloaded: false },
            503 => FailureClass::Transient { overloaded: true },
            _ => FailureClass::Unclassified,
        }
    }
}

impl AcebotError {
    /// Classify this error for the rotation loop.
    ///
    /// Only structured fields are consulted; message text never changes
    /// the outcome.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            AcebotError::InvalidCredential { .. } => FailureClass::InvalidCredential,
            AcebotError::RateLimited { .. } => FailureClass::Transient { overloaded: false },
            AcebotError::Overloaded(_) => FailureClass::Transient { overloaded: true },
            AcebotError::Api { status, .. } => FailureClass::from_status(*status),
            _ => FailureClass::Unclassified,
        }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AcebotError::Api { status, .. } | AcebotError::InvalidCredential { status, .. } => {
                Some(*status)
            }
            AcebotError::RateLimited { .. } => Some(429),
            AcebotError::Overloaded(_) => Some(503),
            _ => None,
        }
    }

    /// Suggested wait from a `RateLimited` error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AcebotError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Whether the caller should offer the user a retry.
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(
            self,
            AcebotError::ExhaustedRetries { .. } | AcebotError::NoCredentialsAvailable
        )
    }
}

/// Result type alias for Acebot operations
pub type Result<T> = std::result::Result<T, AcebotError>;
