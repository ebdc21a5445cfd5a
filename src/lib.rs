//! Acebot - study content generation with credential rotation
//!
//! This crate fetches generated study notes, practice questions, narrated
//! audio, formula images, and tutor chat replies from a generative API.
//! Every upstream call goes through a [`KeyRotator`] that spreads requests
//! over a pool of API keys: keys that are rejected are blacklisted for the life of the process, rate
//! limits and overloads move on to the next key, and a working key stays
//! selected until it fails. Text responses are cached by request
//! fingerprint so repeat requests never reach the network.
//!
//! # Example
//!
//! ```rust,no_run
//! use acebot::{Acebot, RetryConfig, StudyService};
//! use acebot::cache::{CacheConfig, ResponseCache};
//! use acebot::providers::GeminiConfig;
//!
//! #[tokio::main]
//! async fn main() -> acebot::Result<()> {
//!     // API_KEY="key-one,key-two,key-three"
//!     let gateway = Acebot::builder()
//!         .env("API_KEY")
//!         .retry(RetryConfig::new().max_attempts(10))
//!         .cache(ResponseCache::new(&CacheConfig::default()))
//!         .gemini(GeminiConfig::default())
//!         .build()?;
//!
//!     let notes = gateway.generate_notes("Chemistry", "Solutions").await?;
//!     println!("{notes}");
//!
//!     let status = gateway.status();
//!     println!("{} keys active, using #{}", status.active_credentials, status.current_index);
//!     Ok(())
//! }
//! ```
//!
//! # Using the rotator directly
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use acebot::{KeyRotator, RetryConfig};
//! use acebot::credentials::EnvCredentials;
//!
//! # async fn run() -> acebot::Result<()> {
//! let rotator = KeyRotator::new(Arc::new(EnvCredentials::new("API_KEY")), RetryConfig::default());
//! let body = rotator
//!     .execute(|key| async move {
//!         // one network call using `key`
//!         Ok::<_, acebot::AcebotError>(format!("called with {}", key.len()))
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chat;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod prompts;
pub mod providers;
pub mod rotation;
pub mod telemetry;
pub mod traits;

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types at crate root
pub use chat::{ChatMessage, ChatRole};
pub use error::{AcebotError, FailureClass, Result};
pub use gateway::{Acebot, AcebotBuilder, StudyGateway};
pub use rotation::{KeyRotator, ResilienceState, RetryConfig, RotationReason, RotationStatus};
pub use traits::StudyService;
