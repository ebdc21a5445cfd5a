//! Upstream provider trait.
//!
//! A [`ContentProvider`] performs exactly one network call per method and
//! receives the credential to use from the caller. It never retries or
//! rotates on its own; that is [`KeyRotator`](crate::KeyRotator)'s job.
//!
//! Implementations should map failures onto the structured variants of
//! [`AcebotError`](crate::AcebotError) so the rotator can classify them:
//!
//! - rejected credential: `InvalidCredential`
//! - rate limited: `RateLimited`
//! - upstream overloaded: `Overloaded`
//! - other HTTP status: `Api`
//! - transport failure: `Http`

use async_trait::async_trait;

use crate::Result;
use crate::chat::ChatMessage;

/// Provider for generated text, speech, images, and chat replies.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Generate text for a prompt.
    async fn generate_text(&self, credential: &str, prompt: &str) -> Result<String>;

    /// Generate narrated speech. Returns base64-encoded PCM.
    async fn generate_audio(&self, credential: &str, prompt: &str) -> Result<String>;

    /// Generate an image. Returns base64-encoded image bytes.
    async fn generate_image(&self, credential: &str, prompt: &str) -> Result<String>;

    /// Continue a conversation: `history` in order, then `message` from the user.
    async fn chat(
        &self,
        credential: &str,
        system: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String>;
}
