//! Core StudyService trait

use async_trait::async_trait;

use crate::chat::ChatMessage;
use crate::{Result, RotationStatus};

/// What the UI layer calls to obtain study content.
///
/// This trait lets consumers work against study content without coupling
/// to the upstream provider, the credential pool, or the cache.
#[async_trait]
pub trait StudyService: Send + Sync {
    /// Chapter notes. Cached by (subject, chapter).
    async fn generate_notes(&self, subject: &str, chapter: &str) -> Result<String>;

    /// Practice questions with solutions. Cached by (subject, chapter).
    async fn generate_questions(&self, subject: &str, chapter: &str) -> Result<String>;

    /// Narrated walkthrough of `notes`, base64 PCM. Never cached.
    async fn generate_audio(&self, notes: &str, subject: &str) -> Result<String>;

    /// Formula illustration, base64 image bytes. Never cached.
    async fn generate_image(&self, description: &str, subject: &str) -> Result<String>;

    /// Tutor reply to `message` given the earlier turns. Never cached.
    async fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String>;

    /// Credential rotation snapshot for status displays.
    fn status(&self) -> RotationStatus;
}
