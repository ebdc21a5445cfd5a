//! StudyGateway - composes cache, credential rotation, and the upstream provider

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{ContentKind, ResponseCache};
use crate::chat::ChatMessage;
use crate::providers::ContentProvider;
use crate::rotation::{KeyRotator, RotationStatus};
use crate::{AcebotError, Result, StudyService, prompts};

/// Gateway that serves study content through a [`KeyRotator`].
///
/// Text requests consult the [`ResponseCache`] first; a hit returns without
/// touching the rotator. Audio, image, and chat requests always go upstream.
pub struct StudyGateway {
    rotator: KeyRotator,
    cache: Option<ResponseCache>,
    provider: Arc<dyn ContentProvider>,
}

impl StudyGateway {
    pub(crate) fn new(
        rotator: KeyRotator,
        cache: Option<ResponseCache>,
        provider: Arc<dyn ContentProvider>,
    ) -> Self {
        Self {
            rotator,
            cache,
            provider,
        }
    }

    pub fn rotator(&self) -> &KeyRotator {
        &self.rotator
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Remove every cached response. No-op without a cache.
    pub fn clear_cache(&self) -> Result<()> {
        match &self.cache {
            Some(cache) => cache.clear(),
            None => Ok(()),
        }
    }

    async fn cached_text(
        &self,
        kind: ContentKind,
        subject: &str,
        chapter: &str,
        prompt: String,
    ) -> Result<String> {
        require("subject", subject)?;
        require("chapter", chapter)?;

        if let Some(hit) = self
            .cache
            .as_ref()
            .and_then(|c| c.lookup(kind, subject, chapter))
        {
            return Ok(hit);
        }

        let text = self.text(&prompt).await?;

        if let Some(cache) = &self.cache {
            cache.set(&cache.key(kind, subject, chapter), &text);
        }
        Ok(text)
    }

    async fn text(&self, prompt: &str) -> Result<String> {
        let provider = &self.provider;
        debug!(provider = provider.name(), "generating text");
        self.rotator
            .execute(move |credential| async move {
                provider.generate_text(&credential, prompt).await
            })
            .await
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AcebotError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}

#[async_trait]
impl StudyService for StudyGateway {
    async fn generate_notes(&self, subject: &str, chapter: &str) -> Result<String> {
        let prompt = prompts::notes(subject, chapter);
        self.cached_text(ContentKind::Notes, subject, chapter, prompt)
            .await
    }

    async fn generate_questions(&self, subject: &str, chapter: &str) -> Result<String> {
        let prompt = prompts::questions(subject, chapter);
        self.cached_text(ContentKind::Questions, subject, chapter, prompt)
            .await
    }

    async fn generate_audio(&self, notes: &str, subject: &str) -> Result<String> {
        require("notes", notes)?;
        let prompt = prompts::audio(notes, subject);
        let prompt = prompt.as_str();
        let provider = &self.provider;
        debug!(provider = provider.name(), "generating audio");
        self.rotator
            .execute(move |credential| async move {
                provider.generate_audio(&credential, prompt).await
            })
            .await
    }

    async fn generate_image(&self, description: &str, subject: &str) -> Result<String> {
        require("description", description)?;
        let prompt = prompts::image(description, subject);
        let prompt = prompt.as_str();
        let provider = &self.provider;
        debug!(provider = provider.name(), "generating image");
        self.rotator
            .execute(move |credential| async move {
                provider.generate_image(&credential, prompt).await
            })
            .await
    }

    async fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String> {
        require("message", message)?;
        let provider = &self.provider;
        debug!(
            provider = provider.name(),
            turns = history.len(),
            "generating chat reply"
        );
        self.rotator
            .execute(move |credential| async move {
                provider
                    .chat(&credential, prompts::TUTOR_INSTRUCTION, history, message)
                    .await
            })
            .await
    }

    fn status(&self) -> RotationStatus {
        self.rotator.status()
    }
}
