//! Gemini `generateContent` client.
//!
//! Speaks the public REST endpoint directly:
//! `POST {base_url}/v1beta/models/{model}:generateContent` with the key in
//! the `x-goog-api-key` header.
//! See: <https://ai.google.dev/api/generate-content>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::ContentProvider;
use crate::chat::{ChatMessage, ChatRole};
use crate::{AcebotError, Result};

/// Default base URL for the Gemini API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// `details[].reason` Gemini attaches when the key itself is rejected.
const API_KEY_INVALID: &str = "API_KEY_INVALID";

/// Models, voice, and transport settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub base_url: String,
    pub text_model: String,
    pub audio_model: String,
    pub image_model: String,
    pub chat_model: String,
    /// Prebuilt voice for speech output.
    pub voice: String,
    /// Aspect ratio requested for images.
    pub aspect_ratio: String,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            text_model: "gemini-flash-latest".to_string(),
            audio_model: "gemini-2.5-flash-preview-tts".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            chat_model: "gemini-3-flash-preview".to_string(),
            voice: "Kore".to_string(),
            aspect_ratio: "4:3".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl GeminiConfig {
    /// Defaults with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Client for the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AcebotError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate(
        &self,
        credential: &str,
        model: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", credential)
            .json(request)
            .send()
            .await
            .map_err(|e| AcebotError::Http(e.to_string()))?;

        let response = error_for_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| AcebotError::Http(e.to_string()))
    }
}

/// Check response status and map to the rotation-aware error variants.
async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);

    let body = response.text().await.unwrap_or_default();
    let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
    let key_invalid = envelope
        .as_ref()
        .is_some_and(|e| e.error.names_reason(API_KEY_INVALID));
    let message = envelope
        .map(|e| e.error.message)
        .unwrap_or_else(|| format!("Gemini API error: {status}"));

    Err(match status.as_u16() {
        code @ (400 | 401 | 403) => AcebotError::InvalidCredential {
            status: code,
            message,
        },
        // Unknown model unless the body blames the key
        404 if key_invalid => AcebotError::InvalidCredential {
            status: 404,
            message,
        },
        429 => AcebotError::RateLimited { retry_after },
        503 => AcebotError::Overloaded(message),
        code => AcebotError::Api {
            status: code,
            message,
        },
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

impl<'a> GenerateContentRequest<'a> {
    fn prompt(text: &'a str) -> Self {
        Self {
            contents: vec![Content::text(None, text)],
            system_instruction: None,
            generation_config: None,
        }
    }

    /// Multi-turn request: earlier turns in order, then the new user message.
    fn conversation(system: &'a str, history: &'a [ChatMessage], message: &'a str) -> Self {
        let contents = history
            .iter()
            .map(|turn| Content::text(Some(turn.role.as_str()), &turn.text))
            .chain(std::iter::once(Content::text(
                Some(ChatRole::User.as_str()),
                message,
            )))
            .collect();
        Self {
            contents,
            system_instruction: Some(Content::text(None, system)),
            generation_config: None,
        }
    }
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<TextPart<'a>>,
}

impl<'a> Content<'a> {
    fn text(role: Option<&'a str>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![TextPart { text }],
        }
    }
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig<'a> {
    aspect_ratio: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let text: String = self.parts().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// First inline (base64) payload of the first candidate.
    fn inline_data(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.inline_data))
            .map(|d| d.data)
            .filter(|d| !d.is_empty())
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    data: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

impl ErrorBody {
    fn names_reason(&self, reason: &str) -> bool {
        self.details
            .iter()
            .any(|d| d.reason.as_deref() == Some(reason))
    }
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

// ============================================================================
// Provider Trait Implementation
// ============================================================================

#[async_trait]
impl ContentProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, credential: &str, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::prompt(prompt);
        let response = self
            .generate(credential, &self.config.text_model, &request)
            .await?;
        response.text().ok_or(AcebotError::EmptyResponse)
    }

    async fn generate_audio(&self, credential: &str, prompt: &str) -> Result<String> {
        let mut request = GenerateContentRequest::prompt(prompt);
        request.generation_config = Some(GenerationConfig {
            response_modalities: Some(vec!["AUDIO"]),
            speech_config: Some(SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: &self.config.voice,
                    },
                },
            }),
            ..GenerationConfig::default()
        });
        let response = self
            .generate(credential, &self.config.audio_model, &request)
            .await?;
        response.inline_data().ok_or(AcebotError::EmptyResponse)
    }

    async fn generate_image(&self, credential: &str, prompt: &str) -> Result<String> {
        let mut request = GenerateContentRequest::prompt(prompt);
        request.generation_config = Some(GenerationConfig {
            image_config: Some(ImageConfig {
                aspect_ratio: &self.config.aspect_ratio,
            }),
            ..GenerationConfig::default()
        });
        let response = self
            .generate(credential, &self.config.image_model, &request)
            .await?;
        response.inline_data().ok_or(AcebotError::EmptyResponse)
    }

    async fn chat(
        &self,
        credential: &str,
        system: &str,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest::conversation(system, history, message);
        let response = self
            .generate(credential, &self.config.chat_model, &request)
            .await?;
        response.text().ok_or(AcebotError::EmptyResponse)
    }
}
