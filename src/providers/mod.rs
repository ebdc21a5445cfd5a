//! Upstream content providers.
//!
//! [`ContentProvider`] is the seam between the gateway and a concrete
//! generative API. [`GeminiClient`] is the bundled implementation.

pub mod gemini;
pub mod traits;

pub use gemini::{GeminiClient, GeminiConfig};
pub use traits::ContentProvider;
