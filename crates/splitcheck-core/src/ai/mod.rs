//! Pluggable AI extraction backend
//!
//! The receipt photo is read by a hosted vision model. This module keeps that
//! call behind a trait so the rest of the crate never talks to a network
//! client directly; the service is handed an [`ExtractionClient`] value.
//!
//! # Architecture
//!
//! - `ExtractionBackend` trait: one call, image + prompt in, JSON text out
//! - `ExtractionClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `EXTRACTION_BACKEND`: Backend to use (gemini, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for gemini backend)
//! - `GEMINI_HOST`: API base URL (default: https://generativelanguage.googleapis.com)
//!
//! The model itself is chosen per call from the rate limit policy.

mod gemini;
mod mock;
pub mod parsing;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::{MockBackend, RecordedCall};
pub use parsing::{parse_extraction, parse_extraction_as};
pub use types::{ExtractionRequest, ImageInput, SchemaVariant};

use async_trait::async_trait;

use crate::error::Result;

/// Trait implemented by every extraction backend
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Run the model on one receipt image and return its raw JSON text
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String>;

    /// Backend name (for logging)
    fn name(&self) -> &str;
}

/// Concrete extraction client enum
#[derive(Clone)]
pub enum ExtractionClient {
    /// Google Gemini `generateContent` API
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl ExtractionClient {
    /// Create a client from environment variables
    ///
    /// Returns None if the selected backend is missing required variables.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("EXTRACTION_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(ExtractionClient::Gemini),
            "mock" => Some(ExtractionClient::Mock(MockBackend::default())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown EXTRACTION_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(ExtractionClient::Gemini)
            }
        }
    }

    /// Create a Gemini client directly
    pub fn gemini(host: &str, api_key: &str) -> Self {
        ExtractionClient::Gemini(GeminiBackend::new(host, api_key))
    }

    /// Create a mock client that answers every call with `response`
    pub fn mock(response: &str) -> Self {
        ExtractionClient::Mock(MockBackend::with_response(response))
    }
}

#[async_trait]
impl ExtractionBackend for ExtractionClient {
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String> {
        match self {
            ExtractionClient::Gemini(b) => b.extract(request).await,
            ExtractionClient::Mock(b) => b.extract(request).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            ExtractionClient::Gemini(b) => b.name(),
            ExtractionClient::Mock(b) => b.name(),
        }
    }
}
