//! Mock backend for testing
//!
//! Answers every extraction with a canned response (or a canned failure) and
//! remembers what it was asked, so tests can check prompts and schemas.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::types::{ExtractionRequest, SchemaVariant};
use super::ExtractionBackend;

const DEFAULT_RESPONSE: &str = r#"{
    "receipt_name": "Mock Diner",
    "date": "2024-01-01",
    "total_sum": 15.5,
    "tax_in_percent": 10,
    "orders": [
        {"name": "Pancakes", "quantity": 2, "price": 5.0},
        {"name": "Orange Juice", "quantity": 1, "price": 4.0}
    ]
}"#;

/// A recorded extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub prompt: String,
    pub schema: SchemaVariant,
    pub model: String,
    pub mime_type: String,
}

/// Mock extraction backend
#[derive(Clone)]
pub struct MockBackend {
    /// Text returned by `extract`; `None` makes every call fail
    response: Option<String>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_response(DEFAULT_RESPONSE)
    }
}

impl MockBackend {
    /// Create a mock that returns `response` for every call
    pub fn with_response(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock whose calls all fail
    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Calls made so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                prompt: request.prompt.to_string(),
                schema: request.schema,
                model: request.model.to_string(),
                mime_type: request.image.mime_type.clone(),
            });
        }

        self.response
            .clone()
            .ok_or_else(|| Error::Backend("Mock backend configured to fail".into()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parse_extraction;
    use crate::ai::types::ImageInput;

    fn request<'a>(image: &'a ImageInput) -> ExtractionRequest<'a> {
        ExtractionRequest {
            prompt: "Read data from receipt image",
            schema: SchemaVariant::Plain,
            image,
            model: "mock-model",
        }
    }

    #[tokio::test]
    async fn test_default_response_parses() {
        let image = ImageInput::new(vec![0], "image/jpeg");
        let backend = MockBackend::default();
        let text = backend.extract(&request(&image)).await.unwrap();

        let parsed = parse_extraction(&text).unwrap();
        assert_eq!(parsed.receipt.name, "Mock Diner");
        assert_eq!(parsed.items.len(), 2);
    }

    #[tokio::test]
    async fn test_records_calls() {
        let image = ImageInput::new(vec![0], "image/png");
        let backend = MockBackend::with_response("{}");
        backend.extract(&request(&image)).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "mock-model");
        assert_eq!(calls[0].mime_type, "image/png");
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let image = ImageInput::new(vec![0], "image/png");
        let backend = MockBackend::failing();
        assert!(matches!(
            backend.extract(&request(&image)).await,
            Err(Error::Backend(_))
        ));
        assert_eq!(backend.calls().len(), 1);
    }
}
