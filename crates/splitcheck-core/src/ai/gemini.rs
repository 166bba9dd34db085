//! Gemini backend implementation
//!
//! HTTP client for the Gemini `generateContent` API. The response schema is
//! passed as `responseSchema` with `responseMimeType: application/json`, so
//! the first candidate's text is the JSON document itself.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::types::ExtractionRequest;
use super::ExtractionBackend;

const DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Gemini backend
#[derive(Clone)]
pub struct GeminiBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let host = std::env::var("GEMINI_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Some(Self::new(&host, &api_key))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

/// Request to the generateContent API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

/// Response from the generateContent API
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn build_request(request: &ExtractionRequest<'_>) -> GenerateRequest {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&request.image.data);

    GenerateRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![
                Part {
                    text: Some(request.prompt.to_string()),
                    inline_data: None,
                },
                Part {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: request.image.mime_type.clone(),
                        data: encoded,
                    }),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: request.schema.response_schema(),
        },
    }
}

/// Concatenate the text parts of the first candidate
fn first_candidate_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::Backend("Gemini returned no candidate text".into()));
    }
    Ok(text)
}

#[async_trait]
impl ExtractionBackend for GeminiBackend {
    async fn extract(&self, request: &ExtractionRequest<'_>) -> Result<String> {
        let body = build_request(request);
        debug!(
            model = request.model,
            schema = request.schema.as_str(),
            image_bytes = request.image.data.len(),
            "Sending receipt to Gemini"
        );

        let response = self
            .http_client
            .post(self.endpoint(request.model))
            .header("x-goog-api-key", &self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gemini request failed");
            return Err(Error::Backend(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = first_candidate_text(parsed)?;
        debug!("Gemini receipt response: {}", text);
        Ok(text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::types::{ImageInput, SchemaVariant};

    #[test]
    fn test_request_body_shape() {
        let image = ImageInput::new(vec![1, 2, 3], "image/png");
        let request = ExtractionRequest {
            prompt: "Read data from receipt image",
            schema: SchemaVariant::Plain,
            image: &image,
            model: "gemini-2.0-flash",
        };

        let body = serde_json::to_value(build_request(&request)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Read data from receipt image");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "AQID");
        assert!(parts[0].get("inlineData").is_none());
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"],
            SchemaVariant::Plain.response_schema()
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let backend = GeminiBackend::new("http://localhost:8080/", "key");
        assert_eq!(
            backend.endpoint("gemini-2.0-flash"),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_first_candidate_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(first_candidate_text(response).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_first_candidate_text_empty_is_error() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            first_candidate_text(response),
            Err(Error::Backend(_))
        ));
    }
}
