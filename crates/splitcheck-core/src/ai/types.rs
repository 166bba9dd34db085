//! Shared types for extraction backends

use std::path::Path;

use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Which response schema the model is asked to follow
///
/// Both variants describe the same fields; `Translated` additionally requires
/// `translated_name` on every order so a translation is always returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    Plain,
    Translated,
}

impl SchemaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Translated => "translated",
        }
    }

    /// Response schema in the Gemini `responseSchema` format
    pub fn response_schema(&self) -> Value {
        let order_required = match self {
            Self::Plain => json!(["name", "quantity", "price"]),
            Self::Translated => json!(["name", "translated_name", "quantity", "price"]),
        };

        json!({
            "type": "OBJECT",
            "properties": {
                "receipt_name": { "type": "STRING" },
                "translated_receipt_name": { "type": "STRING" },
                "date": { "type": "STRING" },
                "total_sum": { "type": "NUMBER" },
                "tax_in_percent": { "type": "NUMBER" },
                "discount_in_percent": { "type": "NUMBER" },
                "tip_in_percent": { "type": "NUMBER" },
                "orders": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "translated_name": { "type": "STRING" },
                            "quantity": { "type": "INTEGER" },
                            "price": { "type": "NUMBER" }
                        },
                        "required": order_required
                    }
                }
            },
            "required": ["receipt_name", "date", "total_sum"]
        })
    }
}

/// A receipt photo to send to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInput {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(data: Vec<u8>, mime_type: &str) -> Self {
        Self {
            data,
            mime_type: mime_type.to_string(),
        }
    }

    /// Read an image file, inferring the MIME type from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let mime_type = match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "heic" => "image/heic",
            "heif" => "image/heif",
            other => {
                return Err(Error::InvalidData(format!(
                    "Unsupported image type: '{}'",
                    other
                )))
            }
        };

        let data = std::fs::read(path)?;
        Ok(Self::new(data, mime_type))
    }
}

/// Everything a backend needs for one extraction call
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub prompt: &'a str,
    pub schema: SchemaVariant,
    pub image: &'a ImageInput,
    pub model: &'a str,
}
