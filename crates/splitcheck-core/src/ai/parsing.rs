//! Parsing of AI extraction responses
//!
//! The model answers in the snake_case schema from
//! [`SchemaVariant::response_schema`](super::SchemaVariant::response_schema);
//! this maps it onto the internal [`Receipt`]/[`LineItem`] model. Optional
//! fields stay `None` here; zero-defaulting happens when reports are built.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{LineItem, Receipt, ReceiptWithItems};

use super::types::SchemaVariant;

/// Raw receipt as returned by the model
#[derive(Debug, Deserialize)]
struct RawExtraction {
    receipt_name: String,
    #[serde(default)]
    translated_receipt_name: Option<String>,
    date: String,
    total_sum: f64,
    #[serde(default)]
    tax_in_percent: Option<f64>,
    #[serde(default)]
    discount_in_percent: Option<f64>,
    #[serde(default)]
    tip_in_percent: Option<f64>,
    #[serde(default)]
    orders: Option<Vec<RawOrder>>,
}

#[derive(Debug, Deserialize)]
struct RawOrder {
    name: String,
    #[serde(default)]
    translated_name: Option<String>,
    quantity: u32,
    price: f64,
}

fn truncate_for_error(text: &str) -> String {
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Parse the model's JSON text into a receipt and its line items
///
/// Text around the outermost JSON object (code fences, stray prose) is
/// ignored. Invalid JSON or a missing required field is a
/// [`Error::MalformedExtraction`].
pub fn parse_extraction(raw_json_text: &str) -> Result<ReceiptWithItems> {
    parse_extraction_as(raw_json_text, SchemaVariant::Plain)
}

/// Parse a response requested with `schema`
///
/// Under [`SchemaVariant::Translated`] every order must carry a non-empty
/// `translated_name`.
pub fn parse_extraction_as(raw_json_text: &str, schema: SchemaVariant) -> Result<ReceiptWithItems> {
    let response = raw_json_text.trim();
    let start = response.find('{');
    let end = response.rfind('}');

    let json_str = match (start, end) {
        (Some(s), Some(e)) if s < e => &response[s..=e],
        _ => {
            return Err(Error::MalformedExtraction(format!(
                "No JSON found in AI receipt response | Raw: {}",
                truncate_for_error(response)
            )))
        }
    };

    let raw: RawExtraction = serde_json::from_str(json_str).map_err(|e| {
        Error::MalformedExtraction(format!(
            "Invalid receipt JSON from AI: {} | Raw: {}",
            e,
            truncate_for_error(json_str)
        ))
    })?;

    if schema == SchemaVariant::Translated {
        let orders = raw.orders.as_deref().unwrap_or_default();
        if let Some(untranslated) = orders.iter().find(|order| {
            order
                .translated_name
                .as_deref()
                .map_or(true, |t| t.trim().is_empty())
        }) {
            return Err(Error::MalformedExtraction(format!(
                "Order '{}' is missing translated_name",
                untranslated.name
            )));
        }
    }

    let receipt = Receipt {
        name: raw.receipt_name,
        translated_name: raw.translated_receipt_name,
        date: raw.date,
        total: raw.total_sum,
        tax_percent: raw.tax_in_percent,
        discount_percent: raw.discount_in_percent,
        tip_percent: raw.tip_in_percent,
    };

    let items = raw
        .orders
        .unwrap_or_default()
        .into_iter()
        .map(|order| LineItem {
            name: order.name,
            translated_name: order.translated_name,
            quantity: order.quantity,
            unit_price: order.price,
        })
        .collect();

    Ok(ReceiptWithItems { receipt, items })
}
