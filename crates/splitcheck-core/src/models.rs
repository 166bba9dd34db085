//! Data models for receipts, split units and attempt tracking

use serde::{Deserialize, Serialize};

/// Receipt header data
///
/// Percent fields are `None` when the receipt did not show them; report
/// building treats a missing percent as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_name: Option<String>,
    pub date: String,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tip_percent: Option<f64>,
}

impl Receipt {
    pub fn tax(&self) -> f64 {
        self.tax_percent.unwrap_or(0.0)
    }

    pub fn discount(&self) -> f64 {
        self.discount_percent.unwrap_or(0.0)
    }

    pub fn tip(&self) -> f64 {
        self.tip_percent.unwrap_or(0.0)
    }
}

/// One row on the receipt
///
/// A negative `unit_price` represents a discount line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_name: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
}

impl LineItem {
    pub fn new(name: &str, quantity: u32, unit_price: f64) -> Self {
        Self {
            name: name.to_string(),
            translated_name: None,
            quantity,
            unit_price,
        }
    }

    pub fn with_translation(mut self, translated_name: &str) -> Self {
        self.translated_name = Some(translated_name.to_string());
        self
    }
}

/// A receipt together with its ordered line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptWithItems {
    pub receipt: Receipt,
    pub items: Vec<LineItem>,
}

/// Ordered set of consumer names
///
/// Names are unique (case-sensitive) and iterate in insertion order, which is
/// the order reports list them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ConsumerSet {
    names: Vec<String>,
}

impl ConsumerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name; returns false if it was already present
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Remove a name; returns false if it was not present
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for ConsumerSet {
    fn from(names: Vec<String>) -> Self {
        let mut set = ConsumerSet::new();
        for name in &names {
            set.insert(name);
        }
        set
    }
}

impl From<ConsumerSet> for Vec<String> {
    fn from(set: ConsumerSet) -> Self {
        set.names
    }
}

impl<'a> FromIterator<&'a str> for ConsumerSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = ConsumerSet::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}

/// One physical unit of a line item, shareable among consumers ("for all" mode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedUnit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_name: Option<String>,
    pub unit_price: f64,
    #[serde(default)]
    pub consumers: ConsumerSet,
}

/// A line item with the quantity one person picked ("for one" mode)
///
/// Invariant: `selected_quantity <= total_quantity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectableUnit {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_name: Option<String>,
    pub unit_price: f64,
    pub total_quantity: u32,
    #[serde(default)]
    pub selected_quantity: u32,
}

impl SelectableUnit {
    /// Set the selected quantity, clamped to what the receipt lists
    pub fn select(&mut self, quantity: u32) {
        self.selected_quantity = quantity.min(self.total_quantity);
    }
}

/// Per-user extraction attempt record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptState {
    /// Start of the current attempt window, ms since the Unix epoch
    pub last_attempt_timestamp_ms: i64,
    pub attempts: u32,
}

/// Global extraction limits and model parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub cooldown_window_ms: i64,
    pub max_attempts_per_window: u32,
    #[serde(default)]
    pub extraction_prompt: String,
    pub model_identifier: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_set_unique_and_ordered() {
        let mut set = ConsumerSet::new();
        assert!(set.insert("Bob"));
        assert!(set.insert("Alice"));
        assert!(!set.insert("Bob"));
        assert!(set.insert("bob"));

        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names, vec!["Bob", "Alice", "bob"]);
    }

    #[test]
    fn test_consumer_set_remove() {
        let mut set: ConsumerSet = ["Alice", "Bob"].into_iter().collect();
        assert!(set.remove("Alice"));
        assert!(!set.remove("Alice"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("Bob"));
    }

    #[test]
    fn test_consumer_set_serde_dedupes() {
        let set: ConsumerSet = serde_json::from_str(r#"["Alice","Bob","Alice"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["Alice","Bob"]"#);
    }

    #[test]
    fn test_receipt_missing_percents_default_to_zero() {
        let receipt: Receipt =
            serde_json::from_str(r#"{"name":"Cafe","date":"2024-05-01","total":12.5}"#).unwrap();
        assert_eq!(receipt.tax_percent, None);
        assert_eq!(receipt.tax(), 0.0);
        assert_eq!(receipt.discount(), 0.0);
        assert_eq!(receipt.tip(), 0.0);
    }

    #[test]
    fn test_line_item_camel_case() {
        let item: LineItem = serde_json::from_str(
            r#"{"name":"Ramen","translatedName":"Noodles","quantity":2,"unitPrice":9.5}"#,
        )
        .unwrap();
        assert_eq!(item, LineItem::new("Ramen", 2, 9.5).with_translation("Noodles"));
    }

    #[test]
    fn test_selectable_unit_clamps() {
        let mut unit = SelectableUnit {
            name: "Pizza".into(),
            translated_name: None,
            unit_price: 3.0,
            total_quantity: 4,
            selected_quantity: 0,
        };
        unit.select(9);
        assert_eq!(unit.selected_quantity, 4);
        unit.select(2);
        assert_eq!(unit.selected_quantity, 2);
    }
}
