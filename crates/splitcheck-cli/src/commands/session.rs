//! Split session file format
//!
//! A session file is JSON:
//!
//! ```json
//! {
//!   "receipt": {"name": "Cafe", "date": "2024-05-01", "total": 15.0, "taxPercent": 10},
//!   "items": [{"name": "Coffee", "quantity": 2, "unitPrice": 5.0}],
//!   "consumers": ["Alice", "Bob"],
//!   "assignments": [["Alice"], ["Alice", "Bob"]],
//!   "selected": [1]
//! }
//! ```
//!
//! `assignments` has one entry per physical unit (an item with quantity 2 has
//! two entries) and `selected` one entry per item. All three trailing fields
//! are optional; `consumers` defaults to every name used in `assignments`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use splitcheck_core::{LineItem, Receipt, ReceiptWithItems, SplitSession};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFile {
    pub receipt: Receipt,
    pub items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assignments: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selected: Vec<u32>,
}

impl From<ReceiptWithItems> for SessionFile {
    fn from(extracted: ReceiptWithItems) -> Self {
        Self {
            receipt: extracted.receipt,
            items: extracted.items,
            consumers: Vec::new(),
            assignments: Vec::new(),
            selected: Vec::new(),
        }
    }
}

impl SessionFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid session file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write session file {}", path.display()))
    }

    /// Build a split session with the roster, assignments and selections applied
    ///
    /// The receipt and items are held to the same limits as hand edits.
    pub fn into_session(self) -> Result<SplitSession> {
        self.receipt.validate().context("Invalid receipt")?;
        for (index, item) in self.items.iter().enumerate() {
            item.validate().with_context(|| format!("Invalid item {}", index + 1))?;
        }

        let mut session = SplitSession::new(self.receipt, self.items);

        let mut roster: Vec<&str> = self.consumers.iter().map(String::as_str).collect();
        if roster.is_empty() {
            for name in self.assignments.iter().flatten() {
                if !roster.contains(&name.as_str()) {
                    roster.push(name);
                }
            }
        }
        for name in roster {
            session.add_consumer(name)?;
        }

        if self.assignments.len() > session.units().len() {
            bail!(
                "Session has {} assignments but the items only have {} units",
                self.assignments.len(),
                session.units().len()
            );
        }
        for (index, names) in self.assignments.iter().enumerate() {
            let names: Vec<&str> = names.iter().map(|n| n.trim()).collect();
            session
                .assign_consumers(index, &names)
                .with_context(|| format!("Invalid assignment for unit {}", index + 1))?;
        }

        for (index, quantity) in self.selected.iter().enumerate() {
            session
                .set_selected_quantity(index, *quantity)
                .with_context(|| format!("Invalid selection for item {}", index + 1))?;
        }

        Ok(session)
    }
}
