//! Split session
//!
//! Holds the receipt being split together with the derived unit lists for both
//! modes. The unit lists are rebuilt only when the line items actually change
//! (by value), so consumer assignments and selections survive a caller handing
//! back an equal item list.

use tracing::debug;

use crate::error::{Error, Result};
use crate::expand::{expand_for_all, expand_for_one, items_fingerprint};
use crate::models::{ExpandedUnit, LineItem, Receipt, SelectableUnit};
use crate::report::{build_report_for_all, build_report_for_one};

const DUPLICATE_NAME: &str = "This name already exists.";

/// People a receipt can be split between
///
/// Names are trimmed and unique ignoring case. The first spelling added wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumerRoster {
    names: Vec<String>,
}

impl ConsumerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a person and return the stored (trimmed) name
    pub fn add(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Name must not be empty.".into()));
        }
        if self.position(name).is_some() {
            return Err(Error::InvalidData(DUPLICATE_NAME.into()));
        }
        self.names.push(name.to_string());
        Ok(name.to_string())
    }

    /// Remove a person (exact spelling); returns false if absent
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| n != name);
        self.names.len() != before
    }

    /// Exact, case-sensitive membership
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        let lowered = name.to_lowercase();
        self.names.iter().position(|n| n.to_lowercase() == lowered)
    }
}

/// A receipt being split, with state for both split modes
#[derive(Debug, Clone)]
pub struct SplitSession {
    receipt: Receipt,
    items: Vec<LineItem>,
    roster: ConsumerRoster,
    units: Vec<ExpandedUnit>,
    selectable: Vec<SelectableUnit>,
    fingerprint: String,
}

impl SplitSession {
    pub fn new(receipt: Receipt, items: Vec<LineItem>) -> Self {
        let fingerprint = items_fingerprint(&items);
        Self {
            units: expand_for_all(&items),
            selectable: expand_for_one(&items),
            receipt,
            items,
            roster: ConsumerRoster::new(),
            fingerprint,
        }
    }

    pub fn receipt(&self) -> &Receipt {
        &self.receipt
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn roster(&self) -> &ConsumerRoster {
        &self.roster
    }

    /// Units for the "for all" mode, one per physical item
    pub fn units(&self) -> &[ExpandedUnit] {
        &self.units
    }

    /// Rows for the "for one" mode, one per line item
    pub fn selectable_units(&self) -> &[SelectableUnit] {
        &self.selectable
    }

    /// Replace the line items
    ///
    /// Returns true if the items differed by value and the unit lists were
    /// rebuilt (dropping assignments and selections).
    pub fn set_items(&mut self, items: Vec<LineItem>) -> bool {
        let fingerprint = items_fingerprint(&items);
        if fingerprint == self.fingerprint {
            self.items = items;
            return false;
        }

        self.units = expand_for_all(&items);
        self.selectable = expand_for_one(&items);
        self.items = items;
        self.fingerprint = fingerprint;
        debug!(units = self.units.len(), "Line items changed, split state rebuilt");
        true
    }

    /// Replace header data (name, date, total, percents); assignments are kept
    pub fn update_receipt(&mut self, receipt: Receipt) {
        self.receipt = receipt;
    }

    /// Add a person to the roster and return the stored name
    pub fn add_consumer(&mut self, name: &str) -> Result<String> {
        self.roster.add(name)
    }

    /// Remove a person from the roster and from every unit they were on
    pub fn remove_consumer(&mut self, name: &str) -> bool {
        let removed = self.roster.remove(name);
        for unit in &mut self.units {
            unit.consumers.remove(name);
        }
        removed
    }

    /// Replace the consumers of one unit
    ///
    /// Every name must already be on the roster.
    pub fn assign_consumers(&mut self, unit_index: usize, names: &[&str]) -> Result<()> {
        if let Some(unknown) = names.iter().find(|n| !self.roster.contains(n)) {
            return Err(Error::InvalidData(format!("Unknown consumer: {}", unknown)));
        }
        let unit = unit_mut(&mut self.units, unit_index)?;
        unit.consumers = names.iter().copied().collect();
        Ok(())
    }

    /// Take one person off one unit; returns false if they were not on it
    pub fn remove_consumer_from_unit(&mut self, unit_index: usize, name: &str) -> Result<bool> {
        let unit = unit_mut(&mut self.units, unit_index)?;
        Ok(unit.consumers.remove(name))
    }

    /// Set how many of a line item one person had, clamped to the receipt quantity
    pub fn set_selected_quantity(&mut self, index: usize, quantity: u32) -> Result<()> {
        let len = self.selectable.len();
        let unit = self
            .selectable
            .get_mut(index)
            .ok_or_else(|| out_of_range(index, len))?;
        unit.select(quantity);
        Ok(())
    }

    /// Per-consumer "for all" report; None if nothing is assigned
    pub fn report_for_all(&self) -> Option<String> {
        build_report_for_all(&self.receipt, &self.units)
    }

    /// "For one" report over the selected rows
    pub fn report_for_one(&self) -> Option<String> {
        let selected: Vec<SelectableUnit> = self
            .selectable
            .iter()
            .filter(|u| u.selected_quantity > 0)
            .cloned()
            .collect();
        build_report_for_one(&self.receipt, &selected)
    }
}

fn unit_mut(units: &mut [ExpandedUnit], index: usize) -> Result<&mut ExpandedUnit> {
    let len = units.len();
    units.get_mut(index).ok_or_else(|| out_of_range(index, len))
}

fn out_of_range(index: usize, len: usize) -> Error {
    Error::InvalidData(format!("Unit index {} out of range (0..{})", index, len))
}
