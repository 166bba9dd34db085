//! Split expansion
//!
//! Turns the flat line item list into the working lists used by the two split
//! modes. Both functions are pure; re-running them discards any consumer
//! assignments or selected quantities, so callers should only do so when
//! [`items_fingerprint`] reports that the items changed.

use sha2::{Digest, Sha256};

use crate::models::{ConsumerSet, ExpandedUnit, LineItem, SelectableUnit};

/// One unit per physical item, each with no consumers yet
pub fn expand_for_all(items: &[LineItem]) -> Vec<ExpandedUnit> {
    items
        .iter()
        .flat_map(|item| {
            (0..item.quantity).map(move |_| ExpandedUnit {
                name: item.name.clone(),
                translated_name: item.translated_name.clone(),
                unit_price: item.unit_price,
                consumers: ConsumerSet::new(),
            })
        })
        .collect()
}

/// One selectable row per line item, nothing selected
pub fn expand_for_one(items: &[LineItem]) -> Vec<SelectableUnit> {
    items
        .iter()
        .map(|item| SelectableUnit {
            name: item.name.clone(),
            translated_name: item.translated_name.clone(),
            unit_price: item.unit_price,
            total_quantity: item.quantity,
            selected_quantity: 0,
        })
        .collect()
}

/// Content hash of the (name, quantity, price, translated name) sequence
///
/// Two item lists with equal values hash equal regardless of where they came
/// from, which is what decides whether split state must be rebuilt.
pub fn items_fingerprint(items: &[LineItem]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((items.len() as u64).to_le_bytes());
    for item in items {
        hasher.update((item.name.len() as u64).to_le_bytes());
        hasher.update(item.name.as_bytes());
        hasher.update(item.quantity.to_le_bytes());
        // -0.0 and 0.0 are the same price
        let price = if item.unit_price == 0.0 { 0.0 } else { item.unit_price };
        hasher.update(price.to_bits().to_le_bytes());
        match &item.translated_name {
            Some(translated) => {
                hasher.update([1u8]);
                hasher.update((translated.len() as u64).to_le_bytes());
                hasher.update(translated.as_bytes());
            }
            None => hasher.update([0u8]),
        }
    }
    hex::encode(hasher.finalize())
}
