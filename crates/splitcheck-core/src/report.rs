//! Plain-text split reports
//!
//! Two builders share the same layout rules:
//!
//! ```text
//! Cafe Luna            <- receipt name (omitted when empty)
//! 2024-05-01           <- date (omitted when empty)
//! ----
//! · Alice              <- "for all" only: one block per consumer
//!   1. Coffee = 1/2 x 5.00 = 2.50
//!   = 2.50             <- only when a percent adjustment applies
//!  - 10 %
//!  + 8 %
//!  = 2.43
//! = 2.43
//! ------------
//! ```
//!
//! Every line figure is rounded to cents before it is added to a running
//! total, so the sum of per-consumer totals may drift a cent or two from the
//! printed receipt total.
//!
//! A `None` return means the report could not be built: no consumer was
//! assigned to anything ("for all"), or an input figure was not finite.

use tracing::debug;

use crate::models::{ExpandedUnit, Receipt, SelectableUnit};
use crate::money::{format_money, format_percent, round2};

const SHORT_DIVIDER: &str = "----";
const LONG_DIVIDER: &str = "------------";
const CONSUMER_MARKER: &str = "·";

/// Percent adjustments taken from the receipt, missing values as zero
struct Adjustments {
    discount: f64,
    tip: f64,
    tax: f64,
}

impl Adjustments {
    fn from_receipt(receipt: &Receipt) -> Self {
        Self {
            discount: receipt.discount(),
            tip: receipt.tip(),
            tax: receipt.tax(),
        }
    }

    fn is_finite(&self) -> bool {
        self.discount.is_finite() && self.tip.is_finite() && self.tax.is_finite()
    }

    fn any(&self) -> bool {
        self.discount != 0.0 || self.tip != 0.0 || self.tax != 0.0
    }

    /// Apply discount, then tip, then tax, each on the running total
    fn apply(&self, mut total: f64, lines: &mut Vec<String>) -> f64 {
        if self.discount != 0.0 {
            total = round2(total - total * self.discount / 100.0);
            lines.push(format!(" - {} %", format_percent(self.discount)));
        }
        if self.tip != 0.0 {
            total = round2(total + total * self.tip / 100.0);
            lines.push(format!(" + {} %", format_percent(self.tip)));
        }
        if self.tax != 0.0 {
            total = round2(total + total * self.tax / 100.0);
            lines.push(format!(" + {} %", format_percent(self.tax)));
        }
        total
    }
}

fn item_label(name: &str, translated_name: Option<&str>) -> String {
    match translated_name.map(str::trim) {
        Some(translated) if !translated.is_empty() => format!("{} {}", name, translated),
        _ => name.to_string(),
    }
}

fn push_header(receipt: &Receipt, lines: &mut Vec<String>) {
    if !receipt.name.is_empty() {
        lines.push(receipt.name.clone());
    }
    if !receipt.date.is_empty() {
        lines.push(receipt.date.clone());
    }
}

/// Consumer names in the order they first appear across the units
fn collect_consumers(units: &[ExpandedUnit]) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for unit in units {
        for name in unit.consumers.iter() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Build the per-consumer report for "split for all" mode
pub fn build_report_for_all(receipt: &Receipt, units: &[ExpandedUnit]) -> Option<String> {
    let adjustments = Adjustments::from_receipt(receipt);
    if !adjustments.is_finite() || units.iter().any(|u| !u.unit_price.is_finite()) {
        debug!("Refusing to build report from non-finite figures");
        return None;
    }

    let consumers = collect_consumers(units);
    if consumers.is_empty() {
        return None;
    }

    let mut lines = Vec::new();
    push_header(receipt, &mut lines);
    lines.push(SHORT_DIVIDER.to_string());

    for consumer in &consumers {
        lines.push(format!("{} {}", CONSUMER_MARKER, consumer));

        let mut total = 0.0;
        let assigned = units.iter().filter(|u| u.consumers.contains(consumer));
        for (position, unit) in assigned.enumerate() {
            let index = position + 1;
            let label = item_label(&unit.name, unit.translated_name.as_deref());
            let share_count = unit.consumers.len();

            let share = if share_count > 1 {
                let share = round2(unit.unit_price / share_count as f64);
                lines.push(format!(
                    "  {}. {} = 1/{} x {} = {}",
                    index,
                    label,
                    share_count,
                    format_money(unit.unit_price),
                    format_money(share)
                ));
                share
            } else {
                let share = round2(unit.unit_price);
                lines.push(format!("  {}. {} = {}", index, label, format_money(share)));
                share
            };
            total += share;
        }

        if adjustments.any() && total != 0.0 {
            lines.push(format!("  = {}", format_money(total)));
            total = adjustments.apply(total, &mut lines);
            lines.push(format!(" = {}", format_money(total)));
        }

        lines.push(format!("= {}", format_money(total)));
        lines.push(LONG_DIVIDER.to_string());
    }

    debug!(consumers = consumers.len(), "Built split report for all");
    Some(lines.join("\n").trim().to_string())
}

/// Build the single-person report for "split for one" mode
///
/// Only units with a positive selected quantity produce lines; an empty
/// selection still yields a report totalling zero.
pub fn build_report_for_one(receipt: &Receipt, units: &[SelectableUnit]) -> Option<String> {
    let adjustments = Adjustments::from_receipt(receipt);
    if !adjustments.is_finite() || units.iter().any(|u| !u.unit_price.is_finite()) {
        debug!("Refusing to build report from non-finite figures");
        return None;
    }

    let mut lines = Vec::new();
    push_header(receipt, &mut lines);
    if !units.is_empty() {
        lines.push(SHORT_DIVIDER.to_string());
    }

    let mut total = 0.0;
    let selected = units.iter().filter(|u| u.selected_quantity > 0);
    for (position, unit) in selected.enumerate() {
        let index = position + 1;
        let label = item_label(&unit.name, unit.translated_name.as_deref());
        let line_total = round2(unit.selected_quantity as f64 * unit.unit_price);

        if unit.selected_quantity > 1 {
            lines.push(format!(
                "{}. {} = {} x {} = {}",
                index,
                label,
                unit.selected_quantity,
                format_money(unit.unit_price),
                format_money(line_total)
            ));
        } else {
            lines.push(format!("{}. {} = {}", index, label, format_money(line_total)));
        }
        total += line_total;
    }

    if adjustments.any() && total != 0.0 {
        lines.push(format!(" = {}", format_money(total)));
        total = adjustments.apply(total, &mut lines);
        lines.push(format!(" = {}", format_money(total)));
    }

    lines.push(format!("= {}", format_money(total)));

    Some(lines.join("\n").trim().to_string())
}
