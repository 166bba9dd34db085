//! Limits applied when a person corrects an extracted receipt
//!
//! Extraction output is trusted as-is; these checks apply only to hand edits.

use crate::error::{Error, Result};
use crate::models::{LineItem, Receipt};
use crate::money::round2;

pub const MAX_PERCENT: f64 = 100.0;
pub const MAX_TOTAL: f64 = 99_999_999.0;
pub const MAX_UNIT_PRICE: f64 = 9_999_999.0;
pub const MAX_QUANTITY: u32 = 99;

/// Nudge a percent field by `delta`, keeping it within 0..=100
pub fn step_percent(value: Option<f64>, delta: f64) -> f64 {
    (value.unwrap_or(0.0) + delta).clamp(0.0, MAX_PERCENT)
}

/// Sum of quantity x unit price over all items, rounded to cents
///
/// Only for comparing against the printed total; the two rarely match to the
/// cent once discount lines and rounding on the receipt are involved.
pub fn items_sum(items: &[LineItem]) -> f64 {
    round2(
        items
            .iter()
            .map(|item| item.quantity as f64 * item.unit_price)
            .sum(),
    )
}

impl LineItem {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidData("Name cannot be empty.".into()));
        }
        if !(1..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(Error::InvalidData(
                "Amount must be between 1 and 99.".into(),
            ));
        }
        if !self.unit_price.is_finite() || self.unit_price.abs() > MAX_UNIT_PRICE {
            return Err(Error::InvalidData(
                "Price must be between -9,999,999 and 9,999,999.".into(),
            ));
        }
        Ok(())
    }
}

impl Receipt {
    pub fn validate(&self) -> Result<()> {
        if !self.total.is_finite() || !(0.0..=MAX_TOTAL).contains(&self.total) {
            return Err(Error::InvalidData(
                "Total must be between 0 and 99,999,999.".into(),
            ));
        }

        let percents = [
            ("Tax", self.tax_percent),
            ("Discount", self.discount_percent),
            ("Tip", self.tip_percent),
        ];
        for (label, value) in percents {
            if let Some(v) = value {
                if !(0.0..=MAX_PERCENT).contains(&v) {
                    return Err(Error::InvalidData(format!(
                        "{} must be between 0 and 100.",
                        label
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receipt() -> Receipt {
        Receipt {
            name: "Cafe".into(),
            translated_name: None,
            date: "2024-05-01".into(),
            total: 25.0,
            tax_percent: Some(8.0),
            discount_percent: None,
            tip_percent: Some(15.0),
        }
    }

    #[test]
    fn test_step_percent_clamps() {
        assert_eq!(step_percent(Some(99.0), 1.0), 100.0);
        assert_eq!(step_percent(Some(100.0), 1.0), 100.0);
        assert_eq!(step_percent(Some(0.0), -1.0), 0.0);
        assert_eq!(step_percent(None, 1.0), 1.0);
        assert_eq!(step_percent(Some(10.5), -1.0), 9.5);
    }

    #[test]
    fn test_items_sum() {
        let items = vec![
            LineItem::new("Burger", 2, 8.5),
            LineItem::new("Voucher", 1, -3.0),
            LineItem::new("Tea", 3, 1.1),
        ];
        assert_eq!(items_sum(&items), 17.3);
        assert_eq!(items_sum(&[]), 0.0);
    }

    #[test]
    fn test_line_item_validate() {
        assert!(LineItem::new("Tea", 1, 2.0).validate().is_ok());
        assert!(LineItem::new("Voucher", 1, -9_999_999.0).validate().is_ok());
        assert!(LineItem::new("Tea", 99, 2.0).validate().is_ok());

        assert!(LineItem::new("  ", 1, 2.0).validate().is_err());
        assert!(LineItem::new("Tea", 0, 2.0).validate().is_err());
        assert!(LineItem::new("Tea", 100, 2.0).validate().is_err());
        assert!(LineItem::new("Tea", 1, 10_000_000.0).validate().is_err());
        assert!(LineItem::new("Tea", 1, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_receipt_validate() {
        assert!(receipt().validate().is_ok());

        let mut negative = receipt();
        negative.total = -1.0;
        assert!(negative.validate().is_err());

        let mut huge = receipt();
        huge.total = 100_000_000.0;
        assert!(huge.validate().is_err());

        let mut tip = receipt();
        tip.tip_percent = Some(101.0);
        let err = tip.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid data: Tip must be between 0 and 100.");
    }
}
