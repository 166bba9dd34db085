//! Parse a saved extraction response

use std::path::Path;

use anyhow::{Context, Result};
use splitcheck_core::edit::items_sum;
use splitcheck_core::money::format_money;
use splitcheck_core::{parse_extraction, ReceiptWithItems};

use super::SessionFile;

/// Print a receipt and its line items
pub fn print_receipt(extracted: &ReceiptWithItems) {
    let receipt = &extracted.receipt;

    println!();
    match receipt.translated_name.as_deref() {
        Some(translated) if !translated.is_empty() => {
            println!("🧾 {} ({})", receipt.name, translated)
        }
        _ => println!("🧾 {}", receipt.name),
    }
    println!("   Date:  {}", receipt.date);
    println!("   Total: {}", format_money(receipt.total));
    for (label, value) in [
        ("Discount", receipt.discount_percent),
        ("Tip", receipt.tip_percent),
        ("Tax", receipt.tax_percent),
    ] {
        if let Some(v) = value {
            println!("   {}: {} %", label, v);
        }
    }

    println!("{}", "─".repeat(50));
    for (i, item) in extracted.items.iter().enumerate() {
        let name = match item.translated_name.as_deref() {
            Some(t) if !t.is_empty() => format!("{} ({})", item.name, t),
            None | Some(_) => item.name.clone(),
        };
        println!(
            "  {:>2}. {:<30} {:>3} x {:>10}",
            i + 1,
            name,
            item.quantity,
            format_money(item.unit_price)
        );
    }
    println!("{}", "─".repeat(50));

    let sum = items_sum(&extracted.items);
    println!("   Items sum: {}", format_money(sum));
    if (sum - receipt.total).abs() >= 0.01 {
        println!("   ⚠️  Items do not add up to the receipt total");
    }
    println!();
}

pub fn cmd_parse(file: &Path, session_out: Option<&Path>) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let extracted = parse_extraction(&content)?;

    print_receipt(&extracted);

    if let Some(out) = session_out {
        SessionFile::from(extracted).save(out)?;
        println!("✅ Session written to {}", out.display());
    }

    Ok(())
}
