//! Money rounding and formatting
//!
//! Every figure that lands in a report goes through [`round2`] first, so the
//! per-line numbers a reader sees are the numbers that were summed.

/// Round to the nearest cent, halves away from zero
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Avoid rendering "-0.00"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format an amount with exactly two decimals
pub fn format_money(value: f64) -> String {
    format!("{:.2}", round2(value))
}

/// Format a percentage without trailing zeros (`10`, `12.5`)
pub fn format_percent(value: f64) -> String {
    let text = format!("{:.2}", round2(value));
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
