use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount in rupiah with thousands separators, e.g. "Rp 1,200,000".
/// Fractional amounts keep up to two decimals.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = group_thousands(whole);
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Whole percentage, e.g. "85%"
pub fn format_percent(percent: Decimal) -> String {
    let whole = percent.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", whole)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
