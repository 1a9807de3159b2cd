//! Number formatting shared by the calculator display and the converter rows.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places kept in calculator results.
pub const RESULT_PRECISION: u32 = 10;

/// Insert thousands separators into a run of ASCII digits.
pub fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Re-derive the separators of a number as typed, keeping everything after
/// the decimal point (trailing zeros, a dangling `.`) exactly as entered.
pub fn regroup(typed: &str) -> String {
    let raw: String = typed.chars().filter(|&c| c != ',').collect();
    let (sign, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.as_str()),
    };
    match unsigned.split_once('.') {
        Some((int_part, frac_part)) => format!("{sign}{}.{frac_part}", group_digits(int_part)),
        None => format!("{sign}{}", group_digits(unsigned)),
    }
}

/// Remove thousands separators so the text can be parsed.
pub fn strip_separators(text: &str) -> String {
    text.chars().filter(|&c| c != ',').collect()
}

/// Canonical text of a calculator result: at most ten decimals, no trailing zeros.
pub fn format_result(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(RESULT_PRECISION, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if rounded.is_zero() {
        return "0".to_string();
    }
    rounded.to_string()
}

/// A calculator result as shown on the display, with separators.
pub fn format_display(value: Decimal) -> String {
    regroup(&format_result(value))
}

/// An amount rounded and padded to exactly `precision` decimals, no separators.
pub fn format_plain(amount: Decimal, precision: u32) -> String {
    let mut rounded =
        amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(precision);
    if rounded.is_zero() {
        rounded.set_sign_positive(true);
    }
    rounded.to_string()
}

/// An amount rounded and padded to `precision` decimals, with separators.
pub fn format_amount(amount: Decimal, precision: u32) -> String {
    regroup(&format_plain(amount, precision))
}
