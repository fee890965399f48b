//! Price arithmetic and display formatting.
//!
//! Prices travel as plain JSON numbers (whole đồng) and are held as
//! [`Decimal`] so that line totals never pick up floating point error.

use rust_decimal::Decimal;

/// Total price of `amount` units at `price` each.
#[must_use]
pub fn line_total(price: Decimal, amount: i64) -> Decimal {
    price * Decimal::from(amount)
}

/// Format a money value with `.` as the thousands separator.
///
/// Fractional digits are dropped; a zero value formats as an empty string,
/// which the storefront renders as "no price". A non-zero value below one
/// unit formats as `"0"`, without a sign.
///
/// ```
/// use mart_core::format_money;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_money(Decimal::from(1_234_567)), "1.234.567");
/// assert_eq!(format_money(Decimal::from(950)), "950");
/// assert_eq!(format_money(Decimal::ZERO), "");
/// assert_eq!(format_money(Decimal::new(5, 1)), "0");
/// ```
#[must_use]
pub fn format_money(value: Decimal) -> String {
    if value.is_zero() {
        return String::new();
    }

    let truncated = value.trunc();
    if truncated.is_zero() {
        return "0".to_string();
    }

    let whole = truncated.abs().to_string();
    let digits = whole.len();
    let mut out = String::with_capacity(digits + digits / 3 + 1);
    if truncated.is_sign_negative() {
        out.push('-');
    }
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
