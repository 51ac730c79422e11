use std::str::FromStr;

use rust_decimal::Decimal;

use crate::Parsed;

/// Convert a locale-formatted money string into a Decimal.
///
/// Both `35,997,363.00` and `35.997.363,00` are understood: a `.` or `,`
/// followed by exactly three digits (and then a non-digit or the end of
/// the string) is a thousands separator, any other comma is a decimal
/// point. Anything that still cannot be read as a number becomes zero,
/// with the result marked as degraded.
pub fn parse_amount(raw: &str) -> Parsed<Decimal> {
    // Only digits, separators and the sign survive.
    let cleaned: Vec<char> = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    // The separator checks look at the cleaned text as a whole, so every
    // separator is judged before any of them is removed.
    let mut normalized = String::with_capacity(cleaned.len());
    for (i, c) in cleaned.iter().enumerate() {
        if matches!(c, ',' | '.') && is_thousands_separator(&cleaned[i + 1..]) {
            continue;
        }
        normalized.push(if *c == ',' { '.' } else { *c });
    }

    match Decimal::from_str(&normalized) {
        Ok(value) => Parsed::exact(value),
        Err(_) => Parsed::degraded(Decimal::ZERO),
    }
}

/// Parse an amount cell that may be missing altogether.
pub fn parse_optional_amount(raw: Option<&str>) -> Parsed<Decimal> {
    match raw {
        Some(value) => parse_amount(value),
        None => Parsed::degraded(Decimal::ZERO),
    }
}

/// Whether the text following a separator marks it as a thousands separator.
fn is_thousands_separator(rest: &[char]) -> bool {
    rest.len() >= 3
        && rest[..3].iter().all(|c| c.is_ascii_digit())
        && rest.get(3).map_or(true, |c| !c.is_ascii_digit())
}
