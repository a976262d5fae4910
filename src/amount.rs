//! Fixed-point token amounts
//!
//! Token amounts are unsigned 256-bit integers scaled by `10^decimals`. These helpers
//! convert between user-facing decimal strings and raw amounts using integer
//! arithmetic only, so a value that backs a transaction is never rounded by a float.

use alloy_primitives::U256;

use crate::error::AmountError;

/// Raw token amount scaled by `10^decimals`
pub type FixedPointAmount = U256;

/// Number of fraction digits shown when the caller has no preference
pub const DEFAULT_DISPLAY_PRECISION: u8 = 8;

/// `10^decimals`, or `None` if it does not fit in 256 bits
pub fn pow10(decimals: u8) -> Option<U256> {
    U256::from(10u64).checked_pow(U256::from(decimals))
}

/// `a * b / 10^decimals` with overflow checking
pub fn mul_div(a: U256, b: U256, decimals: u8) -> Option<U256> {
    a.checked_mul(b)?.checked_div(pow10(decimals)?)
}

/// Parse a decimal string into a raw amount for a token with `decimals` decimals
///
/// Accepts `"12"`, `"1.5"`, `".5"` and `"1."`; surrounding whitespace is ignored and
/// trailing fraction zeros do not count against the token precision. Signs,
/// exponents and grouping separators are rejected.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (int_part, frac_part) =
        split_decimal(trimmed).ok_or_else(|| AmountError::Malformed(trimmed.to_string()))?;
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.len() > decimals as usize {
        return Err(AmountError::ExcessPrecision {
            decimals,
            found: frac_part.len(),
        });
    }

    let scale = pow10(decimals).ok_or(AmountError::Overflow)?;
    let frac_scale = pow10(decimals - frac_part.len() as u8).ok_or(AmountError::Overflow)?;

    let int_value = digits_to_u256(int_part)?;
    let frac_value = digits_to_u256(frac_part)?;

    int_value
        .checked_mul(scale)
        .and_then(|whole| {
            frac_value
                .checked_mul(frac_scale)
                .and_then(|frac| whole.checked_add(frac))
        })
        .ok_or(AmountError::Overflow)
}

/// Format a raw amount as a decimal string
///
/// The fraction is truncated (never rounded) to `display_precision` digits and
/// trailing zeros are trimmed, keeping at least one fraction digit (`"1.0"`). A
/// precision of zero yields the integer part only.
pub fn format_amount(amount: U256, decimals: u8, display_precision: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;

    let (int_part, frac_part) = if digits.len() > decimals {
        let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
        (int_part.to_string(), frac_part.to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    if display_precision == 0 {
        return int_part;
    }

    let shown = &frac_part[..frac_part.len().min(display_precision as usize)];
    let shown = shown.trim_end_matches('0');
    let shown = if shown.is_empty() { "0" } else { shown };

    format!("{}.{}", int_part, shown)
}

/// Whether an amount string should be treated as "nothing entered"
///
/// Empty, zero-valued and syntactically invalid strings all count as empty.
pub fn is_empty_amount(input: &str) -> bool {
    match split_decimal(input.trim()) {
        Some((int_part, frac_part)) => int_part
            .chars()
            .chain(frac_part.chars())
            .all(|c| c == '0'),
        None => true,
    }
}

fn split_decimal(s: &str) -> Option<(&str, &str)> {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if all_digits(int_part) && all_digits(frac_part) {
        Some((int_part, frac_part))
    } else {
        None
    }
}

fn digits_to_u256(digits: &str) -> Result<U256, AmountError> {
    digits.bytes().try_fold(U256::ZERO, |acc, b| {
        acc.checked_mul(U256::from(10u64))
            .and_then(|v| v.checked_add(U256::from(b - b'0')))
            .ok_or(AmountError::Overflow)
    })
}
