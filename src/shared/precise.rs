//! Decimal arithmetic over string-encoded numbers.
//!
//! Exchanges send prices and quantities as strings (`"0.00012"`), integers, or
//! occasionally scientific notation (`"1e-8"`). Every function here parses
//! its inputs into `rust_decimal::Decimal`, operates without any binary
//! floating-point step, and renders a normalized string back (`"1.50"` becomes
//! `"1.5"`, `"-0"` becomes `"0"`).
//!
//! Division truncates toward zero at a fixed number of fractional digits
//! (default [`DEFAULT_DIV_SCALE`]) and refuses to divide by zero.

use crate::error::PreciseError;
use rust_decimal::prelude::*;
use std::cmp::Ordering;
use std::str::FromStr;

/// Fractional digits kept by [`string_div`].
pub const DEFAULT_DIV_SCALE: u32 = 18;

/// Parse a decimal string. Accepts an optional sign, a fraction and
/// scientific notation. Surrounding whitespace is ignored.
pub fn parse(value: &str) -> Result<Decimal, PreciseError> {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.is_empty() {
        return Err(PreciseError::Parse(value.to_string()));
    }
    if unsigned.contains(['e', 'E']) {
        return Decimal::from_scientific(unsigned)
            .map_err(|_| PreciseError::Parse(value.to_string()));
    }
    Decimal::from_str(unsigned).map_err(|e| match e {
        rust_decimal::Error::ExceedsMaximumPossibleValue
        | rust_decimal::Error::LessThanMinimumPossibleValue => PreciseError::Overflow,
        _ => PreciseError::Parse(value.to_string()),
    })
}

/// Render a decimal in its shortest exact form.
pub fn render(value: Decimal) -> String {
    value.normalize().to_string()
}

fn binary(
    a: &str,
    b: &str,
    op: impl FnOnce(Decimal, Decimal) -> Option<Decimal>,
) -> Result<String, PreciseError> {
    let result = op(parse(a)?, parse(b)?).ok_or(PreciseError::Overflow)?;
    Ok(render(result))
}

pub fn string_add(a: &str, b: &str) -> Result<String, PreciseError> {
    binary(a, b, |x, y| x.checked_add(y))
}

pub fn string_sub(a: &str, b: &str) -> Result<String, PreciseError> {
    binary(a, b, |x, y| x.checked_sub(y))
}

pub fn string_mul(a: &str, b: &str) -> Result<String, PreciseError> {
    binary(a, b, |x, y| x.checked_mul(y))
}

/// `a / b` truncated to [`DEFAULT_DIV_SCALE`] fractional digits.
pub fn string_div(a: &str, b: &str) -> Result<String, PreciseError> {
    string_div_scale(a, b, DEFAULT_DIV_SCALE)
}

/// `a / b` truncated (never rounded) to `scale` fractional digits.
pub fn string_div_scale(a: &str, b: &str, scale: u32) -> Result<String, PreciseError> {
    Ok(render(div_truncated(parse(a)?, parse(b)?, scale)?))
}

/// Decimal division with the same contract as [`string_div_scale`].
pub fn div_truncated(a: Decimal, b: Decimal, scale: u32) -> Result<Decimal, PreciseError> {
    if b.is_zero() {
        return Err(PreciseError::DivisionByZero);
    }
    let quotient = a.checked_div(b).ok_or(PreciseError::Overflow)?;
    Ok(quotient.round_dp_with_strategy(scale, RoundingStrategy::ToZero))
}

/// Remainder with the sign of the dividend.
pub fn string_mod(a: &str, b: &str) -> Result<String, PreciseError> {
    let divisor = parse(b)?;
    if divisor.is_zero() {
        return Err(PreciseError::DivisionByZero);
    }
    let result = parse(a)?.checked_rem(divisor).ok_or(PreciseError::Overflow)?;
    Ok(render(result))
}

pub fn string_abs(a: &str) -> Result<String, PreciseError> {
    Ok(render(parse(a)?.abs()))
}

pub fn string_neg(a: &str) -> Result<String, PreciseError> {
    Ok(render(-parse(a)?))
}

pub fn string_min(a: &str, b: &str) -> Result<String, PreciseError> {
    binary(a, b, |x, y| Some(x.min(y)))
}

pub fn string_max(a: &str, b: &str) -> Result<String, PreciseError> {
    binary(a, b, |x, y| Some(x.max(y)))
}

/// Numeric comparison; textual padding is irrelevant (`"0.0"` equals `"0"`).
pub fn string_cmp(a: &str, b: &str) -> Result<Ordering, PreciseError> {
    Ok(parse(a)?.cmp(&parse(b)?))
}

pub fn string_eq(a: &str, b: &str) -> Result<bool, PreciseError> {
    Ok(string_cmp(a, b)? == Ordering::Equal)
}

pub fn string_gt(a: &str, b: &str) -> Result<bool, PreciseError> {
    Ok(string_cmp(a, b)? == Ordering::Greater)
}

pub fn string_ge(a: &str, b: &str) -> Result<bool, PreciseError> {
    Ok(string_cmp(a, b)? != Ordering::Less)
}

pub fn string_lt(a: &str, b: &str) -> Result<bool, PreciseError> {
    Ok(string_cmp(a, b)? == Ordering::Less)
}

pub fn string_le(a: &str, b: &str) -> Result<bool, PreciseError> {
    Ok(string_cmp(a, b)? != Ordering::Greater)
}

// ─── Optional operands ───────────────────────────────────────────────────────

/// Helpers for normalizers that hold `Option<String>` fields.
///
/// A missing or unparseable operand yields `None`; nothing here fails.
pub mod opt {
    use super::*;

    pub fn add(a: Option<&str>, b: Option<&str>) -> Option<String> {
        string_add(a?, b?).ok()
    }

    pub fn sub(a: Option<&str>, b: Option<&str>) -> Option<String> {
        string_sub(a?, b?).ok()
    }

    pub fn mul(a: Option<&str>, b: Option<&str>) -> Option<String> {
        string_mul(a?, b?).ok()
    }

    pub fn div(a: Option<&str>, b: Option<&str>) -> Option<String> {
        string_div(a?, b?).ok()
    }

    pub fn neg(a: Option<&str>) -> Option<String> {
        string_neg(a?).ok()
    }

    pub fn abs(a: Option<&str>) -> Option<String> {
        string_abs(a?).ok()
    }

    /// Minimum of the present operands.
    pub fn min(a: Option<&str>, b: Option<&str>) -> Option<String> {
        match (a, b) {
            (Some(a), Some(b)) => string_min(a, b).ok(),
            (Some(only), None) | (None, Some(only)) => parse(only).ok().map(render),
            (None, None) => None,
        }
    }

    /// Maximum of the present operands.
    pub fn max(a: Option<&str>, b: Option<&str>) -> Option<String> {
        match (a, b) {
            (Some(a), Some(b)) => string_max(a, b).ok(),
            (Some(only), None) | (None, Some(only)) => parse(only).ok().map(render),
            (None, None) => None,
        }
    }

    pub fn decimal(a: Option<&str>) -> Option<Decimal> {
        parse(a?).ok()
    }
}
