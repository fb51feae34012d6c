//! Precision modes and rounding of amounts and prices to market precision.

use crate::error::PreciseError;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// How a market's `precision.amount` / `precision.price` values are encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrecisionMode {
    /// Precision is a count of fractional digits (`8` means `0.00000001`).
    DecimalPlaces,
    /// Precision is the smallest increment (`0.00000001`).
    #[default]
    TickSize,
}

/// Rounding applied by [`to_precision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    Truncate,
    Round,
}

/// `"4"` to `"0.0001"`; negative digit counts give powers of ten (`"-2"` to `"100"`).
pub fn parse_precision(digits: &str) -> Option<String> {
    let digits: i64 = digits.trim().parse().ok()?;
    if digits >= 0 {
        let scale = u32::try_from(digits).ok()?;
        if scale > 28 {
            return None;
        }
        Some(Decimal::new(1, scale).to_string())
    } else {
        let exp = u32::try_from(-digits).ok()?;
        let power = 10i128.checked_pow(exp)?;
        Decimal::try_from_i128_with_scale(power, 0)
            .ok()
            .map(|d| d.to_string())
    }
}

/// Number of significant fractional digits: `"0.0001"` is 4, `"1"` and `"10"` are 0.
pub fn precision_from_string(value: &str) -> Option<u32> {
    let parsed = super::precise::parse(value).ok()?;
    Some(parsed.normalize().scale())
}

/// Express a precision value in tick-size form regardless of mode.
pub fn tick_size(precision: Decimal, mode: PrecisionMode) -> Option<Decimal> {
    match mode {
        PrecisionMode::TickSize => Some(precision),
        PrecisionMode::DecimalPlaces => {
            let digits = precision.trunc().to_u32()?;
            (digits <= 28).then(|| Decimal::new(1, digits))
        }
    }
}

/// Round or truncate `value` to a market precision.
///
/// Amounts are truncated so an order never exceeds the caller's balance;
/// prices are rounded to the nearest step.
pub fn to_precision(
    value: Decimal,
    precision: Decimal,
    mode: PrecisionMode,
    rounding: Rounding,
) -> Result<Decimal, PreciseError> {
    let strategy = match rounding {
        Rounding::Truncate => RoundingStrategy::ToZero,
        Rounding::Round => RoundingStrategy::MidpointAwayFromZero,
    };
    match mode {
        PrecisionMode::DecimalPlaces => {
            let digits = precision
                .trunc()
                .to_u32()
                .ok_or_else(|| PreciseError::Parse(precision.to_string()))?;
            Ok(value.round_dp_with_strategy(digits, strategy).normalize())
        }
        PrecisionMode::TickSize => {
            if precision.is_zero() {
                return Err(PreciseError::DivisionByZero);
            }
            let steps = value
                .checked_div(precision)
                .ok_or(PreciseError::Overflow)?
                .round_dp_with_strategy(0, strategy);
            let result = steps.checked_mul(precision).ok_or(PreciseError::Overflow)?;
            Ok(result.normalize())
        }
    }
}
