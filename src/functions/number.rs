//! # Decimal Arithmetic
//!
//! Numeric functions read their operands as exact decimals:
//! - optional sign, digits, at most one decimal separator (`.` or `,`)
//! - an empty operand counts as zero
//! - exponents, `NaN` and `inf` are not numbers
//!
//! Results are rendered without trailing zeros and without exponent.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::prelude::Signed;
use rust_decimal::{Decimal, RoundingStrategy};

use super::errors::{FunctionError, FunctionResult};

/// Most fractional digits a decimal can carry
pub const MAX_SCALE: u32 = 28;

/// Parse a field value as a decimal
pub fn parse_decimal(raw: &str) -> FunctionResult<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let normalized = trimmed.replace(',', ".");
    if !is_plain_decimal(&normalized) {
        return Err(FunctionError::NotANumber(raw.to_string()));
    }
    Decimal::from_str(&normalized).map_err(|_| FunctionError::NotANumber(raw.to_string()))
}

fn is_plain_decimal(s: &str) -> bool {
    let digits = s.strip_prefix(|c| c == '+' || c == '-').unwrap_or(s);
    let mut points = 0;
    let mut any_digit = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => any_digit = true,
            '.' => points += 1,
            _ => return false,
        }
    }
    any_digit && points <= 1
}

/// Render a decimal; `-0` renders as `0`
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Folds over all operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    /// a + b + ...
    Sum,
    /// -(a + b + ...)
    Minus,
    /// a - b - ...
    Diff,
    /// a * b * ...
    Product,
    /// |a + b + ...|
    Abs,
    /// -1, 0 or 1 for the sign of a + b + ...
    Sign,
}

impl Arithmetic {
    pub fn name(&self) -> &'static str {
        match self {
            Arithmetic::Sum => "SUM",
            Arithmetic::Minus => "MINUS",
            Arithmetic::Diff => "DIFF",
            Arithmetic::Product => "PRODUCT",
            Arithmetic::Abs => "ABS",
            Arithmetic::Sign => "SIGN",
        }
    }

    pub fn apply(self, operands: &[Decimal]) -> FunctionResult<Decimal> {
        let folded = match self {
            Arithmetic::Product => operands
                .iter()
                .try_fold(Decimal::ONE, |acc, n| acc.checked_mul(*n)),
            Arithmetic::Diff => match operands.split_first() {
                Some((first, rest)) => rest.iter().try_fold(*first, |acc, n| acc.checked_sub(*n)),
                None => Some(Decimal::ZERO),
            },
            Arithmetic::Sum | Arithmetic::Minus | Arithmetic::Abs | Arithmetic::Sign => operands
                .iter()
                .try_fold(Decimal::ZERO, |acc, n| acc.checked_add(*n)),
        };
        let total =
            folded.ok_or_else(|| FunctionError::Arithmetic(format!("{} overflows", self.name())))?;

        Ok(match self {
            Arithmetic::Minus => -total,
            Arithmetic::Abs => total.abs(),
            Arithmetic::Sign => total.signum(),
            Arithmetic::Sum | Arithmetic::Diff | Arithmetic::Product => total,
        })
    }
}

/// Numeric comparison of every operand against the first one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    /// `"true"` if all are equal, `"-1"` if the first is smaller than all
    /// others, `"1"` if it is larger than all others, `"0"` otherwise
    NumCmp,
}

impl Comparison {
    pub fn name(&self) -> &'static str {
        match self {
            Comparison::Lt => "LT",
            Comparison::Le => "LE",
            Comparison::Gt => "GT",
            Comparison::Ge => "GE",
            Comparison::NumCmp => "NUMCMP",
        }
    }

    /// `first.cmp(other)` outcomes that make the comparison false
    fn rejects(self, ord: Ordering) -> bool {
        match self {
            Comparison::Lt => ord != Ordering::Less,
            Comparison::Le => ord == Ordering::Greater,
            Comparison::Gt => ord != Ordering::Greater,
            Comparison::Ge => ord == Ordering::Less,
            Comparison::NumCmp => false,
        }
    }

    /// Values within `margin` of the first operand count as equal to it.
    pub fn apply(self, operands: &[Decimal], margin: Decimal) -> &'static str {
        let (first, rest) = match operands.split_first() {
            Some(split) => split,
            None => return "true",
        };
        let margin = margin.abs();
        let low = first.checked_sub(margin).unwrap_or(Decimal::MIN);
        let high = first.checked_add(margin).unwrap_or(Decimal::MAX);

        let mut tally: i64 = 0;
        for n in rest {
            let ord = if low <= *n && *n <= high {
                Ordering::Equal
            } else {
                first.cmp(n)
            };
            if self.rejects(ord) {
                return "false";
            }

            let step = match ord {
                Ordering::Less => -1,
                Ordering::Equal => 0,
                Ordering::Greater => 1,
            };
            if step * tally < 0 {
                return "0";
            }
            tally += step;
        }

        match (self, tally.cmp(&0)) {
            (Comparison::NumCmp, Ordering::Greater) => "1",
            (Comparison::NumCmp, Ordering::Less) => "-1",
            _ => "true",
        }
    }
}

/// Divide and round half away from zero to at most `max_scale` digits,
/// then pad with zeros to at least `min_scale` digits.
pub fn divide(
    dividend: Decimal,
    divisor: Decimal,
    min_scale: u32,
    max_scale: u32,
) -> FunctionResult<String> {
    if divisor.is_zero() {
        return Err(FunctionError::Arithmetic("division by zero".into()));
    }
    let quotient = dividend
        .checked_div(divisor)
        .ok_or_else(|| FunctionError::Arithmetic("DIVIDE overflows".into()))?;

    let mut result = quotient
        .round_dp_with_strategy(max_scale, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if result.scale() < min_scale {
        result.rescale(min_scale);
    }
    Ok(result.to_string())
}
