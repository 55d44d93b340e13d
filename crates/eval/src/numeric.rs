//! Numeric comparison and arithmetic over runtime values.
//!
//! All decimal work uses `rust_decimal::Decimal`. Comparison rounds both
//! operands to a fixed number of significant digits first, so values that
//! differ only past that precision compare equal. The comparator is wired
//! into the environment at construction time; the rule engine itself has
//! no tolerance logic.

use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::types::{EvalError, Value};

/// Significant digits retained by the default comparator.
pub const DEFAULT_SIGNIFICANT_DIGITS: u32 = 10;

/// Compares values after rounding decimals to a fixed number of
/// significant digits.
#[derive(Debug, Clone)]
pub struct SignificantDigitComparator {
    digits: u32,
}

impl Default for SignificantDigitComparator {
    fn default() -> Self {
        SignificantDigitComparator::new(DEFAULT_SIGNIFICANT_DIGITS)
    }
}

impl SignificantDigitComparator {
    pub fn new(digits: u32) -> Self {
        SignificantDigitComparator { digits }
    }

    fn round(&self, value: Decimal) -> Decimal {
        value.round_sf(self.digits).unwrap_or(value)
    }

    /// Compare two values under `op` (`=`, `!=`, `<`, `<=`, `>`, `>=`).
    ///
    /// Ints and Decimals mix freely (the Int is promoted). Bool, Text,
    /// Array, and Record support `=`/`!=` only; ordering them is a type
    /// error, as is comparing a lambda at all. Ordering against Null is
    /// `false`, so an absent value fails its assertion instead of
    /// aborting the batch.
    pub fn compare(&self, left: &Value, right: &Value, op: &str) -> Result<bool, EvalError> {
        check_operator(op)?;

        if !left.is_scalar() || !right.is_scalar() {
            return Err(EvalError::TypeError {
                message: format!(
                    "cannot compare {} and {}",
                    left.type_name(),
                    right.type_name()
                ),
            });
        }

        if let (Value::Int(l), Value::Int(r)) = (left, right) {
            return apply_ordering(l.cmp(r), op);
        }
        if let (Some(l), Some(r)) = (as_decimal(left), as_decimal(right)) {
            return apply_ordering(self.round(l).cmp(&self.round(r)), op);
        }

        match op {
            "=" => Ok(left == right),
            "!=" => Ok(left != right),
            // a missing value never satisfies an ordering assertion
            _ if matches!(left, Value::Null) || matches!(right, Value::Null) => Ok(false),
            _ => Err(EvalError::TypeError {
                message: format!(
                    "operator '{}' not defined for {} and {}",
                    op,
                    left.type_name(),
                    right.type_name()
                ),
            }),
        }
    }
}

fn check_operator(op: &str) -> Result<(), EvalError> {
    match op {
        "=" | "!=" | "<" | "<=" | ">" | ">=" => Ok(()),
        other => Err(EvalError::InvalidOperator {
            op: other.to_string(),
        }),
    }
}

fn apply_ordering(ord: Ordering, op: &str) -> Result<bool, EvalError> {
    Ok(match op {
        "=" => ord == Ordering::Equal,
        "!=" => ord != Ordering::Equal,
        "<" => ord == Ordering::Less,
        "<=" => ord != Ordering::Greater,
        ">" => ord == Ordering::Greater,
        ">=" => ord != Ordering::Less,
        other => {
            return Err(EvalError::InvalidOperator {
                op: other.to_string(),
            });
        }
    })
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

// ──────────────────────────────────────────────
// Arithmetic
// ──────────────────────────────────────────────

/// Evaluate `left op right` for `+`, `-`, `*`, `/`.
///
/// Int stays Int under `+ - *` with overflow checking; any Decimal
/// operand promotes the whole operation. Division always produces a
/// Decimal so `5 / 2` does not silently truncate.
pub fn arithmetic(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) if op != "/" => {
            let result = match op {
                "+" => l.checked_add(*r),
                "-" => l.checked_sub(*r),
                "*" => l.checked_mul(*r),
                _ => {
                    return Err(EvalError::InvalidOperator {
                        op: op.to_string(),
                    });
                }
            };
            result.map(Value::Int).ok_or_else(|| EvalError::Overflow {
                message: format!("integer {} overflow", op),
            })
        }
        _ => {
            let l = as_decimal(left).ok_or_else(|| type_error(op, left, right))?;
            let r = as_decimal(right).ok_or_else(|| type_error(op, left, right))?;
            let result = match op {
                "+" => l.checked_add(r),
                "-" => l.checked_sub(r),
                "*" => l.checked_mul(r),
                "/" => {
                    if r.is_zero() {
                        return Err(EvalError::DivisionByZero);
                    }
                    l.checked_div(r)
                }
                _ => {
                    return Err(EvalError::InvalidOperator {
                        op: op.to_string(),
                    });
                }
            };
            result
                .map(Value::Decimal)
                .ok_or_else(|| EvalError::Overflow {
                    message: format!("decimal {} overflow", op),
                })
        }
    }
}

fn type_error(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::TypeError {
        message: format!(
            "operator '{}' requires numeric operands, got {} and {}",
            op,
            left.type_name(),
            right.type_name()
        ),
    }
}
