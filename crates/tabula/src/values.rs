//! Cell value escaping and numeric precision checks

use serde_json::Value;
use std::collections::HashSet;
use tabula_common::{Result, TabulaError};

/// Largest integer magnitude a double represents exactly (2^53)
pub const MAX_SAFE_INTEGER: u64 = 1 << 53;

fn precision_error(value: impl std::fmt::Display) -> TabulaError {
    TabulaError::PrecisionLoss(format!(
        "integer {} is not within the IEEE 754 safe integer boundary of [-(2^53), 2^53], the integer may have a precision lost",
        value
    ))
}

/// Reject signed integers outside `[-2^53, 2^53]`
pub fn check_safe_i64(value: i64) -> Result<()> {
    if value.unsigned_abs() <= MAX_SAFE_INTEGER {
        Ok(())
    } else {
        Err(precision_error(value))
    }
}

/// Reject unsigned integers above `2^53`
pub fn check_safe_u64(value: u64) -> Result<()> {
    if value <= MAX_SAFE_INTEGER {
        Ok(())
    } else {
        Err(precision_error(value))
    }
}

/// Check an integer cell value; non-integers always pass.
pub fn check_safe_integer(value: &Value) -> Result<()> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                check_safe_i64(i)
            } else if let Some(u) = n.as_u64() {
                check_safe_u64(u)
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// Prepare a value for a `USER_ENTERED` write into `column`.
///
/// Strings in regular columns get a leading `'` so the backend keeps them as
/// text (`"1"` stays a string, `"2020-01-01"` does not become a date).
/// Formula columns take the string as-is and reject anything else.
pub fn escape_value(column: &str, value: Value, formula_columns: &HashSet<String>) -> Result<Value> {
    if formula_columns.contains(column) {
        return match value {
            Value::String(_) => Ok(value),
            _ => Err(TabulaError::FormulaType {
                column: column.to_string(),
            }),
        };
    }

    Ok(match value {
        Value::String(s) => Value::String(format!("'{}", s)),
        other => other,
    })
}
