//! Value transforms — how a raw attribute input becomes a stored value.
//!
//! A transform receives the canonical attribute name (for error reporting),
//! the raw input, and the value currently stored. Only relative transforms
//! such as [`octave`] read the current value.

use crate::error::{EvalError, Result};

use super::RawValue;

/// Signature shared by all attribute transforms.
pub type Transform = fn(attribute: &str, raw: &RawValue, current: f64) -> Result<f64>;

fn number(attribute: &str, raw: &RawValue) -> Result<f64> {
    match raw {
        RawValue::Number(n) if n.is_finite() => Ok(*n),
        other => Err(EvalError::out_of_range(attribute, other)),
    }
}

/// Pass a number through unchanged. Must be strictly positive.
pub fn positive(attribute: &str, raw: &RawValue, _current: f64) -> Result<f64> {
    let value = number(attribute, raw)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(EvalError::out_of_range(attribute, raw))
    }
}

/// Map 0–100 onto 0.0–1.0.
pub fn percentage(attribute: &str, raw: &RawValue, _current: f64) -> Result<f64> {
    let value = number(attribute, raw)?;
    if (0.0..=100.0).contains(&value) {
        Ok(value / 100.0)
    } else {
        Err(EvalError::out_of_range(attribute, raw))
    }
}

/// Absolute integer octave, or a one-octave shift via `>`/`up` and `<`/`down`.
pub fn octave(attribute: &str, raw: &RawValue, current: f64) -> Result<f64> {
    match raw {
        RawValue::Symbol(s) => match s.as_str() {
            ">" | "up" => Ok(current + 1.0),
            "<" | "down" => Ok(current - 1.0),
            _ => Err(EvalError::out_of_range(attribute, raw)),
        },
        RawValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Ok(*n),
        RawValue::Number(_) => Err(EvalError::out_of_range(attribute, raw)),
    }
}
