//! Decoding of scalar profile values.
//!
//! Profiles are hand-edited, so numbers show up as JSON numbers, decimal
//! strings, or `0x`-prefixed hex strings, and booleans sometimes as 0/1.

use serde_json::Value;

/// Parse a decimal or `0x`-prefixed hexadecimal integer, with optional sign.
///
/// Surrounding whitespace is ignored. Returns `None` for anything else.
pub fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    if negative {
        magnitude.checked_neg()
    } else {
        Some(magnitude)
    }
}

/// Read a signed integer from a number or numeric string.
pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().and_then(|n| i64::try_from(n).ok())),
        Value::String(text) => parse_integer(text),
        _ => None,
    }
}

/// Read an unsigned 32-bit value (a verb, a pin config word).
pub fn unsigned32(value: &Value) -> Option<u32> {
    integer(value).and_then(|n| u32::try_from(n).ok())
}

/// Read a boolean from `true`/`false`, a number (non-zero is true), or the
/// strings `"true"`/`"false"`.
pub fn boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(_) => integer(value).map(|n| n != 0),
        Value::String(text) => {
            let text = text.trim();
            if text.eq_ignore_ascii_case("true") {
                Some(true)
            } else if text.eq_ignore_ascii_case("false") {
                Some(false)
            } else {
                parse_integer(text).map(|n| n != 0)
            }
        }
        _ => None,
    }
}
