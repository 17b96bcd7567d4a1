//! Quantity and price cell parsing.
//!
//! Prices become integer micros without touching floating point. Cells are
//! cleaned of ASCII and ideographic (U+3000) spaces first, since the order
//! export pads numbers with both.

use std::fmt;

/// Errors from numeric cell parsing. Callers coerce these to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericError {
    Invalid(String),
    Negative(String),
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::Invalid(raw) => write!(f, "not a number: '{raw}'"),
            NumericError::Negative(raw) => write!(f, "negative value: '{raw}'"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Remove every ASCII space and U+3000 from a cell.
pub fn strip_cell_spaces(raw: &str) -> String {
    raw.chars().filter(|c| *c != ' ' && *c != '\u{3000}').collect()
}

/// Convert a decimal string to integer micros.
///
/// - optional leading `+` or `-`
/// - optional fractional part after `.`
/// - optional exponent (`1e3`, `2.5E-1`)
/// - digits past the 6th decimal place are truncated toward zero
/// - empty string is zero
pub fn price_to_micros(raw: &str) -> Result<i64, NumericError> {
    let s = strip_cell_spaces(raw.trim());
    if s.is_empty() {
        return Ok(0);
    }
    let invalid = || NumericError::Invalid(raw.to_string());

    let (negative, body) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s.as_str())
    };

    let (mantissa, exp) = match body.find(|c: char| c == 'e' || c == 'E') {
        Some(i) => (&body[..i], body[i + 1..].parse::<i32>().map_err(|_| invalid())?),
        None => (body, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |p: &str| p.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(invalid());
    }

    // Significant digits with the decimal point moved 6 places right.
    let digits = format!("{int_part}{frac_part}");
    let keep = i64::try_from(int_part.len()).map_err(|_| invalid())? + i64::from(exp) + 6;
    let scaled = if keep <= 0 {
        String::new()
    } else {
        let keep = usize::try_from(keep).map_err(|_| invalid())?;
        if keep <= digits.len() {
            digits[..keep].to_string()
        } else if digits.bytes().all(|b| b == b'0') {
            String::new()
        } else if keep - digits.len() > 19 {
            return Err(invalid());
        } else {
            format!("{digits}{}", "0".repeat(keep - digits.len()))
        }
    };

    let trimmed = scaled.trim_start_matches('0');
    let micros: i64 = if trimmed.is_empty() {
        0
    } else {
        trimmed.parse().map_err(|_| invalid())?
    };

    Ok(if negative { -micros } else { micros })
}

/// Parse an order quantity. Empty is zero; fractions are dropped (`"2.9"` is
/// 2) and exponent forms are accepted (`"1e3"` is 1000).
pub fn parse_quantity(raw: &str) -> Result<u64, NumericError> {
    let s = strip_cell_spaces(raw.trim());
    if s.is_empty() {
        return Ok(0);
    }
    let whole = match s.parse::<i64>() {
        Ok(v) => v,
        Err(_) => price_to_micros(&s)? / 1_000_000,
    };
    u64::try_from(whole).map_err(|_| NumericError::Negative(raw.to_string()))
}
