use crate::error::{Error, ErrorCode, Result};
use crate::json_type::JsonType;
use crate::number::Number;
use crate::source::{trim, unquote};

/// Reads a count rule value (`minLength`, `maxItems`, ...): a non-negative integer.
pub fn non_negative(rule: &str, literal: &[u8]) -> Result<usize> {
    let invalid = || {
        Error::new(
            ErrorCode::InvalidConstraintValue,
            format!("the value of the rule \"{rule}\" must be a non-negative integer"),
        )
    };
    if JsonType::guess(literal) != Some(JsonType::Integer) {
        return Err(invalid());
    }
    Number::from_bytes(literal)?.to_usize().ok_or_else(invalid)
}

fn char_count(value: &[u8]) -> Result<usize> {
    if JsonType::guess(value) != Some(JsonType::String) {
        return Err(Error::new(
            ErrorCode::TypeMismatch,
            format!("string expected, got {}", String::from_utf8_lossy(trim(value))),
        ));
    }
    Ok(unquote(value)?.chars().count())
}

pub(super) fn check_min_length(min: usize, value: &[u8]) -> Result<()> {
    let len = char_count(value)?;
    if len < min {
        return Err(Error::new(
            ErrorCode::StringTooShort,
            format!("string length {len} is less than minLength {min}"),
        ));
    }
    Ok(())
}

pub(super) fn check_max_length(max: usize, value: &[u8]) -> Result<()> {
    let len = char_count(value)?;
    if len > max {
        return Err(Error::new(
            ErrorCode::StringTooLong,
            format!("string length {len} is greater than maxLength {max}"),
        ));
    }
    Ok(())
}
