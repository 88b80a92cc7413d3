use crate::error::{Error, ErrorCode, Result};
use crate::json_type::JsonType;
use crate::number::Number;
use crate::source::trim;

/// A `min` or `max` bound. Exclusivity comes from the sibling
/// `exclusiveMinimum`/`exclusiveMaximum` rule and only matters when checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub value: Number,
    pub exclusive: bool,
}

impl Bound {
    pub fn new(value: Number) -> Self {
        Self { value, exclusive: false }
    }

    pub fn from_literal(rule: &str, literal: &[u8]) -> Result<Self> {
        if !matches!(JsonType::guess(literal), Some(JsonType::Integer | JsonType::Float)) {
            return Err(Error::new(
                ErrorCode::InvalidConstraintValue,
                format!("the value of the rule \"{rule}\" must be a number"),
            ));
        }
        let value = Number::from_bytes(literal).map_err(|error| {
            Error::new(
                ErrorCode::InvalidConstraintValue,
                format!("invalid value of the rule \"{rule}\": {}", error.message()),
            )
        })?;
        Ok(Self::new(value))
    }

    pub fn check_min(&self, value: &Number) -> Result<()> {
        let ok = if self.exclusive { value > &self.value } else { value >= &self.value };
        if ok {
            return Ok(());
        }
        let relation = if self.exclusive { "greater than" } else { "greater than or equal to" };
        Err(Error::new(
            ErrorCode::ValueTooSmall,
            format!("value {value} must be {relation} {}", self.value),
        ))
    }

    pub fn check_max(&self, value: &Number) -> Result<()> {
        let ok = if self.exclusive { value < &self.value } else { value <= &self.value };
        if ok {
            return Ok(());
        }
        let relation = if self.exclusive { "less than" } else { "less than or equal to" };
        Err(Error::new(
            ErrorCode::ValueTooLarge,
            format!("value {value} must be {relation} {}", self.value),
        ))
    }
}

/// Reads a `precision` rule value: a positive integer.
pub fn precision(literal: &[u8]) -> Result<usize> {
    let invalid = || {
        Error::new(
            ErrorCode::InvalidConstraintValue,
            "the value of the rule \"precision\" must be a positive integer",
        )
    };
    if JsonType::guess(literal) != Some(JsonType::Integer) {
        return Err(invalid());
    }
    let n = Number::from_bytes(literal)?.to_usize().ok_or_else(invalid)?;
    if n == 0 {
        return Err(Error::new(ErrorCode::ZeroPrecision, "precision must be greater than zero"));
    }
    Ok(n)
}

pub(super) fn check_precision(precision: usize, value: &Number) -> Result<()> {
    if value.frac_len() <= precision {
        return Ok(());
    }
    Err(Error::new(
        ErrorCode::PrecisionExceeded,
        format!("value {value} has more than {precision} fractional digits"),
    ))
}

pub(super) fn value_number(value: &[u8]) -> Result<Number> {
    if !matches!(JsonType::guess(value), Some(JsonType::Integer | JsonType::Float)) {
        return Err(Error::new(
            ErrorCode::TypeMismatch,
            format!("number expected, got {}", String::from_utf8_lossy(trim(value))),
        ));
    }
    Number::from_bytes(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> Number {
        Number::new(s).unwrap()
    }

    #[test]
    fn inclusive_and_exclusive_bounds() {
        let mut min = Bound::from_literal("min", b"1").unwrap();
        min.check_min(&n("1")).unwrap();
        assert_eq!(min.check_min(&n("0.999")).unwrap_err().code(), ErrorCode::ValueTooSmall);
        min.exclusive = true;
        assert_eq!(min.check_min(&n("1.0")).unwrap_err().code(), ErrorCode::ValueTooSmall);

        let max = Bound::from_literal("max", b"1e2").unwrap();
        max.check_max(&n("100")).unwrap();
        assert_eq!(max.check_max(&n("100.0001")).unwrap_err().code(), ErrorCode::ValueTooLarge);
    }

    #[test]
    fn bounds_must_be_numbers() {
        let err = Bound::from_literal("min", b"\"1\"").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConstraintValue);
        assert!(err.message().contains("\"min\""));
    }

    #[test]
    fn precision_rules() {
        assert_eq!(precision(b"2").unwrap(), 2);
        assert_eq!(precision(b"0").unwrap_err().code(), ErrorCode::ZeroPrecision);
        assert_eq!(precision(b"1.5").unwrap_err().code(), ErrorCode::InvalidConstraintValue);
        assert_eq!(precision(b"-1").unwrap_err().code(), ErrorCode::InvalidConstraintValue);
        check_precision(2, &n("1.25")).unwrap();
        check_precision(2, &n("1.2500")).unwrap();
        assert_eq!(check_precision(2, &n("1.255")).unwrap_err().code(), ErrorCode::PrecisionExceeded);
    }
}
