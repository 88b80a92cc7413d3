use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use super::ConstraintKind;
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::{JsonType, SchemaType};
use crate::source::{trim, unquote};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern compiles")
});

static URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:[^\s]+$").expect("uri pattern compiles"));

fn string_value(value: &[u8]) -> Result<String> {
    if JsonType::guess(value) != Some(JsonType::String) {
        return Err(Error::new(
            ErrorCode::TypeMismatch,
            format!("string expected, got {}", String::from_utf8_lossy(trim(value))),
        ));
    }
    unquote(value)
}

/// A `regex` rule. The rule value is a JSON string whose decoded text is the pattern.
#[derive(Debug, Clone)]
pub struct RegexConstraint {
    pattern: String,
    regex: Regex,
}

impl RegexConstraint {
    pub fn new(literal: &[u8]) -> Result<Self> {
        if JsonType::guess(literal) != Some(JsonType::String) {
            return Err(Error::new(
                ErrorCode::InvalidConstraintValue,
                "the value of the rule \"regex\" must be a string",
            ));
        }
        let pattern = unquote(literal)?;
        let regex = Regex::new(&pattern)
            .map_err(|error| Error::new(ErrorCode::InvalidRegex, format!("invalid regex {pattern:?}: {error}")))?;
        Ok(Self { pattern, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn validate(&self, value: &[u8]) -> Result<()> {
        let text = string_value(value)?;
        if self.regex.is_match(&text) {
            return Ok(());
        }
        Err(Error::new(
            ErrorCode::RegexMismatch,
            format!("string {text:?} does not match the regex {:?}", self.pattern),
        ))
    }
}

/// Format checks implied by the semantic string types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
}

impl Format {
    pub fn for_type(schema_type: SchemaType) -> Option<Format> {
        Some(match schema_type {
            SchemaType::Email => Format::Email,
            SchemaType::Uri => Format::Uri,
            SchemaType::Uuid => Format::Uuid,
            SchemaType::Date => Format::Date,
            SchemaType::DateTime => Format::DateTime,
            _ => return None,
        })
    }

    pub fn kind(self) -> ConstraintKind {
        match self {
            Format::Email => ConstraintKind::Email,
            Format::Uri => ConstraintKind::Uri,
            Format::Uuid => ConstraintKind::Uuid,
            Format::Date => ConstraintKind::Date,
            Format::DateTime => ConstraintKind::DateTime,
        }
    }

    pub fn validate(self, value: &[u8]) -> Result<()> {
        let text = string_value(value)?;
        let (ok, code) = match self {
            Format::Email => (EMAIL.is_match(&text), ErrorCode::InvalidEmail),
            Format::Uri => (URI.is_match(&text), ErrorCode::InvalidUri),
            Format::Uuid => (Uuid::parse_str(&text).is_ok(), ErrorCode::InvalidUuid),
            Format::Date => (NaiveDate::parse_from_str(&text, "%Y-%m-%d").is_ok(), ErrorCode::InvalidDate),
            Format::DateTime => (DateTime::parse_from_rfc3339(&text).is_ok(), ErrorCode::InvalidDateTime),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::new(code, format!("{text:?} is not a valid {}", self.kind())))
        }
    }
}
