use std::fmt;

use crate::ast::{RuleAstNode, RuleSource};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::JsonType;
use crate::source::{quote, trim, unquote};

/// A trimmed literal with strings unescaped. Numbers keep their text, so
/// `1` and `1.0` are different keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralKey {
    String(String),
    Number(String),
    Boolean(bool),
    Null,
}

impl LiteralKey {
    pub fn from_bytes(literal: &[u8]) -> Result<Self> {
        let literal = trim(literal);
        match JsonType::guess(literal) {
            Some(JsonType::String) => Ok(LiteralKey::String(unquote(literal)?)),
            Some(JsonType::Integer | JsonType::Float) => {
                Ok(LiteralKey::Number(String::from_utf8_lossy(literal).into_owned()))
            },
            Some(JsonType::Boolean) => Ok(LiteralKey::Boolean(literal == b"true")),
            Some(JsonType::Null) => Ok(LiteralKey::Null),
            _ => Err(Error::new(
                ErrorCode::InvalidConstraintValue,
                format!("a literal expected, got {}", String::from_utf8_lossy(literal)),
            )),
        }
    }
}

impl fmt::Display for LiteralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralKey::String(s) => f.write_str(&quote(s)),
            LiteralKey::Number(n) => f.write_str(n),
            LiteralKey::Boolean(b) => write!(f, "{b}"),
            LiteralKey::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnumItem {
    pub key: LiteralKey,
    /// The literal as written.
    pub text: String,
    pub comment: Option<String>,
}

/// Allowed literal values, either listed inline or taken from a named rule.
#[derive(Debug, Clone, Default)]
pub struct EnumConstraint {
    items: Vec<EnumItem>,
    rule: Option<String>,
}

impl EnumConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    /// An enum whose items come from the rule `name`, filled in at compile time.
    pub fn from_rule(name: impl Into<String>) -> Self {
        Self { items: Vec::new(), rule: Some(name.into()) }
    }

    pub fn rule_name(&self) -> Option<&str> {
        self.rule.as_deref()
    }

    pub fn items(&self) -> &[EnumItem] {
        &self.items
    }

    /// Adds a literal. Values equal after normalization are duplicates.
    pub fn append(&mut self, literal: &[u8], comment: Option<String>) -> Result<()> {
        let key = LiteralKey::from_bytes(literal)?;
        let text = String::from_utf8_lossy(trim(literal)).into_owned();
        if self.items.iter().any(|item| item.key == key) {
            return Err(Error::new(
                ErrorCode::DuplicateEnumValue,
                format!("value duplicates in enum: {text}"),
            ));
        }
        self.items.push(EnumItem { key, text, comment });
        Ok(())
    }

    pub fn resolve(&mut self, items: &[EnumItem]) {
        self.items = items.to_vec();
    }

    pub fn validate(&self, value: &[u8]) -> Result<()> {
        let key = LiteralKey::from_bytes(value)?;
        if self.items.iter().any(|item| item.key == key) {
            return Ok(());
        }
        Err(Error::new(
            ErrorCode::NotInEnum,
            format!("value {key} is not one of the enum values"),
        ))
    }

    pub(super) fn to_ast_node(&self, source: RuleSource) -> RuleAstNode {
        if let Some(rule) = &self.rule {
            return RuleAstNode::reference(rule, source);
        }
        let items = self
            .items
            .iter()
            .map(|item| {
                let mut node = RuleAstNode::literal(item.text.clone(), source);
                node.comment = item.comment.clone();
                node
            })
            .collect();
        RuleAstNode::array(items, source)
    }
}

impl fmt::Display for EnumConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(rule) = &self.rule {
            return f.write_str(rule);
        }
        let items: Vec<&str> = self.items.iter().map(|item| item.text.as_str()).collect();
        write!(f, "[{}]", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_semantic() {
        let mut e = EnumConstraint::new();
        e.append(br#""a""#, None).unwrap();
        let err = e.append(br#""\u0061""#, None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateEnumValue);

        let mut e = EnumConstraint::new();
        e.append(br#""\u0062""#, None).unwrap();
        e.append(br#""a""#, None).unwrap();
        assert_eq!(e.items().len(), 2);
    }

    #[test]
    fn numbers_compare_as_written() {
        let mut e = EnumConstraint::new();
        e.append(b"1", None).unwrap();
        e.append(b" 1.0 ", None).unwrap();
        e.append(b"\"1\"", None).unwrap();
        assert_eq!(e.append(b"1.0", None).unwrap_err().code(), ErrorCode::DuplicateEnumValue);
        assert_eq!(e.items().len(), 3);

        e.validate(b" 1.0 ").unwrap();
        e.validate(b"1").unwrap();
        assert_eq!(e.validate(b"1.00").unwrap_err().code(), ErrorCode::NotInEnum);
    }

    #[test]
    fn validation() {
        let mut e = EnumConstraint::new();
        for literal in [&b"\"red\""[..], b"null", b"true"] {
            e.append(literal, None).unwrap();
        }
        e.validate(br#""red""#).unwrap();
        e.validate(b"null").unwrap();
        assert_eq!(e.validate(br#""blue""#).unwrap_err().code(), ErrorCode::NotInEnum);
        assert_eq!(e.validate(b"false").unwrap_err().code(), ErrorCode::NotInEnum);
        assert_eq!(e.to_string(), r#"["red", null, true]"#);
    }
}
