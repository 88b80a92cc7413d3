use std::fmt;

use crate::ast::{RuleAstNode, RuleSource};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::{JsonType, SchemaType};
use crate::source::{is_user_type_name, quote, trim};

/// The target of a `type` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Builtin(SchemaType),
    User(String),
}

impl TypeRef {
    pub fn parse(name: &str) -> Result<TypeRef> {
        if let Some(builtin) = SchemaType::from_name(name) {
            return Ok(TypeRef::Builtin(builtin));
        }
        if is_user_type_name(name) {
            return Ok(TypeRef::User(name.to_string()));
        }
        Err(Error::new(ErrorCode::UnknownType, format!("unknown type \"{name}\"")))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Builtin(t) => f.write_str(t.as_str()),
            TypeRef::User(name) => f.write_str(name),
        }
    }
}

/// What an object accepts besides its declared keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdditionalProperties {
    Any,
    NotAllowed,
    MustBeSchemaType(SchemaType),
    /// Resolved by the checker.
    MustBeUserType(String),
}

impl AdditionalProperties {
    pub fn from_literal(literal: &[u8]) -> Result<Self> {
        let literal = trim(literal);
        match JsonType::guess(literal) {
            Some(JsonType::Boolean) if literal == b"true" => Ok(AdditionalProperties::Any),
            Some(JsonType::Boolean) => Ok(AdditionalProperties::NotAllowed),
            Some(JsonType::String) => Ok(Self::from_name(&crate::source::unquote(literal)?)),
            _ => Err(Error::new(
                ErrorCode::InvalidConstraintValue,
                "the value of the rule \"additionalProperties\" must be a boolean or a type name",
            )),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match SchemaType::from_name(name) {
            Some(SchemaType::Any) => AdditionalProperties::Any,
            Some(t) => AdditionalProperties::MustBeSchemaType(t),
            None => AdditionalProperties::MustBeUserType(name.to_string()),
        }
    }

    pub(super) fn to_ast_node(&self, source: RuleSource) -> RuleAstNode {
        match self {
            AdditionalProperties::Any => RuleAstNode::literal("true", source),
            AdditionalProperties::NotAllowed => RuleAstNode::literal("false", source),
            AdditionalProperties::MustBeSchemaType(t) => RuleAstNode::literal(quote(t.as_str()), source),
            AdditionalProperties::MustBeUserType(name) => RuleAstNode::reference(name, source),
        }
    }
}

impl fmt::Display for AdditionalProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdditionalProperties::Any => f.write_str("any"),
            AdditionalProperties::NotAllowed => f.write_str("not allowed"),
            AdditionalProperties::MustBeSchemaType(t) => f.write_str(t.as_str()),
            AdditionalProperties::MustBeUserType(name) => f.write_str(name),
        }
    }
}

/// Reads a boolean rule value (`optional`, `nullable`, `const`, ...).
pub fn flag(rule: &str, literal: &[u8]) -> Result<bool> {
    match trim(literal) {
        b"true" => Ok(true),
        b"false" => Ok(false),
        _ => Err(Error::new(
            ErrorCode::InvalidConstraintValue,
            format!("the value of the rule \"{rule}\" must be a boolean"),
        )),
    }
}

/// Checks one `allOf` member name.
pub fn all_of_name(name: &str) -> Result<String> {
    if is_user_type_name(name) {
        return Ok(name.to_string());
    }
    Err(Error::new(
        ErrorCode::InvalidAllOfSchemaName,
        format!("invalid schema name \"{name}\" in the rule \"allOf\""),
    ))
}
