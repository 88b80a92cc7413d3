//! Constraints attached to schema nodes.
//!
//! Each rule of an annotation becomes one [`Constraint`]. A node keeps at most
//! one constraint per [`ConstraintKind`], together with the lexeme it was read
//! from so errors can point at the rule rather than at the node.
use std::fmt;

use crate::ast::{RuleAstNode, RuleSource};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::JsonType;
use crate::lexeme::LexEvent;
use crate::source::quote;

mod enumeration;
mod length;
mod numeric;
mod string;
mod structure;

pub use enumeration::{EnumConstraint, EnumItem, LiteralKey};
pub use length::non_negative;
pub use numeric::{Bound, precision};
pub use string::{Format, RegexConstraint};
pub use structure::{AdditionalProperties, TypeRef, all_of_name, flag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Type,
    TypesList,
    Or,
    AllOf,
    Min,
    Max,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinLength,
    MaxLength,
    MinItems,
    MaxItems,
    Precision,
    Optional,
    Nullable,
    Const,
    Enum,
    Regex,
    AdditionalProperties,
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        use ConstraintKind::*;
        match self {
            Type => "type",
            TypesList => "types",
            Or => "or",
            AllOf => "allOf",
            Min => "min",
            Max => "max",
            ExclusiveMinimum => "exclusiveMinimum",
            ExclusiveMaximum => "exclusiveMaximum",
            MinLength => "minLength",
            MaxLength => "maxLength",
            MinItems => "minItems",
            MaxItems => "maxItems",
            Precision => "precision",
            Optional => "optional",
            Nullable => "nullable",
            Const => "const",
            Enum => "enum",
            Regex => "regex",
            AdditionalProperties => "additionalProperties",
            Email => "email",
            Uri => "uri",
            Uuid => "uuid",
            Date => "date",
            DateTime => "datetime",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Constraint {
    Type(TypeRef),
    /// Member type names of a union. Unnamed members are registered as types too.
    TypesList(Vec<String>),
    /// Marks the node as a union.
    Or,
    AllOf(Vec<String>),
    Min(Bound),
    Max(Bound),
    ExclusiveMinimum(bool),
    ExclusiveMaximum(bool),
    MinLength(usize),
    MaxLength(usize),
    MinItems(usize),
    MaxItems(usize),
    Precision(usize),
    Optional(bool),
    Nullable(bool),
    Const { value: bool, example: Option<LiteralKey> },
    Enum(EnumConstraint),
    Regex(RegexConstraint),
    AdditionalProperties(AdditionalProperties),
    Format(Format),
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Type(_) => ConstraintKind::Type,
            Constraint::TypesList(_) => ConstraintKind::TypesList,
            Constraint::Or => ConstraintKind::Or,
            Constraint::AllOf(_) => ConstraintKind::AllOf,
            Constraint::Min(_) => ConstraintKind::Min,
            Constraint::Max(_) => ConstraintKind::Max,
            Constraint::ExclusiveMinimum(_) => ConstraintKind::ExclusiveMinimum,
            Constraint::ExclusiveMaximum(_) => ConstraintKind::ExclusiveMaximum,
            Constraint::MinLength(_) => ConstraintKind::MinLength,
            Constraint::MaxLength(_) => ConstraintKind::MaxLength,
            Constraint::MinItems(_) => ConstraintKind::MinItems,
            Constraint::MaxItems(_) => ConstraintKind::MaxItems,
            Constraint::Precision(_) => ConstraintKind::Precision,
            Constraint::Optional(_) => ConstraintKind::Optional,
            Constraint::Nullable(_) => ConstraintKind::Nullable,
            Constraint::Const { .. } => ConstraintKind::Const,
            Constraint::Enum(_) => ConstraintKind::Enum,
            Constraint::Regex(_) => ConstraintKind::Regex,
            Constraint::AdditionalProperties(_) => ConstraintKind::AdditionalProperties,
            Constraint::Format(format) => format.kind(),
        }
    }

    pub fn is_json_type_compatible(&self, json_type: JsonType) -> bool {
        use ConstraintKind as K;
        use JsonType as J;
        match self.kind() {
            K::Type | K::TypesList | K::Or | K::Optional | K::Nullable => true,
            K::AllOf | K::AdditionalProperties => json_type == J::Object,
            K::Min | K::Max | K::ExclusiveMinimum | K::ExclusiveMaximum => {
                matches!(json_type, J::Integer | J::Float)
            }
            K::MinLength | K::MaxLength | K::Regex | K::Email | K::Uri | K::Uuid | K::Date | K::DateTime => {
                json_type == J::String
            }
            K::MinItems | K::MaxItems => json_type == J::Array,
            K::Precision => json_type == J::Float,
            K::Const => json_type.is_literal(),
            // an `enum` typed member of a union has no example to infer from
            K::Enum => json_type.is_literal() || json_type == J::Mixed,
        }
    }

    /// Checks a literal value. Constraints that do not restrict literals accept
    /// everything.
    pub fn validate(&self, value: &[u8]) -> Result<()> {
        match self {
            Constraint::Min(bound) => bound.check_min(&numeric::value_number(value)?),
            Constraint::Max(bound) => bound.check_max(&numeric::value_number(value)?),
            Constraint::Precision(precision) => numeric::check_precision(*precision, &numeric::value_number(value)?),
            Constraint::MinLength(min) => length::check_min_length(*min, value),
            Constraint::MaxLength(max) => length::check_max_length(*max, value),
            Constraint::Regex(regex) => regex.validate(value),
            Constraint::Format(format) => format.validate(value),
            Constraint::Enum(items) => items.validate(value),
            Constraint::Const { value: true, example: Some(example) } => {
                if &LiteralKey::from_bytes(value)? == example {
                    Ok(())
                } else {
                    Err(Error::new(
                        ErrorCode::ConstMismatch,
                        format!("value {} does not equal the constant {example}", String::from_utf8_lossy(value).trim()),
                    ))
                }
            }
            _ => Ok(()),
        }
    }

    pub fn to_debug_string(&self) -> String {
        self.to_string()
    }

    pub fn to_ast_node(&self, source: RuleSource) -> RuleAstNode {
        match self {
            Constraint::Type(TypeRef::User(name)) => RuleAstNode::reference(name, source),
            Constraint::Type(TypeRef::Builtin(t)) => RuleAstNode::literal(quote(t.as_str()), source),
            Constraint::TypesList(names) | Constraint::AllOf(names) => RuleAstNode::array(
                names.iter().map(|name| RuleAstNode::reference(name, source)).collect(),
                source,
            ),
            Constraint::Or => RuleAstNode::literal("true", source),
            Constraint::Min(bound) | Constraint::Max(bound) => RuleAstNode::literal(bound.value.to_string(), source),
            Constraint::ExclusiveMinimum(flag)
            | Constraint::ExclusiveMaximum(flag)
            | Constraint::Optional(flag)
            | Constraint::Nullable(flag)
            | Constraint::Const { value: flag, .. } => RuleAstNode::literal(flag.to_string(), source),
            Constraint::MinLength(n)
            | Constraint::MaxLength(n)
            | Constraint::MinItems(n)
            | Constraint::MaxItems(n)
            | Constraint::Precision(n) => RuleAstNode::literal(n.to_string(), source),
            Constraint::Enum(items) => items.to_ast_node(source),
            Constraint::Regex(regex) => RuleAstNode::literal(quote(regex.pattern()), source),
            Constraint::AdditionalProperties(mode) => mode.to_ast_node(source),
            Constraint::Format(_) => RuleAstNode::literal("true", source),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            Constraint::Type(t) => write!(f, "{kind}: {t}"),
            Constraint::TypesList(names) | Constraint::AllOf(names) => write!(f, "{kind}: {}", names.join(", ")),
            Constraint::Or | Constraint::Format(_) => write!(f, "{kind}"),
            Constraint::Min(bound) | Constraint::Max(bound) => {
                write!(f, "{kind}: {}", bound.value)?;
                if bound.exclusive {
                    f.write_str(" (exclusive)")?;
                }
                Ok(())
            }
            Constraint::ExclusiveMinimum(flag)
            | Constraint::ExclusiveMaximum(flag)
            | Constraint::Optional(flag)
            | Constraint::Nullable(flag)
            | Constraint::Const { value: flag, .. } => write!(f, "{kind}: {flag}"),
            Constraint::MinLength(n)
            | Constraint::MaxLength(n)
            | Constraint::MinItems(n)
            | Constraint::MaxItems(n)
            | Constraint::Precision(n) => write!(f, "{kind}: {n}"),
            Constraint::Enum(items) => write!(f, "{kind}: {items}"),
            Constraint::Regex(regex) => write!(f, "{kind}: {}", quote(regex.pattern())),
            Constraint::AdditionalProperties(mode) => write!(f, "{kind}: {mode}"),
        }
    }
}

/// A constraint plus the lexeme of the rule it came from. Generated
/// constraints have no source.
#[derive(Debug, Clone)]
pub struct ConstraintEntry {
    pub constraint: Constraint,
    pub source: Option<LexEvent>,
}

/// Small association list keyed by constraint kind, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    entries: Vec<ConstraintEntry>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, kind: ConstraintKind) -> bool {
        self.entries.iter().any(|e| e.constraint.kind() == kind)
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.entry(kind).map(|e| &e.constraint)
    }

    pub fn get_mut(&mut self, kind: ConstraintKind) -> Option<&mut Constraint> {
        self.entries
            .iter_mut()
            .find(|e| e.constraint.kind() == kind)
            .map(|e| &mut e.constraint)
    }

    pub fn entry(&self, kind: ConstraintKind) -> Option<&ConstraintEntry> {
        self.entries.iter().find(|e| e.constraint.kind() == kind)
    }

    pub fn source(&self, kind: ConstraintKind) -> Option<&LexEvent> {
        self.entry(kind).and_then(|e| e.source.as_ref())
    }

    pub fn insert(&mut self, constraint: Constraint, source: Option<LexEvent>) -> Result<()> {
        let kind = constraint.kind();
        if self.contains(kind) {
            let error = Error::new(ErrorCode::DuplicateRule, format!("duplicate rule \"{kind}\""));
            return Err(match &source {
                Some(source) => error.at(source),
                None => error,
            });
        }
        self.entries.push(ConstraintEntry { constraint, source });
        Ok(())
    }

    pub fn remove(&mut self, kind: ConstraintKind) -> Option<ConstraintEntry> {
        let index = self.entries.iter().position(|e| e.constraint.kind() == kind)?;
        Some(self.entries.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstraintEntry> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ConstraintEntry> {
        self.entries.iter_mut()
    }

    pub fn flag(&self, kind: ConstraintKind) -> bool {
        matches!(
            self.get(kind),
            Some(
                Constraint::Optional(true)
                    | Constraint::Nullable(true)
                    | Constraint::ExclusiveMinimum(true)
                    | Constraint::ExclusiveMaximum(true)
            )
        )
    }

    /// Referenced user type names: `type` and the members of `types`.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(Constraint::Type(TypeRef::User(name))) = self.get(ConstraintKind::Type) {
            names.push(name.as_str());
        }
        if let Some(Constraint::TypesList(list)) = self.get(ConstraintKind::TypesList) {
            names.extend(list.iter().map(String::as_str));
        }
        names
    }

    pub fn min_max(&self) -> (Option<&Bound>, Option<&Bound>) {
        let min = match self.get(ConstraintKind::Min) {
            Some(Constraint::Min(bound)) => Some(bound),
            _ => None,
        };
        let max = match self.get(ConstraintKind::Max) {
            Some(Constraint::Max(bound)) => Some(bound),
            _ => None,
        };
        (min, max)
    }

    pub fn count(&self, kind: ConstraintKind) -> Option<usize> {
        match self.get(kind) {
            Some(
                Constraint::MinLength(n) | Constraint::MaxLength(n) | Constraint::MinItems(n) | Constraint::MaxItems(n),
            ) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_type::SchemaType;
    use crate::number::Number;

    fn all() -> Vec<Constraint> {
        vec![
            Constraint::Type(TypeRef::Builtin(SchemaType::String)),
            Constraint::TypesList(vec!["@A".into()]),
            Constraint::Or,
            Constraint::AllOf(vec!["@A".into()]),
            Constraint::Min(Bound::new(Number::from_usize(1))),
            Constraint::Max(Bound::new(Number::from_usize(1))),
            Constraint::ExclusiveMinimum(true),
            Constraint::ExclusiveMaximum(true),
            Constraint::MinLength(1),
            Constraint::MaxLength(1),
            Constraint::MinItems(1),
            Constraint::MaxItems(1),
            Constraint::Precision(2),
            Constraint::Optional(true),
            Constraint::Nullable(true),
            Constraint::Const { value: true, example: None },
            Constraint::Enum(EnumConstraint::new()),
            Constraint::Regex(RegexConstraint::new(br#""a""#).unwrap()),
            Constraint::AdditionalProperties(AdditionalProperties::Any),
            Constraint::Format(Format::Email),
            Constraint::Format(Format::Uri),
            Constraint::Format(Format::Uuid),
            Constraint::Format(Format::Date),
            Constraint::Format(Format::DateTime),
        ]
    }

    fn compatible_types(constraint: &Constraint) -> Vec<JsonType> {
        use JsonType::*;
        [String, Integer, Float, Boolean, Array, Object, Null, Mixed]
            .into_iter()
            .filter(|t| constraint.is_json_type_compatible(*t))
            .collect()
    }

    #[test]
    fn compatibility_matrix() {
        use JsonType::*;
        let everything = vec![String, Integer, Float, Boolean, Array, Object, Null, Mixed];
        let literals = vec![String, Integer, Float, Boolean, Null];
        for constraint in all() {
            let expected = match constraint.kind() {
                ConstraintKind::Type
                | ConstraintKind::TypesList
                | ConstraintKind::Or
                | ConstraintKind::Optional
                | ConstraintKind::Nullable => everything.clone(),
                ConstraintKind::AllOf | ConstraintKind::AdditionalProperties => vec![Object],
                ConstraintKind::Min
                | ConstraintKind::Max
                | ConstraintKind::ExclusiveMinimum
                | ConstraintKind::ExclusiveMaximum => vec![Integer, Float],
                ConstraintKind::MinItems | ConstraintKind::MaxItems => vec![Array],
                ConstraintKind::Precision => vec![Float],
                ConstraintKind::Const => literals.clone(),
                ConstraintKind::Enum => vec![String, Integer, Float, Boolean, Null, Mixed],
                _ => vec![String],
            };
            assert_eq!(compatible_types(&constraint), expected, "{}", constraint.kind());
        }
    }

    #[test]
    fn one_constraint_per_kind() {
        let mut constraints = Constraints::new();
        constraints.insert(Constraint::MinLength(1), None).unwrap();
        let err = constraints.insert(Constraint::MinLength(2), None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DuplicateRule);
        assert_eq!(constraints.count(ConstraintKind::MinLength), Some(1));
        assert!(constraints.remove(ConstraintKind::MinLength).is_some());
        assert!(constraints.is_empty());
    }

    #[test]
    fn debug_strings() {
        let mut bound = Bound::new(Number::new("1.5").unwrap());
        bound.exclusive = true;
        assert_eq!(Constraint::Min(bound).to_debug_string(), "min: 1.5 (exclusive)");
        assert_eq!(Constraint::TypesList(vec!["@A".into(), "@B".into()]).to_string(), "types: @A, @B");
        assert_eq!(Constraint::Format(Format::Uuid).to_string(), "uuid");
    }

    #[test]
    fn const_compares_the_literal() {
        let constraint = Constraint::Const {
            value: true,
            example: Some(LiteralKey::from_bytes(b"1.50").unwrap()),
        };
        constraint.validate(b" 1.50").unwrap();
        assert_eq!(constraint.validate(b"1.5").unwrap_err().code(), ErrorCode::ConstMismatch);
        assert_eq!(constraint.validate(b"2").unwrap_err().code(), ErrorCode::ConstMismatch);
        Constraint::Const { value: false, example: None }.validate(b"2").unwrap();
    }
}
