//! Notation-agnostic export of a compiled schema tree.
use indexmap::IndexMap;
use serde::Serialize;

use crate::constraint::{Constraint, ConstraintKind, TypeRef};
use crate::node::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
    Shortcut,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleTokenType {
    Literal,
    Array,
    Object,
    Reference,
}

/// Whether a rule was written by the author or derived by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    Manual,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAstNode {
    pub token_type: RuleTokenType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, RuleAstNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<RuleAstNode>,
    pub source: RuleSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl RuleAstNode {
    fn new(token_type: RuleTokenType, value: String, source: RuleSource) -> Self {
        Self {
            token_type,
            value,
            properties: IndexMap::new(),
            items: Vec::new(),
            source,
            comment: None,
        }
    }

    pub fn literal(value: impl Into<String>, source: RuleSource) -> Self {
        Self::new(RuleTokenType::Literal, value.into(), source)
    }

    pub fn reference(name: &str, source: RuleSource) -> Self {
        Self::new(RuleTokenType::Reference, name.to_string(), source)
    }

    pub fn array(items: Vec<RuleAstNode>, source: RuleSource) -> Self {
        let mut node = Self::new(RuleTokenType::Array, String::new(), source);
        node.items = items;
        node
    }

    pub fn object(properties: IndexMap<String, RuleAstNode>, source: RuleSource) -> Self {
        let mut node = Self::new(RuleTokenType::Object, String::new(), source);
        node.properties = properties;
        node
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AstNode {
    pub token_type: TokenType,
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_key_shortcut: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AstNode>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub rules: IndexMap<String, RuleAstNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl AstNode {
    pub fn from_node(node: &Node) -> AstNode {
        let base = node.base();
        let mut rules = IndexMap::new();
        for entry in base.constraints.iter() {
            let source = if entry.source.is_some() { RuleSource::Manual } else { RuleSource::Generated };
            rules.insert(entry.constraint.kind().as_str().to_string(), entry.constraint.to_ast_node(source));
        }

        let mut ast = AstNode {
            token_type: token_type(node),
            schema_type: schema_type(node),
            key: None,
            is_key_shortcut: false,
            value: node.example().map(|e| e.text()).unwrap_or_default(),
            children: Vec::new(),
            rules,
            comment: base.comment.clone(),
        };

        match node {
            Node::Object(object) => {
                for (key, property) in &object.properties {
                    let mut child = AstNode::from_node(&property.node);
                    child.key = Some(key.clone());
                    child.is_key_shortcut = property.is_shortcut;
                    ast.children.push(child);
                }
            }
            Node::Array(array) => ast.children = array.items.iter().map(AstNode::from_node).collect(),
            Node::MixedValue(_) => ast.value = base.basis.text(),
            _ => {}
        }
        ast
    }
}

fn token_type(node: &Node) -> TokenType {
    match node {
        Node::Object(_) => TokenType::Object,
        Node::Array(_) => TokenType::Array,
        Node::MixedValue(_) => TokenType::Shortcut,
        Node::Literal(_) | Node::Mixed(_) => match node.example().map(|e| e.value().first().copied()) {
            Some(Some(b'"')) => TokenType::String,
            Some(Some(b't' | b'f')) => TokenType::Boolean,
            Some(Some(b'n')) => TokenType::Null,
            Some(Some(_)) => TokenType::Number,
            _ => TokenType::Mixed,
        },
    }
}

fn schema_type(node: &Node) -> String {
    let base = node.base();
    if let Some(real) = base.real_type {
        return real.as_str().to_string();
    }
    if base.constraints.contains(ConstraintKind::Or) {
        return "mixed".to_string();
    }
    if let Some(Constraint::Type(TypeRef::User(name))) = base.constraints.get(ConstraintKind::Type) {
        return name.clone();
    }
    base.json_type.as_str().to_string()
}
