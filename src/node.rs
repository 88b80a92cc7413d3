//! The schema tree.
//!
//! Every node shares a [`NodeBase`] carrying its JSON type, the optional
//! semantic type from a `type` rule, its constraints and the lexeme it was
//! built from. Object properties keep their declaration order.
use indexmap::IndexMap;

use crate::constraint::{ConstraintKind, Constraints};
use crate::error::Result;
use crate::json_type::{JsonType, SchemaType};
use crate::lexeme::LexEvent;

#[derive(Debug, Clone)]
pub struct NodeBase {
    pub json_type: JsonType,
    pub real_type: Option<SchemaType>,
    pub constraints: Constraints,
    /// The lexeme the node was built from; errors without a better anchor point here.
    pub basis: LexEvent,
    pub comment: Option<String>,
    /// Set once an annotation has been applied.
    pub annotated: bool,
}

impl NodeBase {
    pub fn new(json_type: JsonType, basis: LexEvent) -> Self {
        Self {
            json_type,
            real_type: None,
            constraints: Constraints::new(),
            basis,
            comment: None,
            annotated: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiteralNode {
    pub base: NodeBase,
    /// Absent on nodes built from an `or` item.
    pub example: Option<LexEvent>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key_event: LexEvent,
    /// `@Name` keys stand for any key of that user type.
    pub is_shortcut: bool,
    /// Copied in by `allOf`.
    pub inherited: bool,
    pub node: Node,
}

#[derive(Debug, Clone)]
pub struct ObjectNode {
    pub base: NodeBase,
    pub properties: IndexMap<String, Property>,
}

#[derive(Debug, Clone)]
pub struct ArrayNode {
    pub base: NodeBase,
    pub items: Vec<Node>,
}

/// A value whose shape is decided by user types, `any` or a union.
#[derive(Debug, Clone)]
pub struct MixedNode {
    pub base: NodeBase,
    pub example: Option<LexEvent>,
}

/// A `@Name` or `@A | @B` shortcut in value position.
#[derive(Debug, Clone)]
pub struct MixedValueNode {
    pub base: NodeBase,
    pub names: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Literal(LiteralNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Mixed(MixedNode),
    MixedValue(MixedValueNode),
}

impl Node {
    /// A literal whose JSON type is guessed from the example.
    pub fn literal(example: LexEvent) -> Node {
        let json_type = JsonType::guess(example.value()).unwrap_or(JsonType::Mixed);
        Node::Literal(LiteralNode { base: NodeBase::new(json_type, example.clone()), example: Some(example) })
    }

    /// A literal with a type but no example.
    pub fn typed_literal(json_type: JsonType, basis: LexEvent) -> Node {
        Node::Literal(LiteralNode { base: NodeBase::new(json_type, basis), example: None })
    }

    pub fn object(basis: LexEvent) -> Node {
        Node::Object(ObjectNode { base: NodeBase::new(JsonType::Object, basis), properties: IndexMap::new() })
    }

    pub fn array(basis: LexEvent) -> Node {
        Node::Array(ArrayNode { base: NodeBase::new(JsonType::Array, basis), items: Vec::new() })
    }

    pub fn mixed(basis: LexEvent) -> Node {
        Node::Mixed(MixedNode { base: NodeBase::new(JsonType::Mixed, basis), example: None })
    }

    pub fn mixed_value(basis: LexEvent, names: Vec<String>) -> Node {
        Node::MixedValue(MixedValueNode { base: NodeBase::new(JsonType::Mixed, basis), names })
    }

    pub fn base(&self) -> &NodeBase {
        match self {
            Node::Literal(n) => &n.base,
            Node::Object(n) => &n.base,
            Node::Array(n) => &n.base,
            Node::Mixed(n) => &n.base,
            Node::MixedValue(n) => &n.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut NodeBase {
        match self {
            Node::Literal(n) => &mut n.base,
            Node::Object(n) => &mut n.base,
            Node::Array(n) => &mut n.base,
            Node::Mixed(n) => &mut n.base,
            Node::MixedValue(n) => &mut n.base,
        }
    }

    pub fn json_type(&self) -> JsonType {
        self.base().json_type
    }

    pub fn constraints(&self) -> &Constraints {
        &self.base().constraints
    }

    pub fn basis(&self) -> &LexEvent {
        &self.base().basis
    }

    pub fn example(&self) -> Option<&LexEvent> {
        match self {
            Node::Literal(n) => n.example.as_ref(),
            Node::Mixed(n) => n.example.as_ref(),
            _ => None,
        }
    }

    pub fn is_optional(&self) -> bool {
        self.constraints().flag(ConstraintKind::Optional)
    }

    pub fn is_nullable(&self) -> bool {
        self.constraints().flag(ConstraintKind::Nullable)
    }

    /// The semantic type if one was declared, the JSON type otherwise.
    pub fn type_label(&self) -> &'static str {
        match self.base().real_type {
            Some(real) => real.as_str(),
            None => self.json_type().as_str(),
        }
    }

    /// Direct children in declaration order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Object(n) => n.properties.values().map(|p| &p.node).collect(),
            Node::Array(n) => n.items.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        match self {
            Node::Object(n) => n.properties.values_mut().map(|p| &mut p.node).collect(),
            Node::Array(n) => n.items.iter_mut().collect(),
            _ => Vec::new(),
        }
    }

    /// Visits this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Node) -> Result<()>) -> Result<()> {
        visit(self)?;
        for child in self.children_mut() {
            child.walk_mut(visit)?;
        }
        Ok(())
    }

    /// Turns a literal into a mixed node, keeping its base and example.
    pub fn make_mixed(&mut self) {
        if let Node::Literal(literal) = self {
            let placeholder = NodeBase::new(JsonType::Mixed, literal.base.basis.clone());
            let base = std::mem::replace(&mut literal.base, placeholder);
            let example = literal.example.take();
            *self = Node::Mixed(MixedNode { base, example });
        }
    }
}
