//! A loaded schema: its root node plus the user types and rules it can see.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::constraint::{EnumConstraint, EnumItem};
use crate::error::{Error, ErrorCode, Result};
use crate::node::Node;
use crate::source::File;

#[derive(Debug, Clone)]
pub struct Schema {
    pub root: Node,
    /// Named types added by the caller and unnamed `or` members, by name.
    pub types: IndexMap<String, Type>,
    pub rules: IndexMap<String, Rule>,
}

impl Schema {
    pub fn new(root: Node) -> Self {
        Self { root, types: IndexMap::new(), rules: IndexMap::new() }
    }

    pub fn get_type(&self, name: &str) -> Result<&Type> {
        self.types
            .get(name)
            .ok_or_else(|| Error::new(ErrorCode::TypeNotFound, format!("type \"{name}\" not found")))
    }

    pub fn type_root(&self, name: &str) -> Result<&Node> {
        Ok(&self.get_type(name)?.schema.root)
    }
}

/// A user type: a schema of its own plus where it was declared.
#[derive(Debug, Clone)]
pub struct Type {
    pub schema: Schema,
    pub file: Arc<File>,
    pub begin: usize,
}

impl Type {
    pub fn new(schema: Schema, file: Arc<File>, begin: usize) -> Self {
        Self { schema, file, begin }
    }

    pub fn root(&self) -> &Node {
        &self.schema.root
    }
}

/// A named rule that annotations may reference by `@Name`.
#[derive(Debug, Clone)]
pub enum Rule {
    Enum(EnumConstraint),
}

impl Rule {
    /// Compiles an enum rule from its source, an array of literals whose item
    /// comments are kept.
    pub fn enum_rule(name: &str, content: impl Into<Vec<u8>>) -> Result<Rule> {
        let file = Arc::new(File::new(name, content));
        Ok(Rule::Enum(crate::loader::load_enum(file)?))
    }

    pub fn enum_items(&self) -> &[EnumItem] {
        match self {
            Rule::Enum(e) => e.items(),
        }
    }
}
