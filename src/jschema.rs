//! The public entry point: a schema source plus the types and rules it may use.
use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::ast::AstNode;
use crate::checker;
use crate::constraint::{AdditionalProperties, Constraint, ConstraintKind};
use crate::error::{Error, ErrorCode, Result};
use crate::loader;
use crate::node::Node;
use crate::scanner::Scanner;
use crate::schema::{Rule, Schema, Type};
use crate::source::{File, is_user_type_name};
use crate::validator::Validator;
use crate::value::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// A jSchema document.
///
/// `length`, `load` and `compile` run at most once; later calls, including
/// concurrent ones, see the first outcome. A compiled schema is read-only and
/// can be shared between threads.
#[derive(Debug)]
pub struct JSchema {
    file: Arc<File>,
    types: IndexMap<String, Type>,
    rules: IndexMap<String, Rule>,
    length: OnceCell<Result<usize>>,
    loaded: OnceCell<Result<Schema>>,
    compiled: OnceCell<Result<Schema>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl JSchema {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file: Arc::new(File::new(name, content)),
            types: IndexMap::new(),
            rules: IndexMap::new(),
            length: OnceCell::new(),
            loaded: OnceCell::new(),
            compiled: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.file.name()
    }

    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    /// Byte length of the top-level value. Anything after it is ignored, so
    /// the schema can be embedded in a larger document.
    pub fn length(&self) -> Result<usize> {
        memo(&self.length, "length", || Scanner::length(self.file.clone())).clone()
    }

    /// The schema tree before the finishing passes and the checker.
    pub fn load(&self) -> Result<&Schema> {
        memo(&self.loaded, "load", || loader::load(self.file.clone(), self.file.name()))
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn compile(&self) -> Result<()> {
        self.compiled().map(|_| ())
    }

    /// Compiles and checks the schema.
    pub fn check(&self) -> Result<()> {
        self.compile()
    }

    pub fn get_ast(&self) -> Result<AstNode> {
        Ok(AstNode::from_node(&self.compiled()?.root))
    }

    /// Makes `schema` available as the user type `name` (e.g. `@Cat`).
    pub fn add_type(&mut self, name: &str, schema: &JSchema) -> Result<()> {
        self.ensure_not_compiled()?;
        if !is_user_type_name(name) {
            return Err(Error::new(ErrorCode::InvalidTypeName, format!("invalid type name \"{name}\"")));
        }
        if self.types.contains_key(name) {
            return Err(Error::new(ErrorCode::TypeAlreadyExists, format!("type \"{name}\" already exists")));
        }
        // loaded under its own name so its unnamed types cannot collide
        let loaded = loader::load(schema.file.clone(), name)?;
        debug!(name, "type added");
        self.types.insert(name.to_string(), Type::new(loaded, schema.file.clone(), 0));
        Ok(())
    }

    /// Makes `rule` available to `{enum: "@Name"}` annotations.
    pub fn add_rule(&mut self, name: &str, rule: Rule) -> Result<()> {
        self.ensure_not_compiled()?;
        if !is_user_type_name(name) {
            return Err(Error::new(ErrorCode::InvalidTypeName, format!("invalid rule name \"{name}\"")));
        }
        if self.rules.contains_key(name) {
            return Err(Error::new(ErrorCode::RuleAlreadyExists, format!("rule \"{name}\" already exists")));
        }
        self.rules.insert(name.to_string(), rule);
        Ok(())
    }

    /// Every user type name the document refers to, sorted.
    pub fn used_user_types(&self) -> Result<Vec<String>> {
        let schema = self.load()?;
        let mut names = BTreeSet::new();
        let mut collect = |node: &Node| collect_type_names(node, &mut names);
        schema.root.walk(&mut collect);
        for ty in schema.types.values() {
            ty.root().walk(&mut collect);
        }
        Ok(names.into_iter().collect())
    }

    /// Validates one property value of a root object schema.
    pub fn validate_object_property(&self, key: &str, value: &[u8]) -> Result<()> {
        let schema = self.compiled()?;
        let value = Value::parse(key, value)?;
        Validator::new(schema).validate_property(key, &value)
    }

    /// Validates a whole JSON value against the root.
    pub fn validate(&self, value: &[u8]) -> Result<()> {
        let schema = self.compiled()?;
        let value = Value::parse("value", value)?;
        Validator::new(schema).validate(&schema.root, &value)
    }

    fn compiled(&self) -> Result<&Schema> {
        memo(&self.compiled, "compile", || self.build()).as_ref().map_err(Clone::clone)
    }

    fn build(&self) -> Result<Schema> {
        let mut schema = self.load()?.clone();
        for (name, ty) in &self.types {
            schema.types.insert(name.clone(), ty.clone());
        }
        loader::add_unnamed_types(&mut schema);
        schema.rules = self.rules.clone();
        debug!(types = schema.types.len(), rules = schema.rules.len(), "resolving enum rules");
        loader::resolve_enum_rules(&mut schema)?;
        debug!("compiling allOf");
        loader::compile_all_of(&mut schema)?;
        debug!("checking");
        checker::check(&schema)?;
        Ok(schema)
    }

    fn ensure_not_compiled(&self) -> Result<()> {
        match self.compiled.get() {
            Some(_) => Err(Error::new(ErrorCode::SchemaAlreadyCompiled, "the schema is already compiled")),
            None => Ok(()),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn memo<'a, T>(cell: &'a OnceCell<Result<T>>, what: &str, init: impl FnOnce() -> Result<T>) -> &'a Result<T> {
    if let Some(result) = cell.get() {
        debug!(what, ok = result.is_ok(), "memoized");
        return result;
    }
    cell.get_or_init(init)
}

fn collect_type_names(node: &Node, out: &mut BTreeSet<String>) {
    let constraints = node.constraints();
    let mut add = |name: &str| {
        if is_user_type_name(name) {
            out.insert(name.to_string());
        }
    };
    constraints.type_names().into_iter().for_each(&mut add);
    if let Some(Constraint::AllOf(names)) = constraints.get(ConstraintKind::AllOf) {
        names.iter().for_each(|n| add(n));
    }
    if let Some(Constraint::AdditionalProperties(AdditionalProperties::MustBeUserType(name))) =
        constraints.get(ConstraintKind::AdditionalProperties)
    {
        add(name);
    }
    if let Node::Object(object) = node {
        object.properties.iter().filter(|(_, p)| p.is_shortcut).for_each(|(key, _)| add(key));
    }
    if let Node::MixedValue(value) = node {
        value.names.iter().for_each(|n| add(n));
    }
}
