//! JSON types reachable through user type references.
use std::collections::BTreeSet;

use crate::error::{Error, ErrorCode, Result};
use crate::json_type::JsonType;
use crate::node::Node;
use crate::schema::Schema;

/// JSON types a value described by `node` may have. [`JsonType::Mixed`] in
/// the set stands for any type.
pub(super) fn node_json_types(schema: &Schema, node: &Node, visited: &mut Vec<String>) -> Result<BTreeSet<JsonType>> {
    let names = node.constraints().type_names();
    let mut types = BTreeSet::new();
    if names.is_empty() {
        types.insert(node.json_type());
    }
    for name in names {
        types.extend(type_json_types(schema, name, visited)?);
    }
    if node.is_nullable() {
        types.insert(JsonType::Null);
    }
    Ok(types)
}

pub(super) fn type_json_types(schema: &Schema, name: &str, visited: &mut Vec<String>) -> Result<BTreeSet<JsonType>> {
    if visited.iter().any(|n| n == name) {
        return Err(Error::new(
            ErrorCode::RecursionInJsonType,
            format!("impossible to determine the JSON type of \"{name}\" due to recursion"),
        ));
    }
    let root = schema.type_root(name)?;
    visited.push(name.to_string());
    let types = node_json_types(schema, root, visited);
    visited.pop();
    types
}

/// Whether a value of type `actual` is allowed by `allowed`.
pub(super) fn admits(allowed: &BTreeSet<JsonType>, actual: JsonType) -> bool {
    allowed.contains(&JsonType::Mixed) || allowed.iter().any(|t| actual.fits(*t))
}

pub(super) fn describe(types: &BTreeSet<JsonType>) -> String {
    types.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(" | ")
}
