//! `allOf`: copies the properties of the listed object types into the node.
use indexmap::IndexMap;
use tracing::trace;

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::LexEvent;
use crate::node::{Node, Property};
use crate::schema::{Schema, Type};

pub(crate) fn compile_all_of(schema: &mut Schema) -> Result<()> {
    // parents are read from the unexpanded registry
    let snapshot = schema.types.clone();
    let mut expand = |node: &mut Node| inherit(node, &snapshot);
    schema.root.walk_mut(&mut expand)?;
    for ty in schema.types.values_mut() {
        ty.schema.root.walk_mut(&mut expand)?;
    }
    Ok(())
}

fn inherit(node: &mut Node, types: &IndexMap<String, Type>) -> Result<()> {
    let Node::Object(object) = node else {
        return Ok(());
    };
    let Some(entry) = object.base.constraints.entry(ConstraintKind::AllOf) else {
        return Ok(());
    };
    let Constraint::AllOf(parents) = &entry.constraint else {
        return Ok(());
    };
    let anchor = entry.source.clone().unwrap_or_else(|| object.base.basis.clone());
    trace!(parents = ?parents, "allOf");

    let mut merged = IndexMap::new();
    for parent in parents.clone() {
        let mut stack = Vec::new();
        for (key, property) in parent_properties(&parent, types, &mut stack).map_err(|e| e.or_at(&anchor))? {
            insert(&mut merged, key, property, &anchor)?;
        }
    }
    for (key, property) in std::mem::take(&mut object.properties) {
        if property.inherited {
            continue;
        }
        let at = property.key_event.clone();
        insert(&mut merged, key, property, &at)?;
    }
    object.properties = merged;
    Ok(())
}

fn insert(into: &mut IndexMap<String, Property>, key: String, property: Property, at: &LexEvent) -> Result<()> {
    if into.contains_key(&key) {
        return Err(Error::new(ErrorCode::AllOfDuplicateKey, format!("duplicate key \"{key}\" in allOf")).at(at));
    }
    into.insert(key, property);
    Ok(())
}

/// The full property list of `name`, its own `allOf` parents included.
fn parent_properties(
    name: &str,
    types: &IndexMap<String, Type>,
    stack: &mut Vec<String>,
) -> Result<IndexMap<String, Property>> {
    if stack.iter().any(|n| n == name) {
        let mut path = stack.clone();
        path.push(name.to_string());
        return Err(Error::new(ErrorCode::InfiniteRecursion, format!("allOf recursion: {}", path.join(" -> "))));
    }
    let ty = types
        .get(name)
        .ok_or_else(|| Error::new(ErrorCode::TypeNotFound, format!("type \"{name}\" not found")))?;
    let Node::Object(object) = ty.root() else {
        return Err(Error::new(ErrorCode::AllOfNotObject, format!("the type \"{name}\" in allOf is not an object")));
    };

    stack.push(name.to_string());
    let mut properties = IndexMap::new();
    if let Some(Constraint::AllOf(grandparents)) = object.base.constraints.get(ConstraintKind::AllOf) {
        for grandparent in grandparents {
            for (key, property) in parent_properties(grandparent, types, stack)? {
                let at = property.key_event.clone();
                insert(&mut properties, key, property, &at)?;
            }
        }
    }
    for (key, property) in &object.properties {
        let at = property.key_event.clone();
        insert(&mut properties, key.clone(), Property { inherited: true, ..property.clone() }, &at)?;
    }
    stack.pop();
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loader::load;
    use crate::source::File;

    fn schema(src: &str, types: &[(&str, &str)]) -> Schema {
        let mut schema = load(Arc::new(File::new("root", src)), "root").unwrap();
        for (name, body) in types {
            let file = Arc::new(File::new(*name, *body));
            let ty = load(file.clone(), name).unwrap();
            schema.types.insert(name.to_string(), Type::new(ty, file, 0));
        }
        schema
    }

    fn keys(node: &Node) -> Vec<(String, bool)> {
        match node {
            Node::Object(o) => o.properties.iter().map(|(k, p)| (k.clone(), p.inherited)).collect(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn inherited_properties_come_first() {
        let mut s = schema(
            "{\"b\": 2} // {allOf: [\"@Base\", \"@More\"]}",
            &[("@Base", "{\"a\": 1} // {allOf: \"@Root\"}"), ("@More", "{\"c\": 3}"), ("@Root", "{\"r\": 0}")],
        );
        compile_all_of(&mut s).unwrap();
        assert_eq!(
            keys(&s.root),
            vec![("r".into(), true), ("a".into(), true), ("c".into(), true), ("b".into(), false)]
        );
        assert_eq!(keys(s.type_root("@Base").unwrap()), vec![("r".into(), true), ("a".into(), false)]);
    }

    #[test]
    fn shortcut_form() {
        let mut s = schema("{} // {allOf: @Base}", &[("@Base", "{\"a\": 1}")]);
        compile_all_of(&mut s).unwrap();
        assert_eq!(keys(&s.root), vec![("a".into(), true)]);
    }

    #[test]
    fn errors() {
        let mut s = schema("{\"a\": 0} // {allOf: \"@Base\"}", &[("@Base", "{\"a\": 1}")]);
        assert_eq!(compile_all_of(&mut s).unwrap_err().code(), ErrorCode::AllOfDuplicateKey);

        let mut s = schema("{} // {allOf: \"@Base\"}", &[("@Base", "[1]")]);
        assert_eq!(compile_all_of(&mut s).unwrap_err().code(), ErrorCode::AllOfNotObject);

        let mut s = schema("{} // {allOf: \"@Missing\"}", &[]);
        let err = compile_all_of(&mut s).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TypeNotFound);
        assert!(err.location().is_some());

        let mut s = schema(
            "{} // {allOf: \"@A\"}",
            &[("@A", "{} // {allOf: \"@B\"}"), ("@B", "{} // {allOf: \"@A\"}")],
        );
        let err = compile_all_of(&mut s).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InfiniteRecursion);
        assert!(err.message().contains("@A -> @B -> @A"), "{}", err.message());
    }
}
