//! Detects user types that can only be satisfied by an infinite value.
//!
//! Edges of the reference graph are the user types a value of some type must
//! contain. Optional properties, nullable values, array items and shortcut
//! keys may be absent, so references through them are lazy and not followed.
use std::collections::HashSet;

use tracing::trace;

use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::LexEvent;
use crate::node::Node;
use crate::schema::Schema;

pub(super) fn check(schema: &Schema) -> Result<()> {
    let mut done = HashSet::new();
    for name in schema.types.keys() {
        let mut path = Vec::new();
        visit(schema, name, None, &mut path, &mut done)?;
    }
    Ok(())
}

fn visit<'a>(
    schema: &'a Schema,
    name: &'a str,
    via: Option<&LexEvent>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Result<()> {
    if let Some(start) = path.iter().position(|n| *n == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        let error = Error::new(ErrorCode::InfiniteRecursion, format!("infinite recursion: {}", cycle.join(" -> ")));
        return Err(match via {
            Some(event) => error.at(event),
            None => error,
        });
    }
    if done.contains(name) {
        return Ok(());
    }
    // unknown names are reported by the node checks
    let Some(ty) = schema.types.get(name) else {
        return Ok(());
    };

    path.push(name);
    let mut edges = Vec::new();
    strict_references(ty.root(), &mut edges);
    trace!(name, edges = edges.len(), "recursion check");
    for (target, event) in edges {
        visit(schema, target, Some(event), path, done)?;
    }
    path.pop();
    done.insert(name);
    Ok(())
}

fn strict_references<'a>(node: &'a Node, out: &mut Vec<(&'a str, &'a LexEvent)>) {
    if node.is_nullable() {
        return;
    }
    for name in node.constraints().type_names() {
        out.push((name, node.basis()));
    }
    if let Node::Object(object) = node {
        for property in object.properties.values() {
            if property.is_shortcut || property.node.is_optional() {
                continue;
            }
            strict_references(&property.node, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loader::load;
    use crate::schema::Type;
    use crate::source::File;

    fn schema(types: &[(&str, &str)]) -> Schema {
        let mut schema = load(Arc::new(File::new("root", "{}")), "root").unwrap();
        for (name, body) in types {
            let file = Arc::new(File::new(*name, *body));
            schema.types.insert(name.to_string(), Type::new(load(file.clone(), name).unwrap(), file, 0));
        }
        schema
    }

    #[test]
    fn direct_recursion() {
        let s = schema(&[("@Node", "{\"next\": @Node}")]);
        let err = check(&s).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InfiniteRecursion);
        assert!(err.message().ends_with("@Node -> @Node"), "{}", err.message());
    }

    #[test]
    fn mutual_recursion_reports_the_path() {
        let s = schema(&[("@A", "{\"b\": @B}"), ("@B", "{\"a\": @A}")]);
        let err = check(&s).unwrap_err();
        assert!(err.message().ends_with("@A -> @B -> @A"), "{}", err.message());
        assert!(err.location().is_some());
    }

    #[test]
    fn lazy_edges_are_not_followed() {
        let s = schema(&[
            ("@List", "{\"next\": @List // {optional: true}\n}"),
            ("@Tree", "{\"children\": [@Tree]}"),
            ("@Link", "{\"to\": @Link // {nullable: true}\n}"),
            ("@Map", "{@Key: @Map}"),
            ("@Key", "\"k\""),
        ]);
        check(&s).unwrap();
    }
}
