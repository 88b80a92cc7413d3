//! Union members and the unnamed types they turn into.
use indexmap::IndexMap;

use super::Loader;
use super::rules::{self, RuleObject, RuleValue};
use super::shortcut;
use crate::constraint::{Constraint, ConstraintKind, TypeRef};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::{JsonType, SchemaType};
use crate::lexeme::LexEvent;
use crate::node::Node;
use crate::schema::{Schema, Type};
use crate::source::is_user_type_name;

impl Loader {
    /// Reads the members of an `or`/`types` rule as type names. Built-in type
    /// names and inline rule objects become unnamed types.
    pub(super) fn union_members(&mut self, rule: &str, value: &RuleValue) -> Result<Vec<String>> {
        let items = match value {
            RuleValue::Shortcut(event) => return shortcut::parse_names(event),
            RuleValue::Array(_, items) => items,
            other => {
                return Err(Error::new(
                    ErrorCode::InvalidRuleValue,
                    format!("the value of the rule \"{rule}\" must be an array of types"),
                )
                .at(other.event()));
            }
        };
        if items.is_empty() {
            return Err(Error::new(ErrorCode::InvalidRuleValue, format!("the rule \"{rule}\" lists no types"))
                .at(value.event()));
        }

        let mut names = Vec::with_capacity(items.len());
        for item in items {
            match item {
                RuleValue::Shortcut(event) => names.extend(shortcut::parse_names(event)?),
                RuleValue::Object(event, object) => names.push(self.micro_type(event, object)?),
                RuleValue::Literal(event) if JsonType::guess(event.value()) == Some(JsonType::String) => {
                    let name = crate::source::unquote(event.value()).map_err(|e| e.at(event))?;
                    if is_user_type_name(&name) {
                        names.push(name);
                        continue;
                    }
                    let builtin = SchemaType::from_name(&name)
                        .ok_or_else(|| Error::new(ErrorCode::UnknownType, format!("unknown type \"{name}\"")).at(event))?;
                    let mut node = micro_node(&TypeRef::Builtin(builtin), event.clone());
                    rules::apply(&mut node, vec![(Constraint::Type(TypeRef::Builtin(builtin)), Some(event.clone()))])?;
                    names.push(self.register_unnamed(node, event.begin()));
                }
                other => {
                    return Err(Error::new(
                        ErrorCode::InvalidRuleValue,
                        format!("an item of the rule \"{rule}\" must be a type name or a rule object"),
                    )
                    .at(other.event()));
                }
            }
        }
        Ok(names)
    }

    /// `{type: "string", maxLength: 3}` inside a union.
    fn micro_type(&mut self, event: &LexEvent, object: &RuleObject) -> Result<String> {
        if !object.contains_key("type") {
            return Err(Error::new(ErrorCode::OrItemWithoutType, "an item of \"or\" must have a \"type\" rule").at(event));
        }
        let built = self.build_rules(object)?;
        let type_ref = built.iter().find_map(|(c, _)| match c {
            Constraint::Type(t) => Some(t.clone()),
            _ => None,
        });
        let mut node = match &type_ref {
            Some(t) => micro_node(t, event.clone()),
            None => Node::mixed(event.clone()),
        };
        rules::apply(&mut node, built)?;
        if node.constraints().contains(ConstraintKind::Or) {
            node.base_mut().json_type = JsonType::Mixed;
        }
        Ok(self.register_unnamed(node, event.begin()))
    }
}

/// An example-less node of the given type.
fn micro_node(type_ref: &TypeRef, basis: LexEvent) -> Node {
    match type_ref {
        TypeRef::Builtin(SchemaType::Object) => Node::object(basis),
        TypeRef::Builtin(SchemaType::Array) => Node::array(basis),
        TypeRef::Builtin(SchemaType::Any | SchemaType::Mixed) | TypeRef::User(_) => Node::mixed(basis),
        TypeRef::Builtin(t) => Node::typed_literal(t.json_type(), basis),
    }
}

/// Moves the unnamed types of every registered type into the root registry.
pub(crate) fn add_unnamed_types(schema: &mut Schema) {
    let mut promoted = IndexMap::new();
    for ty in schema.types.values_mut() {
        drain_types(&mut ty.schema, &mut promoted);
    }
    for (name, ty) in promoted {
        schema.types.entry(name).or_insert(ty);
    }
}

fn drain_types(schema: &mut Schema, out: &mut IndexMap<String, Type>) {
    for (name, mut ty) in schema.types.drain(..) {
        drain_types(&mut ty.schema, out);
        out.insert(name, ty);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loader::load;
    use crate::source::File;

    fn load_str(name: &str, src: &str) -> Schema {
        load(Arc::new(File::new(name, src)), name).unwrap()
    }

    #[test]
    fn builtin_member_gets_its_semantic_type() {
        let schema = load_str("s", "\"a\" // {or: [\"email\", \"integer\"]}");
        let first = schema.type_root("s#1").unwrap();
        assert_eq!(first.base().real_type, Some(SchemaType::Email));
        assert!(first.constraints().contains(ConstraintKind::Email));
        assert_eq!(schema.type_root("s#2").unwrap().json_type(), JsonType::Integer);
    }

    #[test]
    fn object_and_array_members() {
        let schema = load_str("s", "1 // {or: [{type: \"object\"}, {type: \"array\", maxItems: 2}]}");
        assert!(matches!(schema.type_root("s#1").unwrap(), Node::Object(_)));
        let array = schema.type_root("s#2").unwrap();
        assert!(matches!(array, Node::Array(_)));
        assert_eq!(array.constraints().count(ConstraintKind::MaxItems), Some(2));
    }

    #[test]
    fn nested_unnamed_types_are_promoted() {
        let mut root = load_str("root", "@Wrapper");
        let wrapper = load_str("@Wrapper", "1 // {or: [\"string\", \"integer\"]}");
        root.types.insert("@Wrapper".into(), Type::new(wrapper, Arc::new(File::new("w", "")), 0));
        add_unnamed_types(&mut root);
        assert_eq!(root.types.keys().collect::<Vec<_>>(), vec!["@Wrapper", "@Wrapper#1", "@Wrapper#2"]);
        assert!(root.types["@Wrapper"].schema.types.is_empty());
    }

    #[test]
    fn union_member_errors() {
        let err = load(Arc::new(File::new("s", "1 // {or: []}")), "s").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRuleValue);
        let err = load(Arc::new(File::new("s", "1 // {or: [\"cat\"]}")), "s").unwrap_err();
        assert_eq!(err.code(), ErrorCode::UnknownType);
        let err = load(Arc::new(File::new("s", "1 // {or: [1]}")), "s").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRuleValue);
    }
}
