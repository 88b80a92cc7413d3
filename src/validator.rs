//! Runtime validation of JSON values against a compiled schema.
use tracing::trace;

use crate::constraint::{AdditionalProperties, Constraint, ConstraintKind, Format};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::{JsonType, SchemaType};
use crate::node::{ArrayNode, Node, ObjectNode};
use crate::scanner;
use crate::schema::Schema;
use crate::source::quote;
use crate::value::Value;

/// Value levels plus user type hops.
const MAX_DEPTH: usize = 2 * scanner::MAX_DEPTH;

pub(crate) struct Validator<'a> {
    schema: &'a Schema,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub(crate) fn validate(&self, node: &Node, value: &Value) -> Result<()> {
        self.node(node, value, 0)
    }

    /// Validates the value of property `key` of the root object.
    pub(crate) fn validate_property(&self, key: &str, value: &Value) -> Result<()> {
        let Node::Object(object) = &self.schema.root else {
            return Err(Error::new(ErrorCode::NotAnObject, "the schema root is not an object"));
        };
        if let Some(property) = object.properties.get(key).filter(|p| !p.is_shortcut) {
            return self.node(&property.node, value, 0);
        }
        match self.additional(object, key, value, 0)? {
            true => Ok(()),
            false => Err(Error::new(ErrorCode::PropertyNotFound, format!("property \"{key}\" not found"))),
        }
    }

    fn node(&self, node: &Node, value: &Value, depth: usize) -> Result<()> {
        if depth > MAX_DEPTH {
            return Err(Error::new(
                ErrorCode::NestingTooDeep,
                format!("validation went deeper than {MAX_DEPTH} levels"),
            )
            .at(value.event()));
        }
        if value.is_null() && node.is_nullable() {
            return Ok(());
        }
        if matches!(node.base().real_type, Some(SchemaType::Any | SchemaType::Mixed)) {
            return Ok(());
        }

        let names = node.constraints().type_names();
        if !names.is_empty() {
            return self.user_types(&names, value, depth);
        }

        let result = match node {
            Node::Object(object) => self.object(object, value, depth),
            Node::Array(array) => self.array(array, value, depth),
            Node::Literal(_) | Node::Mixed(_) => literal(node, value),
            Node::MixedValue(_) => Ok(()),
        };
        result.map_err(|e| e.or_at(value.event()))
    }

    fn user_types(&self, names: &[&str], value: &Value, depth: usize) -> Result<()> {
        let mut last = None;
        for name in names {
            trace!(name, "trying type");
            match self.node(self.schema.type_root(name)?, value, depth + 1) {
                Ok(()) => return Ok(()),
                Err(error) => last = Some(error),
            }
        }
        match (names.len(), last) {
            (1, Some(error)) => Err(error),
            _ => Err(Error::new(
                ErrorCode::NoMatchingType,
                format!("the value does not match any of {}", names.join(", ")),
            )
            .at(value.event())),
        }
    }

    fn object(&self, object: &ObjectNode, value: &Value, depth: usize) -> Result<()> {
        let Value::Object(_, entries) = value else {
            return Err(type_mismatch(JsonType::Object, value));
        };
        for (key, property) in &object.properties {
            if property.is_shortcut {
                continue;
            }
            match entries.get(key) {
                Some((_, v)) => self.node(&property.node, v, depth + 1)?,
                None if property.node.is_optional() => {}
                None => {
                    return Err(Error::new(ErrorCode::RequiredKeyMissing, format!("required key \"{key}\" is missing"))
                        .at(value.event()));
                }
            }
        }
        for (key, (key_event, v)) in entries {
            if object.properties.get(key).is_some_and(|p| !p.is_shortcut) {
                continue;
            }
            if !self.additional(object, key, v, depth)? {
                return Err(Error::new(
                    ErrorCode::AdditionalPropertyNotAllowed,
                    format!("property \"{key}\" is not allowed"),
                )
                .at(key_event));
            }
        }
        Ok(())
    }

    /// Validates an undeclared key. Returns false when nothing admits it.
    fn additional(&self, object: &ObjectNode, key: &str, value: &Value, depth: usize) -> Result<bool> {
        let mut shortcuts = object.properties.iter().filter(|(_, p)| p.is_shortcut).peekable();
        let quoted = match shortcuts.peek() {
            Some(_) => Some(Value::parse("key", quote(key).as_bytes())?),
            None => None,
        };
        for (shortcut, property) in shortcuts {
            let Some(quoted) = &quoted else { break };
            if self.node(self.schema.type_root(shortcut)?, quoted, depth + 1).is_ok() {
                self.node(&property.node, value, depth + 1)?;
                return Ok(true);
            }
        }
        match object.base.constraints.get(ConstraintKind::AdditionalProperties) {
            Some(Constraint::AdditionalProperties(mode)) => match mode {
                AdditionalProperties::NotAllowed => Ok(false),
                AdditionalProperties::Any => Ok(true),
                AdditionalProperties::MustBeSchemaType(t) => {
                    schema_type(*t, value)?;
                    Ok(true)
                }
                AdditionalProperties::MustBeUserType(name) => {
                    self.node(self.schema.type_root(name)?, value, depth + 1)?;
                    Ok(true)
                }
            },
            _ => Ok(false),
        }
    }

    fn array(&self, array: &ArrayNode, value: &Value, depth: usize) -> Result<()> {
        let Value::Array(_, items) = value else {
            return Err(type_mismatch(JsonType::Array, value));
        };
        let constraints = &array.base.constraints;
        if let Some(min) = constraints.count(ConstraintKind::MinItems).filter(|min| items.len() < *min) {
            return Err(Error::new(ErrorCode::TooFewItems, format!("{} items given, at least {min} expected", items.len())));
        }
        if let Some(max) = constraints.count(ConstraintKind::MaxItems).filter(|max| items.len() > *max) {
            return Err(Error::new(ErrorCode::TooManyItems, format!("{} items given, at most {max} expected", items.len())));
        }
        if array.items.is_empty() {
            return Ok(());
        }
        for item in items {
            let mut last = None;
            for shape in &array.items {
                match self.node(shape, item, depth + 1) {
                    Ok(()) => {
                        last = None;
                        break;
                    }
                    Err(error) => last = Some(error),
                }
            }
            match (array.items.len(), last) {
                (_, None) => {}
                (1, Some(error)) => return Err(error),
                _ => {
                    return Err(Error::new(ErrorCode::NoMatchingType, "the item matches none of the example items")
                        .at(item.event()));
                }
            }
        }
        Ok(())
    }
}

fn type_mismatch(expected: JsonType, value: &Value) -> Error {
    Error::new(ErrorCode::TypeMismatch, format!("{expected} expected, got {}", value.json_type())).at(value.event())
}

fn literal(node: &Node, value: &Value) -> Result<()> {
    let Value::Literal(event) = value else {
        return Err(type_mismatch(node.json_type(), value));
    };
    let declared = node.json_type();
    if declared != JsonType::Mixed && node.base().real_type != Some(SchemaType::Enum) && !value.json_type().fits(declared) {
        return Err(type_mismatch(declared, value));
    }
    for entry in node.constraints().iter() {
        entry.constraint.validate(event.value())?;
    }
    Ok(())
}

/// `additionalProperties: "<type>"` with a built-in type.
fn schema_type(t: SchemaType, value: &Value) -> Result<()> {
    if matches!(t, SchemaType::Any | SchemaType::Mixed) {
        return Ok(());
    }
    let expected = t.json_type();
    if expected != JsonType::Mixed && !value.json_type().fits(expected) {
        return Err(type_mismatch(expected, value));
    }
    match Format::for_type(t) {
        Some(format) => format.validate(value.bytes()).map_err(|e| e.at(value.event())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loader::load;
    use crate::schema::Type;
    use crate::source::File;

    fn schema(src: &str, types: &[(&str, &str)]) -> Schema {
        let mut schema = load(Arc::new(File::new("root", src)), "root").unwrap();
        for (name, body) in types {
            let file = Arc::new(File::new(*name, *body));
            schema.types.insert(name.to_string(), Type::new(load(file.clone(), name).unwrap(), file, 0));
        }
        crate::loader::add_unnamed_types(&mut schema);
        schema
    }

    fn check(schema: &Schema, value: &str) -> Result<()> {
        Validator::new(schema).validate(&schema.root, &Value::parse("value", value.as_bytes()).unwrap())
    }

    fn code(schema: &Schema, value: &str) -> ErrorCode {
        check(schema, value).unwrap_err().code()
    }

    #[test]
    fn literals() {
        let s = schema("5 // {min: 1, max: 10}", &[]);
        check(&s, "7").unwrap();
        assert_eq!(code(&s, "0"), ErrorCode::ValueTooSmall);
        assert_eq!(code(&s, "11"), ErrorCode::ValueTooLarge);
        assert_eq!(code(&s, "\"7\""), ErrorCode::TypeMismatch);
        let s = schema("1.5", &[]);
        check(&s, "2").unwrap();
        let s = schema("2", &[]);
        assert_eq!(code(&s, "2.5"), ErrorCode::TypeMismatch);
    }

    #[test]
    fn objects() {
        let s = schema("{\"id\": 1, \"name\": \"n\" // {optional: true}\n}", &[]);
        check(&s, r#"{"id": 2}"#).unwrap();
        check(&s, r#"{"id": 2, "name": "x"}"#).unwrap();
        assert_eq!(code(&s, r#"{"name": "x"}"#), ErrorCode::RequiredKeyMissing);
        assert_eq!(code(&s, r#"{"id": 2, "extra": 1}"#), ErrorCode::AdditionalPropertyNotAllowed);
        assert_eq!(code(&s, "[]"), ErrorCode::TypeMismatch);
    }

    #[test]
    fn additional_properties() {
        let s = schema("{} // {additionalProperties: \"integer\"}", &[]);
        check(&s, r#"{"a": 1, "b": 2}"#).unwrap();
        assert_eq!(code(&s, r#"{"a": "x"}"#), ErrorCode::TypeMismatch);
        let s = schema("{} // {additionalProperties: true}", &[]);
        check(&s, r#"{"a": [1, "x"]}"#).unwrap();
        let s = schema("{} // {additionalProperties: \"@Id\"}", &[("@Id", "1 // {min: 1}")]);
        assert_eq!(code(&s, r#"{"a": 0}"#), ErrorCode::ValueTooSmall);
    }

    #[test]
    fn key_shortcuts() {
        let s = schema("{@Code: 1}", &[("@Code", "\"ab\" // {regex: \"^[a-z]{2}$\"}")]);
        check(&s, r#"{"xy": 5, "ab": 6}"#).unwrap();
        assert_eq!(code(&s, r#"{"xyz": 5}"#), ErrorCode::AdditionalPropertyNotAllowed);
        assert_eq!(code(&s, r#"{"xy": "5"}"#), ErrorCode::TypeMismatch);
    }

    #[test]
    fn arrays() {
        let s = schema("[1, \"a\"] // {maxItems: 3}", &[]);
        check(&s, "[2, \"b\", 3]").unwrap();
        assert_eq!(code(&s, "[true]"), ErrorCode::NoMatchingType);
        assert_eq!(code(&s, "[1, 2, 3, 4]"), ErrorCode::TooManyItems);
        let s = schema("[] // {minItems: 1}", &[]);
        check(&s, "[1, {}]").unwrap();
        assert_eq!(code(&s, "[]"), ErrorCode::TooFewItems);
    }

    #[test]
    fn unions_and_user_types() {
        let s = schema("{\"pet\": @Cat | @Dog}", &[("@Cat", "{\"meow\": true}"), ("@Dog", "{\"bark\": true}")]);
        check(&s, r#"{"pet": {"bark": false}}"#).unwrap();
        assert_eq!(code(&s, r#"{"pet": {"moo": true}}"#), ErrorCode::NoMatchingType);
        let s = schema("1 // {or: [\"integer\", {type: \"string\", maxLength: 2}]}", &[]);
        check(&s, "\"ab\"").unwrap();
        check(&s, "3").unwrap();
        assert_eq!(code(&s, "\"abc\""), ErrorCode::NoMatchingType);
    }

    #[test]
    fn nullable_and_any() {
        let s = schema("{\"a\": 1 // {nullable: true}\n, \"b\": 1 // {type: \"any\"}\n}", &[]);
        check(&s, r#"{"a": null, "b": [1]}"#).unwrap();
        assert_eq!(code(&s, r#"{"a": "x", "b": 1}"#), ErrorCode::TypeMismatch);
    }

    #[test]
    fn runaway_type_chains_stop() {
        let s = schema("@A", &[("@A", "@B"), ("@B", "@A")]);
        assert_eq!(code(&s, "1"), ErrorCode::NestingTooDeep);
    }

    #[test]
    fn property_validation() {
        let s = schema("{\"id\": 123 // {min: 1}\n}", &[]);
        let v = Validator::new(&s);
        v.validate_property("id", &Value::parse("v", b"5").unwrap()).unwrap();
        let err = v.validate_property("id", &Value::parse("v", b"0").unwrap()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueTooSmall);
        let err = v.validate_property("name", &Value::parse("v", b"0").unwrap()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::PropertyNotFound);
        let s = schema("[1]", &[]);
        let err = Validator::new(&s).validate_property("id", &Value::parse("v", b"0").unwrap()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAnObject);
    }
}
