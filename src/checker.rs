//! Semantic checks over a loaded schema.
//!
//! The root tree and every user type are walked depth-first. The first
//! violation stops the walk. The recursion check runs once everything else
//! has passed.
use std::sync::Arc;

use tracing::debug;

use crate::constraint::{AdditionalProperties, Constraint, ConstraintKind};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::{JsonType, SchemaType};
use crate::lexeme::LexEvent;
use crate::node::{ArrayNode, Node, ObjectNode};
use crate::schema::Schema;
use crate::source::{File, is_user_type_name};
use crate::validator::Validator;
use crate::value::Value;

mod recursion;
mod resolve;

pub(crate) fn check(schema: &Schema) -> Result<()> {
    let checker = Checker { schema };
    checker.check_node(&schema.root)?;
    for (name, ty) in &schema.types {
        debug!(name = name.as_str(), "checking type");
        checker.check_node(ty.root()).map_err(|e| anchor(e, &ty.file, ty.begin))?;
    }
    recursion::check(schema)
}

fn anchor(error: Error, file: &Arc<File>, offset: usize) -> Error {
    if error.location().is_some() { error } else { error.at_offset(file, offset) }
}

/// The only rules a node referencing user types may carry; the referenced
/// types describe everything else.
const ALONG_WITH_TYPE_REFERENCE: [ConstraintKind; 5] = [
    ConstraintKind::Type,
    ConstraintKind::TypesList,
    ConstraintKind::Or,
    ConstraintKind::Optional,
    ConstraintKind::Nullable,
];

struct Checker<'a> {
    schema: &'a Schema,
}

impl Checker<'_> {
    fn check_node(&self, node: &Node) -> Result<()> {
        self.check_compatibility(node)?;
        self.check_user_types(node)?;
        check_bounds(node)?;
        match node {
            Node::Object(object) => self.check_object(object)?,
            Node::Array(array) => check_array(array)?,
            Node::Literal(_) | Node::Mixed(_) => self.check_example(node)?,
            Node::MixedValue(_) => {}
        }
        for child in node.children() {
            self.check_node(child)?;
        }
        Ok(())
    }

    fn check_compatibility(&self, node: &Node) -> Result<()> {
        for entry in node.constraints().iter() {
            if !entry.constraint.is_json_type_compatible(node.json_type()) {
                let error = Error::new(
                    ErrorCode::UnexpectedConstraint,
                    format!(
                        "the rule \"{}\" is not compatible with the type \"{}\"",
                        entry.constraint.kind(),
                        node.type_label()
                    ),
                );
                return Err(error.at(entry.source.as_ref().unwrap_or(node.basis())));
            }
        }
        Ok(())
    }

    fn check_user_types(&self, node: &Node) -> Result<()> {
        let names = node.constraints().type_names();
        if names.is_empty() {
            return Ok(());
        }
        let source = node
            .constraints()
            .source(ConstraintKind::Type)
            .or_else(|| node.constraints().source(ConstraintKind::TypesList))
            .unwrap_or(node.basis());
        let extra = node.constraints().iter().find(|e| !ALONG_WITH_TYPE_REFERENCE.contains(&e.constraint.kind()));
        if let Some(entry) = extra {
            return Err(Error::new(
                ErrorCode::RulesWithTypeReference,
                format!("the rule \"{}\" cannot be used together with a type reference", entry.constraint.kind()),
            )
            .at(entry.source.as_ref().unwrap_or(source)));
        }
        if !node.children().is_empty() {
            return Err(Error::new(
                ErrorCode::ChildrenWithTypeReference,
                format!("a value typed as {} must not have child nodes", names.join(" | ")),
            )
            .at(node.basis()));
        }
        let allowed = resolve::node_json_types(self.schema, node, &mut Vec::new()).map_err(|e| e.or_at(source))?;
        let own = node.json_type();
        if own != JsonType::Mixed && !resolve::admits(&allowed, own) {
            return Err(Error::new(
                ErrorCode::IncorrectUserType,
                format!(
                    "incorrect type of user type: {} given, {} expected by {}",
                    own,
                    resolve::describe(&allowed),
                    names.join(" | ")
                ),
            )
            .at(source));
        }
        Ok(())
    }

    fn check_object(&self, object: &ObjectNode) -> Result<()> {
        for (key, property) in &object.properties {
            if !property.is_shortcut {
                continue;
            }
            let types = resolve::type_json_types(self.schema, key, &mut Vec::new())
                .map_err(|e| e.or_at(&property.key_event))?;
            if types.len() != 1 || !types.contains(&JsonType::String) {
                return Err(Error::new(
                    ErrorCode::KeyShortcutNotString,
                    format!("key shortcut {key} should be string but {} given", resolve::describe(&types)),
                )
                .at(&property.key_event));
            }
        }

        let constraints = &object.base.constraints;
        if let Some(Constraint::AdditionalProperties(AdditionalProperties::MustBeUserType(name))) =
            constraints.get(ConstraintKind::AdditionalProperties)
        {
            let at = constraints.source(ConstraintKind::AdditionalProperties).unwrap_or(&object.base.basis);
            if !is_user_type_name(name) {
                return Err(Error::new(ErrorCode::InvalidTypeName, format!("invalid type name \"{name}\"")).at(at));
            }
            self.schema.get_type(name).map_err(|e| e.at(at))?;
        }
        Ok(())
    }

    /// Literal examples must satisfy their own declaration.
    fn check_example(&self, node: &Node) -> Result<()> {
        let Some(example) = node.example() else {
            return Ok(());
        };
        let value = example.value();
        let example_type = JsonType::guess(value).unwrap_or(JsonType::Mixed);
        if example_type == JsonType::Null && node.is_nullable() {
            return Ok(());
        }
        if example_type == JsonType::Float
            && value.iter().any(|&c| matches!(c, b'e' | b'E'))
            && !matches!(node.base().real_type, Some(SchemaType::Float | SchemaType::Decimal))
        {
            return Err(Error::new(
                ErrorCode::ExponentNotAllowed,
                "an exponent is only allowed with the type \"float\" or \"decimal\"",
            )
            .at(example));
        }

        if matches!(node, Node::Mixed(_)) {
            return Validator::new(self.schema)
                .validate(node, &Value::Literal(example.clone()))
                .map_err(|e| invalid_example(example, e));
        }

        let declared = node.json_type();
        if declared != JsonType::Mixed
            && node.base().real_type != Some(SchemaType::Enum)
            && !example_type.fits(declared)
        {
            return Err(invalid_example(
                example,
                Error::new(ErrorCode::TypeMismatch, format!("{} expected, got {example_type}", node.type_label())),
            ));
        }
        for entry in node.constraints().iter() {
            entry.constraint.validate(value).map_err(|e| e.at(example))?;
        }
        Ok(())
    }
}

fn invalid_example(example: &LexEvent, cause: Error) -> Error {
    Error::new(
        ErrorCode::InvalidExample,
        format!("invalid example {}: {}", example.text(), cause.message()),
    )
    .at(example)
}

fn check_bounds(node: &Node) -> Result<()> {
    let constraints = node.constraints();
    let at = move |kind| constraints.source(kind).unwrap_or(node.basis());

    if let (Some(min), Some(max)) = constraints.min_max() {
        if min.value > max.value {
            return Err(Error::new(
                ErrorCode::BoundsOrder,
                format!("min {} is greater than max {}", min.value, max.value),
            )
            .at(at(ConstraintKind::Max)));
        }
    }
    if let (Some(min), Some(max)) =
        (constraints.count(ConstraintKind::MinLength), constraints.count(ConstraintKind::MaxLength))
    {
        if min > max {
            return Err(Error::new(ErrorCode::BoundsOrder, format!("minLength {min} is greater than maxLength {max}"))
                .at(at(ConstraintKind::MaxLength)));
        }
    }
    for (flag, bound) in [
        (ConstraintKind::ExclusiveMinimum, ConstraintKind::Min),
        (ConstraintKind::ExclusiveMaximum, ConstraintKind::Max),
    ] {
        if constraints.contains(flag) && !constraints.contains(bound) {
            return Err(Error::new(
                ErrorCode::ExclusiveWithoutBound,
                format!("the rule \"{flag}\" requires the rule \"{bound}\""),
            )
            .at(at(flag)));
        }
    }
    Ok(())
}

fn check_array(array: &ArrayNode) -> Result<()> {
    let constraints = &array.base.constraints;
    let at = move |kind| constraints.source(kind).unwrap_or(&array.base.basis);
    let min = constraints.count(ConstraintKind::MinItems);
    let max = constraints.count(ConstraintKind::MaxItems);

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(Error::new(
                ErrorCode::MinItemsGreaterThanMaxItems,
                format!("minItems {min} is greater than maxItems {max}"),
            )
            .at(at(ConstraintKind::MaxItems)));
        }
    }

    // an empty example with a type reference or `any` describes its items elsewhere
    let exempt = array.items.is_empty()
        && (!constraints.type_names().is_empty() || array.base.real_type == Some(SchemaType::Any));
    if exempt {
        return Ok(());
    }
    let count = array.items.len();
    if let Some(min) = min.filter(|min| count < *min) {
        return Err(Error::new(
            ErrorCode::ArrayItemsCount,
            format!("the example has {count} items, minItems is {min}"),
        )
        .at(at(ConstraintKind::MinItems)));
    }
    if let Some(max) = max.filter(|max| count > *max) {
        return Err(Error::new(
            ErrorCode::ArrayItemsCount,
            format!("the example has {count} items, maxItems is {max}"),
        )
        .at(at(ConstraintKind::MaxItems)));
    }
    Ok(())
}
