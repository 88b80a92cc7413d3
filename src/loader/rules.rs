//! Annotation contents: the rule object, its conversion into constraints and
//! the side effects a rule has on the node it describes.
use indexmap::IndexMap;

use super::{Loader, shortcut};
use crate::constraint::{
    AdditionalProperties, Bound, Constraint, ConstraintKind, EnumConstraint, Format, LiteralKey, RegexConstraint,
    TypeRef, all_of_name, flag, non_negative, precision,
};
use crate::error::{Error, ErrorCode, Result};
use crate::json_type::{JsonType, SchemaType};
use crate::lexeme::{LexEvent, LexEventKind};
use crate::node::{Node, NodeBase};
use crate::source::{is_user_type_name, trim, unquote};

/// A rule value as written.
#[derive(Debug, Clone)]
pub(crate) enum RuleValue {
    Literal(LexEvent),
    Shortcut(LexEvent),
    Array(LexEvent, Vec<RuleValue>),
    Object(LexEvent, RuleObject),
}

/// Rule name to (key lexeme, value), in source order.
pub(crate) type RuleObject = IndexMap<String, (LexEvent, RuleValue)>;

impl RuleValue {
    pub(crate) fn event(&self) -> &LexEvent {
        match self {
            RuleValue::Literal(e) | RuleValue::Shortcut(e) | RuleValue::Array(e, _) | RuleValue::Object(e, _) => e,
        }
    }

    fn literal(&self, rule: &str) -> Result<&LexEvent> {
        match self {
            RuleValue::Literal(event) => Ok(event),
            other => Err(invalid_value(rule, "a literal").at(other.event())),
        }
    }

    /// The decoded text of a string literal.
    fn string(&self) -> Result<Option<String>> {
        match self {
            RuleValue::Literal(event) if JsonType::guess(event.value()) == Some(JsonType::String) => {
                Ok(Some(unquote(event.value()).map_err(|e| e.at(event))?))
            }
            _ => Ok(None),
        }
    }
}

fn invalid_value(rule: &str, expected: &str) -> Error {
    Error::new(ErrorCode::InvalidRuleValue, format!("the value of the rule \"{rule}\" must be {expected}"))
}

/// A finished annotation: the rule object if one was written, and the text.
pub(crate) struct Annotation {
    pub begin: LexEvent,
    pub rules: Option<RuleObject>,
    pub comment: Option<String>,
}

enum RuleFrame {
    Object { begin: LexEvent, entries: RuleObject, key: Option<(String, LexEvent)> },
    Array { begin: LexEvent, items: Vec<RuleValue> },
}

/// Collects the events of one annotation into a rule tree.
pub(crate) struct RuleBuilder {
    begin: LexEvent,
    stack: Vec<RuleFrame>,
    rules: Option<RuleObject>,
    comment: Option<String>,
}

impl RuleBuilder {
    pub(crate) fn new(begin: LexEvent) -> Self {
        Self { begin, stack: Vec::new(), rules: None, comment: None }
    }

    /// Consumes one event; returns the annotation once its end is seen.
    pub(crate) fn feed(&mut self, event: &LexEvent) -> Result<Option<Annotation>> {
        match event.kind() {
            LexEventKind::ObjectBegin => {
                self.stack.push(RuleFrame::Object { begin: event.clone(), entries: IndexMap::new(), key: None })
            }
            LexEventKind::ArrayBegin => self.stack.push(RuleFrame::Array { begin: event.clone(), items: Vec::new() }),
            LexEventKind::ObjectKeyEnd => {
                let name = match event.value().first() {
                    Some(b'"') => unquote(event.value()).map_err(|e| e.at(event))?,
                    _ => event.text(),
                };
                if let Some(RuleFrame::Object { key, .. }) = self.stack.last_mut() {
                    *key = Some((name, event.clone()));
                }
            }
            LexEventKind::LiteralEnd => self.complete(RuleValue::Literal(event.clone()))?,
            LexEventKind::TypesShortcutEnd => self.complete(RuleValue::Shortcut(event.clone()))?,
            LexEventKind::ObjectEnd => match self.stack.pop() {
                Some(RuleFrame::Object { begin, entries, .. }) => {
                    let whole = LexEvent::new(LexEventKind::ObjectEnd, begin.begin(), event.end(), event.file().clone());
                    self.complete(RuleValue::Object(whole, entries))?
                }
                _ => return Err(Error::internal("unbalanced rule object").at(event)),
            },
            LexEventKind::ArrayEnd => match self.stack.pop() {
                Some(RuleFrame::Array { begin, items }) => {
                    let whole = LexEvent::new(LexEventKind::ArrayEnd, begin.begin(), event.end(), event.file().clone());
                    self.complete(RuleValue::Array(whole, items))?
                }
                _ => return Err(Error::internal("unbalanced rule array").at(event)),
            },
            LexEventKind::InlineAnnotationTextEnd | LexEventKind::MultiLineAnnotationTextEnd => {
                let text = String::from_utf8_lossy(trim(event.value())).into_owned();
                if !text.is_empty() {
                    self.comment = Some(text);
                }
            }
            LexEventKind::InlineAnnotationEnd | LexEventKind::MultiLineAnnotationEnd => {
                return Ok(Some(Annotation {
                    begin: self.begin.clone(),
                    rules: self.rules.take(),
                    comment: self.comment.take(),
                }));
            }
            _ => {}
        }
        Ok(None)
    }

    fn complete(&mut self, value: RuleValue) -> Result<()> {
        match self.stack.last_mut() {
            None => match value {
                RuleValue::Object(_, entries) => self.rules = Some(entries),
                other => return Err(Error::new(ErrorCode::InvalidRuleValue, "rules must be an object").at(other.event())),
            },
            Some(RuleFrame::Array { items, .. }) => items.push(value),
            Some(RuleFrame::Object { entries, key, begin }) => {
                let Some((name, key_event)) = key.take() else {
                    return Err(Error::internal("rule value without a name").at(begin));
                };
                if entries.contains_key(&name) {
                    return Err(Error::new(ErrorCode::DuplicateRule, format!("duplicate rule \"{name}\"")).at(&key_event));
                }
                entries.insert(name, (key_event, value));
            }
        }
        Ok(())
    }
}

/// A constraint ready to be attached, with the lexeme it came from.
pub(crate) type Built = (Constraint, Option<LexEvent>);

impl Loader {
    /// Turns a rule object into constraints. `or` members are registered as
    /// unnamed types along the way.
    pub(super) fn build_rules(&mut self, rules: &RuleObject) -> Result<Vec<Built>> {
        let mut built = Vec::with_capacity(rules.len());
        for (name, (key_event, value)) in rules {
            let source = Some(value.event().clone());
            match self.build_rule(name, key_event, value) {
                Ok(constraints) => built.extend(constraints.into_iter().map(|c| (c, source.clone()))),
                Err(error) => return Err(error.or_at(value.event())),
            }
        }
        Ok(built)
    }

    fn build_rule(&mut self, name: &str, key_event: &LexEvent, value: &RuleValue) -> Result<Vec<Constraint>> {
        let constraint = match name {
            "type" => Constraint::Type(type_ref(value)?),
            "or" | "types" => {
                let names = self.union_members(name, value)?;
                return Ok(vec![Constraint::TypesList(names), Constraint::Or]);
            }
            "allOf" => Constraint::AllOf(all_of(value)?),
            "min" => Constraint::Min(Bound::from_literal(name, value.literal(name)?.value())?),
            "max" => Constraint::Max(Bound::from_literal(name, value.literal(name)?.value())?),
            "exclusiveMinimum" => Constraint::ExclusiveMinimum(flag(name, value.literal(name)?.value())?),
            "exclusiveMaximum" => Constraint::ExclusiveMaximum(flag(name, value.literal(name)?.value())?),
            "minLength" => Constraint::MinLength(non_negative(name, value.literal(name)?.value())?),
            "maxLength" => Constraint::MaxLength(non_negative(name, value.literal(name)?.value())?),
            "minItems" => Constraint::MinItems(non_negative(name, value.literal(name)?.value())?),
            "maxItems" => Constraint::MaxItems(non_negative(name, value.literal(name)?.value())?),
            "precision" => Constraint::Precision(precision(value.literal(name)?.value())?),
            "optional" => Constraint::Optional(flag(name, value.literal(name)?.value())?),
            "nullable" => Constraint::Nullable(flag(name, value.literal(name)?.value())?),
            "const" => Constraint::Const { value: flag(name, value.literal(name)?.value())?, example: None },
            "enum" => Constraint::Enum(enumeration(value)?),
            "regex" => Constraint::Regex(RegexConstraint::new(value.literal(name)?.value())?),
            "additionalProperties" => Constraint::AdditionalProperties(additional_properties(value)?),
            _ => {
                return Err(Error::new(ErrorCode::UnknownRule, format!("unknown rule \"{name}\"")).at(key_event));
            }
        };
        Ok(vec![constraint])
    }
}

fn type_ref(value: &RuleValue) -> Result<TypeRef> {
    if let RuleValue::Shortcut(event) = value {
        let mut names = shortcut::parse_names(event)?;
        if names.len() != 1 {
            return Err(invalid_value("type", "a single type; use \"or\" for unions"));
        }
        return Ok(TypeRef::User(names.remove(0)));
    }
    match value.string()? {
        Some(name) => TypeRef::parse(&name),
        None => Err(invalid_value("type", "a type name")),
    }
}

fn all_of(value: &RuleValue) -> Result<Vec<String>> {
    match value {
        RuleValue::Shortcut(event) => shortcut::parse_names(event),
        RuleValue::Array(_, items) => {
            let mut names = Vec::new();
            for item in items {
                names.extend(all_of(item).map_err(|e| e.or_at(item.event()))?);
            }
            Ok(names)
        }
        _ => match value.string()? {
            Some(name) => Ok(vec![all_of_name(&name)?]),
            None => Err(invalid_value("allOf", "a type name or a list of type names")),
        },
    }
}

fn enumeration(value: &RuleValue) -> Result<EnumConstraint> {
    match value {
        RuleValue::Array(_, items) => {
            let mut constraint = EnumConstraint::new();
            for item in items {
                let literal = item.literal("enum")?;
                constraint.append(literal.value(), None).map_err(|e| e.or_at(literal))?;
            }
            Ok(constraint)
        }
        RuleValue::Shortcut(event) => match shortcut::parse_names(event)?.as_slice() {
            [name] => Ok(EnumConstraint::from_rule(name.clone())),
            _ => Err(invalid_value("enum", "a single rule name")),
        },
        _ => match value.string()? {
            Some(name) if is_user_type_name(&name) => Ok(EnumConstraint::from_rule(name)),
            _ => Err(invalid_value("enum", "an array of literals or a rule name")),
        },
    }
}

fn additional_properties(value: &RuleValue) -> Result<AdditionalProperties> {
    match value {
        RuleValue::Shortcut(event) => match shortcut::parse_names(event)?.as_slice() {
            [name] => Ok(AdditionalProperties::MustBeUserType(name.clone())),
            _ => Err(invalid_value("additionalProperties", "a single type")),
        },
        _ => AdditionalProperties::from_literal(value.literal("additionalProperties")?.value()),
    }
}

/// Attaches constraints to `node` and applies what they imply: the semantic
/// type, implied format checks, exclusivity of bounds, the `const` value and
/// the switch to a mixed node for unions and user types.
pub(crate) fn apply(node: &mut Node, built: Vec<Built>) -> Result<()> {
    let mut builtin = None;
    let mut user_type = false;
    for (constraint, source) in built {
        match &constraint {
            Constraint::Type(TypeRef::Builtin(t)) => builtin = Some(*t),
            Constraint::Type(TypeRef::User(_)) => user_type = true,
            _ => {}
        }
        node.base_mut().constraints.insert(constraint, source)?;
    }

    if let Some(t) = builtin {
        let base = node.base_mut();
        base.real_type = Some(t);
        if t.json_type() != JsonType::Mixed {
            base.json_type = t.json_type();
        }
        if let Some(format) = Format::for_type(t) {
            base.constraints.insert(Constraint::Format(format), None)?;
        }
    }
    link_exclusive(node.base_mut());
    fill_const(node)?;

    let union = node.constraints().contains(ConstraintKind::Or);
    let any = matches!(builtin, Some(SchemaType::Any | SchemaType::Mixed));
    if matches!(node, Node::Literal(_)) && (union || any || user_type) {
        node.make_mixed();
        if union || any {
            node.base_mut().json_type = JsonType::Mixed;
        }
    }
    Ok(())
}

fn link_exclusive(base: &mut NodeBase) {
    let exclusive_min = base.constraints.flag(ConstraintKind::ExclusiveMinimum);
    let exclusive_max = base.constraints.flag(ConstraintKind::ExclusiveMaximum);
    if let Some(Constraint::Min(bound)) = base.constraints.get_mut(ConstraintKind::Min) {
        bound.exclusive = exclusive_min;
    }
    if let Some(Constraint::Max(bound)) = base.constraints.get_mut(ConstraintKind::Max) {
        bound.exclusive = exclusive_max;
    }
}

fn fill_const(node: &mut Node) -> Result<()> {
    let Some(example) = node.example().cloned() else {
        return Ok(());
    };
    if let Some(Constraint::Const { value: true, example: slot }) =
        node.base_mut().constraints.get_mut(ConstraintKind::Const)
    {
        *slot = Some(LiteralKey::from_bytes(example.value()).map_err(|e| e.at(&example))?);
    }
    Ok(())
}
