//! Named enum rules: loading their source and resolving references to them.
use std::sync::Arc;

use tracing::debug;

use crate::constraint::{Constraint, ConstraintKind, EnumConstraint};
use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::{LexEvent, LexEventKind};
use crate::node::Node;
use crate::scanner::{ScanOptions, Scanner};
use crate::schema::Schema;
use crate::source::{File, trim};

/// Loads an enum rule: an array of literals, each optionally followed by a
/// text annotation on the same line that becomes the item's comment.
pub(crate) fn load_enum(file: Arc<File>) -> Result<EnumConstraint> {
    let mut scanner = Scanner::new(file.clone(), ScanOptions::default());
    let mut items: Vec<(LexEvent, Option<String>)> = Vec::new();
    let mut depth = 0usize;
    let mut in_annotation = false;
    // index of the item a comment on this line would describe
    let mut commentable: Option<usize> = None;

    while let Some(event) = scanner.next()? {
        if in_annotation {
            match event.kind() {
                LexEventKind::ObjectBegin => {
                    return Err(Error::new(ErrorCode::RulesNotAllowed, "rules are not allowed in an enum rule").at(&event));
                }
                LexEventKind::InlineAnnotationTextEnd | LexEventKind::MultiLineAnnotationTextEnd => {
                    let text = String::from_utf8_lossy(trim(event.value())).into_owned();
                    if let (Some(index), false) = (commentable, text.is_empty()) {
                        items[index].1 = Some(text);
                    }
                }
                LexEventKind::InlineAnnotationEnd | LexEventKind::MultiLineAnnotationEnd => in_annotation = false,
                _ => {}
            }
            continue;
        }
        match event.kind() {
            LexEventKind::ArrayBegin if depth == 0 => depth = 1,
            LexEventKind::ArrayEnd if depth == 1 => depth = 0,
            LexEventKind::LiteralEnd if depth == 1 => {
                items.push((event, None));
                commentable = Some(items.len() - 1);
            }
            LexEventKind::InlineAnnotationBegin | LexEventKind::MultiLineAnnotationBegin => in_annotation = true,
            LexEventKind::NewLine => commentable = None,
            LexEventKind::LiteralBegin
            | LexEventKind::ArrayItemBegin
            | LexEventKind::ArrayItemEnd
            | LexEventKind::EndTop => {}
            _ => {
                return Err(Error::new(ErrorCode::InvalidRuleValue, "an enum rule must be an array of literals")
                    .at(&event));
            }
        }
    }

    let mut constraint = EnumConstraint::new();
    for (event, comment) in items {
        constraint.append(event.value(), comment).map_err(|e| e.or_at(&event))?;
    }
    debug!(rule = file.name(), items = constraint.items().len(), "enum rule loaded");
    Ok(constraint)
}

/// Fills every `enum: @Name` constraint with the items of the named rule.
pub(crate) fn resolve_enum_rules(schema: &mut Schema) -> Result<()> {
    let rules = schema.rules.clone();
    let mut resolve = |node: &mut Node| -> Result<()> {
        let base = node.base_mut();
        let source = base.constraints.source(ConstraintKind::Enum).cloned();
        let Some(Constraint::Enum(constraint)) = base.constraints.get_mut(ConstraintKind::Enum) else {
            return Ok(());
        };
        let Some(name) = constraint.rule_name().map(str::to_string) else {
            return Ok(());
        };
        let rule = rules.get(&name).ok_or_else(|| {
            Error::new(ErrorCode::RuleNotFound, format!("rule \"{name}\" not found"))
                .at(source.as_ref().unwrap_or(&base.basis))
        });
        constraint.resolve(rule?.enum_items());
        Ok(())
    };
    schema.root.walk_mut(&mut resolve)?;
    for ty in schema.types.values_mut() {
        ty.schema.root.walk_mut(&mut resolve)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load;
    use crate::schema::Rule;

    fn enum_of(src: &str) -> Result<EnumConstraint> {
        load_enum(Arc::new(File::new("@Colors", src)))
    }

    #[test]
    fn items_keep_their_comments() {
        let e = enum_of("[\n  \"red\", // - warm\n  \"blue\" /* cold */\n  , 3\n]").unwrap();
        let items: Vec<_> = e.items().iter().map(|i| (i.text.as_str(), i.comment.as_deref())).collect();
        assert_eq!(items, vec![("\"red\"", Some("warm")), ("\"blue\"", Some("cold")), ("3", None)]);
    }

    #[test]
    fn rejects_rules_and_non_literals() {
        assert_eq!(enum_of("[1 // {min: 0}\n]").unwrap_err().code(), ErrorCode::RulesNotAllowed);
        assert_eq!(enum_of("[[1]]").unwrap_err().code(), ErrorCode::InvalidRuleValue);
        assert_eq!(enum_of("\"red\"").unwrap_err().code(), ErrorCode::InvalidRuleValue);
        assert_eq!(enum_of("[1, 2, 1]").unwrap_err().code(), ErrorCode::DuplicateEnumValue);
        assert_eq!(enum_of("[1, 1.0]").unwrap().items().len(), 2);
    }

    #[test]
    fn references_are_resolved() {
        let mut schema = load(Arc::new(File::new("root", "\"red\" // {enum: @Colors}")), "root").unwrap();
        schema.rules.insert("@Colors".into(), Rule::enum_rule("@Colors", "[\"red\", \"blue\"]").unwrap());
        resolve_enum_rules(&mut schema).unwrap();
        let constraint = schema.root.constraints().get(ConstraintKind::Enum).unwrap();
        constraint.validate(b"\"blue\"").unwrap();
        assert_eq!(constraint.validate(b"\"green\"").unwrap_err().code(), ErrorCode::NotInEnum);
    }

    #[test]
    fn missing_rule() {
        let mut schema = load(Arc::new(File::new("root", "\"red\" // {enum: @Colors}")), "root").unwrap();
        assert_eq!(resolve_enum_rules(&mut schema).unwrap_err().code(), ErrorCode::RuleNotFound);
    }
}
