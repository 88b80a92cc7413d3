//! `@Name` and `@A | @B` shortcuts.
use crate::constraint::{Constraint, TypeRef};
use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::LexEvent;
use crate::source::is_user_type_name;

/// Splits a shortcut into its type names.
pub(crate) fn parse_names(event: &LexEvent) -> Result<Vec<String>> {
    let text = event.text();
    text.split('|')
        .map(|name| {
            let name = name.trim();
            if is_user_type_name(name) {
                Ok(name.to_string())
            } else {
                Err(Error::new(ErrorCode::InvalidTypeName, format!("invalid type name \"{name}\"")).at(event))
            }
        })
        .collect()
}

/// The constraints a shortcut stands for: a `type` for one name, a union otherwise.
pub(crate) fn constraints(event: &LexEvent, mut names: Vec<String>) -> Vec<(Constraint, Option<LexEvent>)> {
    let source = Some(event.clone());
    if names.len() == 1 {
        return vec![(Constraint::Type(TypeRef::User(names.remove(0))), source)];
    }
    vec![(Constraint::TypesList(names), source.clone()), (Constraint::Or, source)]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::constraint::ConstraintKind;
    use crate::lexeme::LexEventKind;
    use crate::source::File;

    fn event(src: &str) -> LexEvent {
        LexEvent::new(LexEventKind::MixedValueEnd, 0, src.len(), Arc::new(File::new("t", src)))
    }

    #[test]
    fn splits_on_bars() {
        assert_eq!(parse_names(&event("@Cat |@Dog")).unwrap(), vec!["@Cat", "@Dog"]);
        assert_eq!(parse_names(&event("@Cat | Dog")).unwrap_err().code(), ErrorCode::InvalidTypeName);
    }

    #[test]
    fn single_name_is_a_type() {
        let e = event("@Cat");
        let built = constraints(&e, parse_names(&e).unwrap());
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].0.kind(), ConstraintKind::Type);
        let e = event("@Cat | @Dog");
        let kinds: Vec<_> = constraints(&e, parse_names(&e).unwrap()).iter().map(|(c, _)| c.kind()).collect();
        assert_eq!(kinds, vec![ConstraintKind::TypesList, ConstraintKind::Or]);
    }
}
