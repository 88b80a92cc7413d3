//! Plain JSON values read for validation, kept as positioned lexemes.
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, ErrorCode, Result};
use crate::json_type::JsonType;
use crate::lexeme::{LexEvent, LexEventKind};
use crate::scanner::{ScanOptions, Scanner};
use crate::source::{File, unquote};

#[derive(Debug, Clone)]
pub enum Value {
    Literal(LexEvent),
    /// Keys map to the key lexeme (quotes included) and the value.
    Object(LexEvent, IndexMap<String, (LexEvent, Value)>),
    Array(LexEvent, Vec<Value>),
}

impl Value {
    /// Reads a strict JSON value; every notation extension is rejected.
    pub fn parse(name: &str, content: &[u8]) -> Result<Value> {
        let file = Arc::new(File::new(name, content));
        let mut scanner = Scanner::new(file, ScanOptions::plain_json());
        let mut stack: Vec<(Value, Option<(String, LexEvent)>)> = Vec::new();
        let mut root = None;

        while let Some(event) = scanner.next()? {
            let value = match event.kind() {
                LexEventKind::ObjectBegin => {
                    stack.push((Value::Object(event, IndexMap::new()), None));
                    continue;
                }
                LexEventKind::ArrayBegin => {
                    stack.push((Value::Array(event, Vec::new()), None));
                    continue;
                }
                LexEventKind::ObjectKeyEnd => {
                    let key = unquote(event.value()).map_err(|e| e.at(&event))?;
                    if let Some((_, pending)) = stack.last_mut() {
                        *pending = Some((key, event));
                    }
                    continue;
                }
                LexEventKind::LiteralEnd => Value::Literal(event),
                LexEventKind::ObjectEnd | LexEventKind::ArrayEnd => match stack.pop() {
                    Some((Value::Object(_, map), _)) => Value::Object(event, map),
                    Some((Value::Array(_, items), _)) => Value::Array(event, items),
                    _ => return Err(Error::internal("unbalanced value").at(&event)),
                },
                _ => continue,
            };
            match stack.last_mut() {
                None => root = Some(value),
                Some((Value::Array(_, items), _)) => items.push(value),
                Some((Value::Object(_, map), pending)) => {
                    let Some((key, key_event)) = pending.take() else {
                        return Err(Error::internal("object value without a key").at(value.event()));
                    };
                    map.insert(key, (key_event, value));
                }
                Some((Value::Literal(_), _)) => {}
            }
        }
        root.ok_or_else(|| Error::new(ErrorCode::EmptySchema, "the value is empty"))
    }

    /// The lexeme spanning the whole value.
    pub fn event(&self) -> &LexEvent {
        match self {
            Value::Literal(e) | Value::Object(e, _) | Value::Array(e, _) => e,
        }
    }

    pub fn json_type(&self) -> JsonType {
        match self {
            Value::Object(..) => JsonType::Object,
            Value::Array(..) => JsonType::Array,
            Value::Literal(e) => JsonType::guess(e.value()).unwrap_or(JsonType::Mixed),
        }
    }

    pub fn is_null(&self) -> bool {
        self.json_type() == JsonType::Null
    }

    pub fn bytes(&self) -> &[u8] {
        self.event().value()
    }
}
