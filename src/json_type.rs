//! Raw JSON types and the semantic types of the notation.
use std::fmt;

use crate::source::trim;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JsonType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Null,
    /// Not known until user types are resolved.
    Mixed,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::String => "string",
            JsonType::Integer => "integer",
            JsonType::Float => "float",
            JsonType::Boolean => "boolean",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
            JsonType::Mixed => "mixed",
        }
    }

    /// Guesses the type of a literal or compound value from its first bytes.
    pub fn guess(value: &[u8]) -> Option<JsonType> {
        let value = trim(value);
        let first = *value.first()?;
        Some(match first {
            b'"' => JsonType::String,
            b'{' => JsonType::Object,
            b'[' => JsonType::Array,
            b't' | b'f' => JsonType::Boolean,
            b'n' => JsonType::Null,
            b'-' | b'0'..=b'9' => {
                if value.iter().any(|&c| matches!(c, b'.' | b'e' | b'E')) {
                    JsonType::Float
                } else {
                    JsonType::Integer
                }
            }
            b'@' => JsonType::Mixed,
            _ => return None,
        })
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            JsonType::String | JsonType::Integer | JsonType::Float | JsonType::Boolean | JsonType::Null
        )
    }

    /// Whether a value of type `self` may stand where `expected` is declared.
    /// Integers are accepted wherever floats are.
    pub fn fits(self, expected: JsonType) -> bool {
        self == expected || (self == JsonType::Integer && expected == JsonType::Float)
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in type names accepted by the `type` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Array,
    Object,
    Null,
    Email,
    Uri,
    Uuid,
    Date,
    DateTime,
    Enum,
    Mixed,
    Any,
}

impl SchemaType {
    pub fn from_name(name: &str) -> Option<SchemaType> {
        Some(match name {
            "string" => SchemaType::String,
            "integer" => SchemaType::Integer,
            "float" => SchemaType::Float,
            "decimal" => SchemaType::Decimal,
            "boolean" => SchemaType::Boolean,
            "array" => SchemaType::Array,
            "object" => SchemaType::Object,
            "null" => SchemaType::Null,
            "email" => SchemaType::Email,
            "uri" => SchemaType::Uri,
            "uuid" => SchemaType::Uuid,
            "date" => SchemaType::Date,
            "datetime" => SchemaType::DateTime,
            "enum" => SchemaType::Enum,
            "mixed" => SchemaType::Mixed,
            "any" => SchemaType::Any,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Float => "float",
            SchemaType::Decimal => "decimal",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::Null => "null",
            SchemaType::Email => "email",
            SchemaType::Uri => "uri",
            SchemaType::Uuid => "uuid",
            SchemaType::Date => "date",
            SchemaType::DateTime => "datetime",
            SchemaType::Enum => "enum",
            SchemaType::Mixed => "mixed",
            SchemaType::Any => "any",
        }
    }

    pub fn json_type(self) -> JsonType {
        match self {
            SchemaType::String
            | SchemaType::Email
            | SchemaType::Uri
            | SchemaType::Uuid
            | SchemaType::Date
            | SchemaType::DateTime => JsonType::String,
            SchemaType::Integer => JsonType::Integer,
            SchemaType::Float | SchemaType::Decimal => JsonType::Float,
            SchemaType::Boolean => JsonType::Boolean,
            SchemaType::Array => JsonType::Array,
            SchemaType::Object => JsonType::Object,
            SchemaType::Null => JsonType::Null,
            SchemaType::Enum | SchemaType::Mixed | SchemaType::Any => JsonType::Mixed,
        }
    }

    /// Semantic refinements narrower than their raw JSON type.
    pub fn is_refinement(self) -> bool {
        matches!(
            self,
            SchemaType::Decimal
                | SchemaType::Email
                | SchemaType::Uri
                | SchemaType::Uuid
                | SchemaType::Date
                | SchemaType::DateTime
                | SchemaType::Enum
                | SchemaType::Mixed
                | SchemaType::Any
        )
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_literal_types() {
        assert_eq!(JsonType::guess(b" \"a\" "), Some(JsonType::String));
        assert_eq!(JsonType::guess(b"-12"), Some(JsonType::Integer));
        assert_eq!(JsonType::guess(b"1.5"), Some(JsonType::Float));
        assert_eq!(JsonType::guess(b"1e3"), Some(JsonType::Float));
        assert_eq!(JsonType::guess(b"false"), Some(JsonType::Boolean));
        assert_eq!(JsonType::guess(b"null"), Some(JsonType::Null));
        assert_eq!(JsonType::guess(b"@Cat"), Some(JsonType::Mixed));
        assert_eq!(JsonType::guess(b""), None);
    }

    #[test]
    fn integers_fit_floats() {
        assert!(JsonType::Integer.fits(JsonType::Float));
        assert!(!JsonType::Float.fits(JsonType::Integer));
    }

    #[test]
    fn semantic_types_refine_json_types() {
        assert_eq!(SchemaType::from_name("email").map(SchemaType::json_type), Some(JsonType::String));
        assert_eq!(SchemaType::Decimal.json_type(), JsonType::Float);
        assert!(SchemaType::from_name("@Cat").is_none());
        assert!(SchemaType::Uuid.is_refinement());
        assert!(!SchemaType::Integer.is_refinement());
    }
}
