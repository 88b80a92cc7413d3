//! Error type shared by every layer of the compiler.
//!
//! Each condition has a stable numeric code, grouped by the layer that raises it:
//! 1xx scanner, 2xx constraint construction, 3xx loader, 4xx checker,
//! 5xx value validation, 6xx API misuse, 9xx internal.
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::lexeme::LexEvent;
use crate::source::File;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // scanner
    InvalidCharacter,
    UnexpectedEof,
    EmptySchema,
    ExponentNotAllowed,
    InvalidNumber,
    InvalidString,
    NestingTooDeep,
    // constraint construction
    InvalidConstraintValue,
    ZeroPrecision,
    InvalidRegex,
    InvalidAllOfSchemaName,
    DuplicateEnumValue,
    // loader
    UnknownRule,
    InvalidRuleValue,
    DuplicateRule,
    DuplicateKey,
    KeyShortcutNotAllowed,
    AnnotationWithoutValue,
    DuplicateAnnotation,
    UnknownType,
    InvalidTypeName,
    OrItemWithoutType,
    RulesNotAllowed,
    // checker
    UnexpectedConstraint,
    TypeNotFound,
    KeyShortcutNotString,
    InfiniteRecursion,
    RecursionInJsonType,
    IncorrectUserType,
    ArrayItemsCount,
    MinItemsGreaterThanMaxItems,
    AllOfNotObject,
    AllOfDuplicateKey,
    RuleNotFound,
    InvalidExample,
    BoundsOrder,
    ExclusiveWithoutBound,
    RulesWithTypeReference,
    ChildrenWithTypeReference,
    // value validation
    ValueTooSmall,
    ValueTooLarge,
    StringTooShort,
    StringTooLong,
    RegexMismatch,
    NotInEnum,
    ConstMismatch,
    PrecisionExceeded,
    InvalidEmail,
    InvalidUri,
    InvalidUuid,
    InvalidDate,
    InvalidDateTime,
    TypeMismatch,
    PropertyNotFound,
    RequiredKeyMissing,
    AdditionalPropertyNotAllowed,
    TooFewItems,
    TooManyItems,
    NoMatchingType,
    NotAnObject,
    // api
    SchemaAlreadyCompiled,
    TypeAlreadyExists,
    RuleAlreadyExists,
    Internal,
}

impl ErrorCode {
    pub fn number(self) -> u16 {
        use ErrorCode::*;
        match self {
            InvalidCharacter => 101,
            UnexpectedEof => 102,
            EmptySchema => 103,
            ExponentNotAllowed => 104,
            InvalidNumber => 105,
            InvalidString => 106,
            NestingTooDeep => 107,

            InvalidConstraintValue => 201,
            ZeroPrecision => 202,
            InvalidRegex => 203,
            InvalidAllOfSchemaName => 204,
            DuplicateEnumValue => 205,

            UnknownRule => 301,
            InvalidRuleValue => 302,
            DuplicateRule => 303,
            DuplicateKey => 304,
            KeyShortcutNotAllowed => 305,
            AnnotationWithoutValue => 306,
            DuplicateAnnotation => 307,
            UnknownType => 308,
            InvalidTypeName => 309,
            OrItemWithoutType => 310,
            RulesNotAllowed => 311,

            UnexpectedConstraint => 401,
            TypeNotFound => 402,
            KeyShortcutNotString => 403,
            InfiniteRecursion => 404,
            RecursionInJsonType => 405,
            IncorrectUserType => 406,
            ArrayItemsCount => 407,
            MinItemsGreaterThanMaxItems => 408,
            AllOfNotObject => 409,
            AllOfDuplicateKey => 410,
            RuleNotFound => 411,
            InvalidExample => 412,
            BoundsOrder => 413,
            ExclusiveWithoutBound => 414,
            RulesWithTypeReference => 415,
            ChildrenWithTypeReference => 416,

            ValueTooSmall => 501,
            ValueTooLarge => 502,
            StringTooShort => 503,
            StringTooLong => 504,
            RegexMismatch => 505,
            NotInEnum => 506,
            ConstMismatch => 507,
            PrecisionExceeded => 508,
            InvalidEmail => 509,
            InvalidUri => 510,
            InvalidUuid => 511,
            InvalidDate => 512,
            InvalidDateTime => 513,
            TypeMismatch => 514,
            PropertyNotFound => 515,
            RequiredKeyMissing => 516,
            AdditionalPropertyNotAllowed => 517,
            TooFewItems => 518,
            TooManyItems => 519,
            NoMatchingType => 520,
            NotAnObject => 521,

            SchemaAlreadyCompiled => 601,
            TypeAlreadyExists => 602,
            RuleAlreadyExists => 603,

            Internal => 901,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Where an error was detected: a source buffer and a byte offset into it.
#[derive(Debug, Clone)]
pub struct Location {
    pub file: Arc<File>,
    pub offset: usize,
}

#[derive(Debug, Clone, Error)]
#[error("{message} (code {})", .code.number())]
pub struct Error {
    code: ErrorCode,
    message: String,
    location: Option<Location>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), location: None }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Anchors the error at the beginning of `event`, replacing any previous anchor.
    pub fn at(mut self, event: &LexEvent) -> Self {
        self.location = Some(Location { file: event.file().clone(), offset: event.begin() });
        self
    }

    /// Anchors the error at `event` unless a more specific anchor is already set.
    pub fn or_at(self, event: &LexEvent) -> Self {
        if self.location.is_some() { self } else { self.at(event) }
    }

    pub fn at_offset(mut self, file: &Arc<File>, offset: usize) -> Self {
        self.location = Some(Location { file: file.clone(), offset });
        self
    }

    /// Line/column rendering, available once the error carries a location.
    pub fn document(&self) -> Option<DocumentError> {
        let loc = self.location.as_ref()?;
        let (line, column) = loc.file.line_column(loc.offset);
        Some(DocumentError {
            code: self.code.number(),
            message: self.message.clone(),
            file_name: loc.file.name().to_string(),
            line,
            column,
            source_line: String::from_utf8_lossy(loc.file.line_at(loc.offset)).into_owned(),
        })
    }
}

/// A located error rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentError {
    pub code: u16,
    pub message: String,
    pub file_name: String,
    /// 1-based.
    pub line: usize,
    /// 1-based, in bytes.
    pub column: usize,
    pub source_line: String,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR (code {}): {}", self.code, self.message)?;
        writeln!(f, "\tin line {} on file {}", self.line, self.file_name)?;
        writeln!(f, "\t> {}", self.source_line.trim_end())?;
        write!(f, "\t--{}^", "-".repeat(self.column.saturating_sub(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexeme::LexEventKind;

    #[test]
    fn codes_are_grouped_by_layer() {
        assert_eq!(ErrorCode::InvalidCharacter.number() / 100, 1);
        assert_eq!(ErrorCode::ZeroPrecision.number() / 100, 2);
        assert_eq!(ErrorCode::UnknownRule.number() / 100, 3);
        assert_eq!(ErrorCode::InfiniteRecursion.number() / 100, 4);
        assert_eq!(ErrorCode::ValueTooSmall.number() / 100, 5);
        assert_eq!(ErrorCode::TypeAlreadyExists.number() / 100, 6);
    }

    #[test]
    fn or_at_keeps_the_first_anchor() {
        let file = Arc::new(File::new("a.jschema", "{\n  \"id\": 1\n}"));
        let rule = LexEvent::new(LexEventKind::LiteralEnd, 10, 11, file.clone());
        let node = LexEvent::new(LexEventKind::ObjectEnd, 0, 13, file.clone());
        let err = Error::new(ErrorCode::ValueTooSmall, "too small").at(&rule).or_at(&node);
        assert_eq!(err.location().map(|l| l.offset), Some(10));
    }

    #[test]
    fn document_error_points_at_line_and_column() {
        let file = Arc::new(File::new("a.jschema", "{\n  \"id\": 1\n}"));
        let err = Error::new(ErrorCode::ValueTooSmall, "too small").at_offset(&file, 10);
        let doc = err.document().unwrap();
        assert_eq!((doc.line, doc.column), (2, 9));
        assert_eq!(doc.source_line, "  \"id\": 1");
        let rendered = doc.to_string();
        assert!(rendered.contains("code 501"));
        assert!(rendered.ends_with("----------^"));
    }

    #[test]
    fn display_includes_code() {
        let err = Error::new(ErrorCode::UnknownRule, "unknown rule \"foo\"");
        assert_eq!(err.to_string(), "unknown rule \"foo\" (code 301)");
    }
}
