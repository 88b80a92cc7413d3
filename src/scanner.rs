//! Byte-driven scanner for the notation.
//!
//! The scanner is a single transition function over an explicit [`Step`]
//! state. Constructs that nest (values inside objects, rule objects inside
//! annotations, comments between tokens) push the state to resume onto a
//! continuation stack, and a second stack of open begin events keeps the
//! emitted begin/end markers properly nested.
use std::collections::VecDeque;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::{LexEvent, LexEventKind};
use crate::source::{File, quote_char};

mod annotation;
mod literal;
mod structure;

/// The deepest object and array nesting a document may have, counting
/// containers inside annotations.
pub const MAX_DEPTH: usize = 256;

/// Scanner modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Stop at the end of the top-level value (and its trailing annotations)
    /// instead of rejecting whatever follows it.
    pub length_only: bool,
    /// Reject comments, annotations and shortcuts: the input is plain JSON.
    pub plain_json: bool,
}

impl ScanOptions {
    pub fn plain_json() -> Self {
        Self { plain_json: true, ..Self::default() }
    }

    pub fn length_only() -> Self {
        Self { length_only: true, ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    RootBegin,
    RootEnd,
    Done,

    Str,
    StrEscape,
    StrUnicode(u8),
    NumMinus,
    NumZero,
    NumInt,
    NumDot,
    NumFrac,
    NumExp,
    NumExpSign,
    NumExpDigits,
    Keyword(&'static [u8], usize),
    ShortcutAt,
    ShortcutName,
    ShortcutAfterName,
    ShortcutAfterBar,

    ObjectStart,
    ObjectKey,
    ObjectColon,
    ObjectValue,
    ObjectNext,
    RuleKey,
    KeyShortcutAt,
    KeyShortcutName,
    ArrayStart,
    ArrayItem,
    ArrayNext,

    CommentSlash,
    HashStart(u8),
    HashLine,
    HashBlock(u8),
    InlineStart,
    InlineDash,
    InlineText,
    InlineAfterRules,
    BlockStart,
    BlockStartStar,
    BlockDash,
    BlockText,
    BlockTextStar,
    BlockAfterRules,
    BlockAfterRulesStar,
}

impl Step {
    fn context(self) -> &'static str {
        use Step::*;
        match self {
            RootBegin => "at the beginning of the schema",
            RootEnd | Done => "after the top-level value",
            Str | StrEscape | StrUnicode(_) => "in string literal",
            NumMinus | NumZero | NumInt | NumDot | NumFrac | NumExp | NumExpSign | NumExpDigits => {
                "in number literal"
            }
            Keyword(..) => "in literal",
            ShortcutAt | ShortcutName | ShortcutAfterName | ShortcutAfterBar => "in type shortcut",
            ObjectStart | ObjectKey => "at the beginning of an object key",
            ObjectColon => "after object key",
            ObjectValue => "at the beginning of an object value",
            ObjectNext => "after object value",
            RuleKey => "in rule name",
            KeyShortcutAt | KeyShortcutName => "in key shortcut",
            ArrayStart | ArrayItem => "at the beginning of an array item",
            ArrayNext => "after array item",
            CommentSlash => "at the beginning of a comment",
            HashStart(_) | HashLine | HashBlock(_) => "in comment",
            InlineStart | InlineDash | InlineText | InlineAfterRules => "in inline annotation",
            BlockStart | BlockStartStar | BlockDash | BlockText | BlockTextStar | BlockAfterRules
            | BlockAfterRulesStar => "in multi-line annotation",
        }
    }
}

/// The kind of annotation currently open. While one is open the scanner is
/// reading rules rather than example values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Annotation {
    Inline,
    Block,
}

pub struct Scanner {
    file: Arc<File>,
    options: ScanOptions,
    pos: usize,
    step: Step,
    cont: Vec<Step>,
    open: Vec<LexEvent>,
    depth: usize,
    found: VecDeque<LexEvent>,
    annotation: Option<Annotation>,
    shortcut_end: usize,
    text_end: usize,
    significant_end: usize,
    finished: bool,
}

impl Scanner {
    pub fn new(file: Arc<File>, options: ScanOptions) -> Self {
        trace!(file = file.name(), ?options, "scanner created");
        Self {
            file,
            options,
            pos: 0,
            step: Step::RootBegin,
            cont: Vec::new(),
            open: Vec::new(),
            depth: 0,
            found: VecDeque::new(),
            annotation: None,
            shortcut_end: 0,
            text_end: 0,
            significant_end: 0,
            finished: false,
        }
    }

    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    /// The next event, or `None` once the stream is exhausted. The first
    /// error ends the stream.
    pub fn next(&mut self) -> Result<Option<LexEvent>> {
        loop {
            if let Some(event) = self.found.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }
            let result = match self.file.content().get(self.pos).copied() {
                Some(c) => {
                    let fed = self.feed(c, self.pos);
                    self.pos += 1;
                    fed
                }
                None => self.eof(),
            };
            if let Err(error) = result {
                self.finished = true;
                self.found.clear();
                return Err(error);
            }
        }
    }

    /// Byte length of the top-level value, tolerating anything after it.
    pub fn length(file: Arc<File>) -> Result<usize> {
        let mut scanner = Scanner::new(file, ScanOptions::length_only());
        while let Some(event) = scanner.next()? {
            if event.kind() == LexEventKind::EndTop {
                return Ok(event.begin());
            }
        }
        Err(Error::internal("scanner finished without an end-of-top event"))
    }

    /// Scans everything, collecting the events.
    pub fn collect(file: Arc<File>, options: ScanOptions) -> Result<Vec<LexEvent>> {
        let mut scanner = Scanner::new(file, options);
        let mut events = Vec::new();
        while let Some(event) = scanner.next()? {
            events.push(event);
        }
        Ok(events)
    }

    fn feed(&mut self, c: u8, i: usize) -> Result<()> {
        while !self.transition(c, i)? {}
        Ok(())
    }

    /// Returns `false` when `c` was not consumed and must be fed again to the
    /// new state.
    fn transition(&mut self, c: u8, i: usize) -> Result<bool> {
        use Step::*;
        match self.step {
            RootBegin | RootEnd | Done => self.root(c, i),
            Str | StrEscape | StrUnicode(_) => self.string(c, i),
            NumMinus | NumZero | NumInt | NumDot | NumFrac | NumExp | NumExpSign | NumExpDigits => {
                self.number(c, i)
            }
            Keyword(word, pos) => self.keyword(word, pos, c, i),
            ShortcutAt | ShortcutName | ShortcutAfterName | ShortcutAfterBar => self.shortcut(c, i),
            ObjectStart | ObjectKey | ObjectColon | ObjectValue | ObjectNext | RuleKey
            | KeyShortcutAt | KeyShortcutName => self.object(c, i),
            ArrayStart | ArrayItem | ArrayNext => self.array(c, i),
            CommentSlash | HashStart(_) | HashLine | HashBlock(_) => self.comment(c, i),
            InlineStart | InlineDash | InlineText | InlineAfterRules => self.inline_annotation(c, i),
            BlockStart | BlockStartStar | BlockDash | BlockText | BlockTextStar | BlockAfterRules
            | BlockAfterRulesStar => self.block_annotation(c, i),
        }
    }

    fn eof(&mut self) -> Result<()> {
        use Step::*;
        let len = self.file.content().len();
        loop {
            match self.step {
                RootBegin => {
                    return Err(Error::new(ErrorCode::EmptySchema, "empty schema").at_offset(&self.file, len));
                }
                RootEnd => {
                    self.stop();
                    return Ok(());
                }
                Done => {
                    self.finished = true;
                    return Ok(());
                }
                NumZero | NumInt | NumFrac | NumExpDigits => self.end_value(len)?,
                ShortcutName => {
                    self.shortcut_end = len;
                    self.end_value(len)?;
                }
                ShortcutAfterName => self.end_value(self.shortcut_end)?,
                HashLine => self.resume()?,
                HashStart(n) if n != 3 => self.resume()?,
                InlineStart | InlineDash | InlineText | InlineAfterRules => self.close_annotation(len)?,
                step => {
                    return Err(Error::new(
                        ErrorCode::UnexpectedEof,
                        format!("unexpected end of file {}", step.context()),
                    )
                    .at_offset(&self.file, len));
                }
            }
        }
    }

    // ---- Event helpers ----

    fn rule_mode(&self) -> bool {
        self.annotation.is_some()
    }

    fn begin(&mut self, kind: LexEventKind, at: usize) {
        if is_container(kind) {
            self.depth += 1;
        }
        let event = LexEvent::new(kind, at, at, self.file.clone());
        self.open.push(event.clone());
        self.found.push_back(event);
    }

    /// Fails when opening one more object or array would exceed [`MAX_DEPTH`].
    fn enter(&self, at: usize) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(Error::new(
                ErrorCode::NestingTooDeep,
                format!("objects and arrays are nested deeper than {MAX_DEPTH} levels"),
            )
            .at_offset(&self.file, at));
        }
        Ok(())
    }

    fn emit(&mut self, kind: LexEventKind, begin: usize, end: usize) {
        self.found.push_back(LexEvent::new(kind, begin, end, self.file.clone()));
    }

    fn top_kind(&self) -> Option<LexEventKind> {
        self.open.last().map(LexEvent::kind)
    }

    /// Closes the innermost open event.
    fn finish(&mut self, end: usize) -> Result<()> {
        let open = self
            .open
            .pop()
            .ok_or_else(|| Error::internal("scanner closed an event that was never opened"))?;
        if is_container(open.kind()) {
            self.depth -= 1;
        }
        let kind = open
            .kind()
            .pair()
            .ok_or_else(|| Error::internal(format!("scanner opened a non-begin event {:?}", open.kind())))?;
        self.emit(kind, open.begin(), end);
        Ok(())
    }

    /// Closes a finished value together with the item or property wrapping it,
    /// then resumes the enclosing state.
    fn end_value(&mut self, end: usize) -> Result<()> {
        self.finish(end)?;
        if matches!(
            self.top_kind(),
            Some(LexEventKind::ArrayItemBegin | LexEventKind::ObjectValueBegin | LexEventKind::ObjectKeyBegin)
        ) {
            self.finish(end)?;
        }
        if self.open.is_empty() {
            self.significant_end = end;
        }
        self.resume()
    }

    fn resume(&mut self) -> Result<()> {
        self.step = self
            .cont
            .pop()
            .ok_or_else(|| Error::internal("scanner continuation stack is empty"))?;
        Ok(())
    }

    fn stop(&mut self) {
        let end = self.significant_end;
        self.emit(LexEventKind::EndTop, end, end);
        self.step = Step::Done;
        self.finished = true;
        trace!(file = self.file.name(), length = end, "scan finished");
    }

    /// Consumes insignificant whitespace, reporting new lines outside annotations.
    fn space(&mut self, c: u8, i: usize) -> Result<bool> {
        match c {
            b' ' | b'\t' | b'\r' => Ok(true),
            b'\n' => match self.annotation {
                None => {
                    self.emit(LexEventKind::NewLine, i, i + 1);
                    Ok(true)
                }
                Some(Annotation::Block) => Ok(true),
                Some(Annotation::Inline) => Err(self.invalid(c, i, Some("the rules of an inline annotation must end on the same line"))),
            },
            _ => Ok(false),
        }
    }

    fn invalid(&self, c: u8, i: usize, expecting: Option<&str>) -> Error {
        let context = match self.step {
            Step::Keyword(word, _) => format!("in literal {}", String::from_utf8_lossy(word)),
            step => step.context().to_string(),
        };
        let message = match expecting {
            Some(expecting) => format!("invalid character {} {context} ({expecting})", quote_char(c)),
            None => format!("invalid character {} {context}", quote_char(c)),
        };
        Error::new(ErrorCode::InvalidCharacter, message).at_offset(&self.file, i)
    }
}

fn is_container(kind: LexEventKind) -> bool {
    matches!(kind, LexEventKind::ObjectBegin | LexEventKind::ArrayBegin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use LexEventKind::*;

    fn scan(src: &str, options: ScanOptions) -> Result<Vec<LexEvent>> {
        Scanner::collect(Arc::new(File::new("test", src)), options)
    }

    fn kinds(src: &str) -> Vec<LexEventKind> {
        scan(src, ScanOptions::default()).unwrap().iter().map(LexEvent::kind).collect()
    }

    fn error(src: &str) -> Error {
        scan(src, ScanOptions::default()).unwrap_err()
    }

    #[test]
    fn scans_a_literal() {
        assert_eq!(kinds("123"), vec![LiteralBegin, LiteralEnd, EndTop]);
        let events = scan(" \"ab\" ", ScanOptions::default()).unwrap();
        assert_eq!(events[1].value(), b"\"ab\"");
    }

    #[test]
    fn scans_an_annotated_property() {
        assert_eq!(
            kinds("{\"id\": 123 // {min: 1}\n}"),
            vec![
                ObjectBegin,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                InlineAnnotationBegin,
                ObjectBegin,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                ObjectEnd,
                InlineAnnotationEnd,
                NewLine,
                ObjectEnd,
                EndTop,
            ]
        );
    }

    #[test]
    fn end_events_span_their_construct() {
        let events = scan("[1, 22]", ScanOptions::default()).unwrap();
        let array_end = events.iter().find(|e| e.kind() == ArrayEnd).unwrap();
        assert_eq!(array_end.value(), b"[1, 22]");
        let item = events.iter().filter(|e| e.kind() == ArrayItemEnd).nth(1).unwrap();
        assert_eq!(item.value(), b"22");
    }

    #[test]
    fn keyword_errors_name_the_expected_character() {
        let err = error("trux");
        assert_eq!(err.code(), ErrorCode::InvalidCharacter);
        assert!(err.message().contains("in literal true (expecting 'e')"), "{}", err.message());
        assert_eq!(err.location().map(|l| l.offset), Some(3));
    }

    #[test]
    fn unexpected_end_of_file() {
        for src in ["tru", "{\"a\": 1", "[1,", "\"abc", "{} /* {min: 1}", "1 // {min: 1"] {
            assert_eq!(error(src).code(), ErrorCode::UnexpectedEof, "{src:?}");
        }
    }

    #[test]
    fn empty_input_is_an_empty_schema() {
        assert_eq!(error("").code(), ErrorCode::EmptySchema);
        assert_eq!(error("  \n # nothing\n").code(), ErrorCode::EmptySchema);
    }

    #[test]
    fn rejects_trailing_data_unless_measuring() {
        assert_eq!(error("{} x").code(), ErrorCode::InvalidCharacter);
        let file = Arc::new(File::new("test", "{\"a\": [1, 2]} trailing"));
        assert_eq!(Scanner::length(file).unwrap(), 13);
    }

    #[test]
    fn length_includes_trailing_annotation() {
        let file = Arc::new(File::new("test", "1 // {min: 0}\nTYPE @next"));
        assert_eq!(Scanner::length(file).unwrap(), 13);
    }

    #[test]
    fn number_grammar() {
        assert_eq!(error("01").code(), ErrorCode::InvalidCharacter);
        assert_eq!(error("1.").code(), ErrorCode::UnexpectedEof);
        assert_eq!(error("-x").code(), ErrorCode::InvalidCharacter);
        assert_eq!(kinds("-0.5e+3"), vec![LiteralBegin, LiteralEnd, EndTop]);
    }

    #[test]
    fn string_grammar() {
        assert_eq!(kinds(r#""aé\n""#), vec![LiteralBegin, LiteralEnd, EndTop]);
        assert_eq!(error(r#""\x""#).code(), ErrorCode::InvalidCharacter);
        assert_eq!(error(r#""\u12g4""#).code(), ErrorCode::InvalidCharacter);
        assert_eq!(error("\"a\tb\"").code(), ErrorCode::InvalidCharacter);
    }

    #[test]
    fn trailing_commas_are_rejected() {
        assert_eq!(error("[1,]").code(), ErrorCode::InvalidCharacter);
        assert_eq!(error("{\"a\": 1,}").code(), ErrorCode::InvalidCharacter);
    }

    #[test]
    fn shortcuts() {
        assert_eq!(
            kinds("{@id: @Cat | @Dog}"),
            vec![
                ObjectBegin,
                ObjectKeyBegin,
                KeyShortcutBegin,
                KeyShortcutEnd,
                ObjectKeyEnd,
                ObjectValueBegin,
                MixedValueBegin,
                MixedValueEnd,
                ObjectValueEnd,
                ObjectEnd,
                EndTop,
            ]
        );
        let events = scan("@Cat | @Dog ", ScanOptions::default()).unwrap();
        assert_eq!(events[1].value(), b"@Cat | @Dog");
        assert_eq!(error("@Cat |").code(), ErrorCode::UnexpectedEof);
        assert_eq!(error("@Cat | Dog").code(), ErrorCode::InvalidCharacter);
    }

    #[test]
    fn rule_shortcuts_and_bare_keys() {
        assert_eq!(
            kinds("1 // {type: @Cat}"),
            vec![
                LiteralBegin,
                LiteralEnd,
                InlineAnnotationBegin,
                ObjectBegin,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                TypesShortcutBegin,
                TypesShortcutEnd,
                ObjectValueEnd,
                ObjectEnd,
                InlineAnnotationEnd,
                EndTop,
            ]
        );
        assert_eq!(error("1 // {@key: 1}").code(), ErrorCode::KeyShortcutNotAllowed);
    }

    #[test]
    fn annotation_text() {
        assert_eq!(
            kinds("1 // {min: 0} - a comment  "),
            vec![
                LiteralBegin,
                LiteralEnd,
                InlineAnnotationBegin,
                ObjectBegin,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                ObjectEnd,
                InlineAnnotationTextBegin,
                InlineAnnotationTextEnd,
                InlineAnnotationEnd,
                EndTop,
            ]
        );
        let events = scan("1 /* - spans\n lines */", ScanOptions::default()).unwrap();
        let text = events.iter().find(|e| e.kind() == MultiLineAnnotationTextEnd).unwrap();
        assert_eq!(text.value(), b"spans\n lines");
        assert!(!events.iter().any(|e| e.kind() == NewLine));
    }

    #[test]
    fn inline_rules_must_stay_on_one_line() {
        let err = error("1 // {min:\n 0}");
        assert_eq!(err.code(), ErrorCode::InvalidCharacter);
        assert_eq!(kinds("1 /* {min:\n 0} */").last(), Some(&EndTop));
    }

    #[test]
    fn hash_comments_are_silent() {
        assert_eq!(
            kinds("# leading\n[ # item\n  1 ### block\n ###\n]"),
            vec![
                NewLine,
                ArrayBegin,
                NewLine,
                ArrayItemBegin,
                LiteralBegin,
                LiteralEnd,
                ArrayItemEnd,
                NewLine,
                NewLine,
                ArrayEnd,
                EndTop,
            ]
        );
        assert_eq!(error("1 ### open").code(), ErrorCode::UnexpectedEof);
    }

    #[test]
    fn comments_are_not_allowed_inside_rules() {
        assert_eq!(error("1 // {min: 1 # no\n}").code(), ErrorCode::InvalidCharacter);
    }

    #[test]
    fn plain_json_rejects_extensions() {
        for src in ["1 // c", "@Cat", "{@k: 1}", "# c\n1"] {
            let err = scan(src, ScanOptions::plain_json()).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidCharacter, "{src:?}");
        }
        assert!(scan("{\"a\": [true, null, -1.5e3]}", ScanOptions::plain_json()).is_ok());
    }

    #[test]
    fn nesting_is_limited() {
        let nested = |depth: usize| format!("{}{}", "[".repeat(depth), "]".repeat(depth));
        assert!(scan(&nested(MAX_DEPTH), ScanOptions::default()).is_ok());

        let src = nested(MAX_DEPTH + 1);
        let err = scan(&src, ScanOptions::plain_json()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NestingTooDeep);
        assert_eq!(err.location().map(|l| l.offset), Some(MAX_DEPTH));

        let deep_rule = format!("1 // {{enum: {}}}", nested(MAX_DEPTH));
        assert_eq!(error(&deep_rule).code(), ErrorCode::NestingTooDeep);
        assert_eq!(error(&nested(100_000)).code(), ErrorCode::NestingTooDeep);
    }

    #[test]
    fn errors_end_the_stream() {
        let mut scanner = Scanner::new(Arc::new(File::new("test", "[x]")), ScanOptions::default());
        assert_eq!(scanner.next().unwrap().map(|e| e.kind()), Some(ArrayBegin));
        assert!(scanner.next().is_err());
        assert!(scanner.next().unwrap().is_none());
    }
}
