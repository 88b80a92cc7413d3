//! Positioned lexical events produced by the scanner.
use std::fmt;
use std::sync::Arc;

use crate::source::File;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexEventKind {
    LiteralBegin,
    LiteralEnd,
    ObjectBegin,
    ObjectEnd,
    ObjectKeyBegin,
    ObjectKeyEnd,
    ObjectValueBegin,
    ObjectValueEnd,
    ArrayBegin,
    ArrayEnd,
    ArrayItemBegin,
    ArrayItemEnd,
    InlineAnnotationBegin,
    InlineAnnotationEnd,
    InlineAnnotationTextBegin,
    InlineAnnotationTextEnd,
    MultiLineAnnotationBegin,
    MultiLineAnnotationEnd,
    MultiLineAnnotationTextBegin,
    MultiLineAnnotationTextEnd,
    KeyShortcutBegin,
    KeyShortcutEnd,
    TypesShortcutBegin,
    TypesShortcutEnd,
    MixedValueBegin,
    MixedValueEnd,
    NewLine,
    EndTop,
}

impl LexEventKind {
    pub fn is_begin(self) -> bool {
        use LexEventKind::*;
        matches!(
            self,
            LiteralBegin
                | ObjectBegin
                | ObjectKeyBegin
                | ObjectValueBegin
                | ArrayBegin
                | ArrayItemBegin
                | InlineAnnotationBegin
                | InlineAnnotationTextBegin
                | MultiLineAnnotationBegin
                | MultiLineAnnotationTextBegin
                | KeyShortcutBegin
                | TypesShortcutBegin
                | MixedValueBegin
        )
    }

    /// The closing kind of a begin kind; `None` for everything else.
    pub fn pair(self) -> Option<LexEventKind> {
        use LexEventKind::*;
        Some(match self {
            LiteralBegin => LiteralEnd,
            ObjectBegin => ObjectEnd,
            ObjectKeyBegin => ObjectKeyEnd,
            ObjectValueBegin => ObjectValueEnd,
            ArrayBegin => ArrayEnd,
            ArrayItemBegin => ArrayItemEnd,
            InlineAnnotationBegin => InlineAnnotationEnd,
            InlineAnnotationTextBegin => InlineAnnotationTextEnd,
            MultiLineAnnotationBegin => MultiLineAnnotationEnd,
            MultiLineAnnotationTextBegin => MultiLineAnnotationTextEnd,
            KeyShortcutBegin => KeyShortcutEnd,
            TypesShortcutBegin => TypesShortcutEnd,
            MixedValueBegin => MixedValueEnd,
            _ => return None,
        })
    }
}

/// One marker in the event stream. Begin events are empty spans at the
/// opening byte; end events span the whole construct, `[begin, end)`.
#[derive(Clone, PartialEq, Eq)]
pub struct LexEvent {
    kind: LexEventKind,
    begin: usize,
    end: usize,
    file: Arc<File>,
}

impl LexEvent {
    pub fn new(kind: LexEventKind, begin: usize, end: usize, file: Arc<File>) -> Self {
        Self { kind, begin, end, file }
    }

    pub fn kind(&self) -> LexEventKind {
        self.kind
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    pub fn value(&self) -> &[u8] {
        self.file.sub(self.begin, self.end)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.value()).into_owned()
    }
}

impl fmt::Debug for LexEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}[{}..{}]", self.kind, self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_kinds_pair_with_end_kinds() {
        assert_eq!(LexEventKind::ObjectBegin.pair(), Some(LexEventKind::ObjectEnd));
        assert_eq!(LexEventKind::MixedValueBegin.pair(), Some(LexEventKind::MixedValueEnd));
        assert_eq!(LexEventKind::NewLine.pair(), None);
        assert!(LexEventKind::KeyShortcutBegin.is_begin());
        assert!(!LexEventKind::EndTop.is_begin());
    }

    #[test]
    fn value_is_the_spanned_text() {
        let file = Arc::new(File::new("x", r#"{"a": 12}"#));
        let event = LexEvent::new(LexEventKind::LiteralEnd, 6, 8, file);
        assert_eq!(event.value(), b"12");
        assert_eq!(format!("{event:?}"), "LiteralEnd[6..8]");
    }
}
