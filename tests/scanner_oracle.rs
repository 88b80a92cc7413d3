//! Event sequences recorded for a fixed set of snippets.
use std::sync::Arc;

use jschema::lexeme::LexEventKind;
use jschema::scanner::{ScanOptions, Scanner};
use jschema::source::File;

const ORACLE: &[(&str, &str)] = &[
    ("123", "LiteralBegin LiteralEnd EndTop"),
    ("null", "LiteralBegin LiteralEnd EndTop"),
    (
        "[1, \"a\"]",
        "ArrayBegin ArrayItemBegin LiteralBegin LiteralEnd ArrayItemEnd \
         ArrayItemBegin LiteralBegin LiteralEnd ArrayItemEnd ArrayEnd EndTop",
    ),
    (
        "{\"a\": true}",
        "ObjectBegin ObjectKeyBegin ObjectKeyEnd ObjectValueBegin LiteralBegin LiteralEnd \
         ObjectValueEnd ObjectEnd EndTop",
    ),
    (
        "{\"id\": 123 // {min: 1}\n}",
        "ObjectBegin ObjectKeyBegin ObjectKeyEnd ObjectValueBegin LiteralBegin LiteralEnd ObjectValueEnd \
         InlineAnnotationBegin ObjectBegin ObjectKeyBegin ObjectKeyEnd ObjectValueBegin LiteralBegin \
         LiteralEnd ObjectValueEnd ObjectEnd InlineAnnotationEnd NewLine ObjectEnd EndTop",
    ),
    (
        "1 // {min: 0} - a comment",
        "LiteralBegin LiteralEnd InlineAnnotationBegin ObjectBegin ObjectKeyBegin ObjectKeyEnd \
         ObjectValueBegin LiteralBegin LiteralEnd ObjectValueEnd ObjectEnd InlineAnnotationTextBegin \
         InlineAnnotationTextEnd InlineAnnotationEnd EndTop",
    ),
    (
        "1 // {type: @Cat}",
        "LiteralBegin LiteralEnd InlineAnnotationBegin ObjectBegin ObjectKeyBegin ObjectKeyEnd \
         ObjectValueBegin TypesShortcutBegin TypesShortcutEnd ObjectValueEnd ObjectEnd \
         InlineAnnotationEnd EndTop",
    ),
    (
        "{@id: @Cat | @Dog}",
        "ObjectBegin ObjectKeyBegin KeyShortcutBegin KeyShortcutEnd ObjectKeyEnd ObjectValueBegin \
         MixedValueBegin MixedValueEnd ObjectValueEnd ObjectEnd EndTop",
    ),
    (
        "# leading\n[ # item\n  1 ### block\n ###\n]",
        "NewLine ArrayBegin NewLine ArrayItemBegin LiteralBegin LiteralEnd ArrayItemEnd NewLine NewLine \
         ArrayEnd EndTop",
    ),
];

fn kinds(src: &str) -> String {
    let events = Scanner::collect(Arc::new(File::new("oracle", src)), ScanOptions::default())
        .unwrap_or_else(|error| panic!("{src:?}: {error}"));
    events.iter().map(|event| format!("{:?}", event.kind())).collect::<Vec<_>>().join(" ")
}

#[test]
fn event_sequences_match_the_oracle() {
    for (src, expected) in ORACLE {
        let expected = expected.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(kinds(src), expected, "{src:?}");
    }
}

#[test]
fn begin_and_end_events_nest() {
    for (src, _) in ORACLE {
        let events = Scanner::collect(Arc::new(File::new("oracle", *src)), ScanOptions::default()).unwrap();
        let mut open = Vec::new();
        for event in &events {
            let kind = event.kind();
            if let Some(end) = kind.pair() {
                open.push(end);
            } else if !matches!(kind, LexEventKind::NewLine | LexEventKind::EndTop) {
                assert_eq!(open.pop(), Some(kind), "{src:?}");
            }
        }
        assert!(open.is_empty(), "{src:?}");
    }
}
