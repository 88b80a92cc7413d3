//! Positioned source buffers and the byte helpers every layer leans on.
use crate::error::{Error, ErrorCode, Result};

/// A named, immutable source buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct File {
    name: String,
    content: Vec<u8>,
}

impl File {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), content: content.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Bytes in `[begin, end)`, clamped to the buffer.
    pub fn sub(&self, begin: usize, end: usize) -> &[u8] {
        let end = end.min(self.content.len());
        let begin = begin.min(end);
        &self.content[begin..end]
    }

    /// 1-based line and column of `offset`.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let before = &self.content[..offset];
        let line = before.iter().filter(|&&c| is_new_line(c)).count() + 1;
        let line_start = before.iter().rposition(|&c| is_new_line(c)).map_or(0, |i| i + 1);
        (line, offset - line_start + 1)
    }

    /// The full line containing `offset`, without its line terminator.
    pub fn line_at(&self, offset: usize) -> &[u8] {
        let offset = offset.min(self.content.len());
        let start = self.content[..offset].iter().rposition(|&c| is_new_line(c)).map_or(0, |i| i + 1);
        let end = self.content[offset..]
            .iter()
            .position(|&c| is_new_line(c))
            .map_or(self.content.len(), |i| offset + i);
        let line = &self.content[start..end];
        line.strip_suffix(b"\r").unwrap_or(line)
    }
}

pub fn is_new_line(c: u8) -> bool {
    c == b'\n'
}

pub fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

pub fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&c| !is_space(c)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&c| !is_space(c)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Decodes a JSON string literal (quotes included) into its text.
pub fn unquote(bytes: &[u8]) -> Result<String> {
    serde_json::from_slice::<String>(trim(bytes)).map_err(|error| {
        Error::new(
            ErrorCode::InvalidString,
            format!("invalid string literal {}: {error}", String::from_utf8_lossy(bytes)),
        )
    })
}

/// Encodes `text` as a JSON string literal.
pub fn quote(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

pub fn is_type_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// `@` followed by one or more name characters.
pub fn is_user_type_name(name: &str) -> bool {
    match name.as_bytes().split_first() {
        Some((b'@', rest)) => !rest.is_empty() && rest.iter().all(|&c| is_type_name_char(c)),
        _ => false,
    }
}

/// Renders a byte for error messages.
pub fn quote_char(c: u8) -> String {
    match c {
        b'\n' => "'\\n'".to_string(),
        b'\r' => "'\\r'".to_string(),
        b'\t' => "'\\t'".to_string(),
        b'\'' => "\"'\"".to_string(),
        0x20..=0x7e => format!("'{}'", c as char),
        _ => format!("'\\x{c:02x}'"),
    }
}
