//! Literal values and type shortcuts.
use super::{Scanner, Step};
use crate::error::Result;
use crate::lexeme::LexEventKind;
use crate::source::{is_type_name_char, quote_char};

impl Scanner {
    /// Dispatches the first byte of a value. `next` is resumed once the value ends.
    pub(super) fn start_value(&mut self, c: u8, i: usize, next: Step) -> Result<()> {
        if matches!(c, b'{' | b'[') {
            self.enter(i)?;
        }
        self.cont.push(next);
        self.step = match c {
            b'{' => {
                self.begin(LexEventKind::ObjectBegin, i);
                Step::ObjectStart
            }
            b'[' => {
                self.begin(LexEventKind::ArrayBegin, i);
                Step::ArrayStart
            }
            b'"' => {
                self.begin(LexEventKind::LiteralBegin, i);
                Step::Str
            }
            b'-' | b'0'..=b'9' => {
                self.begin(LexEventKind::LiteralBegin, i);
                match c {
                    b'-' => Step::NumMinus,
                    b'0' => Step::NumZero,
                    _ => Step::NumInt,
                }
            }
            b't' | b'f' | b'n' => {
                self.begin(LexEventKind::LiteralBegin, i);
                let word: &'static [u8] = match c {
                    b't' => b"true",
                    b'f' => b"false",
                    _ => b"null",
                };
                Step::Keyword(word, 1)
            }
            b'@' if !self.options.plain_json => {
                let kind = if self.rule_mode() {
                    LexEventKind::TypesShortcutBegin
                } else {
                    LexEventKind::MixedValueBegin
                };
                self.begin(kind, i);
                Step::ShortcutAt
            }
            _ => {
                let error = self.invalid(c, i, Some("expecting a value"));
                return Err(error);
            }
        };
        Ok(())
    }

    pub(super) fn string(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::Str => match c {
                b'"' => self.end_value(i + 1)?,
                b'\\' => self.step = Step::StrEscape,
                0x00..=0x1f => return Err(self.invalid(c, i, Some("control characters must be escaped"))),
                _ => {}
            },
            Step::StrEscape => match c {
                b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => self.step = Step::Str,
                b'u' => self.step = Step::StrUnicode(0),
                _ => return Err(self.invalid(c, i, Some("unknown escape sequence"))),
            },
            Step::StrUnicode(n) => {
                if !c.is_ascii_hexdigit() {
                    return Err(self.invalid(c, i, Some("expecting a hexadecimal digit")));
                }
                self.step = if n == 3 { Step::Str } else { Step::StrUnicode(n + 1) };
            }
            _ => unreachable!("string() called in {:?}", self.step),
        }
        Ok(true)
    }

    /// Exponents are accepted here; whether one is allowed depends on the
    /// declared type, which is only known once the annotation has been read.
    pub(super) fn number(&mut self, c: u8, i: usize) -> Result<bool> {
        match (self.step, c) {
            (Step::NumMinus, b'0') => self.step = Step::NumZero,
            (Step::NumMinus, b'1'..=b'9') => self.step = Step::NumInt,
            (Step::NumMinus, _) => return Err(self.invalid(c, i, Some("expecting a digit"))),

            (Step::NumZero, b'0'..=b'9') => {
                return Err(self.invalid(c, i, Some("leading zeros are not allowed")));
            }
            (Step::NumZero | Step::NumInt, b'.') => self.step = Step::NumDot,
            (Step::NumInt, b'0'..=b'9') => {}

            (Step::NumDot, b'0'..=b'9') => self.step = Step::NumFrac,
            (Step::NumDot, _) => return Err(self.invalid(c, i, Some("expecting a digit after '.'"))),
            (Step::NumFrac, b'0'..=b'9') => {}

            (Step::NumZero | Step::NumInt | Step::NumFrac, b'e' | b'E') => self.step = Step::NumExp,
            (Step::NumExp, b'+' | b'-') => self.step = Step::NumExpSign,
            (Step::NumExp | Step::NumExpSign | Step::NumExpDigits, b'0'..=b'9') => {
                self.step = Step::NumExpDigits
            }
            (Step::NumExp | Step::NumExpSign, _) => {
                return Err(self.invalid(c, i, Some("expecting a digit in the exponent")));
            }

            (Step::NumZero | Step::NumInt | Step::NumFrac | Step::NumExpDigits, _) => {
                self.end_value(i)?;
                return Ok(false);
            }
            _ => unreachable!("number() called in {:?}", self.step),
        }
        Ok(true)
    }

    pub(super) fn keyword(&mut self, word: &'static [u8], pos: usize, c: u8, i: usize) -> Result<bool> {
        if c != word[pos] {
            let expecting = format!("expecting {}", quote_char(word[pos]));
            return Err(self.invalid(c, i, Some(&expecting)));
        }
        if pos + 1 == word.len() {
            self.end_value(i + 1)?;
        } else {
            self.step = Step::Keyword(word, pos + 1);
        }
        Ok(true)
    }

    /// `@Name` or `@A | @B | ...` in value position.
    pub(super) fn shortcut(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::ShortcutAt => {
                if !is_type_name_char(c) {
                    return Err(self.invalid(c, i, Some("expecting a type name")));
                }
                self.step = Step::ShortcutName;
            }
            Step::ShortcutName => {
                if is_type_name_char(c) {
                    return Ok(true);
                }
                self.shortcut_end = i;
                match c {
                    b' ' | b'\t' | b'\r' => self.step = Step::ShortcutAfterName,
                    b'|' => self.step = Step::ShortcutAfterBar,
                    _ => {
                        self.end_value(i)?;
                        return Ok(false);
                    }
                }
            }
            Step::ShortcutAfterName => match c {
                b' ' | b'\t' | b'\r' => {}
                b'|' => self.step = Step::ShortcutAfterBar,
                _ => {
                    self.end_value(self.shortcut_end)?;
                    return Ok(false);
                }
            },
            Step::ShortcutAfterBar => match c {
                b' ' | b'\t' | b'\r' => {}
                b'@' => self.step = Step::ShortcutAt,
                _ => return Err(self.invalid(c, i, Some("expecting '@'"))),
            },
            _ => unreachable!("shortcut() called in {:?}", self.step),
        }
        Ok(true)
    }
}
