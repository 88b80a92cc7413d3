//! Objects, arrays and the top level.
use super::{Scanner, Step};
use crate::error::{Error, ErrorCode, Result};
use crate::lexeme::LexEventKind;
use crate::source::is_type_name_char;

impl Scanner {
    pub(super) fn root(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::RootBegin => {
                if self.space(c, i)? || (c == b'#' && self.comment_start(c)?) {
                    return Ok(true);
                }
                self.start_value(c, i, Step::RootEnd)?;
            }
            Step::RootEnd => {
                if self.space(c, i)? || self.comment_start(c)? {
                    return Ok(true);
                }
                if !self.options.length_only {
                    return Err(self.invalid(c, i, Some("expecting the end of the schema")));
                }
                self.stop();
            }
            Step::Done => {}
            _ => unreachable!("root() called in {:?}", self.step),
        }
        Ok(true)
    }

    pub(super) fn object(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::ObjectStart | Step::ObjectKey => {
                if self.space(c, i)? || self.comment_start(c)? {
                    return Ok(true);
                }
                match c {
                    b'}' if self.step == Step::ObjectStart => self.end_value(i + 1)?,
                    b'}' => return Err(self.invalid(c, i, Some("trailing comma"))),
                    b'"' => {
                        self.begin(LexEventKind::ObjectKeyBegin, i);
                        self.cont.push(Step::ObjectColon);
                        self.step = Step::Str;
                    }
                    b'@' if self.rule_mode() => {
                        return Err(Error::new(
                            ErrorCode::KeyShortcutNotAllowed,
                            "key shortcuts are not allowed in rules",
                        )
                        .at_offset(&self.file, i));
                    }
                    b'@' if !self.options.plain_json => {
                        self.begin(LexEventKind::ObjectKeyBegin, i);
                        self.begin(LexEventKind::KeyShortcutBegin, i);
                        self.cont.push(Step::ObjectColon);
                        self.step = Step::KeyShortcutAt;
                    }
                    _ if self.rule_mode() && is_type_name_char(c) => {
                        self.begin(LexEventKind::ObjectKeyBegin, i);
                        self.cont.push(Step::ObjectColon);
                        self.step = Step::RuleKey;
                    }
                    _ => return Err(self.invalid(c, i, Some("expecting an object key"))),
                }
            }
            Step::RuleKey | Step::KeyShortcutName => {
                if !is_type_name_char(c) {
                    self.end_value(i)?;
                    return Ok(false);
                }
            }
            Step::KeyShortcutAt => {
                if !is_type_name_char(c) {
                    return Err(self.invalid(c, i, Some("expecting a type name")));
                }
                self.step = Step::KeyShortcutName;
            }
            Step::ObjectColon => {
                if self.space(c, i)? {
                    return Ok(true);
                }
                if c != b':' {
                    return Err(self.invalid(c, i, Some("expecting ':'")));
                }
                self.step = Step::ObjectValue;
            }
            Step::ObjectValue => {
                if self.space(c, i)? {
                    return Ok(true);
                }
                self.begin(LexEventKind::ObjectValueBegin, i);
                self.start_value(c, i, Step::ObjectNext)?;
            }
            Step::ObjectNext => {
                if self.space(c, i)? || self.comment_start(c)? {
                    return Ok(true);
                }
                match c {
                    b',' => self.step = Step::ObjectKey,
                    b'}' => self.end_value(i + 1)?,
                    _ => return Err(self.invalid(c, i, Some("expecting ',' or '}'"))),
                }
            }
            _ => unreachable!("object() called in {:?}", self.step),
        }
        Ok(true)
    }

    pub(super) fn array(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::ArrayStart | Step::ArrayItem => {
                if self.space(c, i)? || self.comment_start(c)? {
                    return Ok(true);
                }
                match c {
                    b']' if self.step == Step::ArrayStart => self.end_value(i + 1)?,
                    b']' => return Err(self.invalid(c, i, Some("trailing comma"))),
                    _ => {
                        self.begin(LexEventKind::ArrayItemBegin, i);
                        self.start_value(c, i, Step::ArrayNext)?;
                    }
                }
            }
            Step::ArrayNext => {
                if self.space(c, i)? || self.comment_start(c)? {
                    return Ok(true);
                }
                match c {
                    b',' => self.step = Step::ArrayItem,
                    b']' => self.end_value(i + 1)?,
                    _ => return Err(self.invalid(c, i, Some("expecting ',' or ']'"))),
                }
            }
            _ => unreachable!("array() called in {:?}", self.step),
        }
        Ok(true)
    }
}
