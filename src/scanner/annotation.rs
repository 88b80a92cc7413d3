//! Comments and annotations.
//!
//! `#` and `### ... ###` are plain comments and produce no events besides new
//! lines. `// ...` and `/* ... */` are annotations: an optional rule object
//! followed by an optional `- text` comment.
use super::{Annotation, Scanner, Step};
use crate::error::Result;
use crate::lexeme::LexEventKind;
use crate::source::is_space;

impl Scanner {
    /// Enters a comment when `c` starts one and comments are allowed here.
    /// The current state is resumed after the comment.
    pub(super) fn comment_start(&mut self, c: u8) -> Result<bool> {
        if self.options.plain_json || self.rule_mode() {
            return Ok(false);
        }
        let next = match c {
            b'#' => Step::HashStart(1),
            b'/' => Step::CommentSlash,
            _ => return Ok(false),
        };
        self.cont.push(self.step);
        self.step = next;
        Ok(true)
    }

    pub(super) fn comment(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::CommentSlash => match c {
                b'/' => {
                    self.begin(LexEventKind::InlineAnnotationBegin, i - 1);
                    self.annotation = Some(Annotation::Inline);
                    self.step = Step::InlineStart;
                }
                b'*' => {
                    self.begin(LexEventKind::MultiLineAnnotationBegin, i - 1);
                    self.annotation = Some(Annotation::Block);
                    self.step = Step::BlockStart;
                }
                _ => return Err(self.invalid(c, i, Some("expecting '/' or '*'"))),
            },
            Step::HashStart(n) => {
                if c == b'#' {
                    self.step = Step::HashStart(n.saturating_add(1));
                    return Ok(true);
                }
                self.step = if n == 3 { Step::HashBlock(0) } else { Step::HashLine };
                return Ok(false);
            }
            Step::HashLine => {
                if c == b'\n' {
                    self.resume()?;
                    return Ok(false);
                }
            }
            Step::HashBlock(k) => match c {
                b'#' if k == 2 => self.resume()?,
                b'#' => self.step = Step::HashBlock(k + 1),
                b'\n' => {
                    self.emit(LexEventKind::NewLine, i, i + 1);
                    self.step = Step::HashBlock(0);
                }
                _ => self.step = Step::HashBlock(0),
            },
            _ => unreachable!("comment() called in {:?}", self.step),
        }
        Ok(true)
    }

    pub(super) fn inline_annotation(&mut self, c: u8, i: usize) -> Result<bool> {
        if c == b'\n' {
            self.close_annotation(i)?;
            return Ok(false);
        }
        match self.step {
            Step::InlineStart => match c {
                b' ' | b'\t' | b'\r' => {}
                b'{' => self.start_value(c, i, Step::InlineAfterRules)?,
                b'-' => self.step = Step::InlineDash,
                _ => {
                    self.begin_text(i);
                    self.step = Step::InlineText;
                    return Ok(false);
                }
            },
            Step::InlineDash => {
                if !is_space(c) {
                    self.begin_text(i);
                    self.step = Step::InlineText;
                    return Ok(false);
                }
            }
            Step::InlineText => {
                if !is_space(c) {
                    self.text_end = i + 1;
                }
            }
            Step::InlineAfterRules => match c {
                b' ' | b'\t' | b'\r' => {}
                b'-' => self.step = Step::InlineDash,
                _ => return Err(self.invalid(c, i, Some("expecting '-' or a new line"))),
            },
            _ => unreachable!("inline_annotation() called in {:?}", self.step),
        }
        Ok(true)
    }

    pub(super) fn block_annotation(&mut self, c: u8, i: usize) -> Result<bool> {
        match self.step {
            Step::BlockStart => match c {
                _ if is_space(c) => {}
                b'{' => self.start_value(c, i, Step::BlockAfterRules)?,
                b'*' => self.step = Step::BlockStartStar,
                b'-' => self.step = Step::BlockDash,
                _ => {
                    self.begin_text(i);
                    self.step = Step::BlockText;
                    return Ok(false);
                }
            },
            Step::BlockStartStar => {
                if c == b'/' {
                    self.close_annotation(i + 1)?;
                } else {
                    self.begin_text(i - 1);
                    self.text_end = i;
                    self.step = Step::BlockText;
                    return Ok(false);
                }
            }
            Step::BlockDash => {
                if !is_space(c) {
                    self.begin_text(i);
                    self.step = Step::BlockText;
                    return Ok(false);
                }
            }
            Step::BlockText => match c {
                b'*' => self.step = Step::BlockTextStar,
                _ if !is_space(c) => self.text_end = i + 1,
                _ => {}
            },
            Step::BlockTextStar => match c {
                b'/' => self.close_annotation(i + 1)?,
                b'*' => self.text_end = i,
                _ => {
                    self.text_end = if is_space(c) { i } else { i + 1 };
                    self.step = Step::BlockText;
                }
            },
            Step::BlockAfterRules => match c {
                _ if is_space(c) => {}
                b'-' => self.step = Step::BlockDash,
                b'*' => self.step = Step::BlockAfterRulesStar,
                _ => return Err(self.invalid(c, i, Some("expecting '-' or '*/'"))),
            },
            Step::BlockAfterRulesStar => {
                if c != b'/' {
                    return Err(self.invalid(c, i, Some("expecting '/'")));
                }
                self.close_annotation(i + 1)?;
            }
            _ => unreachable!("block_annotation() called in {:?}", self.step),
        }
        Ok(true)
    }

    fn begin_text(&mut self, at: usize) {
        let kind = match self.annotation {
            Some(Annotation::Block) => LexEventKind::MultiLineAnnotationTextBegin,
            _ => LexEventKind::InlineAnnotationTextBegin,
        };
        self.begin(kind, at);
        self.text_end = at;
    }

    /// Closes the open text (if any) and the annotation itself, then resumes
    /// the state the comment interrupted.
    pub(super) fn close_annotation(&mut self, end: usize) -> Result<()> {
        if matches!(
            self.top_kind(),
            Some(LexEventKind::InlineAnnotationTextBegin | LexEventKind::MultiLineAnnotationTextBegin)
        ) {
            self.finish(self.text_end)?;
        }
        self.finish(end)?;
        self.annotation = None;
        if self.open.is_empty() {
            self.significant_end = end;
        }
        self.resume()
    }
}
