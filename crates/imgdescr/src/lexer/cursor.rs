//! Byte cursor shared by the XML and XPath scanners

use crate::error::Pos;

/// Read position over a byte slice, tracking line and column
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub fn peek(&self, ahead: usize) -> Option<u8> {
        self.input.get(self.pos.saturating_add(ahead)).copied()
    }

    /// Remaining input begins with `pattern`
    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.input
            .get(self.pos..)
            .is_some_and(|rest| rest.starts_with(pattern))
    }

    /// Step over one byte; a newline moves to the next line
    pub fn advance(&mut self) {
        let Some(b) = self.current() else {
            return;
        };
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
    }

    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
    }

    /// Consume `expected` if it is the current byte
    pub fn consume(&mut self, expected: u8) -> bool {
        let found = self.current() == Some(expected);
        if found {
            self.advance();
        }
        found
    }

    /// Consume `pattern` if the remaining input begins with it
    pub fn eat(&mut self, pattern: &[u8]) -> bool {
        let found = self.starts_with(pattern);
        if found {
            self.advance_by(pattern.len());
        }
        found
    }

    /// Consume bytes while `pred` holds and return them
    pub fn take_while<F>(&mut self, pred: F) -> &'a [u8]
    where
        F: Fn(u8) -> bool,
    {
        let start = self.pos;
        while self.current().is_some_and(&pred) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Consume up to and including `terminator`, returning the bytes before it
    ///
    /// `None` when the input ends first; everything is consumed then.
    pub fn take_until(&mut self, terminator: &[u8]) -> Option<&'a [u8]> {
        let start = self.pos;
        while !self.is_eof() {
            if self.starts_with(terminator) {
                let taken = self.slice_from(start);
                self.advance_by(terminator.len());
                return Some(taken);
            }
            self.advance();
        }
        None
    }

    pub const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Byte offset into the input
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes from `start` up to the current offset
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.pos).unwrap_or_default()
    }
}
