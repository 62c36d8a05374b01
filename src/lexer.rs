//! Span scanner for twin expressions.
//!
//! Splits an expression into whitespace-delimited spans while respecting
//! `[...]` arbitrary values, `(...)` groups and function calls, and
//! backslash escapes inside brackets. Structural problems are reported as a
//! [`LexError`] value, never as a panic; everything scanned before the
//! failing span is still returned.

use std::ops::Range;

pub const MISSING_CLOSING_BRACKET: &str = "missing closing bracket";
pub const UNEXPECTED_CLOSING_BRACKET: &str = "unexpected closing bracket";

/// A structural error found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

/// Spans completed before the first error, plus that error if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexOutput {
    pub spans: Vec<Range<usize>>,
    pub error: Option<LexError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Open,
    Close,
    Mismatch,
    Stray,
    Plain,
}

/// Bracket nesting state. The stack holds `(opening byte, position)`.
#[derive(Debug, Default)]
struct Nesting {
    stack: Vec<(u8, usize)>,
}

impl Nesting {
    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn in_arbitrary(&self) -> bool {
        self.stack.iter().any(|(open, _)| *open == b'[')
    }

    fn outermost(&self) -> Option<usize> {
        self.stack.first().map(|(_, pos)| *pos)
    }

    /// Consume the byte at `pos`; returns what happened and how far to advance.
    fn step(&mut self, bytes: &[u8], pos: usize, to: usize) -> (Step, usize) {
        let c = bytes[pos];
        match c {
            b'\\' if self.in_arbitrary() && pos + 1 < to => {
                let next = bytes[pos + 1];
                let escapes_closer = matches!(next, b']' | b')');
                // An escaped closer only counts as an escape when the
                // bracket can still be closed later on.
                if !escapes_closer || bytes[pos + 2..to].contains(&next) {
                    (Step::Plain, 2)
                } else {
                    (Step::Plain, 1)
                }
            }
            b'[' | b'(' => {
                self.stack.push((c, pos));
                (Step::Open, 1)
            }
            b']' | b')' => {
                let expected = if c == b']' { b'[' } else { b'(' };
                match self.stack.last() {
                    Some((open, _)) if *open == expected => {
                        self.stack.pop();
                        (Step::Close, 1)
                    }
                    Some(_) => (Step::Mismatch, 1),
                    None => (Step::Stray, 1),
                }
            }
            _ => (Step::Plain, 1),
        }
    }
}

/// Scanner over one expression string.
pub struct Lexer<'a> {
    source: &'a str,
    separator: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, separator: &'a str) -> Self {
        Self { source, separator }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn separator(&self) -> &'a str {
        self.separator
    }

    /// Split the whole source into top-level spans.
    pub fn tokenize(&self) -> LexOutput {
        self.tokenize_range(0, self.source.len())
    }

    /// Split `source[from..to]` into spans separated by whitespace outside brackets.
    pub fn tokenize_range(&self, from: usize, to: usize) -> LexOutput {
        let bytes = self.source.as_bytes();
        let mut output = LexOutput::default();
        let mut nesting = Nesting::default();
        let mut span_start: Option<usize> = None;
        let mut pos = from;

        while pos < to {
            let c = bytes[pos];
            if nesting.depth() == 0 && c.is_ascii_whitespace() {
                if let Some(start) = span_start.take() {
                    output.spans.push(start..pos);
                }
                pos += 1;
                continue;
            }

            if span_start.is_none() {
                span_start = Some(pos);
            }

            let (step, advance) = nesting.step(bytes, pos, to);
            match step {
                Step::Mismatch => {
                    let start = nesting.outermost().unwrap_or(pos);
                    output.error = Some(LexError {
                        message: MISSING_CLOSING_BRACKET.to_string(),
                        start,
                        end: pos + 1,
                    });
                    return output;
                }
                Step::Stray => {
                    output.error = Some(LexError {
                        message: UNEXPECTED_CLOSING_BRACKET.to_string(),
                        start: pos,
                        end: pos + 1,
                    });
                    return output;
                }
                Step::Open | Step::Close | Step::Plain => {}
            }
            pos += advance;
        }

        if let Some(start) = nesting.outermost() {
            output.error = Some(LexError {
                message: MISSING_CLOSING_BRACKET.to_string(),
                start,
                end: to,
            });
            return output;
        }

        if let Some(start) = span_start {
            output.spans.push(start..to);
        }
        output
    }

    /// Position of the bracket closing the one opened at `open`, searching up to `to`.
    pub fn find_closing(&self, open: usize, to: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        if open >= to || !matches!(bytes[open], b'[' | b'(') {
            return None;
        }
        let mut nesting = Nesting::default();
        let mut pos = open;
        while pos < to {
            let (step, advance) = nesting.step(bytes, pos, to);
            match step {
                Step::Close if nesting.depth() == 0 => return Some(pos),
                Step::Mismatch | Step::Stray => return None,
                _ => {}
            }
            pos += advance;
        }
        None
    }

    /// First occurrence of `needle` in `source[from..to]` outside any bracket.
    pub fn find_top_level(&self, needle: &str, from: usize, to: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let needle = needle.as_bytes();
        if needle.is_empty() {
            return None;
        }
        let mut nesting = Nesting::default();
        let mut pos = from;
        while pos < to {
            if nesting.depth() == 0 && bytes[pos..to].starts_with(needle) {
                return Some(pos);
            }
            let (_, advance) = nesting.step(bytes, pos, to);
            pos += advance;
        }
        None
    }

    /// First top-level separator in `source[from..to]`.
    pub fn find_separator(&self, from: usize, to: usize) -> Option<usize> {
        self.find_top_level(self.separator, from, to)
    }

    /// First top-level occurrence of the byte `b` in `source[from..to]`.
    pub fn find_top_level_byte(&self, b: u8, from: usize, to: usize) -> Option<usize> {
        let bytes = self.source.as_bytes();
        let mut nesting = Nesting::default();
        let mut pos = from;
        while pos < to {
            if nesting.depth() == 0 && bytes[pos] == b {
                return Some(pos);
            }
            let (_, advance) = nesting.step(bytes, pos, to);
            pos += advance;
        }
        None
    }
}
