//! Recursive-descent parser for twin expressions.
//!
//! A term is `[!] (variant SEP)* base [!]` where `base` is a class name,
//! an arbitrary class (`[expr]`, `name-[expr]`), a CSS declaration
//! (`[prop:value]`), short CSS (`prop[expr]`) or a parenthesized group of
//! further terms. Group children inherit the accumulated variants.

use crate::ast::{EmptyKind, EmptyNode, Node, ParseError, ParseResult};
use crate::lexer::Lexer;
use crate::token::{Token, TokenList};

/// Parse one expression. Pure: the same input always yields the same result.
pub fn parse(expression: &str, separator: &str) -> ParseResult {
    Parser::new(expression, separator).parse()
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    source: &'a str,
    empty_list: Vec<EmptyNode>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, separator: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source, separator),
            source,
            empty_list: Vec::new(),
        }
    }

    fn parse(mut self) -> ParseResult {
        let output = self.lexer.tokenize();
        let mut class_list = Vec::new();
        let root = TokenList::new();
        for span in &output.spans {
            self.parse_term(span.start, span.end, &root, false, &mut class_list);
        }

        ParseResult {
            class_list,
            empty_list: self.empty_list,
            error: output.error.map(|e| ParseError {
                message: e.message,
                start: e.start,
                end: e.end,
            }),
        }
    }

    fn token(&self, start: usize, end: usize) -> Token {
        Token::from_source(self.source, start, end)
    }

    fn push_empty(
        &mut self,
        kind: EmptyKind,
        variants: &TokenList,
        start: usize,
        end: usize,
        out: &mut Vec<Node>,
    ) {
        let empty = EmptyNode {
            kind,
            variants: variants.clone(),
            start,
            end,
        };
        self.empty_list.push(empty.clone());
        out.push(Node::Empty(empty));
    }

    fn parse_term(
        &mut self,
        start: usize,
        end: usize,
        inherited: &TokenList,
        inherited_important: bool,
        out: &mut Vec<Node>,
    ) {
        let source: &'a str = self.source;
        let bytes = source.as_bytes();
        let sep_len = self.lexer.separator().len();
        let mut variants = inherited.clone();
        let mut important = inherited_important;
        let mut pos = start;

        if pos < end && bytes[pos] == b'!' {
            important = true;
            pos += 1;
        }

        loop {
            if pos >= end {
                match variants.get(inherited.len()) {
                    Some(first) => {
                        let first_start = first.start;
                        self.push_empty(EmptyKind::Group, &variants, first_start, end, out);
                    }
                    None => {
                        self.push_empty(EmptyKind::Classname, &variants, start, start + 1, out);
                    }
                }
                return;
            }

            if bytes[pos] == b'(' {
                if let Some(close) = self.lexer.find_closing(pos, end) {
                    self.parse_group(pos, close, end, &variants, important, out);
                    let mut after = close + 1;
                    if after < end && bytes[after] == b'!' {
                        after += 1;
                    }
                    if after < end {
                        self.parse_term(after, end, inherited, inherited_important, out);
                    }
                    return;
                }
            }

            match self.lexer.find_separator(pos, end) {
                Some(idx) if idx == pos => {
                    self.push_empty(EmptyKind::Classname, &variants, idx, idx + sep_len, out);
                    pos = idx + sep_len;
                    if pos >= end {
                        return;
                    }
                }
                Some(idx) => {
                    variants.push(self.token(pos, idx));
                    pos = idx + sep_len;
                }
                None => {
                    self.parse_leaf(pos, end, variants, important, out);
                    return;
                }
            }
        }
    }

    fn parse_group(
        &mut self,
        open: usize,
        close: usize,
        end: usize,
        variants: &TokenList,
        important: bool,
        out: &mut Vec<Node>,
    ) {
        let source: &'a str = self.source;
        let bytes = source.as_bytes();
        let important = important || (close + 1 < end && bytes[close + 1] == b'!');
        let inner = self.lexer.tokenize_range(open + 1, close);

        if inner.spans.is_empty() {
            self.push_empty(EmptyKind::Group, variants, open, close + 1, out);
            return;
        }

        let mut children = Vec::new();
        for span in &inner.spans {
            self.parse_term(span.start, span.end, variants, important, &mut children);
        }
        out.push(Node::Group {
            variants: variants.clone(),
            token: self.token(open, close + 1),
            children,
            important,
        });
    }

    fn parse_leaf(
        &mut self,
        start: usize,
        end: usize,
        variants: TokenList,
        mut important: bool,
        out: &mut Vec<Node>,
    ) {
        let source: &'a str = self.source;
        let bytes = source.as_bytes();
        let mut s = start;
        let mut e = end;
        if bytes[s] == b'!' {
            important = true;
            s += 1;
        }
        if e > s && bytes[e - 1] == b'!' {
            important = true;
            e -= 1;
        }
        if s >= e {
            self.push_empty(EmptyKind::Classname, &variants, start, start + 1, out);
            return;
        }

        let token = self.token(s, e);

        if bytes[s] == b'[' {
            if let Some(close) = self.lexer.find_closing(s, e) {
                if close == e - 1 {
                    let node = match self.lexer.find_top_level_byte(b':', s + 1, close) {
                        Some(colon) => Node::CssDeclaration {
                            variants,
                            token,
                            key: self.token(s + 1, colon),
                            value: self.token(colon + 1, close),
                            important,
                        },
                        None => Node::ArbitraryClassname {
                            variants,
                            token,
                            expr: self.token(s + 1, close),
                            important,
                        },
                    };
                    out.push(node);
                    return;
                }
                if bytes[close + 1] == b'/' {
                    out.push(Node::ArbitraryClassname {
                        variants,
                        token,
                        expr: self.token(s + 1, close),
                        important,
                    });
                    return;
                }
            }
        }

        if let Some(open) = self.lexer.find_top_level_byte(b'[', s, e).filter(|&i| i > s) {
            if let Some(close) = self.lexer.find_closing(open, e) {
                let at_end = close == e - 1;
                if at_end || bytes[close + 1] == b'/' {
                    let node = match bytes[open - 1] {
                        b'/' if at_end => Node::ClassName {
                            variants,
                            token,
                            important,
                            opacity: Some(self.token(open, close + 1)),
                        },
                        b'-' => Node::ArbitraryClassname {
                            variants,
                            token,
                            expr: self.token(open + 1, close),
                            important,
                        },
                        b'/' => Node::ClassName {
                            variants,
                            token,
                            important,
                            opacity: None,
                        },
                        _ => Node::ShortCss {
                            variants,
                            token,
                            prop: self.token(s, open),
                            expr: self.token(open + 1, close),
                            important,
                        },
                    };
                    out.push(node);
                    return;
                }
            }
        }

        out.push(Node::ClassName {
            variants,
            token,
            important,
            opacity: None,
        });
    }
}
