use serde::{Deserialize, Serialize};

use crate::token::{Token, TokenList};

/// What was left unfinished at an [`EmptyNode`] location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyKind {
    Group,
    Classname,
}

/// A place where a variant or group was opened but nothing followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyNode {
    pub kind: EmptyKind,
    pub variants: TokenList,
    pub start: usize,
    pub end: usize,
}

/// One node of a parsed twin expression.
///
/// `variants` always holds the full accumulated prefix in source order,
/// including variants inherited from enclosing groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    ClassName {
        variants: TokenList,
        token: Token,
        important: bool,
        /// Bracketed opacity suffix, e.g. `[.5]` in `bg-red-500/[.5]`.
        opacity: Option<Token>,
    },
    CssDeclaration {
        variants: TokenList,
        token: Token,
        key: Token,
        value: Token,
        important: bool,
    },
    ArbitraryClassname {
        variants: TokenList,
        token: Token,
        expr: Token,
        important: bool,
    },
    ShortCss {
        variants: TokenList,
        token: Token,
        prop: Token,
        expr: Token,
        important: bool,
    },
    Group {
        variants: TokenList,
        token: Token,
        children: Vec<Node>,
        important: bool,
    },
    Empty(EmptyNode),
}

impl Node {
    pub fn variants(&self) -> &TokenList {
        match self {
            Node::ClassName { variants, .. }
            | Node::CssDeclaration { variants, .. }
            | Node::ArbitraryClassname { variants, .. }
            | Node::ShortCss { variants, .. }
            | Node::Group { variants, .. } => variants,
            Node::Empty(empty) => &empty.variants,
        }
    }

    /// The span covering the whole node (base part only for leaves).
    pub fn token(&self) -> Option<&Token> {
        match self {
            Node::ClassName { token, .. }
            | Node::CssDeclaration { token, .. }
            | Node::ArbitraryClassname { token, .. }
            | Node::ShortCss { token, .. }
            | Node::Group { token, .. } => Some(token),
            Node::Empty(_) => None,
        }
    }

    pub fn is_important(&self) -> bool {
        match self {
            Node::ClassName { important, .. }
            | Node::CssDeclaration { important, .. }
            | Node::ArbitraryClassname { important, .. }
            | Node::ShortCss { important, .. }
            | Node::Group { important, .. } => *important,
            Node::Empty(_) => false,
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Node::Group { .. } | Node::Empty(_))
    }

    /// Name used for rule lookup: the class text, minus a bracketed opacity suffix.
    pub fn lookup_name(&self) -> Option<&str> {
        match self {
            Node::ClassName { token, opacity, .. } => match opacity {
                Some(op) => {
                    let keep = op.start.saturating_sub(token.start + 1);
                    Some(&token.text[..keep.min(token.text.len())])
                }
                None => Some(token.text.as_str()),
            },
            Node::ArbitraryClassname { token, .. } => Some(token.text.as_str()),
            _ => None,
        }
    }

    /// CSS property name of declaration-like leaves.
    pub fn css_property(&self) -> Option<&Token> {
        match self {
            Node::CssDeclaration { key, .. } => Some(key),
            Node::ShortCss { prop, .. } => Some(prop),
            _ => None,
        }
    }
}

/// A syntax error found while parsing one expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseError {
    pub message: String,
    pub start: usize,
    pub end: usize,
}

/// What the cursor is on, for hover producers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    Variant {
        token: &'a Token,
        arbitrary: bool,
    },
    Leaf {
        node: &'a Node,
        /// Canonical lookup key (opacity suffix removed where applicable).
        value: String,
        important: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    pub class_list: Vec<Node>,
    pub empty_list: Vec<EmptyNode>,
    pub error: Option<ParseError>,
}

impl ParseResult {
    /// Leaves in source order, with groups flattened depth-first.
    pub fn leaves(&self) -> Vec<&Node> {
        leaves_of(&self.class_list)
    }

    pub fn is_empty(&self) -> bool {
        self.class_list.is_empty() && self.empty_list.is_empty()
    }

    /// Find the variant or leaf under the byte `offset`.
    pub fn locate(&self, offset: usize) -> Option<Selection<'_>> {
        for leaf in self.leaves() {
            for variant in leaf.variants() {
                if variant.contains(offset) {
                    return Some(Selection::Variant {
                        token: variant,
                        arbitrary: variant.text.ends_with(']'),
                    });
                }
            }
            let token = leaf.token()?;
            if token.contains(offset) {
                let value = leaf
                    .lookup_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| token.text.clone());
                return Some(Selection::Leaf {
                    node: leaf,
                    value,
                    important: leaf.is_important(),
                });
            }
        }
        for empty in &self.empty_list {
            for variant in &empty.variants {
                if variant.contains(offset) {
                    return Some(Selection::Variant {
                        token: variant,
                        arbitrary: variant.text.ends_with(']'),
                    });
                }
            }
        }
        None
    }
}

/// Strip a numeric or bracketed opacity suffix (`text-red-500/50` → `text-red-500`).
///
/// Hover producers fall back to this key when the full name renders nothing.
pub fn canonical_class_name(name: &str) -> String {
    if let Some(i) = name.rfind('/') {
        let next = name.as_bytes().get(i + 1).copied();
        if matches!(next, Some(b'[') | Some(b'0'..=b'9')) {
            return name[..i].to_string();
        }
    }
    name.to_string()
}

/// Leaves of `nodes` in source order, with groups flattened depth-first.
pub fn leaves_of(nodes: &[Node]) -> Vec<&Node> {
    let mut out = Vec::new();
    collect_leaves(nodes, &mut out);
    out
}

fn collect_leaves<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
    for node in nodes {
        match node {
            Node::Group { children, .. } => collect_leaves(children, out),
            Node::Empty(_) => {}
            leaf => out.push(leaf),
        }
    }
}
