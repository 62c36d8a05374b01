//! Typed theme tree and theme path handling.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ast::ParseError;
use crate::token::Token;

/// A node of the resolved theme: a leaf value, an array or a nested map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeValue {
    Text(String),
    Number(f64),
    Array(Vec<ThemeValue>),
    Map(IndexMap<String, ThemeValue>),
}

impl Default for ThemeValue {
    fn default() -> Self {
        ThemeValue::Map(IndexMap::new())
    }
}

impl ThemeValue {
    /// Walk `path` from this node. Array segments are numeric indices.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&ThemeValue> {
        let mut node = self;
        for key in path {
            let key = key.as_ref();
            node = match node {
                ThemeValue::Map(map) => map.get(key)?,
                ThemeValue::Array(items) => items.get(key.parse::<usize>().ok()?)?,
                ThemeValue::Text(_) | ThemeValue::Number(_) => return None,
            };
        }
        Some(node)
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ThemeValue>> {
        match self {
            ThemeValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Leaf value rendered as CSS text. A map renders its `DEFAULT` entry;
    /// an array renders its items joined by `", "`.
    pub fn to_css(&self) -> Option<String> {
        match self {
            ThemeValue::Text(text) => Some(text.clone()),
            ThemeValue::Number(n) => Some(format_number(*n)),
            ThemeValue::Array(items) => {
                let parts: Vec<String> = items.iter().filter_map(ThemeValue::to_css).collect();
                Some(parts.join(", "))
            }
            ThemeValue::Map(map) => map.get("DEFAULT").and_then(ThemeValue::to_css),
        }
    }

    /// Dashed names of every leaf below this node, e.g. `red-500`.
    ///
    /// A `DEFAULT` key names its parent; arrays are not descended into.
    pub fn leaf_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Some(root) = self.as_map() else {
            return names;
        };

        let mut stack = vec![(String::new(), root.iter())];
        loop {
            let next = match stack.last_mut() {
                Some((prefix, iter)) => iter.next().map(|(k, v)| (prefix.clone(), k, v)),
                None => break,
            };
            let Some((prefix, key, value)) = next else {
                stack.pop();
                continue;
            };

            if key == "DEFAULT" {
                let name = prefix.trim_end_matches('-');
                if !name.is_empty() {
                    names.push(name.to_string());
                }
                continue;
            }
            match value {
                ThemeValue::Text(_) | ThemeValue::Number(_) => names.push(format!("{prefix}{key}")),
                ThemeValue::Array(_) => {}
                ThemeValue::Map(map) => stack.push((format!("{prefix}{key}-"), map.iter())),
            }
        }
        names
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Keys of a theme path expression such as `colors.red[500]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemePath {
    pub keys: Vec<Token>,
    pub errors: Vec<ParseError>,
}

impl ThemePath {
    pub fn key_texts(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.text.as_str()).collect()
    }
}

/// Parse `a.b[c].d` into keys. Bracketed keys may contain dots (`spacing[2.5]`).
pub fn parse_theme_path(input: &str) -> ThemePath {
    let bytes = input.as_bytes();
    let mut path = ThemePath::default();
    let mut pos = 0;
    let end = input.len();

    while pos < end && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    let mut trimmed_end = end;
    while trimmed_end > pos && bytes[trimmed_end - 1].is_ascii_whitespace() {
        trimmed_end -= 1;
    }

    let mut key_start = pos;
    let mut expect_key = true;
    while pos < trimmed_end {
        match bytes[pos] {
            b'.' => {
                if expect_key && key_start == pos {
                    path.errors.push(ParseError {
                        message: "invalid key".to_string(),
                        start: pos,
                        end: pos + 1,
                    });
                } else if key_start < pos {
                    path.keys.push(Token::from_source(input, key_start, pos));
                }
                pos += 1;
                key_start = pos;
                expect_key = true;
            }
            b'[' => {
                if key_start < pos {
                    path.keys.push(Token::from_source(input, key_start, pos));
                }
                let Some(close) = input[pos + 1..trimmed_end].find(']').map(|i| pos + 1 + i) else {
                    path.errors.push(ParseError {
                        message: "missing closing bracket".to_string(),
                        start: pos,
                        end: trimmed_end,
                    });
                    return path;
                };
                if close == pos + 1 {
                    path.errors.push(ParseError {
                        message: "invalid key".to_string(),
                        start: pos,
                        end: close + 1,
                    });
                } else {
                    path.keys.push(Token::from_source(input, pos + 1, close));
                }
                pos = close + 1;
                key_start = pos;
                expect_key = false;
            }
            c if c.is_ascii_whitespace() => {
                path.errors.push(ParseError {
                    message: "unexpected whitespace".to_string(),
                    start: pos,
                    end: pos + 1,
                });
                return path;
            }
            _ => {
                pos += 1;
            }
        }
    }

    if key_start < trimmed_end {
        path.keys.push(Token::from_source(input, key_start, trimmed_end));
    } else if expect_key && !path.keys.is_empty() {
        path.errors.push(ParseError {
            message: "invalid key".to_string(),
            start: trimmed_end.saturating_sub(1),
            end: trimmed_end,
        });
    }
    path
}

static THEME_FUNCTION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"theme\(\s*['"]?([^'"()]*?)['"]?\s*\)"#).unwrap());

/// Replace `theme(path)` calls in a CSS value with their theme values.
///
/// Calls whose path is malformed or undefined are left untouched.
pub fn resolve_theme_functions(value: &str, theme: &ThemeValue) -> String {
    THEME_FUNCTION_REGEX
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let path = parse_theme_path(&caps[1]);
            if !path.errors.is_empty() || path.keys.is_empty() {
                return caps[0].to_string();
            }
            theme
                .get(&path.key_texts())
                .and_then(ThemeValue::to_css)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
