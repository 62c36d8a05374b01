//! Locating twin expressions inside host source text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What an embedded expression contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    /// Class names, e.g. ``tw`flex p-4` `` or `tw="flex"`
    Twin,
    /// CSS properties only, e.g. ``cs`[color:red]` ``
    TwinCssProperty,
    /// A theme path, e.g. ``theme`colors.red.500` ``
    TwinTheme,
}

/// One expression found in source text. Offsets cover the inner value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub start: usize,
    pub end: usize,
    pub value: String,
}

static EXPRESSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"\b(?P<tag>tw|cs|theme)"#,
        r#"(?:(?:\.[A-Za-z][\w]*|\([^()`]*\))?`(?P<tpl>[^`]*)`"#,
        r#"|=(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)'"#,
        r#"|\{\s*(?:"(?P<bdq>[^"]*)"|'(?P<bsq>[^']*)'|`(?P<btpl>[^`$]*)`)\s*\}))"#,
    ))
    .unwrap()
});

/// Find every expression in `text`, in source order.
pub fn find_expressions(text: &str) -> Vec<Expression> {
    let mut found = Vec::new();
    for caps in EXPRESSION_REGEX.captures_iter(text) {
        let kind = match &caps["tag"] {
            "tw" => ExpressionKind::Twin,
            "cs" => ExpressionKind::TwinCssProperty,
            _ => ExpressionKind::TwinTheme,
        };
        let template = caps.name("tpl");
        if kind == ExpressionKind::TwinTheme && template.is_none() {
            continue;
        }
        let Some(value) = template
            .or_else(|| caps.name("dq"))
            .or_else(|| caps.name("sq"))
            .or_else(|| caps.name("bdq"))
            .or_else(|| caps.name("bsq"))
            .or_else(|| caps.name("btpl"))
        else {
            continue;
        };
        found.push(Expression {
            kind,
            start: value.start(),
            end: value.end(),
            value: value.as_str().to_string(),
        });
    }
    found
}

/// 1-based line and column of a byte offset.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    (line, offset - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_template_and_attribute_forms() {
        let text = r#"const A = tw.div`flex p-4`
<div tw="text-red-500" css={cs`[color:red]`} />
<span tw={"hover:underline"} />
const c = theme`colors.red.500`
"#;
        let found = find_expressions(text);
        let kinds: Vec<_> = found.iter().map(|e| (e.kind, e.value.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (ExpressionKind::Twin, "flex p-4"),
                (ExpressionKind::Twin, "text-red-500"),
                (ExpressionKind::TwinCssProperty, "[color:red]"),
                (ExpressionKind::Twin, "hover:underline"),
                (ExpressionKind::TwinTheme, "colors.red.500"),
            ]
        );
        for e in &found {
            assert_eq!(&text[e.start..e.end], e.value);
        }
    }

    #[test]
    fn test_ignores_lookalikes() {
        let found = find_expressions("const stw = `flex`; theme=\"dark\"; newtw`a`");
        assert!(found.is_empty());
    }

    #[test]
    fn test_line_col() {
        let text = "ab\ncd\nef";
        assert_eq!(line_col(text, 0), (1, 1));
        assert_eq!(line_col(text, 4), (2, 2));
        assert_eq!(line_col(text, 6), (3, 1));
    }
}
