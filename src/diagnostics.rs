//! Per-expression diagnostics, colors and hover info.
//!
//! [`Analyzer`] owns everything that lives for one design-system load: the
//! shared [`Searcher`], a [`Resolver`] with its caches, and the diagnostic
//! options. Every expression is parsed from scratch and analysed on its own;
//! a syntax error in one expression never stops the others.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use tracing::trace;

use crate::ast::{EmptyKind, Node, ParseResult, Selection};
use crate::color::{extract_colors, ColorDesc, ColorMatch};
use crate::config::{AnalyzerConfig, DiagnosticOptions};
use crate::conflict::{find_conflicts, to_kebab, ConflictPolicy};
use crate::design_system::{DesignSystem, RuleEntry};
use crate::fuzzy::{is_css_property, Searcher, SuggestKind};
use crate::parser::parse;
use crate::resolver::{Resolution, Resolver};
use crate::source::{find_expressions, Expression, ExpressionKind};
use crate::theme::{parse_theme_path, resolve_theme_functions};
use crate::token::{Token, TokenList};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    Syntax,
    UnknownVariant,
    UnknownClassName,
    InvalidToken,
    Conflict,
    EmptyGroup,
    EmptyClass,
    UndefinedTheme,
}

/// Replacement offered with an unknown-name diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub new_text: String,
}

/// One finding. `range` is in bytes of the text handed to the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub range: Range<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, severity: Severity, message: String, range: Range<usize>) -> Self {
        Self {
            kind,
            severity,
            message,
            range,
            suggestion: None,
        }
    }

    fn at(kind: DiagnosticKind, severity: Severity, message: String, token: &Token, offset: usize) -> Self {
        Self::new(kind, severity, message, offset + token.start..offset + token.end)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Swatch colors of a class-name leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassColor {
    pub range: Range<usize>,
    pub class_name: String,
    pub desc: ColorDesc,
}

/// What a hover position resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HoverTarget {
    Variant {
        name: String,
        arbitrary: bool,
        screen: bool,
    },
    ClassName {
        name: String,
        important: bool,
        rules: Vec<RuleEntry>,
    },
    CssProperty {
        property: String,
        value: String,
        important: bool,
    },
    Theme {
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hover {
    pub range: Range<usize>,
    pub target: HoverTarget,
}

pub struct Analyzer<'d> {
    design: &'d dyn DesignSystem,
    searcher: Arc<Searcher>,
    resolver: Resolver<'d>,
    options: DiagnosticOptions,
    separator: String,
}

impl<'d> Analyzer<'d> {
    /// Build an analyzer, indexing the design system's vocabulary.
    pub fn new(design: &'d dyn DesignSystem, config: &AnalyzerConfig) -> Self {
        let searcher = Arc::new(Searcher::build(design, config.fuzzy_threshold));
        Self::with_searcher(design, searcher, config)
    }

    /// Build an analyzer sharing an already-built searcher.
    pub fn with_searcher(design: &'d dyn DesignSystem, searcher: Arc<Searcher>, config: &AnalyzerConfig) -> Self {
        Self {
            design,
            searcher,
            resolver: Resolver::new(
                design,
                config.diagnostics.exemptions.clone(),
                config.cache_capacity,
            ),
            options: config.diagnostics.clone(),
            separator: config.separator.clone(),
        }
    }

    pub fn searcher(&self) -> &Arc<Searcher> {
        &self.searcher
    }

    pub fn options(&self) -> &DiagnosticOptions {
        &self.options
    }

    pub fn parse(&self, expression: &str) -> ParseResult {
        parse(expression, &self.separator)
    }

    /// Diagnostics for every expression embedded in `text`, in source order.
    pub fn validate_source(&mut self, text: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for expr in find_expressions(text) {
            diagnostics.extend(self.validate(&expr.value, expr.kind, expr.start));
        }
        diagnostics
    }

    /// Diagnostics for one expression whose text starts at byte `offset`.
    pub fn validate(&mut self, expression: &str, kind: ExpressionKind, offset: usize) -> Vec<Diagnostic> {
        match kind {
            ExpressionKind::TwinTheme => self.validate_theme(expression, offset),
            _ => {
                let result = self.parse(expression);
                self.validate_twin(&result, kind, offset)
            }
        }
    }

    fn validate_theme(&self, expression: &str, offset: usize) -> Vec<Diagnostic> {
        let path = parse_theme_path(expression);
        let mut out: Vec<Diagnostic> = path
            .errors
            .iter()
            .map(|err| {
                Diagnostic::new(
                    DiagnosticKind::Syntax,
                    Severity::Error,
                    err.message.clone(),
                    offset + err.start..offset + err.end,
                )
            })
            .collect();

        let keys = path.key_texts();
        if keys.is_empty() || self.design.get_theme(&keys).is_none() {
            out.push(Diagnostic::new(
                DiagnosticKind::UndefinedTheme,
                Severity::Error,
                "value is undefined".to_string(),
                offset..offset + expression.len(),
            ));
        }
        out
    }

    fn validate_twin(&mut self, result: &ParseResult, kind: ExpressionKind, offset: usize) -> Vec<Diagnostic> {
        let mut out = Vec::new();

        if let Some(error) = &result.error {
            out.push(Diagnostic::new(
                DiagnosticKind::Syntax,
                Severity::Error,
                error.message.clone(),
                offset + error.start..offset + error.end,
            ));
        }

        let mut checked_variants = HashSet::new();
        for leaf in result.leaves() {
            let unknown_variant = self.check_variants(leaf.variants(), offset, &mut checked_variants, &mut out);

            match (kind, leaf) {
                (ExpressionKind::Twin, Node::ClassName { variants, token, .. }) => {
                    let reported = self.check_class_name(variants, token, offset, &mut out);
                    if !reported && !unknown_variant {
                        self.check_resolution(leaf, token, offset, &mut out);
                    }
                }
                (ExpressionKind::Twin, Node::ArbitraryClassname { token, .. }) if !unknown_variant => {
                    self.check_resolution(leaf, token, offset, &mut out);
                }
                (ExpressionKind::TwinCssProperty, Node::ClassName { token, .. })
                | (ExpressionKind::TwinCssProperty, Node::ArbitraryClassname { token, .. }) => {
                    out.push(Diagnostic::at(
                        DiagnosticKind::InvalidToken,
                        Severity::Error,
                        format!("Invalid token '{}'", token.text),
                        token,
                        offset,
                    ));
                }
                _ => {}
            }
        }

        self.check_conflicts(result, kind, offset, &mut out);

        for empty in &result.empty_list {
            self.check_variants(&empty.variants, offset, &mut checked_variants, &mut out);
            match empty.kind {
                EmptyKind::Group if self.options.empty_group => out.push(Diagnostic::new(
                    DiagnosticKind::EmptyGroup,
                    Severity::Warning,
                    "forgot something?".to_string(),
                    offset + empty.start..offset + empty.end,
                )),
                EmptyKind::Classname if self.options.empty_class => out.push(Diagnostic::new(
                    DiagnosticKind::EmptyClass,
                    Severity::Warning,
                    "forgot something?".to_string(),
                    offset + empty.start..offset + empty.start + 1,
                )),
                _ => {}
            }
        }

        out
    }

    /// Report unknown variants once per span. Returns whether any was unknown.
    fn check_variants(
        &self,
        variants: &TokenList,
        offset: usize,
        checked: &mut HashSet<(usize, usize)>,
        out: &mut Vec<Diagnostic>,
    ) -> bool {
        let used = variants.texts();
        let mut unknown = false;
        for variant in variants {
            if self.design.is_known_variant(&variant.text, true) {
                continue;
            }
            unknown = true;
            if !checked.insert((variant.start, variant.end)) {
                continue;
            }
            let suggestion = self.searcher.suggest(SuggestKind::Variant, &used, &variant.text);
            out.push(Self::not_found(DiagnosticKind::UnknownVariant, variant, suggestion, offset));
        }
        unknown
    }

    /// Report an unknown class name. Returns whether a diagnostic was emitted.
    fn check_class_name(&self, variants: &TokenList, token: &Token, offset: usize, out: &mut Vec<Diagnostic>) -> bool {
        if token.text.is_empty() || self.design.is_known_class_name(&token.text) {
            return false;
        }
        let used = variants.texts();
        if self.resolver.is_exempt(&token.text, &used) {
            return false;
        }

        let suggestion = self.searcher.suggest(SuggestKind::Classname, &used, &token.text);
        if suggestion.as_deref() != Some(token.text.as_str()) {
            out.push(Self::not_found(DiagnosticKind::UnknownClassName, token, suggestion, offset));
            return true;
        }
        if is_css_property(&token.text) {
            out.push(Diagnostic::at(
                DiagnosticKind::InvalidToken,
                Severity::Error,
                format!("Invalid token '{}', missing square brackets?", token.text),
                token,
                offset,
            ));
            return true;
        }
        false
    }

    fn check_resolution(&mut self, leaf: &Node, token: &Token, offset: usize, out: &mut Vec<Diagnostic>) {
        if !self.options.report_unresolved {
            return;
        }
        if self.resolver.resolve_node(leaf) == Resolution::Unknown {
            out.push(Diagnostic::at(
                DiagnosticKind::InvalidToken,
                Severity::Error,
                format!("Invalid token '{}'", token.text),
                token,
                offset,
            ));
        }
    }

    fn check_conflicts(&mut self, result: &ParseResult, kind: ExpressionKind, offset: usize, out: &mut Vec<Diagnostic>) {
        let policy = self.options.conflict;
        for conflict in find_conflicts(&result.class_list, policy, kind, &mut self.resolver) {
            trace!(key = %conflict.key, tokens = conflict.tokens.len(), "Conflict");
            for token in &conflict.tokens {
                let message = match policy {
                    ConflictPolicy::Loose => format!("{} is conflicted", token.text),
                    _ => format!("{} is conflicted on property: {}", token.text, conflict.property),
                };
                out.push(Diagnostic::at(DiagnosticKind::Conflict, Severity::Warning, message, token, offset));
            }
        }
    }

    fn not_found(kind: DiagnosticKind, token: &Token, suggestion: Option<String>, offset: usize) -> Diagnostic {
        match suggestion {
            Some(new_text) => Diagnostic {
                suggestion: Some(Suggestion {
                    text: token.text.clone(),
                    new_text: new_text.clone(),
                }),
                ..Diagnostic::at(
                    kind,
                    Severity::Error,
                    format!("Can't find '{}', did you mean '{}'?", token.text, new_text),
                    token,
                    offset,
                )
            },
            None => Diagnostic::at(kind, Severity::Error, format!("Can't find '{}'", token.text), token, offset),
        }
    }

    /// Color literals inside arbitrary values and declarations of one expression.
    pub fn document_colors(&self, expression: &str, kind: ExpressionKind, offset: usize) -> Vec<ColorMatch> {
        if kind == ExpressionKind::TwinTheme {
            return Vec::new();
        }
        let result = self.parse(expression);
        let mut colors = Vec::new();
        for leaf in result.leaves() {
            let value = match leaf {
                Node::ShortCss { expr, .. } | Node::ArbitraryClassname { expr, .. } => expr,
                Node::CssDeclaration { value, .. } => value,
                _ => continue,
            };
            let base = offset + value.start;
            colors.extend(extract_colors(&value.text).into_iter().map(|m| ColorMatch {
                range: base + m.range.start..base + m.range.end,
                descriptor: m.descriptor,
            }));
        }
        colors
    }

    /// Swatch colors of the known class names of one expression.
    pub fn class_colors(&mut self, expression: &str, offset: usize) -> Vec<ClassColor> {
        let result = self.parse(expression);
        let mut colors = Vec::new();
        for leaf in result.leaves() {
            let Node::ClassName { token, .. } = leaf else {
                continue;
            };
            if let Some(desc) = self.resolver.color_desc(&token.text) {
                if !desc.is_empty() {
                    colors.push(ClassColor {
                        range: offset + token.start..offset + token.end,
                        class_name: token.text.clone(),
                        desc,
                    });
                }
            }
        }
        colors
    }

    /// [`Analyzer::document_colors`] over every expression in `text`.
    pub fn source_colors(&self, text: &str) -> Vec<ColorMatch> {
        find_expressions(text)
            .into_iter()
            .flat_map(|expr| self.document_colors(&expr.value, expr.kind, expr.start))
            .collect()
    }

    /// Describe what is under byte `position` of `text` inside `expr`.
    pub fn hover(&mut self, expr: &Expression, position: usize) -> Option<Hover> {
        if position < expr.start || position > expr.end {
            return None;
        }

        if expr.kind == ExpressionKind::TwinTheme {
            let path = parse_theme_path(&expr.value);
            if !path.errors.is_empty() || path.keys.is_empty() {
                return None;
            }
            let css = self.design.get_theme(&path.key_texts())?.to_css()?;
            let root = self.design.get_theme(&[]);
            let value = match root {
                Some(theme) if theme.as_map().is_some() => resolve_theme_functions(&css, theme),
                _ => css,
            };
            return Some(Hover {
                range: expr.start..expr.end,
                target: HoverTarget::Theme { value },
            });
        }

        let result = self.parse(&expr.value);
        let selection = result.locate(position - expr.start)?;
        let offset = expr.start;

        match selection {
            Selection::Variant { token, arbitrary } => {
                if expr.kind != ExpressionKind::Twin {
                    return None;
                }
                Some(Hover {
                    range: offset + token.start..offset + token.end,
                    target: HoverTarget::Variant {
                        name: token.text.clone(),
                        arbitrary,
                        screen: self.design.is_screen(&token.text),
                    },
                })
            }
            Selection::Leaf { node, value, important } => {
                let token = node.token()?;
                let range = offset + token.start..offset + token.end;
                if let Some(prop) = node.css_property() {
                    let value = match node {
                        Node::CssDeclaration { value, .. } => value.text.clone(),
                        Node::ShortCss { expr, .. } => expr.text.clone(),
                        _ => value,
                    };
                    return Some(Hover {
                        range,
                        target: HoverTarget::CssProperty {
                            property: to_kebab(&prop.text),
                            value,
                            important,
                        },
                    });
                }
                if expr.kind != ExpressionKind::Twin {
                    return None;
                }
                let rules = self.resolver.rules_for(&[], &value)?;
                Some(Hover {
                    range,
                    target: HoverTarget::ClassName {
                        name: value,
                        important,
                        rules,
                    },
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design_system::{DesignSystemData, StaticDesignSystem};

    fn design() -> StaticDesignSystem {
        let data: DesignSystemData = serde_json::from_str(
            r##"{
                "variants": {
                    "sm": ["@media (min-width: 640px)"],
                    "md": ["@media (min-width: 768px)"]
                },
                "classnames": {
                    "flex": [{ "decls": { "display": ["flex"] } }],
                    "block": [{ "decls": { "display": ["block"] } }],
                    "underline": [{ "decls": { "text-decoration-line": ["underline"] } }],
                    "text-red-500": [{ "decls": { "color": ["#ef4444"] } }],
                    "text-blue-500": [{ "decls": { "color": ["#3b82f6"] } }],
                    "p-4": [{ "decls": { "padding": ["1rem"] } }]
                },
                "arbitrary": { "bg": ["background-color"] },
                "theme": {
                    "colors": { "red": { "500": "#ef4444" } },
                    "spacing": { "4": "1rem" }
                }
            }"##,
        )
        .unwrap();
        StaticDesignSystem::new(data)
    }

    fn messages(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_clean_expression() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        assert!(analyzer.validate("sm:flex hover:underline", ExpressionKind::Twin, 0).is_empty());
    }

    #[test]
    fn test_unknown_variant_and_class_name() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("hoverr:flex flexx", ExpressionKind::Twin, 10);
        assert_eq!(
            messages(&found),
            vec![
                "Can't find 'hoverr', did you mean 'hover'?",
                "Can't find 'flexx', did you mean 'flex'?",
            ]
        );
        assert_eq!(found[0].range, 10..16);
        assert_eq!(found[0].kind, DiagnosticKind::UnknownVariant);
        assert_eq!(
            found[1].suggestion,
            Some(Suggestion {
                text: "flexx".to_string(),
                new_text: "flex".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_variant_reported_once_per_span() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("zzqq:(flex underline)", ExpressionKind::Twin, 0);
        assert_eq!(messages(&found), vec!["Can't find 'zzqq'"]);
    }

    #[test]
    fn test_missing_square_brackets() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("color", ExpressionKind::Twin, 0);
        assert_eq!(messages(&found), vec!["Invalid token 'color', missing square brackets?"]);
    }

    #[test]
    fn test_conflict_messages_per_token() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("text-red-500 text-blue-500", ExpressionKind::Twin, 0);
        assert_eq!(
            messages(&found),
            vec![
                "text-red-500 is conflicted on property: color",
                "text-blue-500 is conflicted on property: color",
            ]
        );
        assert!(found.iter().all(|d| d.severity == Severity::Warning));

        let mut config = AnalyzerConfig::default();
        config.diagnostics.conflict = ConflictPolicy::Loose;
        let mut analyzer = Analyzer::new(&ds, &config);
        let found = analyzer.validate("flex block", ExpressionKind::Twin, 0);
        assert_eq!(messages(&found), vec!["flex is conflicted", "block is conflicted"]);
    }

    #[test]
    fn test_css_property_expression() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("[color:red] color[blue] flex", ExpressionKind::TwinCssProperty, 0);
        assert_eq!(
            messages(&found),
            vec![
                "Invalid token 'flex'",
                "[color:red] is conflicted on property: color",
                "color[blue] is conflicted on property: color",
            ]
        );
    }

    #[test]
    fn test_empty_markers_and_options() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("sm: flex :", ExpressionKind::Twin, 0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].kind, DiagnosticKind::EmptyGroup);
        assert_eq!(found[1].kind, DiagnosticKind::EmptyClass);
        assert_eq!(found[1].range.len(), 1);

        let mut config = AnalyzerConfig::default();
        config.diagnostics.empty_group = false;
        config.diagnostics.empty_class = false;
        let mut analyzer = Analyzer::new(&ds, &config);
        assert!(analyzer.validate("sm: flex :", ExpressionKind::Twin, 0).is_empty());
    }

    #[test]
    fn test_syntax_error_keeps_other_findings() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let found = analyzer.validate("flexx bg-[red", ExpressionKind::Twin, 0);
        assert_eq!(found[0].kind, DiagnosticKind::Syntax);
        assert_eq!(found[0].message, "missing closing bracket");
        assert_eq!(found[1].kind, DiagnosticKind::UnknownClassName);
    }

    #[test]
    fn test_exemptions_and_unresolved_reporting() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        assert!(analyzer.validate("md:container", ExpressionKind::Twin, 0).is_empty());
        assert!(analyzer.validate("bg-[#fff] zz-[1px]", ExpressionKind::Twin, 0).is_empty());

        let mut config = AnalyzerConfig::default();
        config.diagnostics.report_unresolved = true;
        let mut analyzer = Analyzer::new(&ds, &config);
        let found = analyzer.validate("bg-[#fff] zz-[1px]", ExpressionKind::Twin, 0);
        assert_eq!(messages(&found), vec!["Invalid token 'zz-[1px]'"]);
    }

    #[test]
    fn test_theme_expressions() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        assert!(analyzer.validate("colors.red.500", ExpressionKind::TwinTheme, 0).is_empty());
        let found = analyzer.validate("colors.blue", ExpressionKind::TwinTheme, 4);
        assert_eq!(messages(&found), vec!["value is undefined"]);
        assert_eq!(found[0].range, 4..15);
    }

    #[test]
    fn test_validate_source_uses_absolute_offsets() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let text = "const A = tw`flex flexx`\n";
        let found = analyzer.validate_source(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].range.clone()], "flexx");
    }

    #[test]
    fn test_document_and_class_colors() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let text = "tw`bg-[#ff0000] [color:red] text-red-500`";
        let colors = analyzer.source_colors(text);
        assert_eq!(colors.len(), 2);
        assert_eq!(&text[colors[0].range.clone()], "#ff0000");
        assert_eq!(&text[colors[1].range.clone()], "red");

        let swatches = analyzer.class_colors("flex text-red-500", 0);
        assert_eq!(swatches.len(), 1);
        assert_eq!(swatches[0].range, 5..17);
        assert_eq!(swatches[0].desc.color.as_deref(), Some("#ef4444"));
    }

    #[test]
    fn test_hover() {
        let ds = design();
        let mut analyzer = Analyzer::new(&ds, &AnalyzerConfig::default());
        let text = "tw`sm:p-4 [color:red]`";
        let expr = find_expressions(text).remove(0);

        let hover = analyzer.hover(&expr, 4).unwrap();
        assert!(matches!(hover.target, HoverTarget::Variant { ref name, screen: true, .. } if name == "sm"));

        let hover = analyzer.hover(&expr, 7).unwrap();
        assert_eq!(&text[hover.range.clone()], "p-4");
        assert!(matches!(hover.target, HoverTarget::ClassName { ref rules, .. } if rules.len() == 1));

        let hover = analyzer.hover(&expr, 13).unwrap();
        assert_eq!(
            hover.target,
            HoverTarget::CssProperty {
                property: "color".to_string(),
                value: "red".to_string(),
                important: false,
            }
        );

        let theme = find_expressions("theme`spacing.4`").remove(0);
        let hover = analyzer.hover(&theme, 8).unwrap();
        assert_eq!(hover.target, HoverTarget::Theme { value: "1rem".to_string() });
    }
}
