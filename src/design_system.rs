//! Read-only design-system interface and a serde-loaded implementation.
//!
//! The analyzer never owns the design system; it only queries it through
//! [`DesignSystem`]. [`StaticDesignSystem`] answers those queries from a
//! pre-resolved description loaded from JSON or YAML.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::errors::{AnalyzerError, Result};
use crate::theme::ThemeValue;

/// Where a rule was declared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    Components,
    #[default]
    Utilities,
    Base,
    #[serde(other)]
    Custom,
}

/// Pre-resolved description of the declarations a class name expands to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleEntry {
    /// Property to values, in declaration order
    pub decls: IndexMap<String, Vec<String>>,

    pub source: RuleSource,

    /// Enclosing at-rules, e.g. `@media (min-width: 640px)`
    pub context: Vec<String>,

    /// Selector remainder outside the class itself
    pub scope: String,

    /// Pseudo selectors attached to the class
    pub pseudo: Vec<String>,
}

impl RuleEntry {
    pub fn utility<I, K, V>(decls: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map: IndexMap<String, Vec<String>> = IndexMap::new();
        for (prop, value) in decls {
            map.entry(prop.into()).or_default().push(value.into());
        }
        Self {
            decls: map,
            ..Self::default()
        }
    }
}

/// Names the fuzzy matcher indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub variants: Vec<String>,
    pub class_names: Vec<String>,
}

/// Queries the analyzer needs answered by a design-system configuration.
pub trait DesignSystem: Send + Sync {
    /// Candidate rules for `name` under `variants`, or `None` when the name
    /// does not generate anything. With `exact == false` the configured
    /// prefix may be omitted from `name`.
    fn resolve_rule(&self, variants: &[&str], exact: bool, name: &str) -> Option<Vec<RuleEntry>>;

    fn is_known_variant(&self, name: &str, include_arbitrary: bool) -> bool;

    fn is_known_class_name(&self, name: &str) -> bool;

    fn get_theme(&self, path: &[&str]) -> Option<&ThemeValue>;

    fn vocabulary(&self) -> Vocabulary;

    /// Whether `name` is a responsive (screen width) variant.
    fn is_screen(&self, _name: &str) -> bool {
        false
    }

    fn prefix(&self) -> &str {
        ""
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    #[default]
    Media,
    Class,
}

/// Serialized form of a design system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignSystemData {
    /// Class name prefix, e.g. `tw-`
    pub prefix: String,

    pub dark_mode: DarkMode,

    /// Variant name to the scopes it produces
    pub variants: IndexMap<String, Vec<String>>,

    /// Class name to its candidate rules
    pub classnames: IndexMap<String, Vec<RuleEntry>>,

    /// Variant prefixes accepting a bracketed value, e.g. `supports` in `supports-[display:grid]`
    pub arbitrary_variants: Vec<String>,

    /// Class prefixes accepting a bracketed value, mapped to the properties they set
    pub arbitrary: IndexMap<String, Vec<String>>,

    pub theme: ThemeValue,

    /// Register the built-in twin variants
    pub builtin_variants: bool,
}

impl Default for DesignSystemData {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            dark_mode: DarkMode::Media,
            variants: IndexMap::new(),
            classnames: IndexMap::new(),
            arbitrary_variants: Vec::new(),
            arbitrary: IndexMap::new(),
            theme: ThemeValue::default(),
            builtin_variants: true,
        }
    }
}

impl DesignSystemData {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::DesignSystemError {
            message: format!("Failed to read design system {}: {}", path.display(), e),
        })?;

        serde_yaml::from_str(&content).map_err(|e| AnalyzerError::DesignSystemError {
            message: format!("Failed to parse YAML design system: {}", e),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::DesignSystemError {
            message: format!("Failed to read design system {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| AnalyzerError::DesignSystemError {
            message: format!("Failed to parse JSON design system: {}", e),
        })
    }

    /// Load from a file, picking the format by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(AnalyzerError::DesignSystemError {
                message: format!(
                    "Unsupported design system format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }
}

static SCREEN_WIDTH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@media\s+\(.*width:\s*(\d+)px").unwrap());

/// Built-in twin variants, registered after the configured ones.
const TWIN_VARIANTS: &[(&str, &[&str])] = &[
    // @media
    ("dark", &["@media (prefers-color-scheme: dark)"]),
    ("light", &["@media (prefers-color-scheme: light)"]),
    ("screen", &["@media screen"]),
    ("print", &["@media print"]),
    ("landscape", &["@media (orientation: landscape)"]),
    ("portrait", &["@media (orientation: portrait)"]),
    ("any-pointer-none", &["@media (any-pointer: none)"]),
    ("any-pointer-fine", &["@media (any-pointer: fine)"]),
    ("any-pointer-coarse", &["@media (any-pointer: coarse)"]),
    ("pointer-none", &["@media (pointer: none)"]),
    ("pointer-fine", &["@media (pointer: fine)"]),
    ("pointer-coarse", &["@media (pointer: coarse)"]),
    ("any-hover", &["@media (any-hover: hover)"]),
    ("any-hover-none", &["@media (any-hover: none)"]),
    ("can-hover", &["@media (hover: hover)"]),
    ("cant-hover", &["@media (hover: none)"]),
    ("motion-reduce", &["@media (prefers-reduced-motion: reduce)"]),
    ("motion-safe", &["@media (prefers-reduced-motion: no-preference)"]),
    // direction
    ("ltr", &["[dir='ltr']"]),
    ("rtl", &["[dir='rtl']"]),
    // selector
    ("all", &["*"]),
    ("svg", &["svg"]),
    ("sibling", &["~ *"]),
    ("all-child", &["> *"]),
    // not
    ("not-first", &[":not(:first-child)"]),
    ("not-last", &[":not(:last-child)"]),
    ("not-only", &[":not(:only-child)"]),
    ("not-first-of-type", &[":not(:first-of-type)"]),
    ("not-last-of-type", &[":not(:last-of-type)"]),
    ("not-only-of-type", &[":not(:only-of-type)"]),
    ("not-checked", &[":not(:checked)"]),
    ("not-disabled", &[":not(:disabled)"]),
    // pseudo classes
    ("first", &[":first-child"]),
    ("last", &[":last-child"]),
    ("only", &[":only-child"]),
    ("even", &[":nth-child(even)"]),
    ("odd", &[":nth-child(odd)"]),
    ("first-of-type", &[":first-of-type"]),
    ("last-of-type", &[":last-of-type"]),
    ("only-of-type", &[":only-of-type"]),
    ("hover", &[":hover"]),
    ("focus", &[":focus"]),
    ("disabled", &[":disabled"]),
    ("active", &[":active"]),
    ("target", &[":target"]),
    ("visited", &[":visited"]),
    ("default", &[":default"]),
    ("checked", &[":checked"]),
    ("indeterminate", &[":indeterminate"]),
    ("placeholder-shown", &[":placeholder-shown"]),
    ("autofill", &[":autofill"]),
    ("focus-within", &[":focus-within"]),
    ("focus-visible", &[":focus-visible"]),
    ("required", &[":required"]),
    ("valid", &[":valid"]),
    ("invalid", &[":invalid"]),
    ("in-range", &[":in-range"]),
    ("out-of-range", &[":out-of-range"]),
    ("read-only", &[":read-only"]),
    ("empty", &[":empty"]),
    // pseudo elements
    ("first-letter", &["::first-letter"]),
    ("first-line", &["::first-line"]),
    ("marker", &["::marker"]),
    ("selection", &["::selection"]),
    ("before", &["::before"]),
    ("after", &["::after"]),
    // group
    ("group-first", &[".group:first-child"]),
    ("group-last", &[".group:last-child"]),
    ("group-only", &[".group:only-child"]),
    ("group-even", &[".group:nth-child(even)"]),
    ("group-odd", &[".group:nth-child(odd)"]),
    ("group-first-of-type", &[".group:first-of-type"]),
    ("group-last-of-type", &[".group:last-of-type"]),
    ("group-only-of-type", &[".group:only-of-type"]),
    ("group-hover", &[".group:hover"]),
    ("group-focus", &[".group:focus"]),
    ("group-disabled", &[".group:disabled"]),
    ("group-active", &[".group:active"]),
    ("group-target", &[".group:target"]),
    ("group-visited", &[".group:visited"]),
    ("group-default", &[".group:default"]),
    ("group-checked", &[".group:checked"]),
    ("group-indeterminate", &[".group:indeterminate"]),
    ("group-placeholder-shown", &[".group:placeholder-shown"]),
    ("group-autofill", &[".group:autofill"]),
    ("group-focus-within", &[".group:focus-within"]),
    ("group-focus-visible", &[".group:focus-visible"]),
    ("group-required", &[".group:required"]),
    ("group-valid", &[".group:valid"]),
    ("group-invalid", &[".group:invalid"]),
    ("group-in-range", &[".group:in-range"]),
    ("group-out-of-range", &[".group:out-of-range"]),
    ("group-read-only", &[".group:read-only"]),
    ("group-empty", &[".group:empty"]),
    // peer
    ("peer-first", &[".peer:first-child ~"]),
    ("peer-last", &[".peer:last-child ~"]),
    ("peer-only", &[".peer:only-child ~"]),
    ("peer-even", &[".peer:nth-child(even) ~"]),
    ("peer-odd", &[".peer:nth-child(odd) ~"]),
    ("peer-first-of-type", &[".peer:first-of-type ~"]),
    ("peer-last-of-type", &[".peer:last-of-type ~"]),
    ("peer-only-of-type", &[".peer:only-of-type ~"]),
    ("peer-hover", &[".peer:hover ~"]),
    ("peer-focus", &[".peer:focus ~"]),
    ("peer-disabled", &[".peer:disabled ~"]),
    ("peer-active", &[".peer:active ~"]),
    ("peer-target", &[".peer:target ~"]),
    ("peer-visited", &[".peer:visited ~"]),
    ("peer-default", &[".peer:default ~"]),
    ("peer-checked", &[".peer:checked ~"]),
    ("peer-indeterminate", &[".peer:indeterminate ~"]),
    ("peer-placeholder-shown", &[".peer:placeholder-shown ~"]),
    ("peer-autofill", &[".peer:autofill ~"]),
    ("peer-focus-within", &[".peer:focus-within ~"]),
    ("peer-focus-visible", &[".peer:focus-visible ~"]),
    ("peer-required", &[".peer:required ~"]),
    ("peer-valid", &[".peer:valid ~"]),
    ("peer-invalid", &[".peer:invalid ~"]),
    ("peer-in-range", &[".peer:in-range ~"]),
    ("peer-out-of-range", &[".peer:out-of-range ~"]),
    ("peer-read-only", &[".peer:read-only ~"]),
    ("peer-empty", &[".peer:empty ~"]),
    // others
    ("even-of-type", &[":nth-of-type(even)"]),
    ("odd-of-type", &[":nth-of-type(odd)"]),
    ("enabled", &[":enabled"]),
    ("link", &[":link"]),
    ("optional", &[":optional"]),
    ("read-write", &[":read-write"]),
    ("placeholder", &["::placeholder"]),
    ("hocus", &[":hover", ":focus"]),
    ("group-hocus", &[".group:hover", ".group:focus"]),
    ("peer-hocus", &[".peer:hover ~", ".peer:focus ~"]),
];

/// In-memory design system built from [`DesignSystemData`].
#[derive(Debug, Clone)]
pub struct StaticDesignSystem {
    prefix: String,
    variants: IndexMap<String, Vec<String>>,
    classnames: IndexMap<String, Vec<RuleEntry>>,
    arbitrary_variants: Vec<String>,
    arbitrary: IndexMap<String, Vec<String>>,
    theme: ThemeValue,
    /// Responsive variants ordered by pixel width
    screens: IndexMap<String, u32>,
    color_names: Vec<String>,
    opacity_keys: Vec<String>,
}

impl StaticDesignSystem {
    pub fn new(data: DesignSystemData) -> Self {
        let DesignSystemData {
            prefix,
            dark_mode,
            mut variants,
            mut classnames,
            arbitrary_variants,
            arbitrary,
            theme,
            builtin_variants,
        } = data;

        if builtin_variants {
            for (name, scopes) in TWIN_VARIANTS {
                if !variants.contains_key(*name) {
                    variants.insert(name.to_string(), scopes.iter().map(|s| s.to_string()).collect());
                }
            }
        }

        if dark_mode == DarkMode::Class {
            classnames.shift_remove(&format!("{prefix}dark"));
            variants.insert("dark".to_string(), vec![".dark".to_string()]);
            variants.insert("light".to_string(), vec![".light".to_string()]);
        }
        classnames.shift_remove(&format!("{prefix}group"));

        let screens = collect_screens(&variants);
        let color_names = theme
            .get(&["colors"])
            .map(ThemeValue::leaf_names)
            .unwrap_or_default();
        let opacity_keys = theme
            .get(&["opacity"])
            .and_then(ThemeValue::as_map)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        debug!(
            variants = variants.len(),
            classnames = classnames.len(),
            screens = screens.len(),
            colors = color_names.len(),
            "Built design system"
        );

        Self {
            prefix,
            variants,
            classnames,
            arbitrary_variants,
            arbitrary,
            theme,
            screens,
            color_names,
            opacity_keys,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(DesignSystemData::from_file(path)?))
    }

    pub fn screens(&self) -> impl Iterator<Item = (&str, u32)> {
        self.screens.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn color_names(&self) -> &[String] {
        &self.color_names
    }

    /// Scopes a variant produces.
    pub fn variant_scopes(&self, name: &str) -> Option<&[String]> {
        self.variants.get(name).map(Vec::as_slice)
    }

    /// Base class of `<color-class>/<opacity>` when the suffix is a theme
    /// opacity key or a bracketed value.
    fn opacity_base<'n>(&self, name: &'n str) -> Option<&'n str> {
        let slash = name.rfind('/')?;
        let (base, suffix) = (&name[..slash], &name[slash + 1..]);
        if !base.starts_with(&self.prefix) || !self.classnames.contains_key(base) {
            return None;
        }
        if !self.color_names.iter().any(|c| base.ends_with(c.as_str())) {
            return None;
        }
        let arbitrary = suffix.starts_with('[') && suffix.ends_with(']') && suffix.len() > 2;
        if arbitrary || self.opacity_keys.iter().any(|k| k == suffix) {
            Some(base)
        } else {
            None
        }
    }

    /// Properties of a `prefix-[value]` class together with its value.
    fn arbitrary_rule(&self, name: &str) -> Option<RuleEntry> {
        let name = name.strip_prefix(self.prefix.as_str())?;
        let open = name.find("-[")?;
        if !name.ends_with(']') {
            return None;
        }
        let props = self.arbitrary.get(&name[..open])?;
        let value = &name[open + 2..name.len() - 1];
        if value.is_empty() {
            return None;
        }
        Some(RuleEntry::utility(props.iter().map(|p| (p.clone(), value.to_string()))))
    }

    fn is_arbitrary_variant(&self, name: &str) -> bool {
        if !name.ends_with(']') {
            return false;
        }
        if name.starts_with('[') {
            return name.len() > 2;
        }
        match name.find("-[") {
            Some(open) => self.arbitrary_variants.iter().any(|v| v == &name[..open]),
            None => false,
        }
    }

    fn lookup(&self, name: &str) -> Option<Vec<RuleEntry>> {
        if let Some(rules) = self.classnames.get(name) {
            return Some(rules.clone());
        }
        if let Some(base) = self.opacity_base(name) {
            return self.classnames.get(base).cloned();
        }
        self.arbitrary_rule(name).map(|rule| vec![rule])
    }
}

fn collect_screens(variants: &IndexMap<String, Vec<String>>) -> IndexMap<String, u32> {
    let mut screens: Vec<(String, u32)> = Vec::new();
    for (name, scopes) in variants {
        let width = scopes.iter().find_map(|scope| {
            SCREEN_WIDTH_REGEX
                .captures(scope)
                .and_then(|caps| caps[1].parse::<u32>().ok())
        });
        if let Some(px) = width {
            screens.push((name.clone(), px));
        }
    }
    screens.sort_by_key(|(_, px)| *px);
    screens.into_iter().collect()
}

impl DesignSystem for StaticDesignSystem {
    fn resolve_rule(&self, variants: &[&str], exact: bool, name: &str) -> Option<Vec<RuleEntry>> {
        if !variants.iter().all(|v| self.is_known_variant(v, true)) {
            return None;
        }
        if let Some(rules) = self.lookup(name) {
            return Some(rules);
        }
        if !exact && !self.prefix.is_empty() && !name.starts_with(&self.prefix) {
            return self.lookup(&format!("{}{}", self.prefix, name));
        }
        None
    }

    fn is_known_variant(&self, name: &str, include_arbitrary: bool) -> bool {
        self.variants.contains_key(name) || (include_arbitrary && self.is_arbitrary_variant(name))
    }

    fn is_known_class_name(&self, name: &str) -> bool {
        self.classnames.contains_key(name)
            || self.opacity_base(name).is_some()
            || self.arbitrary_rule(name).is_some()
    }

    fn get_theme(&self, path: &[&str]) -> Option<&ThemeValue> {
        self.theme.get(path)
    }

    fn vocabulary(&self) -> Vocabulary {
        Vocabulary {
            variants: self.variants.keys().cloned().collect(),
            class_names: self.classnames.keys().cloned().collect(),
        }
    }

    fn is_screen(&self, name: &str) -> bool {
        self.screens.contains_key(name)
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> DesignSystemData {
        serde_json::from_str(
            r##"{
                "prefix": "",
                "dark_mode": "class",
                "variants": {
                    "lg": ["@media (min-width: 1024px)"],
                    "sm": ["@media (min-width: 640px)"],
                    "md": ["@media (min-width: 768px)"]
                },
                "classnames": {
                    "dark": [{ "decls": {} }],
                    "group": [{ "decls": {} }],
                    "text-red-500": [{ "decls": { "color": ["#ef4444"] } }],
                    "btn": [{ "decls": { "padding": ["1rem"] }, "source": "components" }]
                },
                "arbitrary_variants": ["supports"],
                "arbitrary": { "bg": ["background-color"] },
                "theme": {
                    "colors": { "red": { "500": "#ef4444" } },
                    "opacity": { "50": "0.5" }
                }
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_post_processing() {
        let ds = StaticDesignSystem::new(data());
        assert!(!ds.is_known_class_name("dark"));
        assert!(!ds.is_known_class_name("group"));
        assert_eq!(ds.variant_scopes("dark"), Some(&[".dark".to_string()][..]));
        assert!(ds.is_known_variant("hocus", false));
        let screens: Vec<_> = ds.screens().map(|(k, _)| k).collect();
        assert_eq!(screens, vec!["sm", "md", "lg"]);
        assert!(ds.is_screen("md"));
        assert!(!ds.is_screen("hover"));
    }

    #[test]
    fn test_opacity_and_arbitrary_forms() {
        let ds = StaticDesignSystem::new(data());
        assert!(ds.is_known_class_name("text-red-500/50"));
        assert!(ds.is_known_class_name("text-red-500/[.3]"));
        assert!(!ds.is_known_class_name("text-red-500/33"));

        let rules = ds.resolve_rule(&[], true, "bg-[#fff]").unwrap();
        assert_eq!(rules[0].decls["background-color"], vec!["#fff".to_string()]);
        assert!(ds.resolve_rule(&[], true, "bg-[]").is_none());
    }

    #[test]
    fn test_arbitrary_variants() {
        let ds = StaticDesignSystem::new(data());
        assert!(ds.is_known_variant("[&:hover]", true));
        assert!(!ds.is_known_variant("[&:hover]", false));
        assert!(ds.is_known_variant("supports-[display:grid]", true));
        assert!(!ds.is_known_variant("aria-[checked]", true));
        assert!(ds.resolve_rule(&["hoverr"], true, "text-red-500").is_none());
        assert!(ds.resolve_rule(&["sm", "hover"], true, "text-red-500").is_some());
    }

    #[test]
    fn test_rule_source_parsing() {
        let ds = StaticDesignSystem::new(data());
        let rules = ds.resolve_rule(&[], true, "btn").unwrap();
        assert_eq!(rules[0].source, RuleSource::Components);
        let entry: RuleEntry = serde_json::from_str(r#"{ "source": "plugin" }"#).unwrap();
        assert_eq!(entry.source, RuleSource::Custom);
    }
}
