//! Approximate matching over the variant and class-name vocabularies.
//!
//! Scores are the mean of a token-set ratio (tokens split on `-`) and a
//! plain normalized Levenshtein ratio, both in `[0, 1]`. Ranking is stable,
//! so equal scores keep vocabulary insertion order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::design_system::DesignSystem;

pub const DEFAULT_THRESHOLD: f64 = 0.6;

/// CSS property names, so a property typed as a bare class can be recognized.
pub const CSS_PROPERTIES: &[&str] = &[
    "accent-color", "align-content", "align-items", "align-self", "all", "animation",
    "animation-delay", "animation-direction", "animation-duration", "animation-fill-mode",
    "animation-iteration-count", "animation-name", "animation-play-state",
    "animation-timing-function", "appearance", "aspect-ratio", "backdrop-filter",
    "backface-visibility", "background", "background-attachment", "background-blend-mode",
    "background-clip", "background-color", "background-image", "background-origin",
    "background-position", "background-repeat", "background-size", "block-size", "border",
    "border-block", "border-bottom", "border-bottom-color", "border-bottom-left-radius",
    "border-bottom-right-radius", "border-bottom-style", "border-bottom-width",
    "border-collapse", "border-color", "border-image", "border-inline", "border-left",
    "border-left-color", "border-left-style", "border-left-width", "border-radius",
    "border-right", "border-right-color", "border-right-style", "border-right-width",
    "border-spacing", "border-style", "border-top", "border-top-color",
    "border-top-left-radius", "border-top-right-radius", "border-top-style",
    "border-top-width", "border-width", "bottom", "box-decoration-break", "box-shadow",
    "box-sizing", "break-after", "break-before", "break-inside", "caption-side",
    "caret-color", "clear", "clip", "clip-path", "color", "column-count", "column-gap",
    "column-rule", "column-span", "column-width", "columns", "contain", "content",
    "counter-increment", "counter-reset", "cursor", "direction", "display", "empty-cells",
    "fill", "filter", "flex", "flex-basis", "flex-direction", "flex-flow", "flex-grow",
    "flex-shrink", "flex-wrap", "float", "font", "font-family", "font-feature-settings",
    "font-kerning", "font-size", "font-size-adjust", "font-smoothing", "font-stretch",
    "font-style", "font-variant", "font-variant-numeric", "font-weight", "gap", "grid",
    "grid-area", "grid-auto-columns", "grid-auto-flow", "grid-auto-rows", "grid-column",
    "grid-column-end", "grid-column-start", "grid-row", "grid-row-end", "grid-row-start",
    "grid-template", "grid-template-areas", "grid-template-columns", "grid-template-rows",
    "height", "hyphens", "image-rendering", "inline-size", "inset", "isolation",
    "justify-content", "justify-items", "justify-self", "left", "letter-spacing",
    "line-clamp", "line-height", "list-style", "list-style-image", "list-style-position",
    "list-style-type", "margin", "margin-block", "margin-bottom", "margin-inline",
    "margin-left", "margin-right", "margin-top", "mask", "mask-image", "mask-type",
    "max-height", "max-width", "min-height", "min-width", "mix-blend-mode", "object-fit",
    "object-position", "opacity", "order", "outline", "outline-color", "outline-offset",
    "outline-style", "outline-width", "overflow", "overflow-wrap", "overflow-x",
    "overflow-y", "overscroll-behavior", "padding", "padding-block", "padding-bottom",
    "padding-inline", "padding-left", "padding-right", "padding-top", "perspective",
    "place-content", "place-items", "place-self", "pointer-events", "position", "quotes",
    "resize", "right", "rotate", "row-gap", "scale", "scroll-behavior", "scroll-margin",
    "scroll-padding", "scroll-snap-align", "scroll-snap-type", "stroke", "stroke-width",
    "tab-size", "table-layout", "text-align", "text-decoration", "text-decoration-color",
    "text-decoration-line", "text-decoration-style", "text-decoration-thickness",
    "text-indent", "text-overflow", "text-shadow", "text-transform", "text-underline-offset",
    "top", "touch-action", "transform", "transform-origin", "transition",
    "transition-delay", "transition-duration", "transition-property",
    "transition-timing-function", "translate", "user-select", "vertical-align",
    "visibility", "white-space", "width", "will-change", "word-break", "word-spacing",
    "writing-mode", "z-index",
];

pub fn is_css_property(name: &str) -> bool {
    CSS_PROPERTIES.contains(&name)
}

/// Which vocabulary to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestKind {
    Variant,
    Classname,
}

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
struct Entry {
    text: String,
    chars: Vec<char>,
    tokens: Vec<String>,
}

impl Entry {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            chars: text.chars().collect(),
            tokens: sorted_tokens(text),
        }
    }
}

fn sorted_tokens(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split('-')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Levenshtein distance over chars, two-row.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    1.0 - levenshtein(a, b) as f64 / longest as f64
}

fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

fn token_set_ratio(query: &[String], candidate: &[String]) -> f64 {
    let mut common = Vec::new();
    let mut only_query = Vec::new();
    for t in query {
        if candidate.binary_search(t).is_ok() {
            common.push(t.as_str());
        } else {
            only_query.push(t.as_str());
        }
    }
    let only_candidate: Vec<&str> = candidate
        .iter()
        .filter(|t| query.binary_search(t).is_err())
        .map(String::as_str)
        .collect();

    let base = common.join("-");
    let join = |rest: &[&str]| match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.join("-"),
        (false, true) => base.clone(),
        (false, false) => format!("{}-{}", base, rest.join("-")),
    };
    let with_query = join(only_query.as_slice());
    let with_candidate = join(only_candidate.as_slice());

    ratio(&base, &with_query)
        .max(ratio(&base, &with_candidate))
        .max(ratio(&with_query, &with_candidate))
}

/// Fuzzy index over one vocabulary.
#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    entries: Vec<Entry>,
    seen: HashSet<String>,
}

impl FuzzyIndex {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        index.extend(vocabulary);
        index
    }

    /// Append names not yet indexed, keeping insertion order.
    pub fn extend<I, S>(&mut self, vocabulary: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in vocabulary {
            let name = name.as_ref();
            if self.seen.insert(name.to_string()) {
                self.entries.push(Entry::new(name));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn score(&self, query: &str, candidate: &str) -> f64 {
        let q = Entry::new(query);
        let c = Entry::new(candidate);
        Self::score_entries(&q, &c)
    }

    fn score_entries(query: &Entry, candidate: &Entry) -> f64 {
        let set = token_set_ratio(&query.tokens, &candidate.tokens);
        let plain = ratio_chars(&query.chars, &candidate.chars);
        (set + plain) / 2.0
    }

    /// Candidates scoring at least `threshold` and passing `filter`, best first.
    pub fn search<F>(&self, query: &str, threshold: f64, filter: F) -> Vec<Candidate>
    where
        F: Fn(&str) -> bool,
    {
        let query = Entry::new(query);
        let mut ranked: Vec<Candidate> = self
            .entries
            .iter()
            .filter(|e| filter(&e.text))
            .filter_map(|e| {
                let score = Self::score_entries(&query, e);
                (score >= threshold).then(|| Candidate {
                    text: e.text.clone(),
                    score,
                })
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Variant and class-name indexes built once per design-system load.
#[derive(Debug, Clone)]
pub struct Searcher {
    variants: FuzzyIndex,
    class_names: FuzzyIndex,
    screens: HashSet<String>,
    prefix: String,
    threshold: f64,
}

impl Searcher {
    /// Index the design system's vocabulary. CSS property names are added to
    /// the class-name index after the design system's own names.
    pub fn build(design: &dyn DesignSystem, threshold: f64) -> Self {
        let vocabulary = design.vocabulary();
        let screens = vocabulary
            .variants
            .iter()
            .filter(|v| design.is_screen(v))
            .cloned()
            .collect();
        let variants = FuzzyIndex::new(&vocabulary.variants);
        let mut class_names = FuzzyIndex::new(&vocabulary.class_names);
        class_names.extend(CSS_PROPERTIES);

        debug!(
            variants = variants.len(),
            class_names = class_names.len(),
            "Built fuzzy indexes"
        );

        Self {
            variants,
            class_names,
            screens,
            prefix: design.prefix().to_string(),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn is_dark_light(name: &str) -> bool {
        name == "dark" || name == "light"
    }

    fn variant_filter<'v>(&'v self, used: &'v [&'v str]) -> impl Fn(&str) -> bool + 'v {
        let has_screen = used.iter().any(|v| self.screens.contains(*v));
        let has_dark_light = used.iter().any(|v| Self::is_dark_light(v));
        move |name: &str| {
            if used.iter().any(|u| *u == name) {
                return false;
            }
            if has_screen && self.screens.contains(name) {
                return false;
            }
            !(has_dark_light && Self::is_dark_light(name))
        }
    }

    /// Ranked candidates for `query` given the variants already in use.
    pub fn search(&self, kind: SuggestKind, used_variants: &[&str], query: &str) -> Vec<Candidate> {
        match kind {
            SuggestKind::Variant => {
                let filter = self.variant_filter(used_variants);
                self.variants.search(query, self.threshold, filter)
            }
            SuggestKind::Classname => {
                let container = format!("{}container", self.prefix);
                let no_variants = used_variants.is_empty();
                self.class_names
                    .search(query, self.threshold, |name| no_variants || name != container)
            }
        }
    }

    /// The best candidate, if any scores above the threshold.
    pub fn suggest(&self, kind: SuggestKind, used_variants: &[&str], query: &str) -> Option<String> {
        self.search(kind, used_variants, query)
            .into_iter()
            .next()
            .map(|c| c.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::design_system::{DesignSystemData, RuleEntry, StaticDesignSystem};
    use indexmap::IndexMap;

    fn searcher() -> Searcher {
        let mut variants = IndexMap::new();
        variants.insert("sm".to_string(), vec!["@media (min-width: 640px)".to_string()]);
        variants.insert("md".to_string(), vec!["@media (min-width: 768px)".to_string()]);
        let mut classnames = IndexMap::new();
        for name in ["container", "text-red-500", "text-red-600", "flex", "inline-flex", "underline"] {
            classnames.insert(name.to_string(), vec![RuleEntry::default()]);
        }
        let ds = StaticDesignSystem::new(DesignSystemData {
            variants,
            classnames,
            ..DesignSystemData::default()
        });
        Searcher::build(&ds, DEFAULT_THRESHOLD)
    }

    #[test]
    fn test_levenshtein() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(levenshtein(&a, &b), 3);
        assert_eq!(levenshtein(&[], &b), 7);
    }

    #[test]
    fn test_single_edit_typos() {
        let s = searcher();
        assert_eq!(s.suggest(SuggestKind::Variant, &[], "hoverr").as_deref(), Some("hover"));
        assert_eq!(s.suggest(SuggestKind::Classname, &[], "flexx").as_deref(), Some("flex"));
        assert_eq!(s.suggest(SuggestKind::Classname, &[], "undreline").as_deref(), Some("underline"));
    }

    #[test]
    fn test_ties_follow_insertion_order() {
        let s = searcher();
        assert_eq!(
            s.suggest(SuggestKind::Classname, &[], "text-red-50").as_deref(),
            Some("text-red-500")
        );
    }

    #[test]
    fn test_no_match_below_threshold() {
        let s = searcher();
        assert_eq!(s.suggest(SuggestKind::Variant, &[], "zzzzzzzz"), None);
    }

    #[test]
    fn test_variant_filters() {
        let s = searcher();
        let found = s.search(SuggestKind::Variant, &["sm"], "md");
        assert!(found.iter().all(|c| c.text != "md" && c.text != "sm"));

        let found = s.search(SuggestKind::Variant, &["dark"], "light");
        assert!(found.iter().all(|c| c.text != "light" && c.text != "dark"));
        assert!(s.suggest(SuggestKind::Variant, &[], "lightt").as_deref() == Some("light"));
    }

    #[test]
    fn test_container_only_without_variants() {
        let s = searcher();
        assert_eq!(s.suggest(SuggestKind::Classname, &[], "containr").as_deref(), Some("container"));
        assert_ne!(s.suggest(SuggestKind::Classname, &["md"], "containr").as_deref(), Some("container"));
    }

    #[test]
    fn test_css_property_is_its_own_best_match() {
        let s = searcher();
        assert_eq!(s.suggest(SuggestKind::Classname, &[], "color").as_deref(), Some("color"));
        assert!(is_css_property("color"));
    }

    #[test]
    fn test_suggest_is_deterministic() {
        let s = searcher();
        let first = s.suggest(SuggestKind::Classname, &["hover"], "inline-flx");
        for _ in 0..5 {
            assert_eq!(s.suggest(SuggestKind::Classname, &["hover"], "inline-flx"), first);
        }
        assert_eq!(first.as_deref(), Some("inline-flex"));
    }
}
