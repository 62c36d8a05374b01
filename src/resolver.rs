use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::{canonical_class_name, Node};
use crate::cache::BoundedCache;
use crate::color::ColorDesc;
use crate::design_system::{DesignSystem, RuleEntry};

/// A class name that is not reported when the design system cannot resolve it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionExemption {
    pub class_name: String,

    /// Exempt only when one of these variants is present; empty means always
    #[serde(default)]
    pub with_any_variant: Vec<String>,
}

impl ResolutionExemption {
    pub fn new(class_name: &str, with_any_variant: &[&str]) -> Self {
        Self {
            class_name: class_name.to_string(),
            with_any_variant: with_any_variant.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn matches(&self, name: &str, variants: &[&str]) -> bool {
        self.class_name == name
            && (self.with_any_variant.is_empty()
                || variants.iter().any(|v| self.with_any_variant.iter().any(|w| w == v)))
    }
}

/// `container` with any variants, and `content` under `before`/`after`.
pub fn default_exemptions() -> Vec<ResolutionExemption> {
    vec![
        ResolutionExemption::new("container", &[]),
        ResolutionExemption::new("content", &["before", "after"]),
    ]
}

/// Outcome of looking a leaf up in the design system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Vec<RuleEntry>),
    /// Unresolved, but on the exemption list
    Exempt,
    Unknown,
}

impl Resolution {
    pub fn rules(&self) -> Option<&[RuleEntry]> {
        match self {
            Resolution::Resolved(rules) => Some(rules),
            _ => None,
        }
    }
}

/// Maps leaves to design-system rules, caching results per configuration.
pub struct Resolver<'d> {
    design: &'d dyn DesignSystem,
    exemptions: Vec<ResolutionExemption>,
    rules: BoundedCache<String, Option<Vec<RuleEntry>>>,
    colors: BoundedCache<String, Option<ColorDesc>>,
}

impl<'d> Resolver<'d> {
    pub fn new(design: &'d dyn DesignSystem, exemptions: Vec<ResolutionExemption>, capacity: usize) -> Self {
        Self {
            design,
            exemptions,
            rules: BoundedCache::new(capacity),
            colors: BoundedCache::new(capacity),
        }
    }

    pub fn design(&self) -> &'d dyn DesignSystem {
        self.design
    }

    pub fn is_exempt(&self, name: &str, variants: &[&str]) -> bool {
        let name = name.strip_prefix(self.design.prefix()).unwrap_or(name);
        self.exemptions.iter().any(|e| e.matches(name, variants))
    }

    /// Candidate rules for `name` under `variants`, cached.
    pub fn rules_for(&mut self, variants: &[&str], name: &str) -> Option<Vec<RuleEntry>> {
        let key = format!("{}\u{0}{}", variants.join("\u{1}"), name);
        if let Some(cached) = self.rules.get(&key) {
            return cached.clone();
        }
        let mut rules = self.design.resolve_rule(variants, true, name);
        if rules.is_none() {
            let canonical = canonical_class_name(name);
            if canonical != name {
                if let Some(found) = self.design.resolve_rule(variants, true, &canonical) {
                    trace!(name, canonical = %canonical, "Resolved through canonical name");
                    rules = Some(found);
                }
            }
        }
        self.rules.insert(key, rules.clone());
        rules
    }

    pub fn resolve(&mut self, variants: &[&str], name: &str) -> Resolution {
        match self.rules_for(variants, name) {
            Some(rules) => Resolution::Resolved(rules),
            None if self.is_exempt(name, variants) => Resolution::Exempt,
            None => Resolution::Unknown,
        }
    }

    /// Resolve a class-name-like leaf. Declaration leaves and groups are `Unknown`.
    pub fn resolve_node(&mut self, node: &Node) -> Resolution {
        let Some(name) = node.lookup_name() else {
            return Resolution::Unknown;
        };
        let variants = node.variants().texts();
        self.resolve(&variants, name)
    }

    /// Swatch colors of a known class name, cached.
    pub fn color_desc(&mut self, class_name: &str) -> Option<ColorDesc> {
        if !self.design.is_known_class_name(class_name) {
            return None;
        }
        let key = class_name.to_string();
        if let Some(cached) = self.colors.get(&key) {
            return cached.clone();
        }
        let desc = self
            .design
            .resolve_rule(&[], true, class_name)
            .and_then(|rules| ColorDesc::from_rules(class_name, &rules));
        self.colors.insert(key, desc.clone());
        desc
    }
}
