//! Conflict detection over the leaves of one expression.
//!
//! Every non-important leaf contributes its token to one or more conflict
//! keys; any key collecting two or more tokens is a conflict.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::ast::{leaves_of, Node};
use crate::design_system::RuleSource;
use crate::resolver::{Resolution, Resolver};
use crate::source::ExpressionKind;
use crate::token::{Token, TokenList};

/// How class names are grouped into conflict keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Class-name expressions are not checked
    None,
    /// One key per class name from the set of properties it touches
    Loose,
    /// One key per declared property of every candidate rule
    #[default]
    Strict,
}

/// Tokens sharing one conflict key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub key: String,
    /// The property, or the `:`-joined property set under the loose policy
    pub property: String,
    pub tokens: TokenList,
}

#[derive(Default)]
struct ConflictMap {
    entries: IndexMap<String, (String, TokenList)>,
}

impl ConflictMap {
    fn add(&mut self, segments: Vec<&str>, property: &str, token: &Token) {
        let mut key = segments.join(".");
        if !segments.is_empty() {
            key.push('.');
        }
        key.push_str(property);
        self.entries
            .entry(key)
            .or_insert_with(|| (property.to_string(), TokenList::new()))
            .1
            .push_unique(token.clone());
    }

    fn into_conflicts(self) -> Vec<Conflict> {
        self.entries
            .into_iter()
            .filter(|(_, (_, tokens))| tokens.len() > 1)
            .map(|(key, (property, tokens))| Conflict { key, property, tokens })
            .collect()
    }
}

/// `backgroundColor` → `background-color`. Custom properties are kept verbatim.
pub fn to_kebab(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Group the leaves of `nodes` by conflict key and return groups of two or more tokens.
///
/// Important leaves never participate. In [`ExpressionKind::Twin`]
/// expressions the `none` policy disables detection; in
/// [`ExpressionKind::TwinCssProperty`] expressions only declaration leaves
/// are keyed and detection always runs.
pub fn find_conflicts(
    nodes: &[Node],
    policy: ConflictPolicy,
    kind: ExpressionKind,
    resolver: &mut Resolver<'_>,
) -> Vec<Conflict> {
    let mut map = ConflictMap::default();

    match kind {
        ExpressionKind::TwinTheme => return Vec::new(),
        ExpressionKind::Twin if policy == ConflictPolicy::None => return Vec::new(),
        _ => {}
    }

    for leaf in leaves_of(nodes) {
        if leaf.is_important() {
            continue;
        }
        let Some(token) = leaf.token() else {
            continue;
        };
        let variants = leaf.variants().sorted_texts();

        if let Some(prop) = leaf.css_property() {
            let property = to_kebab(&prop.text);
            let mut segments = Vec::with_capacity(variants.len() + 1);
            if kind == ExpressionKind::Twin {
                segments.push("");
            }
            segments.extend(variants.iter().copied());
            map.add(segments, &property, token);
            continue;
        }
        if kind != ExpressionKind::Twin {
            continue;
        }

        let Resolution::Resolved(rules) = resolver.resolve_node(leaf) else {
            continue;
        };
        match policy {
            ConflictPolicy::Strict => {
                for rule in &rules {
                    for property in rule.decls.keys() {
                        let mut segments: Vec<&str> = rule.context.iter().map(String::as_str).collect();
                        segments.push(&rule.scope);
                        segments.extend(rule.pseudo.iter().map(String::as_str));
                        segments.extend(variants.iter().copied());
                        map.add(segments, property, token);
                    }
                    if rule.source == RuleSource::Components {
                        break;
                    }
                }
            }
            ConflictPolicy::Loose => {
                let properties: BTreeSet<&str> = rules
                    .iter()
                    .flat_map(|rule| rule.decls.keys().map(String::as_str))
                    .collect();
                let joined = properties.into_iter().collect::<Vec<_>>().join(":");
                map.add(variants.clone(), &joined, token);
            }
            ConflictPolicy::None => {}
        }
    }

    map.into_conflicts()
}
