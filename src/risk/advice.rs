//! Curated guidance attached to verdicts.
//!
//! The registry is a closed, statically curated set: resolution never
//! invents text, and adding guidance is a data change, not a code change.
//! Term-level entries strictly override parent-level ones.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::matcher::normalize_key;

/// Scope of a guidance record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceScope {
    Term,
    Parent,
}

/// One actionable guidance record, keyed `term:<t>` or `parent:<category>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceEntry {
    pub id: String,
    pub target: String,
    pub scope: AdviceScope,
    pub guidance: String,
}

/// What the caller knows about one rule match when asking for advice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceQuery {
    pub matched_term: String,
    pub matched_category: Option<String>,
}

impl AdviceQuery {
    /// Build one query per rule match of a verdict, in match order.
    pub fn from_verdict(verdict: &super::evaluation::Verdict) -> Vec<AdviceQuery> {
        verdict
            .matched
            .iter()
            .map(|hit| AdviceQuery {
                matched_term: hit.matched_term().to_string(),
                matched_category: hit.matched_category().map(str::to_string),
            })
            .collect()
    }
}

/// The static advice registry.
#[derive(Debug, Clone)]
pub struct AdviceRegistry {
    entries: BTreeMap<String, AdviceEntry>,
}

impl Default for AdviceRegistry {
    fn default() -> Self {
        Self::curated()
    }
}

impl AdviceRegistry {
    /// The production registry shipped with the engine.
    pub fn curated() -> Self {
        let mut entries = BTreeMap::new();
        for (target, scope, guidance) in CURATED_GUIDANCE {
            let entry = AdviceEntry {
                id: Self::key(*scope, target),
                target: (*target).to_string(),
                scope: *scope,
                guidance: (*guidance).to_string(),
            };
            entries.insert(entry.id.clone(), entry);
        }
        Self { entries }
    }

    /// Empty registry, useful for tests exercising fallback behavior.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: AdviceEntry) {
        self.entries.insert(entry.id.clone(), entry);
    }

    fn key(scope: AdviceScope, target: &str) -> String {
        match scope {
            AdviceScope::Term => format!("term:{target}"),
            AdviceScope::Parent => format!("parent:{target}"),
        }
    }

    /// Resolve guidance for a set of matches.
    ///
    /// Per query: a term-level entry wins outright and suppresses any parent
    /// lookup; otherwise the query's category (or the `parent_lookup`
    /// fallback) selects a parent-level entry; otherwise nothing is emitted
    /// for that query. Results are deduplicated by id, ordered term-level
    /// first, then alphabetically by target.
    pub fn resolve(
        &self,
        queries: &[AdviceQuery],
        parent_lookup: Option<&dyn Fn(&str) -> Option<String>>,
    ) -> Vec<AdviceEntry> {
        let mut resolved: Vec<AdviceEntry> = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        for query in queries {
            let term = normalize_key(&query.matched_term);
            if term.is_empty() {
                continue;
            }

            let entry = match self.entries.get(&Self::key(AdviceScope::Term, &term)) {
                Some(entry) => Some(entry),
                None => {
                    let category = query
                        .matched_category
                        .as_ref()
                        .map(|category| normalize_key(category))
                        .or_else(|| parent_lookup.and_then(|lookup| lookup(&term)));
                    category.and_then(|category| {
                        self.entries.get(&Self::key(AdviceScope::Parent, &category))
                    })
                }
            };

            if let Some(entry) = entry {
                if !seen.contains(&entry.id) {
                    seen.push(entry.id.clone());
                    resolved.push(entry.clone());
                }
            }
        }

        resolved.sort_by(|a, b| {
            scope_rank(a.scope)
                .cmp(&scope_rank(b.scope))
                .then_with(|| a.target.cmp(&b.target))
        });
        resolved
    }
}

fn scope_rank(scope: AdviceScope) -> u8 {
    match scope {
        AdviceScope::Term => 0,
        AdviceScope::Parent => 1,
    }
}

const CURATED_GUIDANCE: &[(&str, AdviceScope, &str)] = &[
    (
        "peanut",
        AdviceScope::Term,
        "Avoid this item and check prepared foods for peanut-derived oils; carry your epinephrine auto-injector.",
    ),
    (
        "almond",
        AdviceScope::Term,
        "Almond flour and almond milk appear in many baked goods; confirm ingredients before eating.",
    ),
    (
        "mango",
        AdviceScope::Term,
        "Mango skin shares urushiol-like compounds with latex; peeled fruit may still trigger oral symptoms.",
    ),
    (
        "shrimp",
        AdviceScope::Term,
        "Shellfish proteins survive cooking; avoid shared fryers and steam from cooking shellfish.",
    ),
    (
        "tree_nut",
        AdviceScope::Parent,
        "Treat all tree nuts as unsafe unless your allergist has cleared a specific nut.",
    ),
    (
        "shellfish",
        AdviceScope::Parent,
        "Cross-contact is common in seafood kitchens; tell restaurant staff about the allergy explicitly.",
    ),
    (
        "dairy",
        AdviceScope::Parent,
        "Check labels for casein and whey, which appear outside obvious dairy products.",
    ),
    (
        "latex",
        AdviceScope::Parent,
        "Latex-fruit syndrome can extend to banana, avocado, kiwi, and chestnut; log any new reactions.",
    ),
    (
        "gluten",
        AdviceScope::Parent,
        "Look for certified gluten-free labeling; oats are frequently cross-contaminated.",
    ),
    (
        "medication_interaction",
        AdviceScope::Parent,
        "Do not take these medications together without confirming the combination with your pharmacist.",
    ),
];
