use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::matcher::{normalize_key, singularize};

/// Severity assumed for a category missing from the severity table. The
/// constant is preserved from the historical rule data; tests pin it so a
/// change is a visible behavior change, not an accident.
pub const DEFAULT_CATEGORY_SEVERITY: i32 = 50;

/// One taxonomy node: a term and the more specific terms underneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermNode {
    #[serde(default)]
    pub children: Vec<String>,
}

/// A clinically established association between a declared allergen and
/// other terms that can trigger a reaction, with a severity adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossReactiveRelation {
    pub source: String,
    #[serde(default)]
    pub related: Vec<String>,
    #[serde(default)]
    pub risk_modifier: i32,
}

/// Full, versioned rule-data snapshot. A new snapshot is always a wholesale
/// replacement; the engine never patches one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomySnapshot {
    pub version: String,
    #[serde(default)]
    pub taxonomy: BTreeMap<String, TermNode>,
    #[serde(default)]
    pub severity: BTreeMap<String, i32>,
    #[serde(default)]
    pub cross_reactive: Vec<CrossReactiveRelation>,
}

impl TaxonomySnapshot {
    /// Expand declared allergies into the flat set of matchable terms.
    ///
    /// A declared allergy whose normalized key is a taxonomy node expands to
    /// every child term. A key the taxonomy does not know degrades to its
    /// singular literal form, so a miss still matches the term itself
    /// instead of silently matching nothing.
    pub fn expand_allergies(&self, declared: &[String]) -> BTreeSet<String> {
        let mut expanded = BTreeSet::new();

        for allergy in declared {
            let key = normalize_key(allergy);
            if key.is_empty() {
                continue;
            }
            match self.taxonomy.get(&key) {
                Some(node) => {
                    for child in &node.children {
                        let child_key = normalize_key(child);
                        if !child_key.is_empty() {
                            expanded.insert(child_key);
                        }
                    }
                }
                None => {
                    expanded.insert(singularize(&key));
                }
            }
        }

        expanded
    }

    /// Reverse child -> parent index, built once per snapshot. The snapshot
    /// is immutable for the run, so this replaces the historical per-call
    /// full-table scan without changing observable behavior.
    pub fn parent_index(&self) -> BTreeMap<String, String> {
        let mut index = BTreeMap::new();
        for (parent, node) in &self.taxonomy {
            for child in &node.children {
                let child_key = normalize_key(child);
                // First parent wins on duplicate children, matching scan order.
                index.entry(child_key).or_insert_with(|| parent.clone());
            }
        }
        index
    }

    /// Resolve the category that carries a term's severity: the term itself
    /// when the severity table knows it, else its taxonomy parent, else the
    /// term unchanged.
    pub fn resolve_category(&self, term: &str, parents: &BTreeMap<String, String>) -> String {
        if self.severity.contains_key(term) {
            return term.to_string();
        }
        if let Some(parent) = parents.get(term) {
            return parent.clone();
        }
        term.to_string()
    }

    /// Severity for a category, falling back to [`DEFAULT_CATEGORY_SEVERITY`].
    pub fn base_severity(&self, category: &str) -> i32 {
        self.severity
            .get(category)
            .copied()
            .unwrap_or(DEFAULT_CATEGORY_SEVERITY)
    }
}
