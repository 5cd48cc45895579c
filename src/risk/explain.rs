//! Human-auditable projection of a verdict.
//!
//! Pure projection: every summary is rebuilt from the raw rule matches,
//! never lifted from the verdict's reasoning sentence, so presentation copy
//! can change without touching the audit trail.

use serde::{Deserialize, Serialize};

use super::evaluation::{RuleMatch, Verdict};

/// Explanation entry kinds, in display rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplanationKind {
    DirectMatch,
    CrossReactive,
    Interaction,
}

impl ExplanationKind {
    const fn rank(self) -> u8 {
        match self {
            ExplanationKind::DirectMatch => 0,
            ExplanationKind::CrossReactive => 1,
            ExplanationKind::Interaction => 2,
        }
    }
}

/// One ranked, typed explanation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationEntry {
    pub kind: ExplanationKind,
    pub matched_term: String,
    pub rule_code: String,
    pub summary: String,
}

/// Project a verdict into ranked explanation entries: direct matches first,
/// then cross-reactive, then interactions; alphabetical by matched term
/// within a kind.
pub fn build_explanations(verdict: &Verdict) -> Vec<ExplanationEntry> {
    let mut entries: Vec<ExplanationEntry> = verdict.matched.iter().map(project).collect();
    entries.sort_by(|a, b| {
        a.kind
            .rank()
            .cmp(&b.kind.rank())
            .then_with(|| a.matched_term.cmp(&b.matched_term))
    });
    entries
}

fn project(hit: &RuleMatch) -> ExplanationEntry {
    match hit {
        RuleMatch::AllergyMatch {
            allergen,
            matched_category,
            severity,
            ..
        } => ExplanationEntry {
            kind: ExplanationKind::DirectMatch,
            matched_term: allergen.clone(),
            rule_code: hit.rule_code().to_string(),
            summary: format!(
                "{allergen} is a declared allergen in the {matched_category} category (severity {severity})"
            ),
        },
        RuleMatch::CrossReactive {
            source,
            matched_term,
            risk_modifier,
            ..
        } => ExplanationEntry {
            kind: ExplanationKind::CrossReactive,
            matched_term: matched_term.clone(),
            rule_code: hit.rule_code().to_string(),
            summary: format!(
                "{matched_term} is cross-reactive with the declared {source} allergy (modifier {risk_modifier:+})"
            ),
        },
        RuleMatch::MedicationInteraction {
            extracted,
            conflicts_with,
            ..
        } => {
            // Canonical order-independent summary: drug names sorted
            // alphabetically regardless of which one was logged.
            let mut drugs = [extracted.as_str(), conflicts_with.as_str()];
            drugs.sort();
            ExplanationEntry {
                kind: ExplanationKind::Interaction,
                matched_term: extracted.clone(),
                rule_code: hit.rule_code().to_string(),
                summary: format!("{} and {} are a known interaction pair", drugs[0], drugs[1]),
            }
        }
    }
}
