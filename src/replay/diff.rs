use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::risk::{RiskLevel, RuleMatch, Verdict};

/// Normalized projection of a verdict built for stable byte-for-byte
/// comparison: sorted, deduplicated, and detached from the live verdict so
/// incidental field ordering can never leak into a diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayVerdict {
    pub risk_level: RiskLevel,
    pub severity: i32,
    pub matched_terms: Vec<String>,
    pub matched_categories: Vec<String>,
    pub cross_reactive: bool,
}

/// Project a verdict into its normalized replay form.
pub fn normalize_verdict(verdict: &Verdict) -> ReplayVerdict {
    let matched_terms: BTreeSet<String> = verdict
        .matched
        .iter()
        .map(|hit| hit.matched_term().to_string())
        .collect();
    let matched_categories: BTreeSet<String> = verdict
        .matched
        .iter()
        .filter_map(|hit| hit.matched_category().map(str::to_string))
        .collect();
    let cross_reactive = verdict
        .matched
        .iter()
        .any(|hit| matches!(hit, RuleMatch::CrossReactive { .. }));

    ReplayVerdict {
        risk_level: verdict.risk_level,
        severity: verdict.meta.severity,
        matched_terms: matched_terms.into_iter().collect(),
        matched_categories: matched_categories.into_iter().collect(),
        cross_reactive,
    }
}

/// Difference between a baseline and candidate replay verdict for one
/// scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayDiff {
    pub scenario_id: String,
    pub risk_level_from: RiskLevel,
    pub risk_level_to: RiskLevel,
    pub risk_level_changed: bool,
    pub severity_changed: bool,
    pub added_matches: Vec<String>,
    pub removed_matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReplayDiff {
    /// Upward means the candidate classifies more risk than the baseline,
    /// by the explicit ordinal none 0, medium 1, high 2.
    pub fn risk_increased(&self) -> bool {
        self.risk_level_to.ordinal() > self.risk_level_from.ordinal()
    }

    pub fn risk_decreased(&self) -> bool {
        self.risk_level_to.ordinal() < self.risk_level_from.ordinal()
    }
}

/// Compute the diff between two normalized verdicts of the same scenario.
pub fn diff_verdicts(
    scenario_id: &str,
    baseline: &ReplayVerdict,
    candidate: &ReplayVerdict,
) -> ReplayDiff {
    let baseline_terms: BTreeSet<&String> = baseline.matched_terms.iter().collect();
    let candidate_terms: BTreeSet<&String> = candidate.matched_terms.iter().collect();

    let added_matches: Vec<String> = candidate_terms
        .difference(&baseline_terms)
        .map(|term| (*term).clone())
        .collect();
    let removed_matches: Vec<String> = baseline_terms
        .difference(&candidate_terms)
        .map(|term| (*term).clone())
        .collect();

    let risk_level_changed = baseline.risk_level != candidate.risk_level;
    let notes = risk_level_changed.then(|| {
        let direction = if candidate.risk_level.ordinal() > baseline.risk_level.ordinal() {
            "up"
        } else {
            "down"
        };
        format!(
            "riskLevel {} → {} ({direction})",
            baseline.risk_level.label(),
            candidate.risk_level.label()
        )
    });

    ReplayDiff {
        scenario_id: scenario_id.to_string(),
        risk_level_from: baseline.risk_level,
        risk_level_to: candidate.risk_level,
        risk_level_changed,
        severity_changed: baseline.severity != candidate.severity,
        added_matches,
        removed_matches,
        notes,
    }
}

/// Aggregate counts over a replay, for dashboards. Gating decisions never
/// consult this; they walk the individual diffs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub scenarios: usize,
    pub risk_increases: usize,
    pub risk_decreases: usize,
    pub added_matches: usize,
    pub removed_matches: usize,
}

pub fn summarize(diffs: &[ReplayDiff]) -> ReplaySummary {
    diffs.iter().fold(
        ReplaySummary {
            scenarios: diffs.len(),
            ..ReplaySummary::default()
        },
        |mut summary, diff| {
            if diff.risk_increased() {
                summary.risk_increases += 1;
            }
            if diff.risk_decreased() {
                summary.risk_decreases += 1;
            }
            summary.added_matches += diff.added_matches.len();
            summary.removed_matches += diff.removed_matches.len();
            summary
        },
    )
}
