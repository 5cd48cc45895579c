use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::{ReplayDiff, ReplayReport};
use crate::risk::RiskLevel;

/// A precise expected-diff record pre-approving one specific change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedDiff {
    pub risk_level_from: RiskLevel,
    pub risk_level_to: RiskLevel,
    #[serde(default)]
    pub added_matches: Vec<String>,
    #[serde(default)]
    pub removed_matches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_taxonomy_version: Option<String>,
}

/// Parsed allowlist document. The two modes are mutually exclusive per
/// document; a malformed or absent document degrades to an empty legacy
/// allowlist, meaning nothing is pre-approved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAllowlist {
    /// Blanket approval by scenario id.
    Legacy(BTreeSet<String>),
    /// Scenario id to the one exact diff that is approved.
    Fingerprinted(BTreeMap<String, ExpectedDiff>),
}

impl Default for ParsedAllowlist {
    fn default() -> Self {
        ParsedAllowlist::Legacy(BTreeSet::new())
    }
}

#[derive(Debug, Deserialize)]
struct FingerprintDocument {
    fingerprints: Vec<FingerprintEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FingerprintEntry {
    scenario_id: String,
    expected: ExpectedDiff,
}

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(default, rename = "allowedRiskLevelChanges")]
    allowed_risk_level_changes: Vec<String>,
}

/// Auto-detect and parse an allowlist document. Format is decided by the
/// presence of a `fingerprints` array; anything that fails to parse falls
/// back to the empty legacy allowlist.
pub fn parse_allowlist(value: &serde_json::Value) -> ParsedAllowlist {
    if value.get("fingerprints").is_some() {
        match serde_json::from_value::<FingerprintDocument>(value.clone()) {
            Ok(document) => {
                let map = document
                    .fingerprints
                    .into_iter()
                    .map(|entry| (entry.scenario_id, entry.expected))
                    .collect();
                return ParsedAllowlist::Fingerprinted(map);
            }
            Err(_) => return ParsedAllowlist::default(),
        }
    }

    match serde_json::from_value::<LegacyDocument>(value.clone()) {
        Ok(document) => {
            ParsedAllowlist::Legacy(document.allowed_risk_level_changes.into_iter().collect())
        }
        Err(_) => ParsedAllowlist::default(),
    }
}

/// Gate exit contract: each failure is one complete, human-readable sentence
/// naming the scenario and the exact mismatch. CI consumers treat the list
/// as a stable, diffable audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateOutcome {
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Evaluate a replay report against an allowlist.
///
/// Every scenario is examined and every failure reported; the gate never
/// stops at the first regression, and it never auto-approves a risk
/// increase — any unexplained upward change forces `passed = false`.
pub fn run_gate(report: &ReplayReport, allowlist: &ParsedAllowlist, strict: bool) -> GateOutcome {
    let mut failures = Vec::new();

    for diff in &report.diffs {
        if !diff.risk_level_changed {
            continue;
        }

        match allowlist {
            ParsedAllowlist::Legacy(allowed) => {
                if allowed.contains(&diff.scenario_id) {
                    continue;
                }
                if diff.risk_increased() {
                    failures.push(format!(
                        "scenario {}: riskLevel increased {} → {} without allowlist approval",
                        diff.scenario_id,
                        diff.risk_level_from.label(),
                        diff.risk_level_to.label()
                    ));
                } else if strict {
                    failures.push(format!(
                        "scenario {}: riskLevel changed {} → {} but is not allowlisted",
                        diff.scenario_id,
                        diff.risk_level_from.label(),
                        diff.risk_level_to.label()
                    ));
                }
            }
            ParsedAllowlist::Fingerprinted(fingerprints) => {
                match fingerprints.get(&diff.scenario_id) {
                    Some(expected) => {
                        check_fingerprint(diff, expected, &report.candidate_version, &mut failures)
                    }
                    None if strict => failures.push(format!(
                        "scenario {}: riskLevel changed {} → {} with no fingerprint on record",
                        diff.scenario_id,
                        diff.risk_level_from.label(),
                        diff.risk_level_to.label()
                    )),
                    None if diff.risk_increased() => failures.push(format!(
                        "scenario {}: riskLevel increased {} → {} without a fingerprint",
                        diff.scenario_id,
                        diff.risk_level_from.label(),
                        diff.risk_level_to.label()
                    )),
                    None => {}
                }
            }
        }
    }

    GateOutcome {
        passed: failures.is_empty(),
        failures,
    }
}

/// Compare one diff against its fingerprint; every mismatching field becomes
/// its own failure line. Match sets are compared order-insensitively.
fn check_fingerprint(
    diff: &ReplayDiff,
    expected: &ExpectedDiff,
    candidate_version: &str,
    failures: &mut Vec<String>,
) {
    if expected.risk_level_from != diff.risk_level_from {
        failures.push(format!(
            "scenario {}: fingerprint mismatch on riskLevelFrom (expected {}, actual {})",
            diff.scenario_id,
            expected.risk_level_from.label(),
            diff.risk_level_from.label()
        ));
    }
    if expected.risk_level_to != diff.risk_level_to {
        failures.push(format!(
            "scenario {}: fingerprint mismatch on riskLevelTo (expected {}, actual {})",
            diff.scenario_id,
            expected.risk_level_to.label(),
            diff.risk_level_to.label()
        ));
    }

    let expected_added = sorted_set(&expected.added_matches);
    let actual_added = sorted_set(&diff.added_matches);
    if expected_added != actual_added {
        failures.push(format!(
            "scenario {}: fingerprint mismatch on addedMatches (expected [{}], actual [{}])",
            diff.scenario_id,
            expected_added.join(", "),
            actual_added.join(", ")
        ));
    }

    let expected_removed = sorted_set(&expected.removed_matches);
    let actual_removed = sorted_set(&diff.removed_matches);
    if expected_removed != actual_removed {
        failures.push(format!(
            "scenario {}: fingerprint mismatch on removedMatches (expected [{}], actual [{}])",
            diff.scenario_id,
            expected_removed.join(", "),
            actual_removed.join(", ")
        ));
    }

    if let Some(expected_version) = &expected.candidate_taxonomy_version {
        if expected_version != candidate_version {
            failures.push(format!(
                "scenario {}: fingerprint mismatch on candidateTaxonomyVersion (expected {}, actual {})",
                diff.scenario_id, expected_version, candidate_version
            ));
        }
    }
}

fn sorted_set(values: &[String]) -> Vec<String> {
    let set: BTreeSet<&String> = values.iter().collect();
    set.into_iter().cloned().collect()
}
