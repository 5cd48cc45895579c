//! Replay harness: re-run the rule engine over a historical scenario corpus
//! under two taxonomy snapshots, diff the normalized verdicts, and gate the
//! result against an allowlist. This is the regression-test surface for the
//! rule data itself; an undetected silent weakening of the classifier is the
//! failure mode this module exists to catch.

pub mod diff;
pub mod gate;

pub use diff::{diff_verdicts, normalize_verdict, summarize, ReplayDiff, ReplaySummary, ReplayVerdict};
pub use gate::{parse_allowlist, run_gate, ExpectedDiff, GateOutcome, ParsedAllowlist};

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::risk::{Event, Profile, RiskEngine, TaxonomySnapshot};

/// One historical scenario: the inputs of a past evaluation, replayable
/// under any taxonomy snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub recorded_at: DateTime<Utc>,
    pub profile: Profile,
    pub events: Vec<Event>,
}

/// The full corpus replay output for one baseline/candidate snapshot pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    pub baseline_version: String,
    pub candidate_version: String,
    pub diffs: Vec<ReplayDiff>,
}

/// Re-run every scenario under both snapshots and diff the outcomes.
/// Scenarios are independent; the fold is sequential because corpus sizes
/// are small and ordering does not affect correctness.
pub fn replay_corpus(
    scenarios: &[Scenario],
    baseline: &TaxonomySnapshot,
    candidate: &TaxonomySnapshot,
) -> ReplayReport {
    let engine = RiskEngine::new();
    let diffs = scenarios
        .iter()
        .map(|scenario| {
            let before = engine.evaluate(&scenario.profile, &scenario.events, baseline);
            let after = engine.evaluate(&scenario.profile, &scenario.events, candidate);
            diff_verdicts(
                &scenario.id,
                &normalize_verdict(&before),
                &normalize_verdict(&after),
            )
        })
        .collect();

    tracing::debug!(
        scenarios = scenarios.len(),
        baseline = %baseline.version,
        candidate = %candidate.version,
        "corpus replay complete"
    );

    ReplayReport {
        baseline_version: baseline.version.clone(),
        candidate_version: candidate.version.clone(),
        diffs,
    }
}

/// Errors raised while loading replay input documents from disk. The core
/// evaluation path itself never fails; only document I/O can.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path} as {expected}: {source}")]
    Parse {
        path: PathBuf,
        expected: &'static str,
        source: serde_json::Error,
    },
}

pub fn load_taxonomy(path: &Path) -> Result<TaxonomySnapshot, DocumentError> {
    load_document(path, "taxonomy snapshot")
}

pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, DocumentError> {
    load_document(path, "scenario corpus")
}

/// Allowlist loading never fails: a missing or malformed document degrades
/// to an empty legacy allowlist, so nothing is pre-approved by accident.
pub fn load_allowlist(path: Option<&Path>) -> ParsedAllowlist {
    let Some(path) = path else {
        return ParsedAllowlist::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return ParsedAllowlist::default();
    };
    match serde_json::from_str::<serde_json::Value>(&raw) {
        Ok(value) => parse_allowlist(&value),
        Err(_) => ParsedAllowlist::default(),
    }
}

/// Load any serde-typed JSON document, naming what was expected on failure.
pub fn load_document<T: serde::de::DeserializeOwned>(
    path: &Path,
    expected: &'static str,
) -> Result<T, DocumentError> {
    let raw = fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DocumentError::Parse {
        path: path.to_path_buf(),
        expected,
        source,
    })
}
