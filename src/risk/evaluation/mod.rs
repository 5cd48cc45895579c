mod rules;

pub use rules::RuleMatch;

use serde::{Deserialize, Serialize};

use super::domain::{Event, EventKind, Profile, RiskLevel};
use super::taxonomy::TaxonomySnapshot;

/// Reasoning text for a run in which no rule fired.
pub const NO_RISK_REASONING: &str = "No known risks detected.";

/// Stateless evaluator. Every call receives the profile, the event batch,
/// and the taxonomy snapshot explicitly; nothing ambient leaks in, so two
/// identical calls produce byte-identical verdicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a batch of events against a profile under one taxonomy
    /// snapshot. Events are processed in input order; within a meal event
    /// the direct allergen check runs first and the cross-reactive check
    /// only when it missed. Risk level is monotonic across the run.
    pub fn evaluate(
        &self,
        profile: &Profile,
        events: &[Event],
        snapshot: &TaxonomySnapshot,
    ) -> Verdict {
        let expanded = snapshot.expand_allergies(&profile.known_allergies);
        let parents = snapshot.parent_index();

        let mut risk_level = RiskLevel::None;
        let mut matched: Vec<RuleMatch> = Vec::new();

        for event in events {
            match event.kind {
                EventKind::Meal => {
                    let Some(meal) = event.field("meal") else {
                        continue;
                    };

                    if let Some(hit) =
                        rules::direct_allergy_match(meal, &expanded, snapshot, &parents)
                    {
                        risk_level = risk_level.escalate(RiskLevel::High);
                        matched.push(hit);
                    } else if let Some(hit) =
                        rules::cross_reactive_match(meal, &profile.known_allergies, snapshot)
                    {
                        risk_level = risk_level.escalate(RiskLevel::Medium);
                        matched.push(hit);
                    }
                }
                EventKind::Medication => {
                    let Some(medication) = event.field("medication") else {
                        continue;
                    };

                    if let Some(hit) =
                        rules::medication_interaction_match(medication, profile, snapshot)
                    {
                        risk_level = risk_level.escalate(RiskLevel::Medium);
                        matched.push(hit);
                    }
                }
                EventKind::Other => {}
            }
        }

        tracing::debug!(
            taxonomy_version = %snapshot.version,
            events = events.len(),
            matches = matched.len(),
            risk = risk_level.label(),
            "risk evaluation complete"
        );

        if matched.is_empty() {
            return Verdict {
                risk_level: RiskLevel::None,
                reasoning: NO_RISK_REASONING.to_string(),
                matched,
                meta: VerdictMeta {
                    taxonomy_version: snapshot.version.clone(),
                    severity: 0,
                    matched_category: None,
                    cross_reactive: None,
                    source: None,
                    matched_term: None,
                },
            };
        }

        let reasoning = render_reasoning(&matched);
        let meta = select_meta(&matched, &snapshot.version);

        Verdict {
            risk_level,
            reasoning,
            matched,
            meta,
        }
    }
}

/// The engine's single output per evaluation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub risk_level: RiskLevel,
    pub reasoning: String,
    pub matched: Vec<RuleMatch>,
    pub meta: VerdictMeta,
}

/// Metadata describing the single best (highest-severity) match of the run.
/// Ties break toward the first match in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictMeta {
    pub taxonomy_version: String,
    pub severity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_reactive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_term: Option<String>,
}

/// Fixed sentence per rule kind, joined with "; ", trailing punctuation
/// normalized to a single period. The reasoning string is presentation copy;
/// explanations rebuild their own summaries from the raw matches instead.
fn render_reasoning(matched: &[RuleMatch]) -> String {
    let sentences: Vec<String> = matched.iter().map(render_sentence).collect();
    let mut joined = sentences.join("; ");
    while joined.ends_with(['.', ';', ' ']) {
        joined.pop();
    }
    joined.push('.');
    joined
}

fn render_sentence(hit: &RuleMatch) -> String {
    match hit {
        RuleMatch::AllergyMatch {
            meal,
            allergen,
            matched_category,
            severity,
            ..
        } => format!(
            "Meal '{meal}' contains {allergen}, matching the declared {matched_category} allergy (severity {severity})"
        ),
        RuleMatch::CrossReactive {
            meal,
            source,
            matched_term,
            ..
        } => format!(
            "Meal '{meal}' contains {matched_term}, a known cross-reactive trigger for the declared {source} allergy"
        ),
        RuleMatch::MedicationInteraction {
            extracted,
            conflicts_with,
            ..
        } => format!(
            "Logged medication {extracted} can interact with current medication {conflicts_with}"
        ),
    }
}

fn select_meta(matched: &[RuleMatch], taxonomy_version: &str) -> VerdictMeta {
    let mut best = &matched[0];
    for hit in &matched[1..] {
        if hit.severity() > best.severity() {
            best = hit;
        }
    }

    let mut meta = VerdictMeta {
        taxonomy_version: taxonomy_version.to_string(),
        severity: best.severity(),
        matched_category: None,
        cross_reactive: None,
        source: None,
        matched_term: None,
    };

    match best {
        RuleMatch::AllergyMatch {
            allergen,
            matched_category,
            ..
        } => {
            meta.matched_category = Some(matched_category.clone());
            meta.matched_term = Some(allergen.clone());
        }
        RuleMatch::CrossReactive {
            source,
            matched_term,
            ..
        } => {
            meta.cross_reactive = Some(true);
            meta.source = Some(source.clone());
            meta.matched_term = Some(matched_term.clone());
        }
        RuleMatch::MedicationInteraction { extracted, .. } => {
            meta.matched_term = Some(extracted.clone());
        }
    }

    meta
}
