use super::common::*;
use crate::risk::evaluation::RiskEngine;
use crate::risk::explain::{build_explanations, ExplanationKind};

#[test]
fn entries_are_ranked_by_kind_then_term() {
    let engine = RiskEngine::new();
    // Interaction first in evaluation order, then cross-reactive, then two
    // direct matches out of alphabetical order; the projection must re-rank.
    let verdict = engine.evaluate(
        &profile(&["tree_nut", "peanut"], &["aspirin"]),
        &[
            medication_event("ibuprofen"),
            meal_event("mango salad"),
            meal_event("walnut brownie"),
            meal_event("almond croissant"),
        ],
        &snapshot(),
    );

    let entries = build_explanations(&verdict);
    let kinds: Vec<ExplanationKind> = entries.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ExplanationKind::DirectMatch,
            ExplanationKind::DirectMatch,
            ExplanationKind::CrossReactive,
            ExplanationKind::Interaction,
        ]
    );
    assert_eq!(entries[0].matched_term, "almond");
    assert_eq!(entries[1].matched_term, "walnut");
    assert_eq!(entries[2].matched_term, "mango");
}

#[test]
fn summaries_are_rebuilt_from_match_details_not_reasoning() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["tree_nut"], &[]),
        &[meal_event("almond croissant")],
        &snapshot(),
    );

    let entries = build_explanations(&verdict);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].rule_code, "AR-001");
    assert_eq!(
        entries[0].summary,
        "almond is a declared allergen in the tree_nut category (severity 80)"
    );
    assert!(!verdict.reasoning.contains(&entries[0].summary));
}

#[test]
fn interaction_summary_sorts_drug_names_canonically() {
    let engine = RiskEngine::new();
    let logged_ibuprofen = engine.evaluate(
        &profile(&[], &["aspirin"]),
        &[medication_event("ibuprofen")],
        &snapshot(),
    );
    let logged_aspirin = engine.evaluate(
        &profile(&[], &["ibuprofen"]),
        &[medication_event("aspirin")],
        &snapshot(),
    );

    let first = build_explanations(&logged_ibuprofen);
    let second = build_explanations(&logged_aspirin);
    assert_eq!(first[0].summary, "aspirin and ibuprofen are a known interaction pair");
    assert_eq!(first[0].summary, second[0].summary);
    assert_eq!(first[0].rule_code, "MI-003");
}

#[test]
fn empty_verdicts_project_to_no_entries() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(&profile(&[], &[]), &[meal_event("plain rice")], &snapshot());
    assert!(build_explanations(&verdict).is_empty());
}
