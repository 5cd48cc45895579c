use std::collections::BTreeMap;

use super::common::*;
use crate::risk::domain::{Event, EventKind, RiskLevel};
use crate::risk::evaluation::{RiskEngine, RuleMatch, NO_RISK_REASONING};
use crate::risk::taxonomy::CrossReactiveRelation;

#[test]
fn declared_parent_allergy_flags_child_term_as_high() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["tree_nut"], &[]),
        &[meal_event("almond croissant")],
        &snapshot(),
    );

    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert_eq!(verdict.matched.len(), 1);
    match &verdict.matched[0] {
        RuleMatch::AllergyMatch {
            allergen,
            parent_key,
            matched_category,
            severity,
            ..
        } => {
            assert_eq!(allergen, "almond");
            assert_eq!(parent_key.as_deref(), Some("tree_nut"));
            assert_eq!(matched_category, "tree_nut");
            assert_eq!(*severity, 80);
        }
        other => panic!("expected allergy match, got {other:?}"),
    }
    assert_eq!(verdict.meta.severity, 80);
    assert_eq!(verdict.meta.matched_term.as_deref(), Some("almond"));
    assert_eq!(verdict.meta.taxonomy_version, "2024-11");
}

#[test]
fn cross_reactive_term_yields_medium_with_modified_severity() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["peanut"], &[]),
        &[meal_event("mango salad")],
        &snapshot(),
    );

    assert_eq!(verdict.risk_level, RiskLevel::Medium);
    match &verdict.matched[0] {
        RuleMatch::CrossReactive {
            source,
            matched_term,
            risk_modifier,
            severity,
            ..
        } => {
            assert_eq!(source, "peanut");
            assert_eq!(matched_term, "mango");
            assert_eq!(*risk_modifier, 10);
            assert_eq!(*severity, 100, "base 90 plus modifier 10");
        }
        other => panic!("expected cross-reactive match, got {other:?}"),
    }
    assert_eq!(verdict.meta.cross_reactive, Some(true));
    assert_eq!(verdict.meta.source.as_deref(), Some("peanut"));
}

#[test]
fn cross_reactive_severity_is_not_clamped() {
    // The rule data allows modified severities past 100 and below 0; the
    // engine must pass them through untouched so a future clamp shows up as
    // a test failure rather than a silent semantic change.
    let mut snapshot = snapshot();
    snapshot.cross_reactive = vec![
        CrossReactiveRelation {
            source: "peanut".to_string(),
            related: vec!["mango".to_string()],
            risk_modifier: 25,
        },
        CrossReactiveRelation {
            source: "latex".to_string(),
            related: vec!["banana".to_string()],
            risk_modifier: -75,
        },
    ];
    let engine = RiskEngine::new();

    let over = engine.evaluate(
        &profile(&["peanut"], &[]),
        &[meal_event("mango sticky rice")],
        &snapshot,
    );
    assert_eq!(over.matched[0].severity(), 115);

    let under = engine.evaluate(
        &profile(&["latex"], &[]),
        &[meal_event("banana bread")],
        &snapshot,
    );
    assert_eq!(under.matched[0].severity(), -15);
}

#[test]
fn cross_reactive_source_severity_never_resolves_through_the_taxonomy() {
    // "almond" is a tree_nut child (80) but has no severity entry of its
    // own; a relation sourced on it gets the default base, not the parent's.
    let mut snapshot = snapshot();
    snapshot.cross_reactive = vec![CrossReactiveRelation {
        source: "almond".to_string(),
        related: vec!["apricot".to_string()],
        risk_modifier: 10,
    }];
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["almond"], &[]),
        &[meal_event("apricot tart")],
        &snapshot,
    );

    assert_eq!(verdict.risk_level, RiskLevel::Medium);
    assert_eq!(verdict.matched[0].severity(), 60, "default 50 plus modifier 10");
}

#[test]
fn cross_reactive_source_accepts_plural_declaration() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["peanuts"], &[]),
        &[meal_event("mango salad")],
        &snapshot(),
    );
    assert_eq!(verdict.risk_level, RiskLevel::Medium);
}

#[test]
fn direct_match_suppresses_cross_reactive_for_the_same_meal() {
    // "mango and walnut salad" hits both paths; the direct allergen check
    // runs first and must be the only recorded match for the event.
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["tree_nut", "peanut"], &[]),
        &[meal_event("mango and walnut salad")],
        &snapshot(),
    );

    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert_eq!(verdict.matched.len(), 1);
    assert!(matches!(&verdict.matched[0], RuleMatch::AllergyMatch { .. }));
}

#[test]
fn medication_interaction_flags_conflicting_current_medication() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&[], &["aspirin"]),
        &[medication_event("Ibuprofen")],
        &snapshot(),
    );

    assert_eq!(verdict.risk_level, RiskLevel::Medium);
    match &verdict.matched[0] {
        RuleMatch::MedicationInteraction {
            extracted,
            conflicts_with,
            severity,
        } => {
            assert_eq!(extracted, "ibuprofen");
            assert_eq!(conflicts_with, "aspirin");
            assert_eq!(*severity, 65, "fixture severity table entry");
        }
        other => panic!("expected interaction match, got {other:?}"),
    }
}

#[test]
fn interaction_severity_defaults_when_category_is_unlisted() {
    let mut snapshot = snapshot();
    snapshot.severity.remove("medication_interaction");
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&[], &["warfarin"]),
        &[medication_event("ibuprofen")],
        &snapshot,
    );
    assert_eq!(verdict.matched[0].severity(), 50);
}

#[test]
fn risk_level_is_monotonic_across_events() {
    let engine = RiskEngine::new();
    // Cross-reactive medium first, direct high second, interaction medium last.
    let verdict = engine.evaluate(
        &profile(&["peanut", "tree_nut"], &["aspirin"]),
        &[
            meal_event("mango salad"),
            meal_event("walnut brownie"),
            medication_event("ibuprofen"),
        ],
        &snapshot(),
    );

    assert_eq!(verdict.risk_level, RiskLevel::High, "high never downgrades");
    assert_eq!(verdict.matched.len(), 3);
    assert!(matches!(&verdict.matched[0], RuleMatch::CrossReactive { .. }));
    assert!(matches!(&verdict.matched[1], RuleMatch::AllergyMatch { .. }));
    assert!(matches!(
        &verdict.matched[2],
        RuleMatch::MedicationInteraction { .. }
    ));
}

#[test]
fn meta_carries_the_highest_severity_match_first_seen_wins_ties() {
    let engine = RiskEngine::new();
    // walnut (80) first, shrimp (85) second: shrimp wins outright.
    let verdict = engine.evaluate(
        &profile(&["tree_nut", "shellfish"], &[]),
        &[meal_event("walnut brownie"), meal_event("shrimp tacos")],
        &snapshot(),
    );
    assert_eq!(verdict.meta.severity, 85);
    assert_eq!(verdict.meta.matched_term.as_deref(), Some("shrimp"));

    // Two tree_nut hits tie at 80: the first recorded match keeps meta.
    let tied = engine.evaluate(
        &profile(&["tree_nut"], &[]),
        &[meal_event("walnut brownie"), meal_event("pecan pie")],
        &snapshot(),
    );
    assert_eq!(tied.meta.severity, 80);
    assert_eq!(tied.meta.matched_term.as_deref(), Some("walnut"));
}

#[test]
fn no_matches_returns_the_canonical_empty_verdict() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["tree_nut"], &["metformin"]),
        &[meal_event("plain rice"), medication_event("metformin")],
        &snapshot(),
    );

    assert_eq!(verdict.risk_level, RiskLevel::None);
    assert_eq!(verdict.reasoning, NO_RISK_REASONING);
    assert!(verdict.matched.is_empty());
    assert_eq!(verdict.meta.severity, 0);
    assert_eq!(verdict.meta.matched_category, None);
}

#[test]
fn blank_fields_and_unknown_event_kinds_are_silent_no_ops() {
    let engine = RiskEngine::new();
    let events = vec![
        Event {
            kind: EventKind::Meal,
            fields: BTreeMap::new(),
        },
        Event {
            kind: EventKind::Meal,
            fields: [("meal".to_string(), "   ".to_string())].into_iter().collect(),
        },
        Event {
            kind: EventKind::Other,
            fields: [("meal".to_string(), "almond croissant".to_string())]
                .into_iter()
                .collect(),
        },
    ];

    let verdict = engine.evaluate(&profile(&["tree_nut"], &[]), &events, &snapshot());
    assert_eq!(verdict.risk_level, RiskLevel::None);
    assert!(verdict.matched.is_empty());
}

#[test]
fn reasoning_joins_sentences_with_a_single_trailing_period() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["tree_nut"], &["aspirin"]),
        &[meal_event("almond croissant"), medication_event("ibuprofen")],
        &snapshot(),
    );

    assert!(verdict.reasoning.contains("; "));
    assert!(verdict.reasoning.ends_with('.'));
    assert!(!verdict.reasoning.ends_with(".."));
    assert!(verdict.reasoning.contains("almond"));
    assert!(verdict.reasoning.contains("ibuprofen"));
}

#[test]
fn evaluation_is_deterministic_byte_for_byte() {
    let engine = RiskEngine::new();
    let events = vec![
        meal_event("mango salad"),
        meal_event("almond croissant"),
        medication_event("ibuprofen"),
    ];
    let who = profile(&["peanut", "tree_nut"], &["aspirin"]);
    let snapshot = snapshot();

    let first = engine.evaluate(&who, &events, &snapshot);
    let second = engine.evaluate(&who, &events, &snapshot);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("verdict serializes"),
        serde_json::to_string(&second).expect("verdict serializes"),
    );
}

#[test]
fn verdict_wire_shape_keeps_rule_discriminator_and_camel_case_fields() {
    let engine = RiskEngine::new();
    let verdict = engine.evaluate(
        &profile(&["tree_nut"], &[]),
        &[meal_event("almond croissant")],
        &snapshot(),
    );

    let value = serde_json::to_value(&verdict).expect("verdict serializes");
    let hit = &value["matched"][0];
    assert_eq!(hit["rule"], "allergy_match");
    assert_eq!(hit["allergen"], "almond");
    assert_eq!(hit["parentKey"], "tree_nut");
    assert_eq!(hit["matchedCategory"], "tree_nut");
}
