use std::collections::BTreeMap;

use crate::risk::domain::{Event, EventKind, Medication, Profile};
use crate::risk::taxonomy::{CrossReactiveRelation, TaxonomySnapshot, TermNode};

pub(super) fn snapshot() -> TaxonomySnapshot {
    let mut taxonomy = BTreeMap::new();
    taxonomy.insert(
        "tree_nut".to_string(),
        TermNode {
            children: vec![
                "almond".to_string(),
                "walnut".to_string(),
                "pecan".to_string(),
                "cashew".to_string(),
            ],
        },
    );
    taxonomy.insert(
        "shellfish".to_string(),
        TermNode {
            children: vec![
                "shrimp".to_string(),
                "crab".to_string(),
                "lobster".to_string(),
            ],
        },
    );

    let mut severity = BTreeMap::new();
    severity.insert("tree_nut".to_string(), 80);
    severity.insert("shellfish".to_string(), 85);
    severity.insert("peanut".to_string(), 90);
    severity.insert("latex".to_string(), 60);
    severity.insert("medication_interaction".to_string(), 65);

    TaxonomySnapshot {
        version: "2024-11".to_string(),
        taxonomy,
        severity,
        cross_reactive: vec![
            CrossReactiveRelation {
                source: "peanut".to_string(),
                related: vec!["mango".to_string(), "lupin".to_string()],
                risk_modifier: 10,
            },
            CrossReactiveRelation {
                source: "latex".to_string(),
                related: vec![
                    "banana".to_string(),
                    "avocado".to_string(),
                    "kiwi".to_string(),
                ],
                risk_modifier: -20,
            },
        ],
    }
}

pub(super) fn profile(allergies: &[&str], medications: &[&str]) -> Profile {
    Profile {
        known_allergies: allergies.iter().map(|name| name.to_string()).collect(),
        current_medications: medications
            .iter()
            .map(|name| Medication {
                name: name.to_string(),
                dosage: None,
            })
            .collect(),
    }
}

pub(super) fn meal_event(meal: &str) -> Event {
    Event {
        kind: EventKind::Meal,
        fields: [("meal".to_string(), meal.to_string())].into_iter().collect(),
    }
}

pub(super) fn medication_event(medication: &str) -> Event {
    Event {
        kind: EventKind::Medication,
        fields: [("medication".to_string(), medication.to_string())]
            .into_iter()
            .collect(),
    }
}
