use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::super::domain::Profile;
use super::super::matcher::{find_match, normalize_key};
use super::super::taxonomy::TaxonomySnapshot;

/// Severity-table category consulted for medication interactions.
const INTERACTION_CATEGORY: &str = "medication_interaction";

/// One rule firing, recorded in evaluation order and never mutated.
///
/// The historical wire shape (`rule` discriminator plus a loose details map)
/// is preserved as a tagged sum type so unknown-field bugs are impossible
/// while any JSON consumer sees the same document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RuleMatch {
    AllergyMatch {
        meal: String,
        allergen: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_key: Option<String>,
        matched_category: String,
        severity: i32,
    },
    CrossReactive {
        meal: String,
        source: String,
        matched_term: String,
        risk_modifier: i32,
        severity: i32,
    },
    MedicationInteraction {
        extracted: String,
        conflicts_with: String,
        severity: i32,
    },
}

impl RuleMatch {
    /// Stable audit code per rule kind.
    pub fn rule_code(&self) -> &'static str {
        match self {
            RuleMatch::AllergyMatch { .. } => "AR-001",
            RuleMatch::CrossReactive { .. } => "XR-002",
            RuleMatch::MedicationInteraction { .. } => "MI-003",
        }
    }

    pub fn severity(&self) -> i32 {
        match self {
            RuleMatch::AllergyMatch { severity, .. }
            | RuleMatch::CrossReactive { severity, .. }
            | RuleMatch::MedicationInteraction { severity, .. } => *severity,
        }
    }

    /// The term this match hinges on, used for normalized replay comparison.
    pub fn matched_term(&self) -> &str {
        match self {
            RuleMatch::AllergyMatch { allergen, .. } => allergen,
            RuleMatch::CrossReactive { matched_term, .. } => matched_term,
            RuleMatch::MedicationInteraction { extracted, .. } => extracted,
        }
    }

    pub fn matched_category(&self) -> Option<&str> {
        match self {
            RuleMatch::AllergyMatch {
                matched_category, ..
            } => Some(matched_category),
            RuleMatch::CrossReactive { .. } | RuleMatch::MedicationInteraction { .. } => None,
        }
    }
}

/// Direct allergen hit: the meal text matched one of the expanded allergy
/// terms. Severity comes from the resolved category of the matched term.
pub(crate) fn direct_allergy_match(
    meal: &str,
    expanded: &BTreeSet<String>,
    snapshot: &TaxonomySnapshot,
    parents: &BTreeMap<String, String>,
) -> Option<RuleMatch> {
    let allergen = find_match(meal, expanded.iter().map(String::as_str))?;
    let parent_key = parents.get(&allergen).cloned();
    let matched_category = snapshot.resolve_category(&allergen, parents);
    let severity = snapshot.base_severity(&matched_category);

    Some(RuleMatch::AllergyMatch {
        meal: meal.to_string(),
        allergen,
        parent_key,
        matched_category,
        severity,
    })
}

/// Cross-reactive hit: a relation whose source (or its naive plural) sits in
/// the declared allergies matched the meal text through its related terms.
/// Severity is the source term's own base severity plus the relation's
/// modifier; a source missing from the severity table falls back to the
/// default, never to a taxonomy parent. The sum is intentionally not clamped
/// to [0, 100]; downstream only uses it for best-match tie-breaking.
pub(crate) fn cross_reactive_match(
    meal: &str,
    declared: &[String],
    snapshot: &TaxonomySnapshot,
) -> Option<RuleMatch> {
    let declared_keys: BTreeSet<String> = declared
        .iter()
        .map(|allergy| normalize_key(allergy))
        .filter(|key| !key.is_empty())
        .collect();

    for relation in &snapshot.cross_reactive {
        let source = normalize_key(&relation.source);
        if source.is_empty() {
            continue;
        }
        let plural = format!("{source}s");
        if !declared_keys.contains(&source) && !declared_keys.contains(&plural) {
            continue;
        }

        if let Some(matched_term) = find_match(meal, relation.related.iter().map(String::as_str)) {
            let severity = snapshot.base_severity(&source) + relation.risk_modifier;
            return Some(RuleMatch::CrossReactive {
                meal: meal.to_string(),
                source,
                matched_term,
                risk_modifier: relation.risk_modifier,
                severity,
            });
        }
    }

    None
}

/// Interaction hit: the logged medication's static interaction list contains
/// one of the user's current medications. The first conflicting current
/// medication in declaration order wins.
pub(crate) fn medication_interaction_match(
    extracted: &str,
    profile: &Profile,
    snapshot: &TaxonomySnapshot,
) -> Option<RuleMatch> {
    let drug = normalize_key(extracted);
    let partners = interaction_partners(&drug)?;

    for current in &profile.current_medications {
        let name = normalize_key(&current.name);
        if partners.contains(&name.as_str()) {
            return Some(RuleMatch::MedicationInteraction {
                extracted: drug,
                conflicts_with: name,
                severity: snapshot.base_severity(INTERACTION_CATEGORY),
            });
        }
    }

    None
}

/// Static drug-interaction registry. Pairs are clinically symmetric but
/// stored one-directionally under the drug being logged; adding a pair is a
/// data change, not a code change.
fn interaction_partners(drug: &str) -> Option<&'static [&'static str]> {
    let partners: &'static [&'static str] = match drug {
        "ibuprofen" => &["aspirin", "warfarin", "naproxen"],
        "aspirin" => &["warfarin", "ibuprofen", "naproxen"],
        "naproxen" => &["aspirin", "warfarin", "ibuprofen"],
        "warfarin" => &["aspirin", "ibuprofen", "naproxen", "fluconazole"],
        "fluconazole" => &["warfarin", "simvastatin"],
        "simvastatin" => &["fluconazole", "clarithromycin"],
        "clarithromycin" => &["simvastatin", "warfarin"],
        "lisinopril" => &["spironolactone", "potassium chloride"],
        "spironolactone" => &["lisinopril", "potassium chloride"],
        "sertraline" => &["tramadol", "sumatriptan"],
        "tramadol" => &["sertraline", "sumatriptan"],
        _ => return None,
    };
    Some(partners)
}
