use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A user's declared health context as the profile store hands it over.
/// The engine only reads it; ownership stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub known_allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<Medication>,
}

/// One medication on the user's active list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
}

/// A typed record extracted upstream from a raw user log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl Event {
    /// Field accessor returning `None` for absent or blank values, so empty
    /// fields degrade to a silent no-op instead of an error.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// Event kinds the rule engine understands. Anything else (supplements,
/// symptoms, future extraction outputs) deserializes to `Other` and is
/// skipped during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Meal,
    Medication,
    #[serde(other)]
    Other,
}

/// Classification attached to a Verdict. Transitions within one evaluation
/// run are monotonic: none -> medium -> high, never downgraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Medium,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Explicit ordinal used for diff direction: none 0, medium 1, high 2.
    pub const fn ordinal(self) -> u8 {
        match self {
            RiskLevel::None => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }

    /// Monotonic escalation: returns the higher of the two levels.
    pub fn escalate(self, other: RiskLevel) -> RiskLevel {
        if other.ordinal() > self.ordinal() {
            other
        } else {
            self
        }
    }
}
