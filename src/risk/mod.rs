//! The pure risk-classification core: taxonomy expansion, term matching,
//! rule evaluation, advice resolution, and explanation building.

pub mod advice;
pub mod domain;
pub(crate) mod evaluation;
pub mod explain;
pub mod matcher;
pub mod taxonomy;

#[cfg(test)]
mod tests;

pub use advice::{AdviceEntry, AdviceQuery, AdviceRegistry, AdviceScope};
pub use domain::{Event, EventKind, Medication, Profile, RiskLevel};
pub use evaluation::{RiskEngine, RuleMatch, Verdict, VerdictMeta, NO_RISK_REASONING};
pub use explain::{build_explanations, ExplanationEntry, ExplanationKind};
pub use taxonomy::{
    CrossReactiveRelation, TaxonomySnapshot, TermNode, DEFAULT_CATEGORY_SEVERITY,
};
