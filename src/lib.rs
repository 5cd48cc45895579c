//! Deterministic, rule-based allergy and drug-interaction risk engine.
//!
//! The library is a pure core: every exported function is a transform of its
//! explicit inputs, with the taxonomy snapshot and user profile passed in on
//! every call. The `replay` module re-runs the engine over a historical
//! scenario corpus to detect and gate behavioral drift when rule data changes.

pub mod config;
pub mod error;
pub mod replay;
pub mod risk;
pub mod telemetry;
