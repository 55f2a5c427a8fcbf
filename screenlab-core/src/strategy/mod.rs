//! Strategy definitions — named, ordered predicate lists.

pub mod catalog;

use crate::predicates::{PredicateSpec, Source};
use serde::{Deserialize, Serialize};

/// Diagnostic field computed for a match.
///
/// Only one canonical strategy reports a bias percentage; the rest carry the
/// "not applicable" sentinel. Downstream consumers key on this asymmetry, so
/// it is preserved rather than generalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    NotApplicable,
    /// Report `(fast - slow) / slow × 100` on match.
    BiasPct { fast: Source, slow: Source },
}

/// A named technical setup: minimum history, ordered predicates, diagnostic.
///
/// Immutable configuration data. Evaluation short-circuits on the first
/// failing predicate; the declared order decides which failure is reported,
/// never the final verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    /// Stable identifier (kebab-case).
    pub name: String,
    /// Human-readable note attached to match records.
    pub note: String,
    /// Minimum bar count before any predicate runs.
    pub min_history: usize,
    pub predicates: Vec<PredicateSpec>,
    pub diagnostic: Diagnostic,
}

impl StrategyDefinition {
    pub fn new(
        name: impl Into<String>,
        note: impl Into<String>,
        min_history: usize,
        predicates: Vec<PredicateSpec>,
        diagnostic: Diagnostic,
    ) -> Self {
        Self {
            name: name.into(),
            note: note.into(),
            min_history,
            predicates,
            diagnostic,
        }
    }
}
