//! Coverage threshold validation

use crate::aggregate::CoverageResult;

/// Outcome of comparing measured coverage against the configured minimum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// `coverage >= minimum`.
    Pass { coverage: f64 },
    /// `coverage < minimum`.
    Fail { coverage: f64 },
    /// Nothing was instrumented after exclusions, so there is no percentage
    /// to compare.
    Indeterminate,
}

impl Verdict {
    pub fn coverage(&self) -> Option<f64> {
        match *self {
            Verdict::Pass { coverage } | Verdict::Fail { coverage } => Some(coverage),
            Verdict::Indeterminate => None,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }
}

/// Compare the aggregate result against `min_coverage` (percent). Equal to
/// the threshold passes.
pub fn evaluate(result: &CoverageResult, min_coverage: f64) -> Verdict {
    match result.percentage() {
        Some(coverage) if coverage >= min_coverage => Verdict::Pass { coverage },
        Some(coverage) => Verdict::Fail { coverage },
        None => Verdict::Indeterminate,
    }
}
