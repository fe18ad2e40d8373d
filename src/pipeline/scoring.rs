//! Safety Scorer: 100 minus the severity deductions of all findings,
//! clamped to [0, 100]. Pure and deterministic.

use crate::models::InteractionFinding;

pub const MAX_SAFETY_SCORE: f64 = 100.0;
pub const MIN_SAFETY_SCORE: f64 = 0.0;

pub fn safety_score(findings: &[InteractionFinding]) -> f64 {
    let deductions: f64 = findings.iter().map(|f| f.severity.deduction()).sum();
    (MAX_SAFETY_SCORE - deductions).clamp(MIN_SAFETY_SCORE, MAX_SAFETY_SCORE)
}
