//! Risk scoring: analysis findings to a bounded 0..=100 score.
//!
//! Each category contributes a capped sub-total so that a long tail of
//! low-severity items cannot outweigh a single severe one.

use crate::domain::{AnalysisFindings, Severity};

/// Upper bound of the score.
pub const MAX_SCORE: u8 = 100;

/// Cap on the summed per-risk weights.
pub const RISK_SUBTOTAL_CAP: u32 = 50;

/// Cap on the summed per-gap weights.
pub const GAP_SUBTOTAL_CAP: u32 = 15;

/// Flat bonus when a critical scenario lacks an automated test.
pub const UNCOVERED_CRITICAL_BONUS: u32 = 5;

fn overall_weight(level: Severity) -> u32 {
    match level {
        Severity::Critical => 30,
        Severity::High => 20,
        Severity::Medium => 10,
        Severity::Low => 0,
    }
}

fn risk_weight(level: Severity) -> u32 {
    match level {
        Severity::Critical => 40,
        Severity::High => 25,
        Severity::Medium => 10,
        Severity::Low => 3,
    }
}

fn gap_weight(level: Severity) -> u32 {
    match level {
        Severity::Critical => 15,
        Severity::High => 10,
        Severity::Medium => 5,
        Severity::Low => 2,
    }
}

/// Per-category breakdown of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreBreakdown {
    pub overall: u32,
    /// Risk sub-total after capping.
    pub risks: u32,
    /// Gap sub-total after capping.
    pub gaps: u32,
    pub coverage_bonus: u32,
}

impl ScoreBreakdown {
    /// Clamped total.
    pub fn total(&self) -> u8 {
        let sum = self
            .overall
            .saturating_add(self.risks)
            .saturating_add(self.gaps)
            .saturating_add(self.coverage_bonus);
        sum.min(u32::from(MAX_SCORE)) as u8
    }
}

fn saturating_sum(weights: impl Iterator<Item = u32>) -> u32 {
    weights.fold(0, u32::saturating_add)
}

/// Compute the per-category contributions for `findings`.
pub fn score_breakdown(findings: &AnalysisFindings) -> ScoreBreakdown {
    let risks = saturating_sum(findings.risks.iter().map(|r| risk_weight(r.level)));
    let gaps = saturating_sum(findings.gaps.iter().map(|g| gap_weight(g.severity)));

    let uncovered_critical = findings
        .test_scenarios
        .iter()
        .any(|s| s.priority == Severity::Critical && !s.has_automated_test);

    ScoreBreakdown {
        overall: overall_weight(findings.overall_risk),
        risks: risks.min(RISK_SUBTOTAL_CAP),
        gaps: gaps.min(GAP_SUBTOTAL_CAP),
        coverage_bonus: if uncovered_critical {
            UNCOVERED_CRITICAL_BONUS
        } else {
            0
        },
    }
}

/// Score `findings` in `[0, 100]`. Pure and total.
pub fn score(findings: &AnalysisFindings) -> u8 {
    score_breakdown(findings).total()
}
