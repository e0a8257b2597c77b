//! Merge decision policy derived from the risk score.
//!
//! Severity triggers are checked before score thresholds at every tier, and
//! `block` is checked before `attention`.

use crate::domain::{AnalysisFindings, GovernanceDecision, Recommendation, Severity};
use crate::metrics::METRICS;
use crate::obs::emit_governance_decided;
use crate::risk;

/// Score at or above which a change is blocked.
pub const BLOCK_THRESHOLD: u8 = 70;

/// Score at or above which a change needs attention.
pub const ATTENTION_THRESHOLD: u8 = 30;

/// Map a score and overall severity to a recommendation. Pure and total.
pub fn decide(score: u8, overall_risk: Severity) -> Recommendation {
    if overall_risk == Severity::Critical || score >= BLOCK_THRESHOLD {
        return Recommendation::Block;
    }
    if overall_risk == Severity::High || score >= ATTENTION_THRESHOLD {
        return Recommendation::Attention;
    }
    Recommendation::MergeOk
}

/// Score `findings` and derive the merge recommendation.
///
/// Synchronous and independent of any autonomous remediation.
pub fn compute_governance_decision(findings: &AnalysisFindings) -> GovernanceDecision {
    let risk_score = risk::score(findings);
    let decision = GovernanceDecision {
        risk_score,
        recommendation: decide(risk_score, findings.overall_risk),
    };
    METRICS.inc_decisions();
    emit_governance_decided(&decision, findings.overall_risk);
    decision
}
