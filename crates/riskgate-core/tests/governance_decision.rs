//! Scoring and merge-decision properties.

use riskgate_core::{
    compute_governance_decision, decide, score, AnalysisFindings, Gap, Recommendation, Risk,
    Severity, TestScenario,
};

const LEVELS: [Severity; 4] = [
    Severity::Critical,
    Severity::High,
    Severity::Medium,
    Severity::Low,
];

fn findings_grid() -> Vec<AnalysisFindings> {
    let mut out = Vec::new();
    for overall in LEVELS {
        for risk_count in 0..6 {
            for gap_level in LEVELS {
                let mut f = AnalysisFindings::empty(overall);
                for i in 0..risk_count {
                    f = f.with_risk(Risk::new(LEVELS[i % 4], format!("area-{i}")));
                }
                f = f
                    .with_gap(Gap::new(gap_level))
                    .with_gap(Gap::new(gap_level))
                    .with_scenario(TestScenario::new("critical path", Severity::Critical));
                out.push(f);
            }
        }
    }
    out
}

#[test]
fn test_empty_findings_score_zero() {
    let findings: AnalysisFindings = serde_json::from_str(r#"{"overallRisk": "low"}"#).unwrap();
    assert_eq!(score(&findings), 0);
    let decision = compute_governance_decision(&findings);
    assert_eq!(decision.risk_score, 0);
    assert_eq!(decision.recommendation, Recommendation::MergeOk);
}

#[test]
fn test_score_is_always_bounded() {
    for findings in findings_grid() {
        assert!(score(&findings) <= 100, "{findings:?}");
    }
}

#[test]
fn test_adding_a_critical_risk_never_decreases_score() {
    for findings in findings_grid() {
        let before = score(&findings);
        let after = score(&findings.clone().with_risk(Risk::new(Severity::Critical, "new")));
        assert!(after >= before, "{before} -> {after}");
    }
}

#[test]
fn test_decision_thresholds() {
    assert_eq!(decide(70, Severity::Low), Recommendation::Block);
    assert_eq!(decide(69, Severity::Low), Recommendation::Attention);
    assert_eq!(decide(29, Severity::Low), Recommendation::MergeOk);
    assert_eq!(decide(0, Severity::Critical), Recommendation::Block);
    assert_eq!(decide(0, Severity::High), Recommendation::Attention);
    assert_eq!(decide(10, Severity::Medium), Recommendation::MergeOk);
}

#[test]
fn test_critical_overall_always_blocks() {
    for findings in findings_grid()
        .into_iter()
        .filter(|f| f.overall_risk == Severity::Critical)
    {
        let decision = compute_governance_decision(&findings);
        assert_eq!(decision.recommendation, Recommendation::Block);
        assert!(decision.risk_score >= 30);
    }
}

#[test]
fn test_decision_serializes_for_callers() {
    let findings = AnalysisFindings::empty(Severity::High)
        .with_risk(Risk::new(Severity::Critical, "payments"))
        .with_gap(Gap::new(Severity::High));
    let decision = compute_governance_decision(&findings);
    // 20 + 40 + 10
    assert_eq!(decision.risk_score, 70);
    let json = serde_json::to_value(decision).unwrap();
    assert_eq!(json["riskScore"], 70);
    assert_eq!(json["recommendation"], "block");
}
