//! Scenario selection and prompt assembly for the two generation strategies.

use std::fmt::Write as _;

use crate::domain::{AnalysisFindings, ExampleKind, TestPattern, TestScenario};

/// Scenario cap for page-object generation.
pub const POM_SCENARIO_CAP: usize = 8;

/// Scenario cap for flat generation.
pub const FLAT_SCENARIO_CAP: usize = 10;

/// Generation style chosen from the detected layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    PageObject,
    Flat,
}

impl Strategy {
    pub fn for_pattern(pattern: &TestPattern) -> Self {
        if pattern.prefers_page_objects() {
            Strategy::PageObject
        } else {
            Strategy::Flat
        }
    }

    pub fn scenario_cap(self) -> usize {
        match self {
            Strategy::PageObject => POM_SCENARIO_CAP,
            Strategy::Flat => FLAT_SCENARIO_CAP,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::PageObject => "page_object",
            Strategy::Flat => "flat",
        }
    }
}

/// Uncovered scenarios, critical/high first, then e2e-tagged, capped.
///
/// The sort is stable so equal scenarios keep their analysis order.
pub fn select_scenarios(findings: &AnalysisFindings, cap: usize) -> Vec<&TestScenario> {
    let mut eligible: Vec<&TestScenario> = findings
        .test_scenarios
        .iter()
        .filter(|s| !s.has_automated_test)
        .collect();
    eligible.sort_by_key(|s| (!s.priority.is_elevated(), !s.is_e2e(), s.priority.rank()));
    eligible.truncate(cap);
    eligible
}

const OUTPUT_CONTRACT: &str = r#"Respond with JSON only, in this shape:
{"files": [{"filename": "<path>", "kind": "test" | "page_object" | "utility" | "fixture", "code": "<file contents>", "dependencies": ["<package>"]}]}"#;

/// System prompt for `strategy` targeting `framework`.
pub fn system_prompt(strategy: Strategy, framework: &str) -> String {
    let style = match strategy {
        Strategy::PageObject => {
            "Use the page object model: one page class per screen with locators and actions, \
             tests that only call page methods, shared helpers in utility files."
        }
        Strategy::Flat => {
            "Write self-contained test files that follow the existing suite's conventions. \
             Do not introduce page objects."
        }
    };
    format!(
        "You are a senior test automation engineer writing {framework} tests for a code change.\n\
         {style}\n\
         Every test must be deterministic and must not depend on test order.\n\
         {OUTPUT_CONTRACT}"
    )
}

/// User prompt carrying the layout, exemplars, risks and selected scenarios.
pub fn user_prompt(
    strategy: Strategy,
    findings: &AnalysisFindings,
    pattern: &TestPattern,
    scenarios: &[&TestScenario],
) -> String {
    let mut out = String::new();
    let dirs = &pattern.directories;

    let _ = writeln!(out, "Framework: {}", pattern.framework);
    let _ = writeln!(out, "Tests directory: {}", dirs.tests);
    if strategy == Strategy::PageObject {
        if let Some(pages) = &dirs.pages {
            let _ = writeln!(out, "Page objects directory: {pages}");
        }
    }
    if let Some(utils) = &dirs.utils {
        let _ = writeln!(out, "Utilities directory: {utils}");
    }
    let _ = writeln!(out, "Overall risk: {}", findings.overall_risk);

    if !findings.risks.is_empty() {
        let _ = writeln!(out, "\nRisks:");
        for risk in &findings.risks {
            let status = if risk.mitigated { " (mitigated)" } else { "" };
            let _ = writeln!(out, "- [{}] {}{} {}", risk.level, risk.area, status, risk.description);
        }
    }

    let _ = writeln!(out, "\nScenarios to automate:");
    for (i, scenario) in scenarios.iter().enumerate() {
        let tags = if scenario.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", scenario.tags.join(", "))
        };
        let _ = writeln!(out, "{}. ({}) {}{}", i + 1, scenario.priority, scenario.title, tags);
        for step in &scenario.steps {
            let _ = writeln!(out, "   - {step}");
        }
    }

    if !pattern.examples.is_empty() {
        let _ = writeln!(out, "\nExisting code to imitate:");
        for example in &pattern.examples {
            let label = match example.kind {
                ExampleKind::Test => "test",
                ExampleKind::PageObject => "page object",
                ExampleKind::Utility => "utility",
            };
            let _ = writeln!(out, "--- {} ({label}) ---\n{}", example.path, example.content);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    fn scenario(title: &str, priority: Severity) -> TestScenario {
        TestScenario::new(title, priority)
    }

    #[test]
    fn test_selection_orders_elevated_then_e2e() {
        let findings = AnalysisFindings::empty(Severity::High)
            .with_scenario(scenario("low", Severity::Low))
            .with_scenario(scenario("medium-e2e", Severity::Medium).with_tag("e2e"))
            .with_scenario(scenario("high", Severity::High))
            .with_scenario(scenario("critical-e2e", Severity::Critical).with_tag("e2e"))
            .with_scenario(scenario("critical", Severity::Critical));

        let titles: Vec<&str> = select_scenarios(&findings, 10)
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["critical-e2e", "critical", "high", "medium-e2e", "low"]
        );
    }

    #[test]
    fn test_selection_skips_covered_and_caps() {
        let mut findings = AnalysisFindings::empty(Severity::Low)
            .with_scenario(scenario("covered", Severity::Critical).covered());
        for i in 0..12 {
            findings = findings.with_scenario(scenario(&format!("s{i}"), Severity::Medium));
        }
        let selected = select_scenarios(&findings, POM_SCENARIO_CAP);
        assert_eq!(selected.len(), POM_SCENARIO_CAP);
        assert!(selected.iter().all(|s| s.title != "covered"));
        assert_eq!(selected[0].title, "s0");
    }

    #[test]
    fn test_strategy_from_pattern() {
        assert_eq!(Strategy::for_pattern(&TestPattern::fallback()), Strategy::PageObject);
        assert_eq!(Strategy::PageObject.scenario_cap(), 8);
        assert_eq!(Strategy::Flat.scenario_cap(), 10);
    }

    #[test]
    fn test_user_prompt_mentions_layout_and_scenarios() {
        let findings = AnalysisFindings::empty(Severity::High)
            .with_scenario(scenario("checkout flow", Severity::Critical).with_tag("e2e"));
        let pattern = TestPattern::fallback();
        let selected = select_scenarios(&findings, 8);
        let prompt = user_prompt(Strategy::PageObject, &findings, &pattern, &selected);
        assert!(prompt.contains("Page objects directory: tests/pages"));
        assert!(prompt.contains("1. (critical) checkout flow [e2e]"));
        assert!(system_prompt(Strategy::Flat, "jest").contains("jest"));
    }
}
