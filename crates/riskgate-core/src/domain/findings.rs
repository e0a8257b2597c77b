//! Analysis findings produced upstream for a single change.
//!
//! Findings are immutable once produced; every consumer in this crate takes
//! them by shared reference.

use serde::{Deserialize, Serialize};

/// Severity scale shared by risks, gaps and scenario priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Sort rank, most severe first.
    pub fn rank(self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }

    /// Whether this is `critical` or `high`.
    pub fn is_elevated(self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single identified risk in the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Risk {
    pub level: Severity,
    pub area: String,
    #[serde(default)]
    pub mitigated: bool,
    #[serde(default)]
    pub description: String,
}

impl Risk {
    pub fn new(level: Severity, area: impl Into<String>) -> Self {
        Self {
            level,
            area: area.into(),
            mitigated: false,
            description: String::new(),
        }
    }
}

/// A coverage or process gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
}

impl Gap {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            description: String::new(),
        }
    }
}

/// A test scenario the analysis recommends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestScenario {
    #[serde(default)]
    pub title: String,
    pub priority: Severity,
    #[serde(default)]
    pub has_automated_test: bool,
    /// Free-form tags such as `e2e`, `api`, `smoke`.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl TestScenario {
    pub fn new(title: impl Into<String>, priority: Severity) -> Self {
        Self {
            title: title.into(),
            priority,
            has_automated_test: false,
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn covered(mut self) -> Self {
        self.has_automated_test = true;
        self
    }

    pub fn is_e2e(&self) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case("e2e"))
    }
}

/// Structured analysis output for one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFindings {
    pub overall_risk: Severity,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub gaps: Vec<Gap>,
    #[serde(default)]
    pub test_scenarios: Vec<TestScenario>,
}

impl AnalysisFindings {
    /// Findings with the given overall risk and nothing else.
    pub fn empty(overall_risk: Severity) -> Self {
        Self {
            overall_risk,
            risks: Vec::new(),
            gaps: Vec::new(),
            test_scenarios: Vec::new(),
        }
    }

    pub fn with_risk(mut self, risk: Risk) -> Self {
        self.risks.push(risk);
        self
    }

    pub fn with_gap(mut self, gap: Gap) -> Self {
        self.gaps.push(gap);
        self
    }

    pub fn with_scenario(mut self, scenario: TestScenario) -> Self {
        self.test_scenarios.push(scenario);
        self
    }
}
