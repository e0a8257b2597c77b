//! Test generation orchestration: detect pattern, generate, validate, filter.
//!
//! Generation never aborts: model failures and malformed output yield an
//! empty candidate list, and rejected candidates are filtered out with their
//! counts reported in [`ValidationSummary`].

pub mod parse;
pub mod prompt;

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collaborators::{LanguageModel, RepoSnapshot, SyntaxValidator};
use crate::domain::{
    AnalysisFindings, GeneratedTestArtifact, TestPattern, ValidationResult, ValidationWarning,
};
use crate::metrics::METRICS;
use crate::obs::emit_generation_completed;
use crate::pattern::TestPatternDetector;
use crate::validators::unsafe_path_reason;

pub use parse::{parse_artifacts, strip_fence};
pub use prompt::{select_scenarios, Strategy, FLAT_SCENARIO_CAP, POM_SCENARIO_CAP};

/// Validation counts for one generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total_tests: usize,
    pub valid_tests: usize,
    pub invalid_tests: usize,
}

/// Output of [`TestGenerationOrchestrator::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutcome {
    /// Only artifacts that passed validation.
    pub artifacts: Vec<GeneratedTestArtifact>,
    pub pattern: TestPattern,
    pub validation_summary: ValidationSummary,
}

/// Drives pattern detection, model generation and validation.
pub struct TestGenerationOrchestrator {
    model: Arc<dyn LanguageModel>,
    validator: Arc<dyn SyntaxValidator>,
}

impl TestGenerationOrchestrator {
    pub fn new(model: Arc<dyn LanguageModel>, validator: Arc<dyn SyntaxValidator>) -> Self {
        Self { model, validator }
    }

    /// Generate validated test artifacts for `findings` against `repo`.
    pub async fn generate(
        &self,
        findings: &AnalysisFindings,
        repo: &dyn RepoSnapshot,
    ) -> GenerationOutcome {
        let pattern = TestPatternDetector::new(repo).detect().await;
        let strategy = Strategy::for_pattern(&pattern);

        let candidates = self.generate_candidates(strategy, findings, &pattern).await;
        let checked = self.validate_all(candidates).await;

        let total = checked.len();
        let (artifacts, rejected): (Vec<_>, Vec<_>) =
            checked.into_iter().partition(GeneratedTestArtifact::is_valid);
        for artifact in &rejected {
            debug!(
                filename = %artifact.filename,
                warnings = ?artifact.validation.as_ref().map(|v| &v.warnings),
                "artifact rejected by validator"
            );
        }

        let summary = ValidationSummary {
            total_tests: total,
            valid_tests: artifacts.len(),
            invalid_tests: rejected.len(),
        };
        METRICS.add_artifacts(summary.valid_tests as u64, summary.invalid_tests as u64);
        emit_generation_completed(
            &pattern.framework,
            summary.total_tests,
            summary.valid_tests,
            summary.invalid_tests,
        );

        GenerationOutcome {
            artifacts,
            pattern,
            validation_summary: summary,
        }
    }

    async fn generate_candidates(
        &self,
        strategy: Strategy,
        findings: &AnalysisFindings,
        pattern: &TestPattern,
    ) -> Vec<GeneratedTestArtifact> {
        let scenarios = select_scenarios(findings, strategy.scenario_cap());
        if scenarios.is_empty() {
            debug!("no uncovered scenarios; skipping generation");
            return Vec::new();
        }

        let system = prompt::system_prompt(strategy, &pattern.framework);
        let user = prompt::user_prompt(strategy, findings, pattern, &scenarios);

        let response = match self.model.infer(&system, &user, true).await {
            Ok(text) => text,
            Err(e) => {
                warn!(strategy = strategy.as_str(), error = %e, "model inference failed");
                return Vec::new();
            }
        };

        match parse_artifacts(&response, &pattern.framework) {
            Ok(artifacts) => artifacts,
            Err(e) => {
                warn!(strategy = strategy.as_str(), error = %e, "discarding malformed model output");
                Vec::new()
            }
        }
    }

    async fn validate_all(
        &self,
        mut candidates: Vec<GeneratedTestArtifact>,
    ) -> Vec<GeneratedTestArtifact> {
        let results = join_all(candidates.iter().map(|a| async move {
            match unsafe_path_reason(&a.filename) {
                Some(reason) => ValidationResult::invalid(
                    ValidationWarning::new(format!("{}: {reason}", a.filename))
                        .with_suggestion("use a path relative to the test directory"),
                ),
                None => self.validator.validate(&a.filename, &a.code).await,
            }
        }))
        .await;
        for (artifact, result) in candidates.iter_mut().zip(results) {
            artifact.attach_validation(result);
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Severity, TestScenario};
    use crate::fakes::{MemoryRepoSnapshot, ScriptedLanguageModel};
    use crate::validators::NoopSyntaxValidator;

    #[tokio::test]
    async fn test_no_uncovered_scenarios_skips_model() {
        let model = Arc::new(ScriptedLanguageModel::new(vec![]));
        let orchestrator =
            TestGenerationOrchestrator::new(model.clone(), Arc::new(NoopSyntaxValidator));
        let findings = AnalysisFindings::empty(Severity::High)
            .with_scenario(TestScenario::new("covered", Severity::Critical).covered());

        let outcome = orchestrator
            .generate(&findings, &MemoryRepoSnapshot::new())
            .await;

        assert!(outcome.artifacts.is_empty());
        assert_eq!(outcome.validation_summary, ValidationSummary::default());
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsafe_paths_are_rejected_before_validation() {
        let response = r#"{"files": [
            {"filename": "login.spec.ts", "kind": "test", "code": "test('a', () => {})"},
            {"filename": ".github/workflows/ci.yml", "kind": "fixture", "code": "on: push"},
            {"filename": "../../outside.spec.ts", "kind": "test", "code": "test('b', () => {})"}
        ]}"#;
        let model = Arc::new(ScriptedLanguageModel::new(vec![response.to_string()]));
        let orchestrator = TestGenerationOrchestrator::new(model, Arc::new(NoopSyntaxValidator));
        let findings = AnalysisFindings::empty(Severity::High)
            .with_scenario(TestScenario::new("login", Severity::Critical));

        let outcome = orchestrator
            .generate(&findings, &MemoryRepoSnapshot::new())
            .await;

        let names: Vec<&str> = outcome
            .artifacts
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        assert_eq!(names, vec!["login.spec.ts"]);
        assert_eq!(outcome.validation_summary.total_tests, 3);
        assert_eq!(outcome.validation_summary.invalid_tests, 2);
    }

    #[tokio::test]
    async fn test_model_error_yields_empty_outcome() {
        let model = Arc::new(ScriptedLanguageModel::failing("rate limited"));
        let orchestrator = TestGenerationOrchestrator::new(model, Arc::new(NoopSyntaxValidator));
        let findings = AnalysisFindings::empty(Severity::High)
            .with_scenario(TestScenario::new("checkout", Severity::Critical));

        let outcome = orchestrator
            .generate(&findings, &MemoryRepoSnapshot::new())
            .await;

        assert!(outcome.artifacts.is_empty());
        assert!(!outcome.pattern.detected);
    }
}
