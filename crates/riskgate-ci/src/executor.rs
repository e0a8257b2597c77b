//! Autonomous companion-PR execution.
//!
//! Generate, branch, commit, open PR, schedule monitoring. The sequence is
//! synchronous up to scheduling; the first failing step is recorded in
//! [`ExecutionResult::errors`] and ends the run. Nothing is returned as `Err`.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use riskgate_core::obs::emit_step_failed;
use riskgate_core::{
    notify_best_effort, AnalysisFindings, ArtifactKind, AutonomousConfig, BaseBranchStrategy,
    BranchRef, CompanionPr, CompanionPrRequest, FileChange, GeneratedTestArtifact, NoopNotifier,
    Notifier, PipelineNotification, RepoSnapshot, TestDirectories, TestGenerationOrchestrator,
    unsafe_path_reason, ValidationSummary, VcsHost,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::branch::companion_branch_name;
use crate::monitor::{CiMonitor, MonitorReport};

/// Steps of the synchronous sequence that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStep {
    ResolveBase,
    CreateBranch,
    Commit,
    OpenPr,
    ScheduleMonitor,
}

impl ExecutionStep {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStep::ResolveBase => "resolve_base",
            ExecutionStep::CreateBranch => "create_branch",
            ExecutionStep::Commit => "commit",
            ExecutionStep::OpenPr => "open_pr",
            ExecutionStep::ScheduleMonitor => "schedule_monitor",
        }
    }
}

impl fmt::Display for ExecutionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed step and its cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{step} failed: {message}")]
pub struct StepError {
    pub step: ExecutionStep,
    pub message: String,
}

/// Originating change and repository access for one run.
#[derive(Clone)]
pub struct ExecutionContext {
    pub change_id: u64,
    pub title: Option<String>,
    pub snapshot: Arc<dyn RepoSnapshot>,
}

impl ExecutionContext {
    pub fn new(change_id: u64, snapshot: Arc<dyn RepoSnapshot>) -> Self {
        Self {
            change_id,
            title: None,
            snapshot,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Outcome of [`AutonomousExecutor::execute`].
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub artifacts: Vec<GeneratedTestArtifact>,
    pub companion_pr: Option<CompanionPr>,
    pub branch_name: Option<String>,
    pub commit_sha: Option<String>,
    pub errors: Vec<StepError>,
    pub validation_summary: ValidationSummary,
    /// Handle to the scheduled monitoring session, if any.
    #[serde(skip)]
    pub monitor: Option<JoinHandle<MonitorReport>>,
}

impl ExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    fn fail(&mut self, step: ExecutionStep, err: impl fmt::Display) {
        let message = format!("{err:#}");
        emit_step_failed(step.as_str(), &message);
        self.errors.push(StepError { step, message });
    }
}

/// Runs the companion-PR sequence for one change.
pub struct AutonomousExecutor {
    config: AutonomousConfig,
    generator: TestGenerationOrchestrator,
    host: Arc<dyn VcsHost>,
    monitor: CiMonitor,
    notifier: Arc<dyn Notifier>,
}

impl AutonomousExecutor {
    pub fn new(
        config: AutonomousConfig,
        generator: TestGenerationOrchestrator,
        host: Arc<dyn VcsHost>,
        monitor: CiMonitor,
    ) -> Self {
        Self {
            config,
            generator,
            host,
            monitor,
            notifier: Arc::new(NoopNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &AutonomousConfig {
        &self.config
    }

    pub fn monitor(&self) -> &CiMonitor {
        &self.monitor
    }

    /// Execute the sequence. Returns right after monitoring is scheduled.
    pub async fn execute(
        &self,
        findings: &AnalysisFindings,
        ctx: &ExecutionContext,
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        if !self.config.enabled {
            debug!(change_id = ctx.change_id, "autonomous mode disabled");
            return result;
        }

        let outcome = self
            .generator
            .generate(findings, ctx.snapshot.as_ref())
            .await;
        result.validation_summary = outcome.validation_summary;
        if outcome.artifacts.is_empty() {
            info!(change_id = ctx.change_id, "no valid artifacts generated");
            return result;
        }
        result.artifacts = outcome.artifacts;

        let dirs = &outcome.pattern.directories;
        let mut files: Vec<FileChange> = Vec::with_capacity(result.artifacts.len());
        result.artifacts.retain(|a| match artifact_path(a, dirs) {
            Some(path) => {
                files.push(FileChange {
                    path,
                    content: a.code.clone(),
                });
                true
            }
            None => {
                warn!(filename = %a.filename, "dropping artifact with unsafe path");
                false
            }
        });
        if files.is_empty() {
            info!(change_id = ctx.change_id, "no artifact has a committable path");
            return result;
        }

        let branch = companion_branch_name(&self.config.branch_prefix, ctx.change_id, Utc::now());
        result.branch_name = Some(branch.clone());

        let base = match self.resolve_base(ctx.change_id).await {
            Ok(base) => base,
            Err(e) => {
                result.fail(ExecutionStep::ResolveBase, e);
                return result;
            }
        };

        if let Err(e) = self.host.create_branch(&branch, &base.sha).await {
            result.fail(ExecutionStep::CreateBranch, e);
            return result;
        }

        let message = format!(
            "test: add {} generated tests for change #{}",
            files.len(),
            ctx.change_id
        );
        match self.host.commit_files(&branch, &files, &message).await {
            Ok(sha) => result.commit_sha = Some(sha),
            Err(e) => {
                result.fail(ExecutionStep::Commit, e);
                return result;
            }
        }
        info!(
            change_id = ctx.change_id,
            branch = %branch,
            files = files.len(),
            "generated tests committed"
        );

        if !self.config.create_pr {
            return result;
        }

        let request = CompanionPrRequest {
            title: pr_title(ctx),
            body: pr_body(&files, &result.validation_summary),
            head: branch,
            base: base.name,
            change_id: ctx.change_id,
        };
        let pr = match self.host.open_companion_pr(&request).await {
            Ok(pr) => pr,
            Err(e) => {
                result.fail(ExecutionStep::OpenPr, e);
                return result;
            }
        };
        info!(change_id = ctx.change_id, pr_id = pr.id, url = %pr.url, "companion PR opened");
        result.companion_pr = Some(pr.clone());
        notify_best_effort(
            self.notifier.as_ref(),
            PipelineNotification::CompanionPrOpened {
                change_id: ctx.change_id,
                pr: pr.clone(),
                artifact_count: result.artifacts.len(),
            },
        )
        .await;

        if self.config.monitor_ci {
            match self
                .monitor
                .schedule(pr, result.artifacts.clone(), self.config.auto_fix)
            {
                Ok(handle) => result.monitor = Some(handle),
                Err(e) => result.fail(ExecutionStep::ScheduleMonitor, e),
            }
        }

        result
    }

    async fn resolve_base(&self, change_id: u64) -> anyhow::Result<BranchRef> {
        match self.config.base_branch_strategy {
            BaseBranchStrategy::Default => self.host.default_branch().await,
            BaseBranchStrategy::PrHead => self.host.change_head(change_id).await,
        }
    }
}

/// Repository path for `artifact`, or `None` if it would escape the
/// repository or land in a hidden directory.
///
/// Filenames with a directory component are kept as-is; bare names go to
/// the pattern directory for their kind, falling back to the tests directory.
pub fn artifact_path(artifact: &GeneratedTestArtifact, dirs: &TestDirectories) -> Option<String> {
    let name = artifact.filename.as_str();
    if unsafe_path_reason(name).is_some() {
        return None;
    }
    if name.contains('/') {
        return Some(name.to_string());
    }
    let dir = match artifact.kind {
        ArtifactKind::Test => dirs.tests.as_str(),
        ArtifactKind::PageObject => dirs.pages.as_deref().unwrap_or(&dirs.tests),
        ArtifactKind::Utility | ArtifactKind::Fixture => {
            dirs.utils.as_deref().unwrap_or(&dirs.tests)
        }
    };
    let path = format!("{}/{}", dir.trim_end_matches('/'), name);
    unsafe_path_reason(&path).is_none().then_some(path)
}

fn pr_title(ctx: &ExecutionContext) -> String {
    match &ctx.title {
        Some(title) => format!("Generated tests for: {title}"),
        None => format!("Generated tests for change #{}", ctx.change_id),
    }
}

fn pr_body(files: &[FileChange], summary: &ValidationSummary) -> String {
    let mut body = String::from("Automatically generated tests covering uncovered scenarios.\n\n");
    for file in files {
        body.push_str(&format!("- `{}`\n", file.path));
    }
    body.push_str(&format!(
        "\nValidation: {} of {} candidates passed.\n",
        summary.valid_tests, summary.total_tests
    ));
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(filename: &str, kind: ArtifactKind) -> GeneratedTestArtifact {
        GeneratedTestArtifact::new(filename, "playwright", kind, "test('x', () => {})")
    }

    #[test]
    fn test_artifact_path_by_kind() {
        let dirs = TestDirectories::default_pom();
        assert_eq!(
            artifact_path(&artifact("login.spec.ts", ArtifactKind::Test), &dirs).as_deref(),
            Some("tests/login.spec.ts")
        );
        assert_eq!(
            artifact_path(&artifact("LoginPage.ts", ArtifactKind::PageObject), &dirs).as_deref(),
            Some("tests/pages/LoginPage.ts")
        );
        assert_eq!(
            artifact_path(&artifact("auth.ts", ArtifactKind::Fixture), &dirs).as_deref(),
            Some("tests/utils/auth.ts")
        );
    }

    #[test]
    fn test_artifact_path_keeps_explicit_dirs_and_falls_back() {
        let dirs = TestDirectories::flat("__tests__");
        assert_eq!(
            artifact_path(&artifact("e2e/a.spec.ts", ArtifactKind::Test), &dirs).as_deref(),
            Some("e2e/a.spec.ts")
        );
        assert_eq!(
            artifact_path(&artifact("Page.ts", ArtifactKind::PageObject), &dirs).as_deref(),
            Some("__tests__/Page.ts")
        );
    }

    #[test]
    fn test_artifact_path_refuses_escaping_and_hidden_paths() {
        let dirs = TestDirectories::default_pom();
        for name in [
            "../../.github/workflows/pwn.yml",
            ".github/workflows/pwn.yml",
            "/etc/cron.d/job",
            "tests/../../escape.spec.ts",
        ] {
            assert_eq!(
                artifact_path(&artifact(name, ArtifactKind::Test), &dirs),
                None,
                "{name}"
            );
        }
        // A hidden pattern directory is refused too.
        let hidden = TestDirectories::flat(".hidden");
        assert_eq!(
            artifact_path(&artifact("a.spec.ts", ArtifactKind::Test), &hidden),
            None
        );
    }

    #[test]
    fn test_step_error_display() {
        let err = StepError {
            step: ExecutionStep::OpenPr,
            message: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "open_pr failed: forbidden");
    }
}
