//! Interfaces to the external collaborators the pipeline drives.
//!
//! Every method returns `anyhow::Result` because implementations live behind
//! network boundaries. Callers decide per call site whether a failure is
//! recoverable.

use std::future::Future;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{
    BranchRef, CheckRun, CiCheckOutcome, CompanionPr, CompanionPrRequest, FileChange,
    GeneratedTestArtifact, ValidationResult,
};

/// Language-model inference.
///
/// The returned text may be malformed when `structured_output` is requested;
/// callers treat that as a parse failure, not a fatal error.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        structured_output: bool,
    ) -> anyhow::Result<String>;
}

/// Syntax validation for generated files.
#[async_trait]
pub trait SyntaxValidator: Send + Sync {
    async fn validate(&self, filename: &str, code: &str) -> ValidationResult;
}

/// Entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
        }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
        }
    }
}

/// Read-only view of the target repository.
///
/// `Ok(None)` means "not found" and is a normal outcome; `Err` is a transport
/// or permission failure.
#[async_trait]
pub trait RepoSnapshot: Send + Sync {
    async fn read_file(&self, path: &str) -> anyhow::Result<Option<String>>;

    async fn list_dir(&self, path: &str) -> anyhow::Result<Option<Vec<DirEntry>>>;
}

/// Version-control hosting operations.
#[async_trait]
pub trait VcsHost: Send + Sync {
    async fn default_branch(&self) -> anyhow::Result<BranchRef>;

    /// Head branch and commit of the originating change.
    async fn change_head(&self, change_id: u64) -> anyhow::Result<BranchRef>;

    /// Create `name` at `base_sha`. Must succeed if the branch already exists.
    async fn create_branch(&self, name: &str, base_sha: &str) -> anyhow::Result<()>;

    /// Write all files as one tree, one commit, one ref update.
    async fn commit_files(
        &self,
        branch: &str,
        files: &[FileChange],
        message: &str,
    ) -> anyhow::Result<String>;

    async fn open_companion_pr(&self, request: &CompanionPrRequest) -> anyhow::Result<CompanionPr>;

    async fn check_status(&self, pr_id: u64) -> anyhow::Result<CiCheckOutcome>;

    async fn report_unresolved_failure(
        &self,
        pr_id: u64,
        failing_checks: &[CheckRun],
    ) -> anyhow::Result<()>;
}

/// Outcome of one remediation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationResult {
    pub success: bool,
    /// Commit pushed by the fix, if any.
    pub commit_sha: Option<String>,
}

/// Automated repair of failing checks on a companion PR.
#[async_trait]
pub trait Remediator: Send + Sync {
    async fn attempt_fix(
        &self,
        pr: &CompanionPr,
        failing_checks: &[CheckRun],
        original_artifacts: &[GeneratedTestArtifact],
    ) -> anyhow::Result<RemediationResult>;
}

/// Best-effort probe: `None` for both "not found" and "failed".
///
/// Errors are logged at debug level and never propagated.
pub async fn probe<T, F>(what: &str, fut: F) -> Option<T>
where
    F: Future<Output = anyhow::Result<Option<T>>>,
{
    match fut.await {
        Ok(found) => found,
        Err(e) => {
            debug!(probe = %what, error = %e, "probe failed; treating as not found");
            None
        }
    }
}
