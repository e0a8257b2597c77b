//! In-memory fakes for collaborator traits (testing only)
//!
//! Provides scripted or recording implementations of every collaborator so
//! the pipeline can be exercised without network access.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::collaborators::{
    DirEntry, LanguageModel, RemediationResult, Remediator, RepoSnapshot, SyntaxValidator, VcsHost,
};
use crate::domain::{
    BranchRef, CheckRun, CiCheckOutcome, CompanionPr, CompanionPrRequest, FileChange,
    GeneratedTestArtifact, ValidationResult, ValidationWarning,
};
use crate::notify::{Notifier, PipelineNotification};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// ScriptedLanguageModel
// ---------------------------------------------------------------------------

/// Returns queued responses in order; errors once the queue is exhausted.
#[derive(Debug, Default)]
pub struct ScriptedLanguageModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedLanguageModel {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose first call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(message.to_string())])),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// `(system, user)` prompts seen so far.
    pub fn prompts(&self) -> Vec<(String, String)> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn infer(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _structured_output: bool,
    ) -> anyhow::Result<String> {
        lock(&self.prompts).push((system_prompt.to_string(), user_prompt.to_string()));
        match lock(&self.responses).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted response left")),
        }
    }
}

// ---------------------------------------------------------------------------
// RejectingValidator
// ---------------------------------------------------------------------------

/// Rejects the listed filenames and accepts everything else.
#[derive(Debug, Default)]
pub struct RejectingValidator {
    reject: HashSet<String>,
}

impl RejectingValidator {
    pub fn new<I, S>(reject: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reject: reject.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl SyntaxValidator for RejectingValidator {
    async fn validate(&self, filename: &str, _code: &str) -> ValidationResult {
        if self.reject.contains(filename) {
            ValidationResult::invalid(ValidationWarning::new(format!("{filename} rejected")))
        } else {
            ValidationResult::valid()
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryRepoSnapshot
// ---------------------------------------------------------------------------

/// Repository snapshot backed by a path -> content map.
///
/// Directories are implied by file paths. Paths registered with
/// [`MemoryRepoSnapshot::with_failure`] return a transport error.
#[derive(Debug, Default)]
pub struct MemoryRepoSnapshot {
    files: BTreeMap<String, String>,
    failing: HashSet<String>,
    reads: AtomicU32,
}

impl MemoryRepoSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_failure(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RepoSnapshot for MemoryRepoSnapshot {
    async fn read_file(&self, path: &str) -> anyhow::Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(path) {
            anyhow::bail!("simulated failure reading {path}");
        }
        Ok(self.files.get(path).cloned())
    }

    async fn list_dir(&self, path: &str) -> anyhow::Result<Option<Vec<DirEntry>>> {
        if self.failing.contains(path) {
            anyhow::bail!("simulated failure listing {path}");
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        for key in self.files.keys() {
            if let Some(rest) = key.strip_prefix(&prefix) {
                match rest.split_once('/') {
                    Some((dir, _)) => dirs.insert(dir.to_string()),
                    None => files.insert(rest.to_string()),
                };
            }
        }
        if files.is_empty() && dirs.is_empty() {
            return Ok(None);
        }
        let mut entries: Vec<DirEntry> = dirs.into_iter().map(DirEntry::dir).collect();
        entries.extend(files.into_iter().map(DirEntry::file));
        Ok(Some(entries))
    }
}

// ---------------------------------------------------------------------------
// FakeVcsHost
// ---------------------------------------------------------------------------

/// Hosting operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostOp {
    DefaultBranch,
    ChangeHead,
    CreateBranch,
    Commit,
    OpenPr,
    Report,
}

/// One scripted reply to `check_status`.
#[derive(Debug, Clone)]
pub enum ScriptedStatus {
    Outcome(CiCheckOutcome),
    TransportError,
}

/// A recorded commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommit {
    pub branch: String,
    pub files: Vec<FileChange>,
    pub message: String,
    pub sha: String,
}

/// In-memory hosting provider with per-PR scripted CI statuses.
///
/// Once a PR's script is exhausted every further poll returns `pending`.
#[derive(Debug, Default)]
pub struct FakeVcsHost {
    branches: Mutex<BTreeMap<String, String>>,
    commits: Mutex<Vec<RecordedCommit>>,
    pr_requests: Mutex<Vec<CompanionPrRequest>>,
    statuses: Mutex<HashMap<u64, VecDeque<ScriptedStatus>>>,
    status_queries: Mutex<HashMap<u64, u32>>,
    reports: Mutex<Vec<(u64, Vec<CheckRun>)>>,
    failing: Mutex<HashSet<HostOp>>,
    next_pr_id: AtomicU64,
}

impl FakeVcsHost {
    pub const DEFAULT_BRANCH: &'static str = "main";
    pub const DEFAULT_SHA: &'static str = "0000000000000000000000000000000000000001";

    pub fn new() -> Self {
        let host = Self::default();
        host.next_pr_id.store(100, Ordering::Relaxed);
        host
    }

    pub fn fail_on(&self, op: HostOp) {
        lock(&self.failing).insert(op);
    }

    pub fn script_status(&self, pr_id: u64, script: Vec<ScriptedStatus>) {
        lock(&self.statuses).entry(pr_id).or_default().extend(script);
    }

    /// Id the next opened PR will receive.
    pub fn peek_next_pr_id(&self) -> u64 {
        self.next_pr_id.load(Ordering::Relaxed)
    }

    pub fn branches(&self) -> BTreeMap<String, String> {
        lock(&self.branches).clone()
    }

    pub fn commits(&self) -> Vec<RecordedCommit> {
        lock(&self.commits).clone()
    }

    pub fn pr_requests(&self) -> Vec<CompanionPrRequest> {
        lock(&self.pr_requests).clone()
    }

    pub fn status_queries(&self, pr_id: u64) -> u32 {
        lock(&self.status_queries).get(&pr_id).copied().unwrap_or(0)
    }

    pub fn reports(&self) -> Vec<(u64, Vec<CheckRun>)> {
        lock(&self.reports).clone()
    }

    fn check(&self, op: HostOp) -> anyhow::Result<()> {
        if lock(&self.failing).contains(&op) {
            anyhow::bail!("simulated {op:?} failure");
        }
        Ok(())
    }
}

#[async_trait]
impl VcsHost for FakeVcsHost {
    async fn default_branch(&self) -> anyhow::Result<BranchRef> {
        self.check(HostOp::DefaultBranch)?;
        Ok(BranchRef {
            name: Self::DEFAULT_BRANCH.to_string(),
            sha: Self::DEFAULT_SHA.to_string(),
        })
    }

    async fn change_head(&self, change_id: u64) -> anyhow::Result<BranchRef> {
        self.check(HostOp::ChangeHead)?;
        Ok(BranchRef {
            name: format!("feature/change-{change_id}"),
            sha: format!("{change_id:040x}"),
        })
    }

    async fn create_branch(&self, name: &str, base_sha: &str) -> anyhow::Result<()> {
        self.check(HostOp::CreateBranch)?;
        lock(&self.branches)
            .entry(name.to_string())
            .or_insert_with(|| base_sha.to_string());
        Ok(())
    }

    async fn commit_files(
        &self,
        branch: &str,
        files: &[FileChange],
        message: &str,
    ) -> anyhow::Result<String> {
        self.check(HostOp::Commit)?;
        let mut branches = lock(&self.branches);
        if !branches.contains_key(branch) {
            anyhow::bail!("branch {branch} does not exist");
        }
        let mut commits = lock(&self.commits);
        let sha = format!("{:040x}", commits.len() + 0xc0ffee);
        commits.push(RecordedCommit {
            branch: branch.to_string(),
            files: files.to_vec(),
            message: message.to_string(),
            sha: sha.clone(),
        });
        branches.insert(branch.to_string(), sha.clone());
        Ok(sha)
    }

    async fn open_companion_pr(&self, request: &CompanionPrRequest) -> anyhow::Result<CompanionPr> {
        self.check(HostOp::OpenPr)?;
        let id = self.next_pr_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.pr_requests).push(request.clone());
        Ok(CompanionPr {
            id,
            url: format!("https://git.example.com/pulls/{id}"),
            branch_name: request.head.clone(),
        })
    }

    async fn check_status(&self, pr_id: u64) -> anyhow::Result<CiCheckOutcome> {
        *lock(&self.status_queries).entry(pr_id).or_insert(0) += 1;
        let next = lock(&self.statuses)
            .get_mut(&pr_id)
            .and_then(|q| q.pop_front());
        match next {
            Some(ScriptedStatus::Outcome(outcome)) => Ok(outcome),
            Some(ScriptedStatus::TransportError) => anyhow::bail!("simulated status timeout"),
            None => Ok(CiCheckOutcome::pending()),
        }
    }

    async fn report_unresolved_failure(
        &self,
        pr_id: u64,
        failing_checks: &[CheckRun],
    ) -> anyhow::Result<()> {
        self.check(HostOp::Report)?;
        lock(&self.reports).push((pr_id, failing_checks.to_vec()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ScriptedRemediator
// ---------------------------------------------------------------------------

/// A recorded remediation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationCall {
    pub pr_id: u64,
    pub failing_checks: Vec<CheckRun>,
    pub artifact_count: usize,
}

/// Remediator returning queued outcomes; `Err` once the queue is empty.
#[derive(Debug, Default)]
pub struct ScriptedRemediator {
    outcomes: Mutex<VecDeque<bool>>,
    calls: Mutex<Vec<RemediationCall>>,
}

impl ScriptedRemediator {
    pub fn new(outcomes: Vec<bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RemediationCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl Remediator for ScriptedRemediator {
    async fn attempt_fix(
        &self,
        pr: &CompanionPr,
        failing_checks: &[CheckRun],
        original_artifacts: &[GeneratedTestArtifact],
    ) -> anyhow::Result<RemediationResult> {
        lock(&self.calls).push(RemediationCall {
            pr_id: pr.id,
            failing_checks: failing_checks.to_vec(),
            artifact_count: original_artifacts.len(),
        });
        match lock(&self.outcomes).pop_front() {
            Some(success) => Ok(RemediationResult {
                success,
                commit_sha: success.then(|| format!("fix-{}", pr.id)),
            }),
            None => Err(anyhow::anyhow!("remediation service unavailable")),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Records delivered notifications; optionally fails every delivery.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<PipelineNotification>>,
    attempts: AtomicU32,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delivered(&self) -> Vec<PipelineNotification> {
        lock(&self.delivered).clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &PipelineNotification) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            anyhow::bail!("chat service unavailable");
        }
        lock(&self.delivered).push(notification.clone());
        Ok(())
    }
}
