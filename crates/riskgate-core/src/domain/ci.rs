//! Version-control and CI shapes exchanged with the hosting collaborator.

use serde::{Deserialize, Serialize};

/// Aggregate CI status of a companion PR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pending,
    Success,
    Failure,
}

/// Conclusion of a single check run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CheckConclusion {
    Success,
    Failure,
    Cancelled,
    TimedOut,
    Skipped,
    Neutral,
    /// Still running or queued.
    Pending,
}

impl CheckConclusion {
    /// Conclusions that count as an actual failed check.
    pub fn is_failure(self) -> bool {
        matches!(self, CheckConclusion::Failure | CheckConclusion::TimedOut)
    }
}

/// One named check on the companion PR.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckRun {
    pub name: String,
    pub conclusion: CheckConclusion,
}

impl CheckRun {
    pub fn new(name: impl Into<String>, conclusion: CheckConclusion) -> Self {
        Self {
            name: name.into(),
            conclusion,
        }
    }
}

/// One poll of CI state. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CiCheckOutcome {
    pub status: CheckStatus,
    #[serde(default)]
    pub checks: Vec<CheckRun>,
}

impl CiCheckOutcome {
    pub fn pending() -> Self {
        Self {
            status: CheckStatus::Pending,
            checks: Vec::new(),
        }
    }

    pub fn success() -> Self {
        Self {
            status: CheckStatus::Success,
            checks: Vec::new(),
        }
    }

    pub fn failure(checks: Vec<CheckRun>) -> Self {
        Self {
            status: CheckStatus::Failure,
            checks,
        }
    }

    /// Checks whose conclusion is an actual failure.
    pub fn failing_checks(&self) -> Vec<CheckRun> {
        self.checks
            .iter()
            .filter(|c| c.conclusion.is_failure())
            .cloned()
            .collect()
    }
}

/// A named branch and its tip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub sha: String,
}

/// A file to write in a single atomic commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

/// Request to open a companion PR.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompanionPrRequest {
    pub title: String,
    pub body: String,
    /// Branch carrying the generated artifacts.
    pub head: String,
    /// Branch the companion PR targets.
    pub base: String,
    /// Originating change this PR accompanies.
    pub change_id: u64,
}

/// A companion PR opened by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompanionPr {
    pub id: u64,
    pub url: String,
    pub branch_name: String,
}
