//! Monitoring session bookkeeping.
//!
//! A session is created when a companion PR is handed to the monitor and
//! destroyed on its terminal transition. The registry is the only state
//! shared between sessions; the lock is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use riskgate_core::{CompanionPr, GeneratedTestArtifact, Result, RiskgateError};
use serde::Serialize;

/// In-memory state for one companion PR's CI lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutonomousExecutionSession {
    pub pr: CompanionPr,
    pub original_artifacts: Vec<GeneratedTestArtifact>,
    /// Set once, before the single remediation attempt.
    pub attempted_auto_fix: bool,
    pub checks_performed: u32,
    pub started_at: DateTime<Utc>,
}

impl AutonomousExecutionSession {
    pub fn new(pr: CompanionPr, original_artifacts: Vec<GeneratedTestArtifact>) -> Self {
        Self {
            pr,
            original_artifacts,
            attempted_auto_fix: false,
            checks_performed: 0,
            started_at: Utc::now(),
        }
    }

    pub fn pr_id(&self) -> u64 {
        self.pr.id
    }
}

/// Sessions keyed by companion PR id.
///
/// Cloning yields another handle onto the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<u64, AutonomousExecutionSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, AutonomousExecutionSession>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `session`. A live session for the same PR is a conflict.
    pub fn insert(&self, session: AutonomousExecutionSession) -> Result<()> {
        let mut sessions = self.lock();
        let pr_id = session.pr_id();
        if sessions.contains_key(&pr_id) {
            return Err(RiskgateError::SessionConflict(pr_id));
        }
        sessions.insert(pr_id, session);
        Ok(())
    }

    pub fn get(&self, pr_id: u64) -> Option<AutonomousExecutionSession> {
        self.lock().get(&pr_id).cloned()
    }

    pub fn contains(&self, pr_id: u64) -> bool {
        self.lock().contains_key(&pr_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Artifacts the session was created with, or empty if unknown.
    pub fn original_artifacts(&self, pr_id: u64) -> Vec<GeneratedTestArtifact> {
        self.lock()
            .get(&pr_id)
            .map(|s| s.original_artifacts.clone())
            .unwrap_or_default()
    }

    /// Claim the session's single remediation attempt.
    ///
    /// Returns `true` only for the first claim on a live session.
    pub fn claim_auto_fix(&self, pr_id: u64) -> bool {
        match self.lock().get_mut(&pr_id) {
            Some(session) if !session.attempted_auto_fix => {
                session.attempted_auto_fix = true;
                true
            }
            _ => false,
        }
    }

    /// Count one inconclusive poll; returns the new total.
    pub fn record_check(&self, pr_id: u64) -> u32 {
        match self.lock().get_mut(&pr_id) {
            Some(session) => {
                session.checks_performed += 1;
                session.checks_performed
            }
            None => u32::MAX,
        }
    }

    pub fn reset_checks(&self, pr_id: u64) {
        if let Some(session) = self.lock().get_mut(&pr_id) {
            session.checks_performed = 0;
        }
    }

    pub fn remove(&self, pr_id: u64) -> Option<AutonomousExecutionSession> {
        self.lock().remove(&pr_id)
    }

    /// Register `session` and tie its lifetime to the returned guard.
    pub fn register(&self, session: AutonomousExecutionSession) -> Result<SessionGuard> {
        let pr_id = session.pr_id();
        self.insert(session)?;
        Ok(SessionGuard {
            registry: self.clone(),
            pr_id,
            released: false,
        })
    }
}

/// Owns one registered session and removes it when dropped.
///
/// A monitoring task that panics or is aborted drops its guard, so the PR
/// id never stays registered after the task is gone.
#[derive(Debug)]
pub struct SessionGuard {
    registry: SessionRegistry,
    pr_id: u64,
    released: bool,
}

impl SessionGuard {
    pub fn pr_id(&self) -> u64 {
        self.pr_id
    }

    /// Remove the session now and hand back its final state.
    pub fn release(mut self) -> Option<AutonomousExecutionSession> {
        self.released = true;
        self.registry.remove(self.pr_id)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.released {
            self.registry.remove(self.pr_id);
        }
    }
}
