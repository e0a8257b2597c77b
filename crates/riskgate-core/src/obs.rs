//! Structured observability hooks for governance and remediation lifecycle events.
//!
//! This module provides:
//! - A session-scoped tracing span tagged with the companion PR id
//! - Emission functions for decisions, generation, executor steps and CI monitoring
//!
//! Events are emitted at `info!` level (step failures at `warn!`).

use tracing::{info, warn};

use crate::domain::{GovernanceDecision, Severity};

/// Span for one monitoring session, for use with `tracing::Instrument`.
pub fn session_span(pr_id: u64) -> tracing::Span {
    tracing::info_span!("riskgate.session", pr_id = pr_id)
}

/// Emit event: governance decision computed.
pub fn emit_governance_decided(decision: &GovernanceDecision, overall_risk: Severity) {
    info!(
        event = "governance.decided",
        score = decision.risk_score,
        recommendation = %decision.recommendation,
        overall_risk = %overall_risk,
    );
}

/// Emit event: generation pass finished with validation counts.
pub fn emit_generation_completed(framework: &str, total: usize, valid: usize, invalid: usize) {
    info!(
        event = "generation.completed",
        framework = %framework,
        total = total,
        valid = valid,
        invalid = invalid,
    );
}

/// Emit event: an executor step failed and the run was aborted.
pub fn emit_step_failed(step: &str, error: &dyn std::fmt::Display) {
    warn!(event = "execution.step_failed", step = %step, error = %error);
}

/// Emit event: a monitoring session was registered.
pub fn emit_monitor_scheduled(pr_id: u64, branch: &str) {
    info!(event = "monitor.scheduled", pr_id = pr_id, branch = %branch);
}

/// Emit event: monitoring state change.
pub fn emit_monitor_transition(pr_id: u64, from: &str, to: &str, checks_performed: u32) {
    info!(
        event = "monitor.transition",
        pr_id = pr_id,
        from = %from,
        to = %to,
        checks_performed = checks_performed,
    );
}

/// Emit event: a session reached a terminal state and was destroyed.
pub fn emit_monitor_terminal(pr_id: u64, terminal: &str, attempted_auto_fix: bool) {
    info!(
        event = "monitor.terminal",
        pr_id = pr_id,
        terminal = %terminal,
        attempted_auto_fix = attempted_auto_fix,
    );
}
