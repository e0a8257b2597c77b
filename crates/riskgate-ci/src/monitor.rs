//! CI monitoring for companion PRs.
//!
//! Each scheduled session runs as its own task:
//! `scheduled -> polling -> [remediating -> polling] -> terminal`.
//! Polls within a session are strictly sequential, inconclusive polls are
//! bounded by `max_checks`, and a session gets at most one remediation
//! attempt. The session is removed from the registry when its task ends,
//! whether it reaches a terminal state, panics, or is aborted.

use std::sync::Arc;

use riskgate_core::metrics::METRICS;
use riskgate_core::obs::{
    emit_monitor_scheduled, emit_monitor_terminal, emit_monitor_transition, session_span,
};
use riskgate_core::{
    notify_best_effort, CheckRun, CheckStatus, CompanionPr, GeneratedTestArtifact,
    MonitorSettings, NoopNotifier, Notifier, PipelineNotification, Remediator, Result, VcsHost,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn, Instrument};

use crate::session::{AutonomousExecutionSession, SessionGuard, SessionRegistry};

/// Terminal state of a monitoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalState {
    Success,
    ReportedFailure,
    Timeout,
}

impl TerminalState {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminalState::Success => "success",
            TerminalState::ReportedFailure => "reported-failure",
            TerminalState::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monitor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Scheduled,
    Polling,
    Remediating,
    Terminal(TerminalState),
}

impl MonitorState {
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorState::Scheduled => "scheduled",
            MonitorState::Polling => "polling",
            MonitorState::Remediating => "remediating",
            MonitorState::Terminal(t) => t.as_str(),
        }
    }
}

/// Final report of one session, returned through its `JoinHandle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorReport {
    pub pr_id: u64,
    pub terminal: TerminalState,
    pub checks_performed: u32,
    pub attempted_auto_fix: bool,
}

/// Schedules and drives monitoring sessions.
#[derive(Clone)]
pub struct CiMonitor {
    host: Arc<dyn VcsHost>,
    remediator: Arc<dyn Remediator>,
    notifier: Arc<dyn Notifier>,
    registry: SessionRegistry,
    settings: MonitorSettings,
}

impl CiMonitor {
    pub fn new(
        host: Arc<dyn VcsHost>,
        remediator: Arc<dyn Remediator>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            host,
            remediator,
            notifier: Arc::new(NoopNotifier),
            registry: SessionRegistry::new(),
            settings,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Register a session for `pr` and start monitoring it in the background.
    ///
    /// Returns as soon as the task is spawned. Fails only if a session for
    /// the same PR is still live.
    pub fn schedule(
        &self,
        pr: CompanionPr,
        original_artifacts: Vec<GeneratedTestArtifact>,
        auto_fix: bool,
    ) -> Result<JoinHandle<MonitorReport>> {
        let guard = self
            .registry
            .register(AutonomousExecutionSession::new(pr.clone(), original_artifacts))?;
        METRICS.inc_sessions_started();
        emit_monitor_scheduled(pr.id, &pr.branch_name);

        let span = session_span(pr.id);
        let monitor = self.clone();
        // Dropped with the task, even before its first poll.
        Ok(tokio::spawn(
            async move { monitor.run(guard, pr, auto_fix).await }.instrument(span),
        ))
    }

    async fn run(&self, guard: SessionGuard, pr: CompanionPr, auto_fix: bool) -> MonitorReport {
        let mut state = MonitorState::Scheduled;
        sleep(self.settings.initial_delay()).await;
        self.transition(pr.id, &mut state, MonitorState::Polling);

        let terminal = loop {
            let outcome = match self.host.check_status(pr.id).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    warn!(pr_id = pr.id, error = %e, "CI status query failed; will retry");
                    None
                }
            };

            match outcome {
                Some(outcome) if outcome.status == CheckStatus::Success => {
                    break TerminalState::Success;
                }
                Some(outcome) if outcome.status == CheckStatus::Failure => {
                    let failing = outcome.failing_checks();
                    if auto_fix && !failing.is_empty() && self.registry.claim_auto_fix(pr.id) {
                        self.transition(pr.id, &mut state, MonitorState::Remediating);
                        if self.remediate(&pr, &failing).await {
                            self.registry.reset_checks(pr.id);
                            self.transition(pr.id, &mut state, MonitorState::Polling);
                            sleep(self.settings.poll_interval()).await;
                            continue;
                        }
                    }
                    let reported = if failing.is_empty() {
                        outcome.checks
                    } else {
                        failing
                    };
                    self.report_failure(pr.id, reported).await;
                    break TerminalState::ReportedFailure;
                }
                // Pending, or a transport error: inconclusive either way.
                _ => {
                    let checks = self.registry.record_check(pr.id);
                    if checks >= self.settings.max_checks {
                        break TerminalState::Timeout;
                    }
                    sleep(self.settings.poll_interval()).await;
                }
            }
        };

        self.transition(pr.id, &mut state, MonitorState::Terminal(terminal));
        self.finish(guard, terminal).await
    }

    async fn remediate(&self, pr: &CompanionPr, failing: &[CheckRun]) -> bool {
        METRICS.inc_remediation_attempts();
        let artifacts = self.registry.original_artifacts(pr.id);
        match self.remediator.attempt_fix(pr, failing, &artifacts).await {
            Ok(result) if result.success => {
                info!(
                    pr_id = pr.id,
                    commit = result.commit_sha.as_deref().unwrap_or("-"),
                    "remediation pushed a fix"
                );
                true
            }
            Ok(_) => {
                info!(pr_id = pr.id, "remediation did not produce a fix");
                false
            }
            Err(e) => {
                warn!(pr_id = pr.id, error = %e, "remediation failed");
                false
            }
        }
    }

    async fn report_failure(&self, pr_id: u64, failing: Vec<CheckRun>) {
        if let Err(e) = self.host.report_unresolved_failure(pr_id, &failing).await {
            warn!(pr_id, error = %e, "failed to report unresolved CI failure");
        }
        notify_best_effort(
            self.notifier.as_ref(),
            PipelineNotification::CiFailureReported {
                pr_id,
                failing_checks: failing,
            },
        )
        .await;
    }

    async fn finish(&self, guard: SessionGuard, terminal: TerminalState) -> MonitorReport {
        let pr_id = guard.pr_id();
        let (checks_performed, attempted_auto_fix) = guard
            .release()
            .map(|s| (s.checks_performed, s.attempted_auto_fix))
            .unwrap_or_default();

        emit_monitor_terminal(pr_id, terminal.as_str(), attempted_auto_fix);
        match terminal {
            TerminalState::Success => {
                notify_best_effort(
                    self.notifier.as_ref(),
                    PipelineNotification::CiPassed {
                        pr_id,
                        attempted_auto_fix,
                    },
                )
                .await;
            }
            TerminalState::Timeout => {
                METRICS.inc_sessions_timed_out();
                notify_best_effort(
                    self.notifier.as_ref(),
                    PipelineNotification::MonitoringTimedOut {
                        pr_id,
                        checks_performed,
                    },
                )
                .await;
            }
            TerminalState::ReportedFailure => {}
        }

        MonitorReport {
            pr_id,
            terminal,
            checks_performed,
            attempted_auto_fix,
        }
    }

    fn transition(&self, pr_id: u64, state: &mut MonitorState, next: MonitorState) {
        let checks = self
            .registry
            .get(pr_id)
            .map(|s| s.checks_performed)
            .unwrap_or_default();
        emit_monitor_transition(pr_id, state.as_str(), next.as_str(), checks);
        *state = next;
    }
}
