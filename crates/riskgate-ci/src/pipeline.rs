//! Top-level entry points: governance decision plus autonomous execution.

use std::sync::Arc;

use riskgate_core::{
    compute_governance_decision, notify_best_effort, AnalysisFindings, GovernanceDecision,
    LanguageModel, NoopNotifier, NoopSyntaxValidator, NotificationConfig, Notifier,
    PipelineNotification, Remediator, RiskgateConfig, SyntaxValidator,
    TestGenerationOrchestrator, VcsHost, WebhookNotifier,
};
use serde::Serialize;
use tracing::warn;

use crate::executor::{AutonomousExecutor, ExecutionContext, ExecutionResult};
use crate::monitor::CiMonitor;
use crate::session::SessionRegistry;

/// External services the pipeline talks to, resolved once at startup.
#[derive(Clone)]
pub struct Collaborators {
    pub model: Arc<dyn LanguageModel>,
    pub validator: Arc<dyn SyntaxValidator>,
    pub host: Arc<dyn VcsHost>,
    pub remediator: Arc<dyn Remediator>,
    /// Overrides the notifier derived from configuration.
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl Collaborators {
    /// Collaborators with the no-op validator and the configured notifier.
    pub fn new(
        model: Arc<dyn LanguageModel>,
        host: Arc<dyn VcsHost>,
        remediator: Arc<dyn Remediator>,
    ) -> Self {
        Self {
            model,
            validator: Arc::new(NoopSyntaxValidator),
            host,
            remediator,
            notifier: None,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn SyntaxValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

/// Webhook notifier if one is configured, otherwise a no-op.
pub fn notifier_from_config(config: &NotificationConfig) -> Arc<dyn Notifier> {
    match config.webhook_url.as_deref() {
        Some(url) => match WebhookNotifier::new(url) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                warn!(error = %e, "webhook notifier unavailable; notifications disabled");
                Arc::new(NoopNotifier)
            }
        },
        None => Arc::new(NoopNotifier),
    }
}

/// Decision and execution outcome for one change.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub decision: GovernanceDecision,
    pub execution: ExecutionResult,
}

/// Long-lived pipeline owning the session registry.
pub struct GovernancePipeline {
    executor: AutonomousExecutor,
    notifier: Arc<dyn Notifier>,
}

impl GovernancePipeline {
    pub fn new(config: &RiskgateConfig, collaborators: Collaborators) -> Self {
        Self::with_registry(config, collaborators, SessionRegistry::new())
    }

    pub fn with_registry(
        config: &RiskgateConfig,
        collaborators: Collaborators,
        registry: SessionRegistry,
    ) -> Self {
        let notifier = collaborators
            .notifier
            .clone()
            .unwrap_or_else(|| notifier_from_config(&config.notifications));

        let monitor = CiMonitor::new(
            collaborators.host.clone(),
            collaborators.remediator.clone(),
            config.monitor.clone(),
        )
        .with_registry(registry)
        .with_notifier(notifier.clone());

        let generator =
            TestGenerationOrchestrator::new(collaborators.model, collaborators.validator);
        let executor = AutonomousExecutor::new(
            config.autonomous.clone(),
            generator,
            collaborators.host,
            monitor,
        )
        .with_notifier(notifier.clone());

        Self { executor, notifier }
    }

    pub fn executor(&self) -> &AutonomousExecutor {
        &self.executor
    }

    pub fn registry(&self) -> &SessionRegistry {
        self.executor.monitor().registry()
    }

    /// Decide first, then run the autonomous sequence.
    ///
    /// The decision is computed and published before any autonomous step
    /// runs and is never altered by its outcome.
    pub async fn handle_change(
        &self,
        findings: &AnalysisFindings,
        ctx: &ExecutionContext,
    ) -> PipelineReport {
        let decision = compute_governance_decision(findings);
        notify_best_effort(
            self.notifier.as_ref(),
            PipelineNotification::GovernanceDecided {
                change_id: ctx.change_id,
                decision,
            },
        )
        .await;

        let execution = self.executor.execute(findings, ctx).await;
        PipelineReport {
            decision,
            execution,
        }
    }
}

/// Run the autonomous sequence once, registering its monitoring session in
/// `registry`.
///
/// Callers keep one registry for the life of the process so that a PR id is
/// never monitored twice at once. Returns after monitoring is scheduled, not
/// after it completes.
pub async fn run_autonomous_pipeline(
    findings: &AnalysisFindings,
    ctx: &ExecutionContext,
    config: &RiskgateConfig,
    collaborators: Collaborators,
    registry: &SessionRegistry,
) -> ExecutionResult {
    GovernancePipeline::with_registry(config, collaborators, registry.clone())
        .executor()
        .execute(findings, ctx)
        .await
}
