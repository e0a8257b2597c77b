//! Fire-and-forget notifications about governance and remediation events.
//!
//! Delivery failures are logged by [`notify_best_effort`] and never reach the
//! pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{CheckRun, CompanionPr, GovernanceDecision};

/// Events published to the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineNotification {
    GovernanceDecided {
        change_id: u64,
        decision: GovernanceDecision,
    },
    CompanionPrOpened {
        change_id: u64,
        pr: CompanionPr,
        artifact_count: usize,
    },
    CiPassed {
        pr_id: u64,
        attempted_auto_fix: bool,
    },
    CiFailureReported {
        pr_id: u64,
        failing_checks: Vec<CheckRun>,
    },
    MonitoringTimedOut {
        pr_id: u64,
        checks_performed: u32,
    },
}

impl PipelineNotification {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineNotification::GovernanceDecided { .. } => "governance_decided",
            PipelineNotification::CompanionPrOpened { .. } => "companion_pr_opened",
            PipelineNotification::CiPassed { .. } => "ci_passed",
            PipelineNotification::CiFailureReported { .. } => "ci_failure_reported",
            PipelineNotification::MonitoringTimedOut { .. } => "monitoring_timed_out",
        }
    }
}

/// Notification sink.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &PipelineNotification) -> anyhow::Result<()>;
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &PipelineNotification) -> anyhow::Result<()> {
        Ok(())
    }
}

/// POSTs each notification as JSON to a webhook URL.
pub struct WebhookNotifier {
    url: String,
    http_client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("riskgate/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            url: url.into(),
            http_client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &PipelineNotification) -> anyhow::Result<()> {
        let response = self
            .http_client
            .post(&self.url)
            .json(notification)
            .send()
            .await?;
        if !response.status().is_success() {
            anyhow::bail!("webhook returned {}", response.status());
        }
        Ok(())
    }
}

/// Deliver `notification`, logging and swallowing any failure.
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: PipelineNotification) {
    match notifier.notify(&notification).await {
        Ok(()) => debug!(notification = notification.name(), "notification delivered"),
        Err(e) => warn!(notification = notification.name(), error = %e, "notification failed"),
    }
}
