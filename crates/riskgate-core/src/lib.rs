//! Riskgate Core Library
//!
//! Risk scoring, merge governance and test generation for change events:
//! - `risk` / `merge_policy`: findings to a bounded score and a merge recommendation
//! - `pattern`: inference of the target repository's test conventions
//! - `generation`: model-driven test generation filtered through a syntax validator
//! - `collaborators`: interfaces to the language model, validator, hosting and remediation services

pub mod collaborators;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod generation;
pub mod local_repo;
pub mod merge_policy;
pub mod metrics;
pub mod notify;
pub mod obs;
pub mod pattern;
pub mod risk;
pub mod telemetry;
pub mod validators;

pub use collaborators::{
    probe, DirEntry, LanguageModel, RemediationResult, Remediator, RepoSnapshot, SyntaxValidator,
    VcsHost,
};
pub use config::{
    AutonomousConfig, BaseBranchStrategy, MonitorSettings, NotificationConfig, RiskgateConfig,
};
pub use domain::{
    AnalysisFindings, ArtifactKind, BranchRef, CheckConclusion, CheckRun, CheckStatus,
    CiCheckOutcome, CodeExample, CompanionPr, CompanionPrRequest, ExampleKind, FileChange, Gap,
    GeneratedTestArtifact, GovernanceDecision, Recommendation, Result, Risk, RiskgateError,
    Severity, StructureType, TestDirectories, TestPattern, TestScenario, ValidationResult,
    ValidationWarning,
};
pub use generation::{GenerationOutcome, Strategy, TestGenerationOrchestrator, ValidationSummary};
pub use local_repo::LocalRepoSnapshot;
pub use merge_policy::{compute_governance_decision, decide};
pub use metrics::METRICS;
pub use notify::{notify_best_effort, NoopNotifier, Notifier, PipelineNotification, WebhookNotifier};
pub use pattern::TestPatternDetector;
pub use risk::{score, score_breakdown, ScoreBreakdown};
pub use telemetry::init_tracing;
pub use validators::{unsafe_path_reason, DelimiterSyntaxValidator, NoopSyntaxValidator};

/// Riskgate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
