//! Riskgate CI - autonomous companion PRs and CI monitoring
//!
//! Provides:
//! - An executor that commits generated tests to a companion branch and opens a PR
//! - A bounded CI monitor with a single remediation attempt per session
//! - Pipeline entry points that keep the merge decision independent of both

pub mod branch;
pub mod executor;
pub mod monitor;
pub mod pipeline;
pub mod session;

// Re-export key types
pub use branch::companion_branch_name;
pub use executor::{
    artifact_path, AutonomousExecutor, ExecutionContext, ExecutionResult, ExecutionStep, StepError,
};
pub use monitor::{CiMonitor, MonitorReport, MonitorState, TerminalState};
pub use pipeline::{
    notifier_from_config, run_autonomous_pipeline, Collaborators, GovernancePipeline,
    PipelineReport,
};
pub use session::{AutonomousExecutionSession, SessionGuard, SessionRegistry};
