//! Domain models for riskgate.
//!
//! Canonical definitions for the core entities:
//! - `AnalysisFindings`: upstream risk analysis of a change
//! - `GovernanceDecision`: score and merge recommendation
//! - `TestPattern`: inferred test conventions of the target repository
//! - `GeneratedTestArtifact`: candidate test files and their validation
//! - CI shapes exchanged with the hosting collaborator

pub mod artifact;
pub mod ci;
pub mod decision;
pub mod error;
pub mod findings;
pub mod pattern;

// Re-export main types and errors
pub use artifact::{
    artifact_id, ArtifactKind, GeneratedTestArtifact, ValidationResult, ValidationWarning,
};
pub use ci::{
    BranchRef, CheckConclusion, CheckRun, CheckStatus, CiCheckOutcome, CompanionPr,
    CompanionPrRequest, FileChange,
};
pub use decision::{GovernanceDecision, Recommendation};
pub use error::{Result, RiskgateError};
pub use findings::{AnalysisFindings, Gap, Risk, Severity, TestScenario};
pub use pattern::{
    CodeExample, ExampleKind, StructureType, TestDirectories, TestPattern, DEFAULT_FRAMEWORK,
};
