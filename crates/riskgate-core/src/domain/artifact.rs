//! Generated test artifacts and their validation results.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// What a generated file is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    #[default]
    Test,
    PageObject,
    Utility,
    Fixture,
}

/// A single validator finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Syntax validation outcome attached to an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
        }
    }

    pub fn invalid(warning: ValidationWarning) -> Self {
        Self {
            valid: false,
            warnings: vec![warning],
        }
    }
}

/// A candidate test file produced by generation.
///
/// Validation is attached exactly once by the orchestrator via
/// [`GeneratedTestArtifact::attach_validation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTestArtifact {
    pub id: String,
    pub filename: String,
    pub framework_tag: String,
    pub kind: ArtifactKind,
    pub code: String,
    pub dependencies: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

impl GeneratedTestArtifact {
    pub fn new(
        filename: impl Into<String>,
        framework_tag: impl Into<String>,
        kind: ArtifactKind,
        code: impl Into<String>,
    ) -> Self {
        let filename = filename.into();
        let code = code.into();
        Self {
            id: artifact_id(&filename, &code),
            filename,
            framework_tag: framework_tag.into(),
            kind,
            code,
            dependencies: BTreeSet::new(),
            validation: None,
        }
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Attach the validator outcome. A second call is ignored.
    pub fn attach_validation(&mut self, result: ValidationResult) {
        if self.validation.is_none() {
            self.validation = Some(result);
        }
    }

    /// `false` only when validation ran and rejected the artifact.
    pub fn is_valid(&self) -> bool {
        self.validation.as_ref().map_or(true, |v| v.valid)
    }
}

/// Deterministic identity: first 16 hex chars of SHA-256(filename NUL code).
pub fn artifact_id(filename: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update([0u8]);
    hasher.update(code.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
