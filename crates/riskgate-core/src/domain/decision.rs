//! Governance decision gating whether a change should merge.

use serde::{Deserialize, Serialize};

/// Merge recommendation tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    MergeOk,
    Attention,
    Block,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::MergeOk => "merge_ok",
            Recommendation::Attention => "attention",
            Recommendation::Block => "block",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived `{risk_score, recommendation}` pair. Created once per analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceDecision {
    pub risk_score: u8,
    pub recommendation: Recommendation,
}
