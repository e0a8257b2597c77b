//! Domain-level error taxonomy for riskgate.

/// Riskgate domain errors.
#[derive(Debug, thiserror::Error)]
pub enum RiskgateError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed model output: {0}")]
    Parse(String),

    #[error("collaborator call failed: {0}")]
    Collaborator(String),

    #[error("monitoring session already registered for companion PR #{0}")]
    SessionConflict(u64),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<anyhow::Error> for RiskgateError {
    fn from(err: anyhow::Error) -> Self {
        RiskgateError::Collaborator(format!("{err:#}"))
    }
}

/// Result type for riskgate domain operations.
pub type Result<T> = std::result::Result<T, RiskgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = RiskgateError::Config("max_checks must be positive".to_string());
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("max_checks"));
    }

    #[test]
    fn test_session_conflict_names_pr() {
        let err = RiskgateError::SessionConflict(42);
        assert!(err.to_string().contains("#42"));
    }

    #[test]
    fn test_anyhow_conversion_keeps_context() {
        let err = anyhow::anyhow!("connection reset").context("get check status");
        let converted: RiskgateError = err.into();
        let msg = converted.to_string();
        assert!(msg.contains("get check status"));
        assert!(msg.contains("connection reset"));
    }
}
