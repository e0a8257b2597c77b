//! Pipeline configuration.
//!
//! Precedence, lowest first: built-in defaults, a TOML file, `RISKGATE_*`
//! environment variables. Each `[autonomous]` toggle enables one stage of the
//! remediation workflow and has no effect on scoring.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Result, RiskgateError};

/// Which commit the companion branch is created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BaseBranchStrategy {
    /// Tip of the repository's default branch.
    #[default]
    Default,
    /// Head commit of the originating change.
    PrHead,
}

impl std::str::FromStr for BaseBranchStrategy {
    type Err = RiskgateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "default" => Ok(BaseBranchStrategy::Default),
            "pr-head" => Ok(BaseBranchStrategy::PrHead),
            other => Err(RiskgateError::Config(format!(
                "unknown base branch strategy '{other}' (expected 'default' or 'pr-head')"
            ))),
        }
    }
}

/// `[autonomous]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutonomousConfig {
    pub enabled: bool,
    #[serde(alias = "createPr", alias = "createPR")]
    pub create_pr: bool,
    #[serde(alias = "monitorCi", alias = "monitorCI")]
    pub monitor_ci: bool,
    #[serde(alias = "autoFix")]
    pub auto_fix: bool,
    #[serde(alias = "baseBranchStrategy")]
    pub base_branch_strategy: BaseBranchStrategy,
    #[serde(alias = "branchPrefix")]
    pub branch_prefix: String,
}

impl Default for AutonomousConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            create_pr: true,
            monitor_ci: true,
            auto_fix: true,
            base_branch_strategy: BaseBranchStrategy::Default,
            branch_prefix: "riskgate/tests".to_string(),
        }
    }
}

/// `[monitor]` section: CI polling bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// Grace period before the first poll.
    pub initial_delay_secs: u64,
    pub poll_interval_secs: u64,
    /// Pending polls allowed before the session times out.
    pub max_checks: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: 30,
            poll_interval_secs: 30,
            max_checks: 20,
        }
    }
}

impl MonitorSettings {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// `[notifications]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RiskgateConfig {
    pub autonomous: AutonomousConfig,
    pub monitor: MonitorSettings,
    pub notifications: NotificationConfig,
}

impl RiskgateConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RiskgateConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config: RiskgateConfig = toml::from_str(&text)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = RiskgateConfig::default();
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `RISKGATE_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flags: [(&str, &mut bool); 4] = [
            ("RISKGATE_AUTONOMOUS_ENABLED", &mut self.autonomous.enabled),
            ("RISKGATE_AUTONOMOUS_CREATE_PR", &mut self.autonomous.create_pr),
            ("RISKGATE_AUTONOMOUS_MONITOR_CI", &mut self.autonomous.monitor_ci),
            ("RISKGATE_AUTONOMOUS_AUTO_FIX", &mut self.autonomous.auto_fix),
        ];
        for (key, slot) in flags {
            if let Some(raw) = lookup(key) {
                *slot = parse_bool(key, &raw)?;
            }
        }
        if let Some(raw) = lookup("RISKGATE_BASE_BRANCH_STRATEGY") {
            self.autonomous.base_branch_strategy = raw.parse()?;
        }
        if let Some(url) = lookup("RISKGATE_WEBHOOK_URL") {
            self.notifications.webhook_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.monitor.poll_interval_secs == 0 {
            return Err(RiskgateError::Config(
                "monitor.poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.monitor.max_checks == 0 {
            return Err(RiskgateError::Config(
                "monitor.max_checks must be positive".to_string(),
            ));
        }
        if self.autonomous.branch_prefix.trim_matches('/').is_empty() {
            return Err(RiskgateError::Config(
                "autonomous.branch_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(RiskgateError::Config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RiskgateConfig::default();
        assert!(!config.autonomous.enabled);
        assert!(config.autonomous.create_pr);
        assert_eq!(config.autonomous.base_branch_strategy, BaseBranchStrategy::Default);
        assert_eq!(config.monitor.max_checks, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial_sections() {
        let config = RiskgateConfig::from_toml_str(
            r#"
            [autonomous]
            enabled = true
            auto_fix = false
            baseBranchStrategy = "pr-head"

            [monitor]
            max_checks = 5
            "#,
        )
        .unwrap();
        assert!(config.autonomous.enabled);
        assert!(!config.autonomous.auto_fix);
        assert!(config.autonomous.monitor_ci);
        assert_eq!(config.autonomous.base_branch_strategy, BaseBranchStrategy::PrHead);
        assert_eq!(config.monitor.max_checks, 5);
        assert_eq!(config.monitor.poll_interval_secs, 30);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("RISKGATE_AUTONOMOUS_ENABLED", "true"),
            ("RISKGATE_AUTONOMOUS_CREATE_PR", "0"),
            ("RISKGATE_BASE_BRANCH_STRATEGY", "pr-head"),
            ("RISKGATE_WEBHOOK_URL", "https://hooks.example.com/x"),
        ]
        .into_iter()
        .collect();

        let mut config = RiskgateConfig::default();
        config
            .apply_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert!(config.autonomous.enabled);
        assert!(!config.autonomous.create_pr);
        assert_eq!(config.autonomous.base_branch_strategy, BaseBranchStrategy::PrHead);
        assert_eq!(
            config.notifications.webhook_url.as_deref(),
            Some("https://hooks.example.com/x")
        );
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let mut config = RiskgateConfig::default();
        let err = config
            .apply_env_overrides(|k| (k == "RISKGATE_AUTONOMOUS_AUTO_FIX").then(|| "maybe".into()))
            .unwrap_err();
        assert!(matches!(err, RiskgateError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_bounds() {
        let err = RiskgateConfig::from_toml_str("[monitor]\nmax_checks = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_checks"));
        let err = RiskgateConfig::from_toml_str("[monitor]\npoll_interval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_serializes_documented_snake_case_keys() {
        let json = serde_json::to_value(RiskgateConfig::default()).unwrap();
        let autonomous = &json["autonomous"];
        assert_eq!(autonomous["create_pr"], true);
        assert_eq!(autonomous["monitor_ci"], true);
        assert_eq!(autonomous["auto_fix"], true);
        assert_eq!(autonomous["base_branch_strategy"], "default");
        assert_eq!(autonomous["branch_prefix"], "riskgate/tests");
        assert!(autonomous.get("createPr").is_none());
        assert_eq!(json["monitor"]["poll_interval_secs"], 30);
    }

    #[test]
    fn test_camel_case_option_names_still_parse() {
        let config = RiskgateConfig::from_toml_str(
            "[autonomous]\ncreatePR = false\nmonitorCI = false\nautoFix = false\n",
        )
        .unwrap();
        assert!(!config.autonomous.create_pr);
        assert!(!config.autonomous.monitor_ci);
        assert!(!config.autonomous.auto_fix);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riskgate.toml");
        std::fs::write(&path, "[monitor]\ninitial_delay_secs = 5\n").unwrap();
        let config = RiskgateConfig::load(&path).unwrap();
        assert_eq!(config.monitor.initial_delay(), Duration::from_secs(5));
    }
}
