//! Riskgate - merge governance for analyzed changes
//!
//! The `riskgate` command exposes the offline parts of the pipeline.
//!
//! ## Commands
//!
//! - `score`: Risk score and merge recommendation for a findings file
//! - `detect`: Test framework and layout of a local checkout
//! - `config`: Effective configuration after file and environment overrides

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use riskgate_core::{
    compute_governance_decision, score_breakdown, AnalysisFindings, GovernanceDecision,
    LocalRepoSnapshot, RiskgateConfig, TestPattern, TestPatternDetector,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "riskgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Risk-based merge governance with autonomous test generation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "RISKGATE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a findings file and print the governance decision
    Score {
        /// Path to analysis findings (JSON)
        findings: PathBuf,

        /// Include the per-category score breakdown
        #[arg(long)]
        breakdown: bool,
    },

    /// Detect the test framework and layout of a repository checkout
    Detect {
        /// Repository root (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreOutput {
    #[serde(flatten)]
    decision: GovernanceDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<serde_json::Value>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    riskgate_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Score {
            findings,
            breakdown,
        } => cmd_score(&findings, breakdown).and_then(|out| print_json(&out)),
        Commands::Detect { path } => cmd_detect(&path).await.and_then(|out| print_json(&out)),
        Commands::Config => cmd_config(cli.config.as_deref()).and_then(|out| print_json(&out)),
    };

    if cli.verbose {
        riskgate_core::METRICS.flush();
    }
    result
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_score(path: &Path, with_breakdown: bool) -> Result<ScoreOutput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read findings from {}", path.display()))?;
    let findings: AnalysisFindings = serde_json::from_str(&text)
        .with_context(|| format!("Invalid findings in {}", path.display()))?;

    let decision = compute_governance_decision(&findings);
    let breakdown = with_breakdown.then(|| {
        let b = score_breakdown(&findings);
        serde_json::json!({
            "overall": b.overall,
            "risks": b.risks,
            "gaps": b.gaps,
            "coverageBonus": b.coverage_bonus,
        })
    });
    Ok(ScoreOutput {
        decision,
        breakdown,
    })
}

async fn cmd_detect(path: &Path) -> Result<TestPattern> {
    if !path.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }
    let snapshot = LocalRepoSnapshot::new(path);
    let pattern = TestPatternDetector::new(&snapshot).detect().await;
    info!(path = %path.display(), detected = pattern.detected, "detection finished");
    Ok(pattern)
}

fn cmd_config(path: Option<&Path>) -> Result<RiskgateConfig> {
    let config = match path {
        Some(path) => RiskgateConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RiskgateConfig::from_env().context("Invalid RISKGATE_* environment")?,
    };
    Ok(config)
}
