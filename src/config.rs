//! Run configuration. Every flag can also be supplied through the matching
//! GitHub Actions input variable (`INPUT_<NAME>`), so the same binary serves
//! as an action step and as a local command.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{GateError, Result};
use crate::exclude::ExclusionSet;
use crate::github::DEFAULT_COMMENT_MARKER;

const DEFAULT_REPORT_PATH: &str = "./coverage/lcov.info";
const DEFAULT_MIN_COVERAGE: f64 = 100.0;

/// covgate: fail the build when LCOV line coverage is below a threshold.
#[derive(Parser, Debug)]
#[command(name = "covgate", version, about)]
pub struct Cli {
    /// Path to the LCOV report (default: ./coverage/lcov.info)
    #[arg(long, env = "INPUT_PATH")]
    pub path: Option<PathBuf>,

    /// Minimum line coverage in percent; equal passes (default: 100)
    #[arg(long, env = "INPUT_MIN_COVERAGE")]
    pub min_coverage: Option<String>,

    /// Space-separated glob patterns of files to leave out of the totals.
    #[arg(long, env = "INPUT_EXCLUDE")]
    pub exclude: Option<String>,

    /// Token used to comment on the pull request. Commenting is skipped
    /// when unset.
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Literal that identifies our comment. It is embedded in every posted
    /// comment and searched for when deciding whether to update.
    #[arg(long, env = "INPUT_COMMENT_MARKER")]
    pub comment_marker: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub min_coverage: f64,
    pub exclusions: ExclusionSet,
    pub github_token: Option<String>,
    pub comment_marker: String,
}

/// Treat empty or blank values the same as missing ones. Actions passes
/// every declared input, set or not.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Coerce the threshold input to a percentage in `0..=100`.
pub fn parse_min_coverage(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| GateError::Config(format!("min_coverage '{raw}' is not a number")))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(GateError::Config(format!(
            "min_coverage {value} is outside 0..=100"
        )));
    }
    Ok(value)
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        let min_coverage = match non_blank(self.min_coverage) {
            Some(raw) => parse_min_coverage(&raw)?,
            None => DEFAULT_MIN_COVERAGE,
        };
        let exclusions = ExclusionSet::parse(self.exclude.as_deref().unwrap_or(""))?;
        let comment_marker = non_blank(self.comment_marker)
            .unwrap_or_else(|| DEFAULT_COMMENT_MARKER.to_string());

        Ok(Config {
            path: self
                .path
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH)),
            min_coverage,
            exclusions,
            github_token: non_blank(self.github_token),
            comment_marker,
        })
    }
}
