//! GitHub Actions runner integration: workflow commands and the job step
//! summary. Outside of Actions the same calls fall back to plain logging.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context as _, Result};

/// Escape a message for use as workflow command data.
///
/// See https://github.com/actions/toolkit/blob/main/packages/core/src/command.ts
#[must_use]
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Render a workflow command line such as `::error::message`.
#[must_use]
pub fn command(name: &str, message: &str) -> String {
    format!("::{name}::{}", escape_data(message))
}

/// Where status signals go for this process.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    github_actions: bool,
    step_summary: Option<PathBuf>,
}

impl Runner {
    /// Detect the runner from `GITHUB_ACTIONS` and `GITHUB_STEP_SUMMARY`.
    pub fn from_env() -> Self {
        Self {
            github_actions: std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true"),
            step_summary: std::env::var_os("GITHUB_STEP_SUMMARY")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn new(github_actions: bool, step_summary: Option<PathBuf>) -> Self {
        Self {
            github_actions,
            step_summary,
        }
    }

    /// Mark the run as failed with `message`. The caller is responsible for
    /// the non-zero exit status.
    pub fn set_failed(&self, message: &str) {
        if self.github_actions {
            println!("{}", command("error", message));
        } else {
            tracing::error!("{message}");
        }
    }

    pub fn warning(&self, message: &str) {
        if self.github_actions {
            println!("{}", command("warning", message));
        } else {
            tracing::warn!("{message}");
        }
    }

    /// Append Markdown to the job summary, if the runner provides one.
    pub fn append_summary(&self, markdown: &str) -> Result<()> {
        let Some(path) = &self.step_summary else {
            return Ok(());
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open step summary {}", path.display()))?;
        writeln!(file, "{markdown}")
            .with_context(|| format!("Failed to write step summary {}", path.display()))?;
        Ok(())
    }
}
