use std::path::PathBuf;

use thiserror::Error;

/// Every way a gate run can fail. Each variant ends up as a single
/// `::error::` line and a non-zero exit status.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("could not read coverage report {}: {source}", path.display())]
    ReportUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("lcov is empty!")]
    ReportEmpty,

    #[error("parsing error! {0}")]
    Parse(String),

    #[error("no instrumented lines left to measure after exclusions; coverage cannot be evaluated")]
    NothingToEvaluate,

    #[error("{0}")]
    BelowThreshold(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GateError>;
