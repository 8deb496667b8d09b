//! One gate run, strictly in order: read the report, parse, aggregate,
//! decide, report, then optionally publish the pull request comment.

use std::path::Path;

use crate::actions::Runner;
use crate::aggregate::{aggregate, Aggregate};
use crate::config::Config;
use crate::error::{GateError, Result};
use crate::github::{upsert_comment, Environment, GitHubClient, Upsert};
use crate::model::CoverageRecord;
use crate::parsers::lcov::LcovParser;
use crate::parsers::Parser;
use crate::report::{GateReport, MarkdownFormatter, TextFormatter};
use crate::threshold::{self, Verdict};

/// Read and parse the report at `path`. A missing, unreadable or empty file
/// is rejected before the parser sees it.
pub fn load_records(path: &Path) -> Result<Vec<CoverageRecord>> {
    let content = std::fs::read(path).map_err(|source| GateError::ReportUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if content.is_empty() {
        return Err(GateError::ReportEmpty);
    }

    let records = LcovParser.parse(&content)?;
    if records.is_empty() {
        return Err(GateError::Parse("no SF records found".to_string()));
    }
    tracing::debug!(path = %path.display(), records = records.len(), "parsed report");
    Ok(records)
}

/// Load, aggregate and compare against the threshold.
pub fn evaluate(config: &Config, sha: Option<String>) -> Result<GateReport> {
    let records = load_records(&config.path)?;
    let Aggregate { result, uncovered } = aggregate(&records, &config.exclusions);
    let verdict = threshold::evaluate(&result, config.min_coverage);

    Ok(GateReport {
        result,
        uncovered,
        min_coverage: config.min_coverage,
        verdict,
        sha,
    })
}

/// Turn a verdict into the run status.
pub fn decide(report: &GateReport) -> Result<()> {
    match report.verdict {
        Verdict::Pass { .. } => Ok(()),
        Verdict::Fail { .. } => Err(GateError::BelowThreshold(report.failure_message())),
        Verdict::Indeterminate => Err(GateError::NothingToEvaluate),
    }
}

/// Post or refresh the pull request comment. Skipped without a token or
/// outside a pull request.
pub fn publish(
    config: &Config,
    env: &Environment,
    report: &GateReport,
) -> anyhow::Result<Option<Upsert>> {
    let Some(token) = config.github_token.as_deref() else {
        tracing::debug!("no github_token configured, not commenting");
        return Ok(None);
    };
    let Some(client) = GitHubClient::from_environment(token, env) else {
        tracing::warn!("github_token set but this run is not for a pull request, not commenting");
        return Ok(None);
    };

    let body = report.format(&MarkdownFormatter);
    let outcome = upsert_comment(&client, &config.comment_marker, &body)?;
    match outcome {
        Upsert::Created => tracing::info!(
            "Comment posted to {}/pull/{}",
            client.repo(),
            client.pr_number()
        ),
        Upsert::Updated(id) => tracing::info!(
            "Comment {id} updated on {}/pull/{}",
            client.repo(),
            client.pr_number()
        ),
    }
    Ok(Some(outcome))
}

/// Execute a full run. Any failure has already been signalled through
/// `runner` when this returns `Err`; the caller only maps it to an exit
/// status. Publishing problems are warnings and never change the result.
pub fn run(config: &Config, runner: &Runner, env: &Environment) -> Result<()> {
    let report = match evaluate(config, env.sha.clone()) {
        Ok(report) => report,
        Err(e) => {
            runner.set_failed(&e.to_string());
            return Err(e);
        }
    };

    print!("{}", report.format(&TextFormatter));
    if let Err(e) = runner.append_summary(&report.format(&MarkdownFormatter)) {
        runner.warning(&format!("{e:#}"));
    }

    let status = decide(&report);
    if let Err(e) = &status {
        runner.set_failed(&e.to_string());
    }

    if let Err(e) = publish(config, env, &report) {
        runner.warning(&format!("could not publish coverage comment: {e:#}"));
    }

    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclude::ExclusionSet;
    use crate::github::DEFAULT_COMMENT_MARKER;

    fn config(path: &Path, min_coverage: f64, exclude: &str) -> Config {
        Config {
            path: path.to_path_buf(),
            min_coverage,
            exclusions: ExclusionSet::parse(exclude).unwrap(),
            github_token: None,
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }

    fn write_report(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lcov.info");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_report_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("nope.info")).unwrap_err();
        assert!(matches!(err, GateError::ReportUnreadable { .. }));
    }

    #[test]
    fn test_empty_report() {
        let (_dir, path) = write_report("");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, GateError::ReportEmpty));
        assert_eq!(err.to_string(), "lcov is empty!");
    }

    #[test]
    fn test_report_without_records_is_parse_error() {
        let (_dir, path) = write_report("this is not lcov\n");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, GateError::Parse(_)));
        assert!(err.to_string().starts_with("parsing error!"));
    }

    #[test]
    fn test_exclusion_example() {
        let (_dir, path) = write_report(
            "SF:a.js\nDA:1,1\nLF:10\nLH:10\nend_of_record\n\
             SF:b.js\nDA:3,0\nLF:10\nLH:0\nend_of_record\n",
        );
        let report = evaluate(&config(&path, 90.0, "b.js"), None).unwrap();
        assert_eq!(report.result.total_found, 10);
        assert_eq!(report.result.total_hit, 10);
        assert_eq!(report.verdict, Verdict::Pass { coverage: 100.0 });
        assert!(report.uncovered.is_empty());
        assert!(decide(&report).is_ok());
    }

    #[test]
    fn test_below_threshold_reports_uncovered_lines() {
        let (_dir, path) = write_report("SF:a.js\nDA:1,1\nDA:2,0\nDA:3,0\nend_of_record\n");
        let report = evaluate(&config(&path, 50.0, ""), None).unwrap();
        let msg = match decide(&report) {
            Err(GateError::BelowThreshold(msg)) => msg,
            other => panic!("expected BelowThreshold, got {other:?}"),
        };
        assert!(msg.starts_with("33.33333333333333 is less than min_coverage 50"));
        assert!(msg.ends_with("  a.js: 2, 3"));
    }

    #[test]
    fn test_everything_excluded_cannot_be_evaluated() {
        let (_dir, path) = write_report("SF:a.js\nDA:1,1\nend_of_record\n");
        let report = evaluate(&config(&path, 0.0, "*.js"), None).unwrap();
        assert!(matches!(decide(&report), Err(GateError::NothingToEvaluate)));
    }

    #[test]
    fn test_publish_without_token_is_noop() {
        let (_dir, path) = write_report("SF:a.js\nDA:1,1\nend_of_record\n");
        let cfg = config(&path, 0.0, "");
        let report = evaluate(&cfg, None).unwrap();
        let env = Environment {
            api_url: "http://127.0.0.1:9".to_string(),
            repo: Some("octo/repo".to_string()),
            pr_number: Some(1),
            sha: None,
        };
        assert_eq!(publish(&cfg, &env, &report).unwrap(), None);
    }

    #[test]
    fn test_publish_outside_pull_request_is_noop() {
        let (_dir, path) = write_report("SF:a.js\nDA:1,1\nend_of_record\n");
        let mut cfg = config(&path, 0.0, "");
        cfg.github_token = Some("token".to_string());
        let report = evaluate(&cfg, None).unwrap();
        assert_eq!(publish(&cfg, &Environment::default(), &report).unwrap(), None);
    }
}
