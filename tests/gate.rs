mod common;

use covgate::actions::Runner;
use covgate::error::GateError;
use covgate::gate;
use covgate::github::Environment;

fn run(config: &covgate::config::Config) -> Result<(), GateError> {
    gate::run(config, &Runner::new(false, None), &Environment::default())
}

/// Records from the README example: b.js is excluded, a.js is fully covered.
const TWO_FILES: &[u8] = b"\
SF:a.js\n\
DA:1,1\n\
LF:10\n\
LH:10\n\
end_of_record\n\
SF:b.js\n\
DA:3,0\n\
LF:10\n\
LH:0\n\
end_of_record\n";

#[test]
fn passes_when_excluded_file_would_drag_coverage_down() {
    let (_dir, path) = common::write_report(TWO_FILES);
    assert!(run(&common::config(path, 90.0, "b.js")).is_ok());
}

#[test]
fn fails_without_the_exclusion() {
    let (_dir, path) = common::write_report(TWO_FILES);
    let err = run(&common::config(path, 90.0, "")).unwrap_err();
    match err {
        GateError::BelowThreshold(msg) => {
            assert!(msg.starts_with("50 is less than min_coverage 90"));
            assert!(msg.contains("Lines not covered:\n  b.js: 3"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn threshold_is_inclusive() {
    // 80 of 100 lines hit.
    let mut lcov = String::from("SF:x.js\n");
    for line in 1..=100 {
        let hits = if line <= 80 { 1 } else { 0 };
        lcov.push_str(&format!("DA:{line},{hits}\n"));
    }
    lcov.push_str("end_of_record\n");
    let (_dir, path) = common::write_report(lcov.as_bytes());

    assert!(run(&common::config(path.clone(), 80.0, "")).is_ok());
    assert!(matches!(
        run(&common::config(path, 80.01, "")),
        Err(GateError::BelowThreshold(_))
    ));
}

#[test]
fn empty_report_fails_before_parsing() {
    let (_dir, path) = common::write_report(b"");
    assert!(matches!(
        run(&common::config(path, 0.0, "")),
        Err(GateError::ReportEmpty)
    ));
}

#[test]
fn missing_report_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coverage").join("lcov.info");
    assert!(matches!(
        run(&common::config(path, 0.0, "")),
        Err(GateError::ReportUnreadable { .. })
    ));
}

#[test]
fn all_files_excluded_is_an_explicit_failure() {
    let (_dir, path) = common::write_report(TWO_FILES);
    assert!(matches!(
        run(&common::config(path, 0.0, "*.js")),
        Err(GateError::NothingToEvaluate)
    ));
}

#[test]
fn step_summary_written_even_on_failure() {
    let (dir, path) = common::write_report(TWO_FILES);
    let summary = dir.path().join("summary.md");
    let runner = Runner::new(false, Some(summary.clone()));

    let result = gate::run(
        &common::config(path, 90.0, ""),
        &runner,
        &Environment::default(),
    );

    assert!(result.is_err());
    let md = std::fs::read_to_string(summary).unwrap();
    assert!(md.contains("### ❌ Coverage: 50.00%"));
    assert!(md.contains("**`b.js`**: 3"));
}

#[test]
fn failed_comment_publishing_keeps_the_verdict() {
    // Nothing listens on the discard port, so every API call errors out.
    let env = Environment {
        api_url: "http://127.0.0.1:9".to_string(),
        repo: Some("octo/repo".to_string()),
        pr_number: Some(1),
        sha: None,
    };
    let runner = Runner::new(false, None);
    let (_dir, path) = common::write_report(TWO_FILES);

    let mut passing = common::config(path.clone(), 90.0, "b.js");
    passing.github_token = Some("ghp_test".to_string());
    let report = gate::evaluate(&passing, None).unwrap();
    assert!(gate::publish(&passing, &env, &report).is_err());
    assert!(gate::run(&passing, &runner, &env).is_ok());

    let mut failing = common::config(path, 90.0, "");
    failing.github_token = Some("ghp_test".to_string());
    assert!(matches!(
        gate::run(&failing, &runner, &env),
        Err(GateError::BelowThreshold(_))
    ));
}
