use std::path::PathBuf;

use covgate::config::Config;
use covgate::exclude::ExclusionSet;
use covgate::github::DEFAULT_COMMENT_MARKER;
use tempfile::TempDir;

/// Write `content` to a fresh `lcov.info`, returning the dir handle and path.
/// The caller must hold onto `TempDir` to keep the temp directory alive.
pub fn write_report(content: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lcov.info");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

pub fn config(path: PathBuf, min_coverage: f64, exclude: &str) -> Config {
    Config {
        path,
        min_coverage,
        exclusions: ExclusionSet::parse(exclude).unwrap(),
        github_token: None,
        comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
    }
}
