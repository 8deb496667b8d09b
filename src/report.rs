//! Output formatting for gate results.

use std::fmt::Write;

use crate::aggregate::{CoverageResult, UncoveredLineMap};
use crate::model::Counter;
use crate::threshold::Verdict;

/// Everything needed to describe a finished evaluation.
pub struct GateReport {
    pub result: CoverageResult,
    pub uncovered: UncoveredLineMap,
    pub min_coverage: f64,
    pub verdict: Verdict,
    /// Commit SHA to display and link line numbers against.
    pub sha: Option<String>,
}

impl GateReport {
    /// Format using a specific formatter.
    #[must_use]
    pub fn format(&self, formatter: &dyn ReportFormatter) -> String {
        formatter.format(self)
    }

    /// The failure text for a below-threshold run: percentage, threshold and
    /// one `file: line, line, ...` row per file with uncovered lines, in the
    /// order files appeared in the report.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let coverage = self.verdict.coverage().unwrap_or(f64::NAN);
        let mut out = format!(
            "{coverage} is less than min_coverage {}\n\nLines not covered:",
            self.min_coverage
        );
        for (file, lines) in self.uncovered.iter() {
            let lines = lines
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(out, "\n  {file}: {lines}").unwrap();
        }
        out
    }
}

/// Trait for formatting gate reports.
pub trait ReportFormatter {
    /// Format the report to a string.
    fn format(&self, report: &GateReport) -> String;
}

/// Plain text summary, printed to the log on every run.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &GateReport) -> String {
        let mut out = String::new();
        let result = &report.result;
        let min = report.min_coverage;

        match report.verdict.coverage() {
            Some(pct) => writeln!(
                out,
                "Line coverage: {pct:.2}% ({}/{} lines, minimum {min}%)",
                result.total_hit, result.total_found
            )
            .unwrap(),
            None => writeln!(out, "Line coverage: n/a (no instrumented lines, minimum {min}%)")
                .unwrap(),
        }
        writeln!(
            out,
            "Files:         {} measured, {} excluded",
            result.files_included, result.files_excluded
        )
        .unwrap();
        if result.functions.found > 0 {
            writeln!(out, "Functions:     {}", counter_summary(result.functions)).unwrap();
        }
        if result.branches.found > 0 {
            writeln!(out, "Branches:      {}", counter_summary(result.branches)).unwrap();
        }
        let status = match report.verdict {
            Verdict::Pass { .. } => "PASS",
            Verdict::Fail { .. } => "FAIL",
            Verdict::Indeterminate => "CANNOT EVALUATE",
        };
        writeln!(out, "Result:        {status}").unwrap();
        out
    }
}

/// Maximum number of files listed in the Markdown body. Comment bodies are
/// capped at 65536 characters by GitHub.
const MAX_FILES_LISTED: usize = 50;

/// Markdown formatter, used for the pull request comment and step summary.
pub struct MarkdownFormatter;

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &GateReport) -> String {
        let mut md = String::new();
        let result = &report.result;
        let min = report.min_coverage;

        match report.verdict {
            Verdict::Pass { coverage } => {
                writeln!(md, "### ✅ Coverage: {coverage:.2}%\n").unwrap()
            }
            Verdict::Fail { coverage } => {
                writeln!(md, "### ❌ Coverage: {coverage:.2}%\n").unwrap()
            }
            Verdict::Indeterminate => writeln!(md, "### ⚠️ Coverage: n/a\n").unwrap(),
        }

        write!(
            md,
            "**{}** of **{}** lines covered (minimum **{min}%**)",
            result.total_hit, result.total_found
        )
        .unwrap();
        if let Some(ref sha) = report.sha {
            let short_sha = sha.get(..7).unwrap_or(sha);
            write!(md, " ({short_sha})").unwrap();
        }
        md.push('\n');

        if !report.uncovered.is_empty() {
            md.push_str("\n| File | Uncovered lines |\n");
            md.push_str("|:-----|----------------:|\n");
            for (file, lines) in report.uncovered.iter().take(MAX_FILES_LISTED) {
                writeln!(md, "| `{file}` | {} |", lines.len()).unwrap();
            }

            md.push_str("\n<details>\n<summary>Lines not covered</summary>\n\n");
            for (file, lines) in report.uncovered.iter().take(MAX_FILES_LISTED) {
                let ranges = match report.sha {
                    // Absolute paths from the runner cannot be linked into the repo.
                    Some(ref sha) if !file.starts_with('/') => {
                        format_line_ranges_linked(lines, sha, file)
                    }
                    _ => format_line_ranges(lines),
                };
                writeln!(md, "**`{file}`**: {ranges}\n").unwrap();
            }
            let hidden = report.uncovered.len().saturating_sub(MAX_FILES_LISTED);
            if hidden > 0 {
                writeln!(md, "_...and {hidden} more files._\n").unwrap();
            }
            md.push_str("</details>\n");
        }

        md.push('\n');
        write!(
            md,
            "<sub>{} files measured, {} excluded",
            result.files_included, result.files_excluded
        )
        .unwrap();
        if result.functions.found > 0 {
            write!(md, " · functions {}", counter_summary(result.functions)).unwrap();
        }
        if result.branches.found > 0 {
            write!(md, " · branches {}", counter_summary(result.branches)).unwrap();
        }
        md.push_str("</sub>\n");

        md
    }
}

fn counter_summary(counter: Counter) -> String {
    match crate::aggregate::percentage(counter.hit, counter.found) {
        Some(pct) => format!("{}/{} ({pct:.1}%)", counter.hit, counter.found),
        None => format!("{}/{}", counter.hit, counter.found),
    }
}

/// Coalesce line numbers into `(start, end)` runs of consecutive lines.
/// Input order does not matter; duplicates collapse.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let mut sorted = lines.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let Some((&first, rest)) = sorted.split_first() else {
        return Vec::new();
    };

    let mut ranges: Vec<(u32, u32)> = Vec::new();
    let mut start = first;
    let mut end = first;
    for &line in rest {
        if line == end + 1 {
            end = line;
        } else {
            ranges.push((start, end));
            start = line;
            end = line;
        }
    }
    ranges.push((start, end));
    ranges
}

/// Format line numbers into compact range notation, e.g. "1, 3-5, 8".
#[must_use]
pub fn format_line_ranges(lines: &[u32]) -> String {
    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format line numbers into compact range notation with markdown links.
///
/// Each line number becomes a link like `[N](../blob/{sha}/{path}#LN)`.
/// Ranges are rendered as `[3-5](../blob/{sha}/{path}#L3-L5)`.
#[must_use]
pub fn format_line_ranges_linked(lines: &[u32], sha: &str, path: &str) -> String {
    let link = |start: u32, end: u32| -> String {
        if start == end {
            format!("[{start}](../blob/{sha}/{path}#L{start})")
        } else {
            format!("[{start}-{end}](../blob/{sha}/{path}#L{start}-L{end})")
        }
    };

    coalesce_ranges(lines)
        .iter()
        .map(|&(start, end)| link(start, end))
        .collect::<Vec<_>>()
        .join(", ")
}
