//! Single-pass aggregation of parsed records into totals and the
//! uncovered-lines map.

use std::collections::HashMap;

use crate::exclude::ExclusionSet;
use crate::model::{Counter, CoverageRecord};

/// Compute a percentage, returning `None` when the total is zero.
#[must_use]
pub fn percentage(hit: u64, found: u64) -> Option<f64> {
    if found == 0 {
        None
    } else {
        Some(hit as f64 * 100.0 / found as f64)
    }
}

/// Totals over the included (non-excluded) records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoverageResult {
    pub total_found: u64,
    pub total_hit: u64,
    pub files_included: usize,
    pub files_excluded: usize,
    pub functions: Counter,
    pub branches: Counter,
}

impl CoverageResult {
    /// Line coverage in percent. `None` means there was nothing to measure,
    /// which is neither a pass nor a fail.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        percentage(self.total_hit, self.total_found)
    }
}

/// Uncovered line numbers per file, iterated in the order files were first
/// seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncoveredLineMap {
    entries: Vec<(String, Vec<u32>)>,
    index: HashMap<String, usize>,
}

impl UncoveredLineMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: &str, line: u32) {
        match self.index.get(file) {
            Some(&i) => self.entries[i].1.push(line),
            None => {
                self.index.insert(file.to_string(), self.entries.len());
                self.entries.push((file.to_string(), vec![line]));
            }
        }
    }

    pub fn get(&self, file: &str) -> Option<&[u32]> {
        self.index.get(file).map(|&i| self.entries[i].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.entries
            .iter()
            .map(|(file, lines)| (file.as_str(), lines.as_slice()))
    }

    /// Number of files with at least one uncovered line.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of [`aggregate`]. Both halves come from the same pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub result: CoverageResult,
    pub uncovered: UncoveredLineMap,
}

/// Sum line totals over every record not matched by `exclusions`, collecting
/// `hit == 0` lines along the way. Excluded records contribute nothing.
pub fn aggregate(records: &[CoverageRecord], exclusions: &ExclusionSet) -> Aggregate {
    let mut out = Aggregate::default();

    for record in records {
        if let Some(pattern) = exclusions.matching_pattern(&record.file) {
            tracing::debug!(file = %record.file, %pattern, "excluding file from coverage");
            out.result.files_excluded += 1;
            continue;
        }

        out.result.files_included += 1;
        out.result.total_found += record.lines.found;
        out.result.total_hit += record.lines.hit;
        out.result.functions.add(record.functions);
        out.result.branches.add(record.branches);

        for detail in record.lines.details.iter().filter(|d| d.hit == 0) {
            out.uncovered.push(&record.file, detail.line);
        }
    }

    out
}
