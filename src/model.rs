//! In-memory shape of a parsed LCOV report. The parser produces a
//! `Vec<CoverageRecord>`; everything downstream only reads it.

/// Hit count for a single instrumented line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDetail {
    pub line: u32,
    pub hit: u64,
}

/// Line totals for one source file plus the per-line detail they summarize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSummary {
    pub found: u64,
    pub hit: u64,
    pub details: Vec<LineDetail>,
}

/// Found/hit counters for functions or branches. Reported, never gated on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter {
    pub found: u64,
    pub hit: u64,
}

impl Counter {
    pub fn add(&mut self, other: Counter) {
        self.found += other.found;
        self.hit += other.hit;
    }
}

/// Coverage for a single source file (one `SF:` ... `end_of_record` block).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageRecord {
    pub file: String,
    pub lines: LineSummary,
    pub functions: Counter,
    pub branches: Counter,
}

impl CoverageRecord {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}
