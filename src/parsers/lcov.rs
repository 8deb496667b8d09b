/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<path to source file>
///   FNDA:<execution count>,<function name>
///   FNF:<number of functions found>
///   FNH:<number of functions hit>
///   DA:<line number>,<execution count>[,<checksum>]
///   BRDA:<line>,<block>,<branch>,<taken>   ("-" means 0)
///   BRF:<branches found>
///   BRH:<branches hit>
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
use std::io::BufRead;

use super::Parser;
use crate::error::{GateError, Result};
use crate::model::{Counter, CoverageRecord, LineDetail};

/// LCOV format parser.
pub struct LcovParser;

impl Parser for LcovParser {
    fn parse(&self, input: &[u8]) -> Result<Vec<CoverageRecord>> {
        parse(input)
    }
}

/// Parse LCOV coverage data from raw bytes.
pub fn parse(input: &[u8]) -> Result<Vec<CoverageRecord>> {
    let mut records = Vec::new();
    parse_reader(&mut &*input, &mut |record| records.push(record))?;
    Ok(records)
}

/// A record under construction. Summary tags are kept separately so that a
/// block without `LF`/`LH` (or `FNF`/`BRF` ...) can fall back to counting
/// its detail lines.
struct PendingRecord {
    record: CoverageRecord,
    lines_found: Option<u64>,
    lines_hit: Option<u64>,
    functions_found: Option<u64>,
    functions_hit: Option<u64>,
    branches_found: Option<u64>,
    branches_hit: Option<u64>,
    fnda: Counter,
    brda: Counter,
}

impl PendingRecord {
    fn new(file: &str) -> Self {
        Self {
            record: CoverageRecord::new(file),
            lines_found: None,
            lines_hit: None,
            functions_found: None,
            functions_hit: None,
            branches_found: None,
            branches_hit: None,
            fnda: Counter::default(),
            brda: Counter::default(),
        }
    }

    fn finish(self) -> CoverageRecord {
        let mut record = self.record;
        let details = &record.lines.details;
        record.lines.found = self.lines_found.unwrap_or(details.len() as u64);
        record.lines.hit = self
            .lines_hit
            .unwrap_or_else(|| details.iter().filter(|d| d.hit > 0).count() as u64);
        record.functions = Counter {
            found: self.functions_found.unwrap_or(self.fnda.found),
            hit: self.functions_hit.unwrap_or(self.fnda.hit),
        };
        record.branches = Counter {
            found: self.branches_found.unwrap_or(self.brda.found),
            hit: self.branches_hit.unwrap_or(self.brda.hit),
        };
        record
    }
}

/// Streaming LCOV parser: calls `emit` once per `end_of_record`.
fn parse_reader(reader: &mut dyn BufRead, emit: &mut dyn FnMut(CoverageRecord)) -> Result<()> {
    let mut current: Option<PendingRecord> = None;

    let mut raw_line = String::new();
    let mut line_no = 0usize;
    loop {
        raw_line.clear();
        line_no += 1;
        let n = reader
            .read_line(&mut raw_line)
            .map_err(|e| GateError::Parse(format!("line {line_no}: {e}")))?;
        if n == 0 {
            break;
        }

        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(pending) = current.take() {
                emit(pending.finish());
            }
            continue;
        }

        let (tag, value) = match line.split_once(':') {
            Some(pair) => pair,
            None => continue,
        };

        if tag == "SF" {
            // A new SF without end_of_record closes the previous block.
            if let Some(pending) = current.take() {
                emit(pending.finish());
            }
            current = Some(PendingRecord::new(value));
            continue;
        }

        let Some(pending) = current.as_mut() else {
            // TN and anything else outside an SF block.
            continue;
        };

        match tag {
            "DA" => {
                // Negative counts mark non-instrumentable lines; skip them.
                let mut parts = value.splitn(3, ',');
                let line_number = parts.next().and_then(|s| s.parse::<u32>().ok());
                let count = parts.next().and_then(|s| s.parse::<i64>().ok());
                if let (Some(line), Some(count)) = (line_number, count) {
                    if count >= 0 {
                        pending.record.lines.details.push(LineDetail {
                            line,
                            hit: count as u64,
                        });
                    }
                }
            }
            "LF" => pending.lines_found = value.parse().ok(),
            "LH" => pending.lines_hit = value.parse().ok(),
            "FNDA" => {
                if let Some((count, _name)) = value.split_once(',') {
                    pending.fnda.found += 1;
                    if count.parse::<u64>().unwrap_or(0) > 0 {
                        pending.fnda.hit += 1;
                    }
                }
            }
            "FNF" => pending.functions_found = value.parse().ok(),
            "FNH" => pending.functions_hit = value.parse().ok(),
            "BRDA" => {
                let parts: Vec<&str> = value.splitn(4, ',').collect();
                if parts.len() == 4 {
                    pending.brda.found += 1;
                    if parts[3] != "-" && parts[3].parse::<u64>().unwrap_or(0) > 0 {
                        pending.brda.hit += 1;
                    }
                }
            }
            "BRF" => pending.branches_found = value.parse().ok(),
            "BRH" => pending.branches_hit = value.parse().ok(),
            // FN, VER and friends carry nothing we aggregate.
            _ => {}
        }
    }

    // Handle a file that ends without end_of_record
    if let Some(pending) = current.take() {
        emit(pending.finish());
    }

    Ok(())
}
