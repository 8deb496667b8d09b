pub mod lcov;

use crate::error::Result;
use crate::model::CoverageRecord;

/// Every report parser implements this trait.
pub trait Parser {
    /// Parse the input bytes into per-file coverage records, in report order.
    fn parse(&self, input: &[u8]) -> Result<Vec<CoverageRecord>>;
}
