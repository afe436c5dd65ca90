//! Run summary.

use std::fmt;
use std::time::Duration;

use arrow::record_batch::RecordBatch;
use tabmerge_compute::{NarrowingReport, format_bytes};

/// Row counts observed at each stage boundary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub orders: usize,
    pub products: usize,
    pub customers: usize,
    pub unified: usize,
    /// Unified rows whose product join found no product.
    pub unmatched_products: usize,
    /// Unified rows whose customer join found no customer.
    pub unmatched_customers: usize,
    pub result: usize,
}

/// Wall time spent in each stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageTimings {
    pub load: Duration,
    pub join: Duration,
    pub narrow: Duration,
    pub derive: Duration,
    pub filter: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.load + self.join + self.narrow + self.derive + self.filter
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineSummary {
    pub rows: RowCounts,
    pub narrowing: NarrowingReport,
    pub timings: StageTimings,
}

impl PipelineSummary {
    pub fn memory_before(&self) -> usize {
        self.narrowing.bytes_before
    }

    pub fn memory_after(&self) -> usize {
        self.narrowing.bytes_after
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = &self.rows;
        writeln!(
            f,
            "sources: {} orders, {} products, {} customers",
            rows.orders, rows.products, rows.customers
        )?;
        writeln!(
            f,
            "unified: {} rows ({} without product, {} without customer)",
            rows.unified, rows.unmatched_products, rows.unmatched_customers
        )?;
        writeln!(
            f,
            "memory: {} before narrowing, {} after",
            format_bytes(self.memory_before()),
            format_bytes(self.memory_after())
        )?;
        for change in &self.narrowing.changes {
            writeln!(f, "  {}: {} -> {}", change.column, change.from, change.to)?;
        }
        if self.narrowing.coerced_dates > 0 {
            writeln!(
                f,
                "  {} unparseable dates set to null",
                self.narrowing.coerced_dates
            )?;
        }
        writeln!(f, "result: {} rows", rows.result)?;
        write!(f, "elapsed: {:.3?}", self.timings.total())
    }
}

/// What a pipeline run produces.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub result: RecordBatch,
    pub summary: PipelineSummary,
}
