//! The tabmerge pipeline.
//!
//! Loads orders, products and customers, joins them into one table, narrows its column types,
//! derives `TotalValue` and keeps the rows selected by the business filter:
//!
//! ```text
//! orders + products --(left join on ProductID)--> + customers --(left join on CustomerID)-->
//!   unified --(narrow)--> optimized --(derive TotalValue)--> enriched --(filter)--> result
//! ```
//!
//! [`Pipeline`] runs every stage in sequence; the stage functions in [`stages`] are public for
//! callers that want to run or inspect one step at a time. The first failing stage aborts the
//! run with its error.

pub mod config;
pub mod stages;
pub mod summary;

use std::time::Instant;

use tabmerge_result::Result;

pub use config::{JoinSettings, PipelineConfig, SourcePaths};
pub use stages::{
    JoinedTable, SourceTables, derive_enriched, filter_result, join_sources, load_sources,
    narrow_unified,
};
pub use summary::{PipelineOutput, PipelineSummary, RowCounts, StageTimings};

/// Runs the configured stages over one set of inputs.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the configured sources and run every stage.
    pub fn run(&self) -> Result<PipelineOutput> {
        let started = Instant::now();
        let tables = load_sources(&self.config.sources, &self.config.csv)?;
        let load = started.elapsed();
        tracing::info!(
            target: "tabmerge-pipeline",
            orders = tables.orders.num_rows(),
            products = tables.products.num_rows(),
            customers = tables.customers.num_rows(),
            elapsed = ?load,
            "sources loaded"
        );

        let mut output = self.run_tables(tables)?;
        output.summary.timings.load = load;
        Ok(output)
    }

    /// Run the in-memory stages over already loaded tables.
    pub fn run_tables(&self, tables: SourceTables) -> Result<PipelineOutput> {
        let mut summary = PipelineSummary::default();
        summary.rows.orders = tables.orders.num_rows();
        summary.rows.products = tables.products.num_rows();
        summary.rows.customers = tables.customers.num_rows();

        let started = Instant::now();
        let joined = join_sources(&tables, &self.config.join)?;
        summary.timings.join = started.elapsed();
        summary.rows.unified = joined.table.num_rows();
        summary.rows.unmatched_products = joined.unmatched_products;
        summary.rows.unmatched_customers = joined.unmatched_customers;
        drop(tables);

        let started = Instant::now();
        let (optimized, report) = narrow_unified(&joined.table, &self.config.narrowing)?;
        summary.timings.narrow = started.elapsed();
        tracing::info!(
            target: "tabmerge-pipeline",
            bytes_before = report.bytes_before,
            bytes_after = report.bytes_after,
            changed_columns = report.changes.len(),
            "unified table narrowed"
        );
        summary.narrowing = report;
        drop(joined);

        let started = Instant::now();
        let enriched = derive_enriched(&optimized, &self.config.derive)?;
        summary.timings.derive = started.elapsed();

        let started = Instant::now();
        let result = filter_result(&enriched, &self.config.filter)?;
        summary.timings.filter = started.elapsed();
        summary.rows.result = result.num_rows();

        tracing::info!(
            target: "tabmerge-pipeline",
            unified = summary.rows.unified,
            result = summary.rows.result,
            "pipeline complete"
        );
        Ok(PipelineOutput { result, summary })
    }
}
