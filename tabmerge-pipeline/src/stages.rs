//! The five pipeline stages as standalone functions.
//!
//! Each stage reads its input table and returns a new one; the [`crate::Pipeline`] driver only
//! sequences them and records timings.

use arrow::array::{Array, BooleanArray};
use arrow::record_batch::RecordBatch;
use tabmerge_compute::{
    BusinessFilter, CustomerPresence, DeriveOptions, NarrowingOptions, NarrowingReport,
    derive_total_value, narrow_batch,
};
use tabmerge_ingest::{CsvReadOptions, load_source};
use tabmerge_join::{JoinKey, JoinOptions, hash_join};
use tabmerge_result::{Error, Result};
use tabmerge_types::{SourceKind, columns};

use crate::config::{JoinSettings, SourcePaths};

/// The three loaded inputs.
#[derive(Clone, Debug)]
pub struct SourceTables {
    pub orders: RecordBatch,
    pub products: RecordBatch,
    pub customers: RecordBatch,
}

/// Unified table plus the join-match counts observed while building it.
#[derive(Clone, Debug)]
pub struct JoinedTable {
    /// Orders with product and customer columns, plus the customer match indicator.
    pub table: RecordBatch,
    pub unmatched_products: usize,
    pub unmatched_customers: usize,
}

/// Read all three sources. Any failure is an [`Error::SourceRead`].
pub fn load_sources(paths: &SourcePaths, csv: &CsvReadOptions) -> Result<SourceTables> {
    let load = |kind: SourceKind| load_source(kind, paths.path(kind), csv);
    Ok(SourceTables {
        orders: load(SourceKind::Orders)?,
        products: load(SourceKind::Products)?,
        customers: load(SourceKind::Customers)?,
    })
}

/// Join orders to products on `ProductID`, then to customers on `CustomerID`.
///
/// The result carries a `__customer_matched` indicator for the filter stage.
pub fn join_sources(tables: &SourceTables, settings: &JoinSettings) -> Result<JoinedTable> {
    let options = |right: SourceKind, indicator: &str| JoinOptions {
        join_type: settings.join_type,
        duplicate_keys: settings.duplicate_keys,
        ..JoinOptions::default()
    }
    .with_right_name(right.name())
    .with_match_indicator(indicator);

    let with_products = hash_join(
        &tables.orders,
        &tables.products,
        &JoinKey::on(columns::PRODUCT_ID),
        &options(SourceKind::Products, columns::PRODUCT_MATCHED),
    )?;
    let unmatched_products = count_unmatched(&with_products, columns::PRODUCT_MATCHED)?;
    if unmatched_products > 0 {
        tracing::warn!(
            target: "tabmerge-pipeline",
            unmatched_products,
            "orders reference products missing from the catalog"
        );
    }
    let with_products = drop_column(&with_products, columns::PRODUCT_MATCHED)?;

    let unified = hash_join(
        &with_products,
        &tables.customers,
        &JoinKey::on(columns::CUSTOMER_ID),
        &options(SourceKind::Customers, columns::CUSTOMER_MATCHED),
    )?;
    let unmatched_customers = count_unmatched(&unified, columns::CUSTOMER_MATCHED)?;

    tracing::debug!(
        target: "tabmerge-pipeline",
        rows = unified.num_rows(),
        columns = unified.num_columns(),
        unmatched_products,
        unmatched_customers,
        "sources joined"
    );
    Ok(JoinedTable {
        table: unified,
        unmatched_products,
        unmatched_customers,
    })
}

/// Downcast numerics, dictionary-encode categories and parse dates.
pub fn narrow_unified(
    unified: &RecordBatch,
    options: &NarrowingOptions,
) -> Result<(RecordBatch, NarrowingReport)> {
    narrow_batch(unified, options)
}

/// Append `TotalValue = Price x Quantity`.
pub fn derive_enriched(optimized: &RecordBatch, options: &DeriveOptions) -> Result<RecordBatch> {
    derive_total_value(optimized, options)
}

/// Apply the business filter and drop the join indicator columns from the result.
pub fn filter_result(enriched: &RecordBatch, filter: &BusinessFilter) -> Result<RecordBatch> {
    let kept = filter.apply(enriched)?;
    let mut result = drop_column(&kept, columns::CUSTOMER_MATCHED)?;
    if let CustomerPresence::MatchColumn(name) = &filter.customer {
        result = drop_column(&result, name)?;
    }
    Ok(result)
}

fn count_unmatched(batch: &RecordBatch, indicator: &str) -> Result<usize> {
    let matched = batch
        .column_by_name(indicator)
        .and_then(|c| c.as_any().downcast_ref::<BooleanArray>())
        .ok_or_else(|| Error::Internal(format!("join indicator '{indicator}' missing")))?;
    Ok(matched.len() - matched.true_count())
}

/// `batch` without column `name`; unchanged when the column is absent.
fn drop_column(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    let schema = batch.schema();
    let Ok(idx) = schema.index_of(name) else {
        return Ok(batch.clone());
    };
    let keep: Vec<usize> = (0..batch.num_columns()).filter(|&i| i != idx).collect();
    Ok(batch.project(&keep)?)
}
