//! Conformance of loaded tables to their source contract.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::kernels::cmp::lt;
use arrow::compute::{CastOptions, cast, cast_with_options};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tabmerge_result::{Error, Result};
use tabmerge_types::SourceContract;

/// Check required columns and cast contract columns to their canonical type.
///
/// Columns the contract does not mention pass through unchanged. Casts are strict: a value
/// that cannot be represented in the canonical type fails instead of becoming null. Negative
/// values in a `non_negative` column are kept and logged as a warning.
pub fn conform(batch: &RecordBatch, contract: &SourceContract) -> Result<RecordBatch> {
    let schema = batch.schema();

    let missing: Vec<&str> = contract
        .required_columns()
        .filter(|c| schema.index_of(c.name).is_err())
        .map(|c| c.name)
        .collect();
    if !missing.is_empty() {
        return Err(Error::InvalidArgumentError(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }

    let strict = CastOptions {
        safe: false,
        ..Default::default()
    };

    let mut fields = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let Some(expected) = contract.column(field.name()) else {
            fields.push(field.as_ref().clone());
            columns.push(Arc::clone(column));
            continue;
        };

        let target = expected.kind.canonical_type(field.data_type()).ok_or_else(|| {
            Error::InvalidArgumentError(format!(
                "column '{}' holds {} values, expected {}",
                field.name(),
                field.data_type(),
                expected.kind
            ))
        })?;

        if expected.non_negative {
            let negative = count_negative(column)?;
            if negative > 0 {
                tracing::warn!(
                    target: "tabmerge-ingest",
                    source = %contract.kind,
                    column = %field.name(),
                    negative,
                    "negative values in a non-negative column"
                );
            }
        }

        if &target == field.data_type() {
            fields.push(field.as_ref().clone());
            columns.push(Arc::clone(column));
            continue;
        }

        let converted = cast_with_options(column, &target, &strict).map_err(|err| {
            Error::InvalidArgumentError(format!(
                "column '{}' cannot be read as {}: {err}",
                field.name(),
                expected.kind
            ))
        })?;
        tracing::trace!(
            target: "tabmerge-ingest",
            column = %field.name(),
            from = %field.data_type(),
            to = %target,
            "conformed column"
        );
        fields.push(Field::new(field.name(), target, field.is_nullable()));
        columns.push(converted);
    }

    let conformed = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(conformed, columns)?)
}

/// Number of values below zero in a numeric column. Nulls are not counted.
pub(crate) fn count_negative(column: &ArrayRef) -> Result<usize> {
    if !(column.data_type().is_integer() || column.data_type().is_floating()) {
        return Ok(0);
    }
    let values = cast(column, &DataType::Float64)?;
    let below = lt(&values, &Float64Array::new_scalar(0.0))?;
    Ok(below.true_count())
}
