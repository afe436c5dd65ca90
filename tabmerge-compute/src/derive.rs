//! Derived columns.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::compute::cast;
use arrow::compute::kernels::numeric::mul;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tabmerge_result::{Error, Result};
use tabmerge_types::columns;

/// Column names used by [`derive_total_value`].
#[derive(Clone, Debug)]
pub struct DeriveOptions {
    pub price_column: String,
    pub quantity_column: String,
    pub output_column: String,
}

impl Default for DeriveOptions {
    fn default() -> Self {
        Self {
            price_column: columns::PRICE.to_string(),
            quantity_column: columns::QUANTITY.to_string(),
            output_column: columns::TOTAL_VALUE.to_string(),
        }
    }
}

/// Append `output = price x quantity` to `batch`.
///
/// The product is computed in the price column's float type (`Float32` once narrowed; integer
/// prices are computed as `Float64`). A null operand yields a null result. A product of finite
/// operands that does not fit the value type fails with [`Error::NarrowingOverflow`].
pub fn derive_total_value(batch: &RecordBatch, options: &DeriveOptions) -> Result<RecordBatch> {
    let schema = batch.schema();
    if schema.index_of(&options.output_column).is_ok() {
        return Err(Error::InvalidArgumentError(format!(
            "column '{}' already exists",
            options.output_column
        )));
    }
    let (price_field, price) = column(batch, &options.price_column)?;
    let (qty_field, quantity) = column(batch, &options.quantity_column)?;

    let value_type = match price.data_type() {
        DataType::Float32 | DataType::Float64 => price.data_type().clone(),
        dt if dt.is_integer() => DataType::Float64,
        other => {
            return Err(Error::InvalidArgumentError(format!(
                "price column '{}' is {other}, expected a numeric column",
                options.price_column
            )));
        }
    };
    if !(quantity.data_type().is_integer() || quantity.data_type().is_floating()) {
        return Err(Error::InvalidArgumentError(format!(
            "quantity column '{}' is {}, expected a numeric column",
            options.quantity_column,
            quantity.data_type()
        )));
    }

    let price = cast(price, &value_type)?;
    let quantity = cast(quantity, &value_type)?;
    let total = mul(&price, &quantity)?;
    if let Some((row, value)) = first_overflow(&price, &quantity, &total)? {
        return Err(Error::narrowing_overflow(
            &options.output_column,
            &value_type,
            value,
            row,
        ));
    }

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(
        &options.output_column,
        value_type,
        price_field.is_nullable() || qty_field.is_nullable(),
    ));
    let mut arrays: Vec<ArrayRef> = batch.columns().to_vec();
    arrays.push(total);

    tracing::trace!(
        target: "tabmerge-compute",
        column = %options.output_column,
        rows = batch.num_rows(),
        "derived column"
    );
    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// First row whose operands are finite but whose product is not, with the exact product.
fn first_overflow(
    price: &ArrayRef,
    quantity: &ArrayRef,
    total: &ArrayRef,
) -> Result<Option<(usize, f64)>> {
    let wide = |array: &ArrayRef| -> Result<Float64Array> {
        let widened = cast(array, &DataType::Float64)?;
        widened
            .as_any()
            .downcast_ref::<Float64Array>()
            .cloned()
            .ok_or_else(|| Error::Internal("Float64 cast did not yield Float64Array".into()))
    };
    let (price, quantity, total) = (wide(price)?, wide(quantity)?, wide(total)?);
    for row in 0..total.len() {
        if total.is_null(row) || total.value(row).is_finite() {
            continue;
        }
        let (p, q) = (price.value(row), quantity.value(row));
        if p.is_finite() && q.is_finite() {
            return Ok(Some((row, p * q)));
        }
    }
    Ok(None)
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<(Field, &'a ArrayRef)> {
    let idx = batch.schema().index_of(name).map_err(|_| {
        Error::InvalidArgumentError(format!("column '{name}' not found"))
    })?;
    Ok((batch.schema().field(idx).clone(), batch.column(idx)))
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float32Array, Int8Array, Int64Array};

    use super::*;

    fn batch(fields: Vec<(&str, ArrayRef)>) -> RecordBatch {
        let schema = Arc::new(Schema::new(
            fields
                .iter()
                .map(|(n, a)| Field::new(*n, a.data_type().clone(), a.null_count() > 0))
                .collect::<Vec<_>>(),
        ));
        RecordBatch::try_new(schema, fields.into_iter().map(|(_, a)| a).collect()).unwrap()
    }

    #[test]
    fn total_is_price_times_quantity_in_price_type() {
        let input = batch(vec![
            ("Price", Arc::new(Float32Array::from(vec![50.0, 19.5]))),
            ("Quantity", Arc::new(Int8Array::from(vec![3, 2]))),
        ]);
        let out = derive_total_value(&input, &DeriveOptions::default()).unwrap();
        let total = out
            .column_by_name("TotalValue")
            .unwrap()
            .as_any()
            .downcast_ref::<Float32Array>()
            .unwrap();
        assert_eq!(total.values(), &[150.0, 39.0]);
        assert!(!out.schema().field(2).is_nullable());
    }

    #[test]
    fn null_operands_give_null_total() {
        let input = batch(vec![
            ("Price", Arc::new(Float64Array::from(vec![None, Some(10.0)]))),
            ("Quantity", Arc::new(Int64Array::from(vec![Some(2), Some(4)]))),
        ]);
        let out = derive_total_value(&input, &DeriveOptions::default()).unwrap();
        let total = out
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(total.is_null(0));
        assert_eq!(total.value(1), 40.0);
        assert!(out.schema().field(2).is_nullable());
    }

    #[test]
    fn total_beyond_float32_range_fails() {
        let input = batch(vec![
            ("Price", Arc::new(Float32Array::from(vec![10.0, 3.0e38]))),
            ("Quantity", Arc::new(Int8Array::from(vec![2, 10]))),
        ]);
        let err = derive_total_value(&input, &DeriveOptions::default()).unwrap_err();
        match err {
            Error::NarrowingOverflow {
                column,
                target,
                row,
                ..
            } => {
                assert_eq!(column, "TotalValue");
                assert_eq!(target, "Float32");
                assert_eq!(row, 1);
            }
            other => panic!("expected NarrowingOverflow, got {other:?}"),
        }
    }

    #[test]
    fn infinite_price_is_carried_not_reported() {
        let input = batch(vec![
            ("Price", Arc::new(Float64Array::from(vec![f64::INFINITY]))),
            ("Quantity", Arc::new(Int64Array::from(vec![1]))),
        ]);
        let out = derive_total_value(&input, &DeriveOptions::default()).unwrap();
        let total = out
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert!(total.value(0).is_infinite());
    }

    #[test]
    fn missing_or_existing_columns_are_rejected() {
        let input = batch(vec![("Price", Arc::new(Float32Array::from(vec![1.0])))]);
        assert!(derive_total_value(&input, &DeriveOptions::default()).is_err());

        let input = batch(vec![
            ("Price", Arc::new(Float32Array::from(vec![1.0]))),
            ("Quantity", Arc::new(Int8Array::from(vec![1]))),
            ("TotalValue", Arc::new(Float32Array::from(vec![1.0]))),
        ]);
        let err = derive_total_value(&input, &DeriveOptions::default()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
