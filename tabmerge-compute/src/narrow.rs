//! Type narrowing for the unified table.
//!
//! The pass walks the table's columns once and rewrites the ones named in
//! [`NarrowingOptions`]:
//!
//! * integer columns are downcast to the smallest signed width holding their observed range,
//!   or to a fixed width when [`IntegerTarget::Fixed`] is configured;
//! * float columns become `Float32`;
//! * category columns become `Dictionary(K, Utf8)` with the narrowest key type;
//! * date columns held as text are parsed into `Date32`, with bad values coerced to null.
//!
//! Every conversion is checked. A value that does not fit its target fails the pass with
//! [`Error::NarrowingOverflow`] instead of wrapping. Designated columns that are missing from
//! the table are skipped, and columns nobody named pass through untouched.

use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float32Array, Float64Array, Int64Array};
use arrow::compute::{CastOptions, cast_with_options, max, min};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tabmerge_result::{Error, Result};
use tabmerge_types::columns;

use crate::category::{encode_category, is_text};
use crate::date::parse_date_column;
use crate::memory::batch_memory_bytes;

/// Signed integer widths a column can be narrowed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntegerWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntegerWidth {
    const ASCENDING: [IntegerWidth; 4] = [
        IntegerWidth::W8,
        IntegerWidth::W16,
        IntegerWidth::W32,
        IntegerWidth::W64,
    ];

    pub fn data_type(self) -> DataType {
        match self {
            IntegerWidth::W8 => DataType::Int8,
            IntegerWidth::W16 => DataType::Int16,
            IntegerWidth::W32 => DataType::Int32,
            IntegerWidth::W64 => DataType::Int64,
        }
    }

    /// Inclusive value range of this width.
    pub fn range(self) -> (i64, i64) {
        match self {
            IntegerWidth::W8 => (i8::MIN.into(), i8::MAX.into()),
            IntegerWidth::W16 => (i16::MIN.into(), i16::MAX.into()),
            IntegerWidth::W32 => (i32::MIN.into(), i32::MAX.into()),
            IntegerWidth::W64 => (i64::MIN, i64::MAX),
        }
    }

    pub fn fits(self, value: i64) -> bool {
        let (lo, hi) = self.range();
        (lo..=hi).contains(&value)
    }

    /// Smallest width holding every value in `[lo, hi]`.
    pub fn smallest_for(lo: i64, hi: i64) -> IntegerWidth {
        Self::ASCENDING
            .into_iter()
            .find(|w| w.fits(lo) && w.fits(hi))
            .unwrap_or(IntegerWidth::W64)
    }
}

impl fmt::Display for IntegerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data_type())
    }
}

/// How integer columns pick their width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntegerTarget {
    /// Smallest signed width holding the column's observed minimum and maximum.
    #[default]
    Minimal,
    /// Always this width; a value outside it is a [`Error::NarrowingOverflow`].
    Fixed(IntegerWidth),
}

/// Which columns the narrowing pass rewrites, and how.
#[derive(Clone, Debug)]
pub struct NarrowingOptions {
    pub integer_columns: Vec<String>,
    pub integer_target: IntegerTarget,
    pub float_columns: Vec<String>,
    pub category_columns: Vec<String>,
    pub date_columns: Vec<String>,
}

impl Default for NarrowingOptions {
    fn default() -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            integer_columns: owned(&[
                columns::ORDER_ID,
                columns::CUSTOMER_ID,
                columns::PRODUCT_ID,
                columns::QUANTITY,
            ]),
            integer_target: IntegerTarget::Minimal,
            float_columns: owned(&[columns::PRICE]),
            category_columns: owned(&[
                columns::CATEGORY,
                columns::SUPPLIER,
                columns::REGION,
                columns::SEGMENT,
                columns::PRODUCT_NAME,
            ]),
            date_columns: owned(&[columns::ORDER_DATE]),
        }
    }
}

impl NarrowingOptions {
    pub fn with_integer_target(mut self, target: IntegerTarget) -> Self {
        self.integer_target = target;
        self
    }

    fn role(&self, name: &str) -> Option<Role> {
        let named = |list: &[String]| list.iter().any(|c| c == name);
        if named(&self.date_columns) {
            Some(Role::Date)
        } else if named(&self.integer_columns) {
            Some(Role::Integer)
        } else if named(&self.float_columns) {
            Some(Role::Float)
        } else if named(&self.category_columns) {
            Some(Role::Category)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Role {
    Integer,
    Float,
    Category,
    Date,
}

/// One column whose type was changed by the pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnChange {
    pub column: String,
    pub from: DataType,
    pub to: DataType,
}

/// Outcome of [`narrow_batch`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NarrowingReport {
    pub changes: Vec<ColumnChange>,
    pub bytes_before: usize,
    pub bytes_after: usize,
    /// Non-null date strings that failed to parse and became null.
    pub coerced_dates: usize,
}

impl NarrowingReport {
    pub fn change(&self, column: &str) -> Option<&ColumnChange> {
        self.changes.iter().find(|c| c.column == column)
    }

    pub fn saved_bytes(&self) -> usize {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Narrow the designated columns of `batch`.
pub fn narrow_batch(
    batch: &RecordBatch,
    options: &NarrowingOptions,
) -> Result<(RecordBatch, NarrowingReport)> {
    let schema = batch.schema();
    let mut report = NarrowingReport {
        bytes_before: batch_memory_bytes(batch),
        ..Default::default()
    };

    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let name = field.name();
        let narrowed = match options.role(name) {
            None => Arc::clone(column),
            Some(Role::Integer) => narrow_integer(name, column, options.integer_target)?,
            Some(Role::Float) => narrow_float(name, column)?,
            Some(Role::Category) => encode_category(column)?,
            Some(Role::Date) => {
                let (parsed, coerced) = narrow_date(name, column)?;
                report.coerced_dates += coerced;
                parsed
            }
        };

        if narrowed.data_type() != column.data_type() {
            tracing::trace!(
                target: "tabmerge-compute",
                column = %name,
                from = %column.data_type(),
                to = %narrowed.data_type(),
                "narrowed column"
            );
            report.changes.push(ColumnChange {
                column: name.clone(),
                from: column.data_type().clone(),
                to: narrowed.data_type().clone(),
            });
        }
        fields.push(
            field
                .as_ref()
                .clone()
                .with_data_type(narrowed.data_type().clone()),
        );
        arrays.push(narrowed);
    }

    let schema = Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()));
    let narrowed = RecordBatch::try_new(schema, arrays)?;
    report.bytes_after = batch_memory_bytes(&narrowed);

    tracing::debug!(
        target: "tabmerge-compute",
        changed = report.changes.len(),
        bytes_before = report.bytes_before,
        bytes_after = report.bytes_after,
        coerced_dates = report.coerced_dates,
        "narrowing complete"
    );
    Ok((narrowed, report))
}

fn strict() -> CastOptions<'static> {
    CastOptions {
        safe: false,
        ..Default::default()
    }
}

fn is_integer(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn narrow_integer(name: &str, column: &ArrayRef, target: IntegerTarget) -> Result<ArrayRef> {
    let data_type = column.data_type();
    if is_text(data_type) {
        // Text keys cannot be downcast; they keep their type.
        return Ok(Arc::clone(column));
    }
    if !is_integer(data_type) {
        return Err(Error::InvalidArgumentError(format!(
            "column '{name}' is {data_type}, expected an integer column"
        )));
    }

    let wide = if data_type == &DataType::Int64 {
        Arc::clone(column)
    } else {
        cast_with_options(column, &DataType::Int64, &strict()).map_err(|_| {
            // Only UInt64 values above i64::MAX can fail here.
            first_unsigned_overflow(name, column)
        })?
    };
    let values = wide
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| Error::Internal(format!("column '{name}' did not widen to Int64")))?;

    let width = match target {
        IntegerTarget::Minimal => match (min(values), max(values)) {
            (Some(lo), Some(hi)) => IntegerWidth::smallest_for(lo, hi),
            _ => IntegerWidth::W8,
        },
        IntegerTarget::Fixed(width) => {
            if let Some((row, value)) = values
                .iter()
                .enumerate()
                .find_map(|(row, v)| v.filter(|v| !width.fits(*v)).map(|v| (row, v)))
            {
                return Err(Error::narrowing_overflow(name, width, value, row));
            }
            width
        }
    };

    let target_type = width.data_type();
    if data_type == &target_type {
        return Ok(Arc::clone(column));
    }
    Ok(cast_with_options(&wide, &target_type, &strict())?)
}

fn first_unsigned_overflow(name: &str, column: &ArrayRef) -> Error {
    let found = column
        .as_any()
        .downcast_ref::<arrow::array::UInt64Array>()
        .and_then(|values| {
            values
                .iter()
                .enumerate()
                .find_map(|(row, v)| v.filter(|v| i64::try_from(*v).is_err()).map(|v| (row, v)))
        });
    match found {
        Some((row, value)) => Error::narrowing_overflow(name, IntegerWidth::W64, value, row),
        None => Error::Internal(format!("column '{name}' failed to widen to Int64")),
    }
}

fn narrow_float(name: &str, column: &ArrayRef) -> Result<ArrayRef> {
    let data_type = column.data_type();
    if data_type == &DataType::Float32 {
        return Ok(Arc::clone(column));
    }
    if !(is_integer(data_type) || matches!(data_type, DataType::Float16 | DataType::Float64)) {
        return Err(Error::InvalidArgumentError(format!(
            "column '{name}' is {data_type}, expected a numeric column"
        )));
    }

    let wide = if data_type == &DataType::Float64 {
        Arc::clone(column)
    } else {
        cast_with_options(column, &DataType::Float64, &strict())?
    };
    let values = wide
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| Error::Internal(format!("column '{name}' did not widen to Float64")))?;

    let limit = f64::from(f32::MAX);
    if let Some((row, value)) = values
        .iter()
        .enumerate()
        .find_map(|(row, v)| v.filter(|v| v.is_finite() && v.abs() > limit).map(|v| (row, v)))
    {
        return Err(Error::narrowing_overflow(
            name,
            DataType::Float32,
            value,
            row,
        ));
    }

    let narrowed: Float32Array = values.iter().map(|v| v.map(|v| v as f32)).collect();
    Ok(Arc::new(narrowed))
}

fn narrow_date(name: &str, column: &ArrayRef) -> Result<(ArrayRef, usize)> {
    match column.data_type() {
        DataType::Date32 => Ok((Arc::clone(column), 0)),
        DataType::Date64 | DataType::Timestamp(_, _) => {
            Ok((cast_with_options(column, &DataType::Date32, &strict())?, 0))
        }
        other if is_text(other) => {
            let text = if matches!(other, DataType::Dictionary(_, _)) {
                cast_with_options(column, &DataType::Utf8, &strict())?
            } else {
                Arc::clone(column)
            };
            let (parsed, coerced) = parse_date_column(&text)?;
            if coerced > 0 {
                tracing::warn!(
                    target: "tabmerge-compute",
                    column = %name,
                    coerced,
                    "unparseable dates coerced to null"
                );
            }
            Ok((parsed, coerced))
        }
        other => Err(Error::InvalidArgumentError(format!(
            "column '{name}' is {other}, expected a date or text column"
        ))),
    }
}
