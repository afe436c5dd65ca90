//! Category (dictionary) encoding of low-cardinality text columns.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use rustc_hash::FxHashSet;
use tabmerge_result::{Error, Result};

/// Narrowest signed key type able to index `distinct` dictionary values.
pub fn dictionary_key_type(distinct: usize) -> DataType {
    if distinct <= 1 << 7 {
        DataType::Int8
    } else if distinct <= 1 << 15 {
        DataType::Int16
    } else if distinct <= 1 << 31 {
        DataType::Int32
    } else {
        DataType::Int64
    }
}

/// Dictionary-encode a text column with the narrowest key type for its distinct values.
///
/// Already-encoded columns are re-keyed. Nulls stay null; labels are unchanged.
pub fn encode_category(column: &ArrayRef) -> Result<ArrayRef> {
    let text = as_utf8(column)?;
    let labels = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::Internal("category column did not cast to Utf8".into()))?;

    let distinct: FxHashSet<&str> = labels.iter().flatten().collect();
    let key_type = dictionary_key_type(distinct.len());
    let target = DataType::Dictionary(Box::new(key_type), Box::new(DataType::Utf8));
    if column.data_type() == &target {
        return Ok(Arc::clone(column));
    }
    Ok(cast(&text, &target)?)
}

/// Decode a text or dictionary column into its per-row labels.
pub fn category_labels(column: &ArrayRef) -> Result<Vec<Option<String>>> {
    let text = as_utf8(column)?;
    let labels = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::Internal("category column did not cast to Utf8".into()))?;
    Ok(labels.iter().map(|v| v.map(str::to_string)).collect())
}

pub(crate) fn is_text(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, value) => is_text(value),
        _ => false,
    }
}

fn as_utf8(column: &ArrayRef) -> Result<ArrayRef> {
    match column.data_type() {
        DataType::Utf8 => Ok(Arc::clone(column)),
        other if is_text(other) => Ok(cast(column, &DataType::Utf8)?),
        other => Err(Error::InvalidArgumentError(format!(
            "category encoding needs a text column, got {other}"
        ))),
    }
}
