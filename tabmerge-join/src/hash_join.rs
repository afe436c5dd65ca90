//! Hash join implementation.
//!
//! Hash join is O(N+M) compared to nested-loop's O(N×M). The pipeline joins a large order
//! table against small dimension tables, so the dimension (right) table is always the build
//! side and the order (left) table is probed row by row in its original order.
//!
//! Algorithm:
//! 1. Key normalization: integer keys of any width are widened to `Int64`; text and
//!    dictionary-encoded text keys are read as `Utf8`. Mixing an integer key with a text key is
//!    rejected, unless one side holds no key at all (an empty or all-null column, as loaded
//!    from a header-only file); that side then takes the other side's key type.
//! 2. Build phase: index the right table as `key -> [row]`. Under
//!    [`DuplicateKeyPolicy::Reject`] a repeated key fails the join before any output is built.
//! 3. Probe phase: look up every left key and record `(left_row, Option<right_row>)` pairs.
//!    NULL keys never match.
//! 4. Gather: left columns are gathered by left row (zero-copy when every left row appears once
//!    in order), right columns by the optional right row, so a missing match yields NULL.

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Int64Array, StringArray, UInt32Array, new_null_array,
};
use arrow::compute::{CastOptions, cast_with_options, take};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::{FxHashMap, FxHashSet};
use tabmerge_result::{Error, Result};

use crate::{DuplicateKeyPolicy, JoinKey, JoinOptions, JoinType};

/// Build-side index mapping a key to the right rows holding it.
type HashTable<K> = FxHashMap<K, Vec<u32>>;

/// A join key column after normalization.
enum KeyColumn {
    Int(Int64Array),
    Text(StringArray),
}

impl KeyColumn {
    fn is_int(&self) -> bool {
        matches!(self, KeyColumn::Int(_))
    }

    fn has_no_keys(&self) -> bool {
        match self {
            KeyColumn::Int(a) => a.null_count() == a.len(),
            KeyColumn::Text(a) => a.null_count() == a.len(),
        }
    }

    fn len(&self) -> usize {
        match self {
            KeyColumn::Int(a) => a.len(),
            KeyColumn::Text(a) => a.len(),
        }
    }

    /// An all-null column of `len` rows with the same key type as `self`.
    fn nulls_like(&self, len: usize) -> KeyColumn {
        match self {
            KeyColumn::Int(_) => KeyColumn::Int(Int64Array::new_null(len)),
            KeyColumn::Text(_) => KeyColumn::Text(StringArray::new_null(len)),
        }
    }
}

/// Retype a key side that holds no keys to the other side's key type.
fn align_keyless(left: KeyColumn, right: KeyColumn) -> (KeyColumn, KeyColumn) {
    if left.is_int() == right.is_int() {
        return (left, right);
    }
    if left.has_no_keys() {
        (right.nulls_like(left.len()), right)
    } else if right.has_no_keys() {
        let right = left.nulls_like(right.len());
        (left, right)
    } else {
        (left, right)
    }
}

/// Row pairs produced by the probe phase.
#[derive(Debug, Default)]
struct JoinMatches {
    left: Vec<u32>,
    right: Vec<Option<u32>>,
}

impl JoinMatches {
    fn matched(&self) -> usize {
        self.right.iter().filter(|r| r.is_some()).count()
    }
}

/// Join `left` with `right` on `key`.
///
/// The output holds every left column followed by every right column except the right key.
/// See [`JoinOptions`] for the join type, duplicate-key policy, name collisions and the match
/// indicator column.
pub fn hash_join(
    left: &RecordBatch,
    right: &RecordBatch,
    key: &JoinKey,
    options: &JoinOptions,
) -> Result<RecordBatch> {
    let left_schema = left.schema();
    let right_schema = right.schema();
    let left_key_idx = find_column(&left_schema, &key.left, "left")?;
    let right_key_idx = find_column(&right_schema, &key.right, &options.right_name)?;

    let left_keys = normalize_key(left.column(left_key_idx), &key.left)?;
    let right_keys = normalize_key(right.column(right_key_idx), &key.right)?;
    let (left_keys, right_keys) = align_keyless(left_keys, right_keys);

    let matches = match (&left_keys, &right_keys) {
        (KeyColumn::Int(l), KeyColumn::Int(r)) => {
            let table = build_hash_table(r.iter(), &key.right, options)?;
            probe(l.iter(), &table, options.join_type)?
        }
        (KeyColumn::Text(l), KeyColumn::Text(r)) => {
            let table = build_hash_table(r.iter(), &key.right, options)?;
            probe(l.iter(), &table, options.join_type)?
        }
        _ => {
            return Err(Error::InvalidArgumentError(format!(
                "join key types differ: left.{} is {}, {}.{} is {}",
                key.left,
                left_schema.field(left_key_idx).data_type(),
                options.right_name,
                key.right,
                right_schema.field(right_key_idx).data_type()
            )));
        }
    };

    tracing::debug!(
        target: "tabmerge-join",
        join_type = %options.join_type,
        key = %key.left,
        left_rows = left.num_rows(),
        right_rows = right.num_rows(),
        output_rows = matches.left.len(),
        matched = matches.matched(),
        "hash join complete"
    );

    assemble(left, right, right_key_idx, &matches, options)
}

fn find_column(schema: &Schema, name: &str, side: &str) -> Result<usize> {
    schema.index_of(name).map_err(|_| {
        Error::InvalidArgumentError(format!("join key column '{name}' not found in {side} table"))
    })
}

fn normalize_key(column: &ArrayRef, name: &str) -> Result<KeyColumn> {
    let target = match column.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => DataType::Utf8,
        DataType::Dictionary(_, value) if value.as_ref() == &DataType::Utf8 => DataType::Utf8,
        other => {
            return Err(Error::InvalidArgumentError(format!(
                "unsupported join key type {other} for column '{name}'"
            )));
        }
    };

    let strict = CastOptions {
        safe: false,
        ..Default::default()
    };
    let normalized = if column.data_type() == &target {
        Arc::clone(column)
    } else {
        cast_with_options(column, &target, &strict)?
    };

    let key = match target {
        DataType::Int64 => normalized
            .as_any()
            .downcast_ref::<Int64Array>()
            .cloned()
            .map(KeyColumn::Int),
        _ => normalized
            .as_any()
            .downcast_ref::<StringArray>()
            .cloned()
            .map(KeyColumn::Text),
    };
    key.ok_or_else(|| Error::Internal(format!("join key '{name}' did not normalize")))
}

/// Build phase: index right rows by key.
fn build_hash_table<K, I>(keys: I, column: &str, options: &JoinOptions) -> Result<HashTable<K>>
where
    K: Hash + Eq + Display,
    I: Iterator<Item = Option<K>>,
{
    let mut table: HashTable<K> = FxHashMap::default();
    for (row, key) in keys.enumerate() {
        let Some(key) = key else {
            continue;
        };
        let row = row_index(row)?;
        if options.duplicate_keys == DuplicateKeyPolicy::Reject && table.contains_key(&key) {
            return Err(Error::JoinKey {
                table: options.right_name.clone(),
                column: column.to_string(),
                key: key.to_string(),
            });
        }
        table.entry(key).or_default().push(row);
    }
    Ok(table)
}

/// Probe phase: match every left row against the build-side index, in left order.
fn probe<K, I>(keys: I, table: &HashTable<K>, join_type: JoinType) -> Result<JoinMatches>
where
    K: Hash + Eq,
    I: Iterator<Item = Option<K>>,
{
    let mut matches = JoinMatches::default();
    for (row, key) in keys.enumerate() {
        let row = row_index(row)?;
        match key.and_then(|k| table.get(&k)) {
            Some(build_rows) => {
                for &build_row in build_rows {
                    matches.left.push(row);
                    matches.right.push(Some(build_row));
                }
            }
            None if join_type == JoinType::Left => {
                matches.left.push(row);
                matches.right.push(None);
            }
            None => {}
        }
    }
    Ok(matches)
}

fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row)
        .map_err(|_| Error::InvalidArgumentError("join input exceeds u32::MAX rows".into()))
}

fn assemble(
    left: &RecordBatch,
    right: &RecordBatch,
    right_key_idx: usize,
    matches: &JoinMatches,
    options: &JoinOptions,
) -> Result<RecordBatch> {
    let num_rows = matches.left.len();
    let left_schema = left.schema();
    let right_schema = right.schema();

    let mut fields: Vec<Field> = Vec::with_capacity(left.num_columns() + right.num_columns());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    let mut names: FxHashSet<String> = FxHashSet::default();

    let left_identity = num_rows == left.num_rows()
        && matches
            .left
            .iter()
            .enumerate()
            .all(|(pos, &row)| row as usize == pos);
    let left_indices = UInt32Array::from(matches.left.clone());
    for (field, column) in left_schema.fields().iter().zip(left.columns()) {
        let gathered = if left_identity {
            Arc::clone(column)
        } else {
            take(column.as_ref(), &left_indices, None)?
        };
        names.insert(field.name().clone());
        fields.push(field.as_ref().clone());
        columns.push(gathered);
    }

    let right_indices = UInt32Array::from(matches.right.clone());
    let pad_with_nulls = options.join_type == JoinType::Left;
    for (idx, (field, column)) in right_schema.fields().iter().zip(right.columns()).enumerate() {
        if idx == right_key_idx {
            continue;
        }
        let name = output_name(field.name(), &options.right_suffix, &names)?;
        let gathered = if right.num_rows() == 0 {
            new_null_array(field.data_type(), num_rows)
        } else {
            take(column.as_ref(), &right_indices, None)?
        };
        names.insert(name.clone());
        fields.push(Field::new(
            name,
            field.data_type().clone(),
            field.is_nullable() || pad_with_nulls,
        ));
        columns.push(gathered);
    }

    if let Some(indicator) = &options.match_indicator {
        if names.contains(indicator) {
            return Err(Error::InvalidArgumentError(format!(
                "match indicator column '{indicator}' collides with an existing column"
            )));
        }
        let matched: BooleanArray = matches.right.iter().map(|r| Some(r.is_some())).collect();
        fields.push(Field::new(indicator, DataType::Boolean, false));
        columns.push(Arc::new(matched));
    }

    let schema = Arc::new(Schema::new_with_metadata(
        fields,
        left_schema.metadata().clone(),
    ));
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn output_name(name: &str, suffix: &str, taken: &FxHashSet<String>) -> Result<String> {
    if !taken.contains(name) {
        return Ok(name.to_string());
    }
    let suffixed = format!("{name}{suffix}");
    if taken.contains(&suffixed) {
        return Err(Error::InvalidArgumentError(format!(
            "right column '{name}' collides with '{suffixed}' even after suffixing"
        )));
    }
    Ok(suffixed)
}
