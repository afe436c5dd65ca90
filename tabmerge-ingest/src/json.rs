//! Reader for JSON documents holding an array of flat records.
//!
//! The document is parsed with `serde_json`, the schema is inferred from every record with
//! Arrow's JSON inference, and the records are decoded with Arrow's JSON decoder. Keys missing
//! from a record decode as nulls.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use arrow::json::reader::{ReaderBuilder, infer_json_schema_from_iterator};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use tabmerge_result::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArrayReader;

impl JsonArrayReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_table(&self, path: &Path) -> Result<RecordBatch> {
        let file = File::open(path)?;
        let document: Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| Error::InvalidArgumentError(format!("invalid JSON: {err}")))?;
        read_records(document)
    }
}

/// Decode an in-memory JSON document (top-level array of objects) into a table.
pub fn read_records(document: Value) -> Result<RecordBatch> {
    let records = match document {
        Value::Array(items) => items,
        other => {
            return Err(Error::InvalidArgumentError(format!(
                "expected a top-level array of records, found {}",
                value_kind(&other)
            )));
        }
    };

    if records.is_empty() {
        return Err(Error::InvalidArgumentError(
            "document contains no records".into(),
        ));
    }
    if let Some((idx, record)) = records.iter().enumerate().find(|(_, r)| !r.is_object()) {
        return Err(Error::InvalidArgumentError(format!(
            "record {idx} is {}, expected an object",
            value_kind(record)
        )));
    }

    let schema = infer_json_schema_from_iterator(records.iter().map(Ok))
        .map_err(|err| Error::InvalidArgumentError(format!("cannot infer JSON schema: {err}")))?;
    let schema = Arc::new(schema);

    let mut decoder = ReaderBuilder::new(Arc::clone(&schema))
        .with_batch_size(records.len())
        .build_decoder()?;
    decoder
        .serialize(&records)
        .map_err(|err| Error::InvalidArgumentError(format!("malformed JSON record: {err}")))?;

    let batch = decoder
        .flush()?
        .unwrap_or_else(|| RecordBatch::new_empty(Arc::clone(&schema)));
    tracing::trace!(
        target: "tabmerge-ingest",
        rows = batch.num_rows(),
        fields = schema.fields().len(),
        "decoded JSON records"
    );
    Ok(batch)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
