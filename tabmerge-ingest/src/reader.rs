use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::{Format, ReaderBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use regex::Regex;
use tabmerge_result::{Error, Result};

use crate::inference;

const DEFAULT_BATCH_SIZE: usize = 8192;

#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    pub has_header: bool,
    pub delimiter: u8,
    /// Records sampled for type inference. `None` samples the whole file, which keeps a late
    /// decimal value from failing a column inferred as integer.
    pub max_read_records: Option<usize>,
    pub batch_size: Option<usize>,
    /// Literal field value read as null (matched case-insensitively). Empty fields are always
    /// null.
    pub null_token: Option<String>,
    /// Columns read as `Utf8` whatever type inference picks for them.
    pub text_columns: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            max_read_records: None,
            batch_size: None,
            null_token: None,
            text_columns: Vec::new(),
        }
    }
}

impl CsvReadOptions {
    pub fn with_text_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_columns.extend(names.into_iter().map(Into::into));
        self
    }

    /// `schema` with every field listed in `text_columns` retyped to `Utf8`.
    pub(crate) fn apply_text_columns(&self, schema: SchemaRef) -> SchemaRef {
        if !schema
            .fields()
            .iter()
            .any(|f| self.text_columns.iter().any(|name| name == f.name()))
        {
            return schema;
        }
        let fields: Vec<Field> = schema
            .fields()
            .iter()
            .map(|f| {
                if self.text_columns.iter().any(|name| name == f.name()) {
                    f.as_ref().clone().with_data_type(DataType::Utf8)
                } else {
                    f.as_ref().clone()
                }
            })
            .collect();
        Arc::new(Schema::new_with_metadata(fields, schema.metadata().clone()))
    }

    pub(crate) fn to_format(&self) -> Result<Format> {
        let mut format = Format::default().with_header(self.has_header);
        if self.delimiter != b',' {
            format = format.with_delimiter(self.delimiter);
        }
        if let Some(token) = &self.null_token {
            let pattern = format!("(?i)^(|{})$", regex::escape(token));
            let null_regex = Regex::new(&pattern).map_err(|err| {
                Error::InvalidArgumentError(format!("invalid null token '{token}': {err}"))
            })?;
            format = format.with_null_regex(null_regex);
        }
        Ok(format)
    }
}

/// Reads a delimited text file into one in-memory table.
#[derive(Debug, Clone, Default)]
pub struct CsvReader {
    options: CsvReadOptions,
}

impl CsvReader {
    pub fn new(options: CsvReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CsvReadOptions {
        &self.options
    }

    /// Inferred schema of `path`, with `text_columns` already applied.
    pub fn infer_schema(&self, path: &Path) -> Result<SchemaRef> {
        let outcome = inference::infer(path, &self.options)?;
        Ok(self.options.apply_text_columns(outcome.schema))
    }

    /// Read every record of `path`, concatenated into a single batch.
    pub fn read_table(&self, path: &Path) -> Result<RecordBatch> {
        let outcome = inference::infer(path, &self.options)?;
        let schema = self.options.apply_text_columns(outcome.schema);

        let file = File::open(path)?;
        let reader = ReaderBuilder::new(Arc::clone(&schema))
            .with_format(self.options.to_format()?)
            .with_batch_size(self.options.batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
            .build(file)?;

        let mut batches = Vec::new();
        for batch in reader {
            let batch = batch.map_err(|err| {
                Error::InvalidArgumentError(format!("malformed CSV record: {err}"))
            })?;
            if batch.num_rows() > 0 {
                batches.push(batch);
            }
        }

        let table = concat_batches(&schema, &batches)?;
        tracing::trace!(
            target: "tabmerge-ingest",
            path = %path.display(),
            batches = batches.len(),
            sampled_records = outcome.sampled_records,
            rows = table.num_rows(),
            "read CSV table"
        );
        Ok(table)
    }
}
