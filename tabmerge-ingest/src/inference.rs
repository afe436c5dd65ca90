//! CSV schema inference.
//!
//! Arrow's CSV format inference decides column types; this module adds the header checks
//! Arrow does not perform (empty file, blank or duplicated column names) so malformed inputs
//! fail before the table is read.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use rustc_hash::FxHashSet;
use tabmerge_result::{Error, Result};

use crate::CsvReadOptions;

pub(crate) struct InferenceOutcome {
    pub schema: SchemaRef,
    pub sampled_records: usize,
}

pub(crate) fn infer(path: &Path, options: &CsvReadOptions) -> Result<InferenceOutcome> {
    if fs::metadata(path)?.len() == 0 {
        return Err(Error::InvalidArgumentError("file is empty".into()));
    }

    let format = options.to_format()?;
    let file = File::open(path)?;
    let (schema, sampled_records) = format
        .infer_schema(file, options.max_read_records)
        .map_err(|err| Error::InvalidArgumentError(format!("cannot infer CSV schema: {err}")))?;
    if options.has_header {
        validate_header(&schema)?;
    }

    tracing::trace!(
        target: "tabmerge-ingest",
        path = %path.display(),
        sampled_records,
        fields = schema.fields().len(),
        "inferred CSV schema"
    );

    Ok(InferenceOutcome {
        schema: Arc::new(schema),
        sampled_records,
    })
}

/// Header names arrive unquoted from the CSV parser; reject blank and repeated ones.
fn validate_header(schema: &Schema) -> Result<()> {
    let mut seen = FxHashSet::default();
    for (idx, field) in schema.fields().iter().enumerate() {
        let name = field.name().trim();
        if name.is_empty() {
            return Err(Error::InvalidArgumentError(format!(
                "header column {} has no name",
                idx + 1
            )));
        }
        if !seen.insert(name) {
            return Err(Error::InvalidArgumentError(format!(
                "header column '{name}' appears more than once"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn quoted_header_names_are_unquoted() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#"CustomerID,"Region, full",Segment"#).unwrap();
        writeln!(tmp, "1,Nord,Premium").unwrap();

        let outcome = infer(tmp.path(), &CsvReadOptions::default()).expect("infer");
        assert_eq!(outcome.schema.field(1).name(), "Region, full");
        assert_eq!(outcome.schema.fields().len(), 3);
    }

    #[test]
    fn quoted_duplicate_header_is_rejected() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, r#""Region",Region"#).unwrap();
        writeln!(tmp, "Nord,Sud").unwrap();

        let err = infer(tmp.path(), &CsvReadOptions::default())
            .err()
            .expect("duplicate header");
        assert!(err.to_string().contains("'Region'"));
    }

    #[test]
    fn duplicate_header_is_rejected() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "CustomerID,Region,Region").unwrap();
        writeln!(tmp, "1,Nord,Sud").unwrap();

        let err = infer(tmp.path(), &CsvReadOptions::default())
            .err()
            .expect("duplicate header");
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let tmp = NamedTempFile::new().unwrap();
        let err = infer(tmp.path(), &CsvReadOptions::default())
            .err()
            .expect("empty file");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn sample_limit_is_reported() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "CustomerID").unwrap();
        for id in 0..10 {
            writeln!(tmp, "{id}").unwrap();
        }
        let options = CsvReadOptions {
            max_read_records: Some(4),
            ..Default::default()
        };
        let outcome = infer(tmp.path(), &options).expect("infer");
        assert_eq!(outcome.sampled_records, 4);
    }
}
