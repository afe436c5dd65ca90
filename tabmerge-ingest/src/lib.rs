//! Source loading for the tabmerge pipeline.
//!
//! Orders and customers arrive as delimited text with a header row; products arrive as a JSON
//! document holding an array of records. Both readers materialize the whole input into a single
//! Arrow [`RecordBatch`] with inferred column types, and [`conform`] then checks the result
//! against the source's [`SourceContract`](tabmerge_types::SourceContract).
//!
//! [`load_source`] ties the pieces together and reports every failure as
//! [`Error::SourceRead`], tagged with the source name and path.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use tabmerge_result::{Error, Result};
use tabmerge_types::{ColumnKind, SourceKind};

pub mod conform;
pub mod inference;
pub mod json;
pub mod reader;
pub mod writer;

pub use conform::conform;
pub use json::JsonArrayReader;
pub use reader::{CsvReadOptions, CsvReader};
pub use writer::{CsvWriteOptions, write_csv, write_csv_to_writer, write_json_array};

/// Read one source file and conform it to the source's column contract.
///
/// Orders and customers are read as CSV with `csv_options`; products are read as a JSON array.
/// Date columns of the contract are read as text so that impossible calendar dates reach the
/// narrowing stage, which turns them into nulls, instead of failing the read.
pub fn load_source(
    kind: SourceKind,
    path: impl AsRef<Path>,
    csv_options: &CsvReadOptions,
) -> Result<RecordBatch> {
    let path = path.as_ref();
    tracing::debug!(target: "tabmerge-ingest", source = %kind, path = %path.display(), "loading source");

    let raw = match kind {
        SourceKind::Products => JsonArrayReader::new().read_table(path),
        SourceKind::Orders | SourceKind::Customers => {
            let dates = kind
                .contract()
                .columns
                .iter()
                .filter(|c| c.kind == ColumnKind::Date)
                .map(|c| c.name);
            CsvReader::new(csv_options.clone().with_text_columns(dates)).read_table(path)
        }
    };

    let table = raw
        .and_then(|batch| conform(&batch, kind.contract()))
        .map_err(|err| into_source_read(kind, path, err))?;

    tracing::debug!(
        target: "tabmerge-ingest",
        source = %kind,
        rows = table.num_rows(),
        columns = table.num_columns(),
        "source loaded"
    );
    Ok(table)
}

fn into_source_read(kind: SourceKind, path: &Path, err: Error) -> Error {
    match err {
        already @ Error::SourceRead { .. } => already,
        Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
            Error::source_read(kind.name(), path, "file not found")
        }
        Error::InvalidArgumentError(reason) => Error::source_read(kind.name(), path, reason),
        other => Error::source_read(kind.name(), path, other),
    }
}
