//! Table writers used to materialize generated inputs.
//!
//! [`write_csv`] wraps Arrow's CSV writer and [`write_json_array`] Arrow's JSON array writer, so
//! files written here read back through [`CsvReader`](crate::CsvReader) and
//! [`JsonArrayReader`](crate::JsonArrayReader) with the same schema.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use arrow::csv::WriterBuilder;
use arrow::json::ArrayWriter;
use arrow::record_batch::RecordBatch;
use tabmerge_result::Result;

/// Configuration for writing CSV files.
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Write a header row with column names when true.
    pub include_header: bool,
    /// Delimiter to use between fields.
    pub delimiter: u8,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: b',',
        }
    }
}

pub fn write_csv(
    path: impl AsRef<Path>,
    batch: &RecordBatch,
    options: &CsvWriteOptions,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut sink = BufWriter::new(file);
    write_csv_to_writer(&mut sink, batch, options)?;
    sink.flush()?;
    Ok(())
}

pub fn write_csv_to_writer<W: Write>(
    writer: W,
    batch: &RecordBatch,
    options: &CsvWriteOptions,
) -> Result<()> {
    let mut csv = WriterBuilder::new()
        .with_header(options.include_header)
        .with_delimiter(options.delimiter)
        .build(writer);
    csv.write(batch)?;
    Ok(())
}

/// Write `batch` as a JSON document holding one object per row.
pub fn write_json_array(path: impl AsRef<Path>, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut json = ArrayWriter::new(BufWriter::new(file));
    json.write(batch)?;
    json.finish()?;
    let mut sink = json.into_inner();
    sink.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CsvReader, JsonArrayReader};
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("ProductID", DataType::Int64, false),
            Field::new("ProductName", DataType::Utf8, false),
            Field::new("Price", DataType::Float64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec!["Prodotto_01", "Prodotto_02"])),
                Arc::new(Float64Array::from(vec![19.99, 250.5])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_written_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.csv");
        write_csv(&path, &sample(), &CsvWriteOptions::default()).expect("write");

        let table = CsvReader::default().read_table(&path).expect("read back");
        assert_eq!(table.columns(), sample().columns());
    }

    #[test]
    fn csv_writer_honors_delimiter() {
        let mut out = Vec::new();
        let options = CsvWriteOptions {
            delimiter: b'|',
            ..Default::default()
        };
        write_csv_to_writer(&mut out, &sample(), &options).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ProductID|ProductName|Price"));
    }

    #[test]
    fn json_written_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.json");
        write_json_array(&path, &sample()).expect("write");

        let table = JsonArrayReader::new().read_table(&path).expect("read back");
        assert_eq!(table.num_rows(), 2);
        let prices = table
            .column(table.schema().index_of("Price").unwrap())
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(prices.values(), &[19.99, 250.5]);
    }
}
