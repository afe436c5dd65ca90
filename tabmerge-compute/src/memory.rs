//! In-memory footprint of tables.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;

/// Bytes held by the buffers of every column in `batch`.
///
/// Counts whole buffers, so a sliced column reports the size of its parent allocation.
pub fn batch_memory_bytes(batch: &RecordBatch) -> usize {
    batch
        .columns()
        .iter()
        .map(|column| column.get_array_memory_size())
        .sum()
}

/// Render a byte count with a binary unit, e.g. `1.50 MiB`.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}
