//! Columnar kernels applied between the join and the final result.
//!
//! - [`narrow`]: downcast numeric columns, dictionary-encode category columns, parse dates
//! - [`derive`]: append the `TotalValue` column
//! - [`filter`]: the business predicate that selects result rows
//! - [`memory`]: in-memory footprint of a table
//!
//! [`category`] and [`date`] hold the per-column helpers the narrowing pass is built from.

pub mod category;
pub mod date;
pub mod derive;
pub mod filter;
pub mod memory;
pub mod narrow;

pub use category::{category_labels, dictionary_key_type, encode_category};
pub use date::{days_since_epoch, parse_date_column, parse_date32};
pub use derive::{DeriveOptions, derive_total_value};
pub use filter::{BusinessFilter, CustomerPresence};
pub use memory::{batch_memory_bytes, format_bytes};
pub use narrow::{
    ColumnChange, IntegerTarget, IntegerWidth, NarrowingOptions, NarrowingReport, narrow_batch,
};
