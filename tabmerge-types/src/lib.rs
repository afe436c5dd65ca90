//! Shared vocabulary for the tabmerge crates.
//!
//! - [`columns`]: canonical column names of the three sources and the derived table
//! - [`SourceKind`]: which input a table came from
//! - [`SourceContract`]: the columns each source must (or may) provide, with their kinds

pub mod columns;
pub mod contract;

pub use contract::{
    CUSTOMERS_CONTRACT, ColumnContract, ColumnKind, ORDERS_CONTRACT, PRODUCTS_CONTRACT,
    SourceContract, SourceKind,
};
