//! tabmerge: merge orders, products and customers into one compact, filtered Arrow table.
//!
//! This crate is the entrypoint of the workspace. It re-exports the pipeline and the
//! configuration types of the underlying `tabmerge-*` crates.
//!
//! # Quick Start
//!
//! ```no_run
//! use tabmerge::{Pipeline, PipelineConfig};
//!
//! let output = Pipeline::new(PipelineConfig::from_dir("data")).run()?;
//! println!("{}", output.summary);
//! # Ok::<(), tabmerge::Error>(())
//! ```
//!
//! # Architecture
//!
//! - **Ingest** (`tabmerge-ingest`): CSV and JSON-array readers conforming to per-source
//!   column contracts (`tabmerge-types`).
//! - **Join** (`tabmerge-join`): hash joins with key-uniqueness checks.
//! - **Compute** (`tabmerge-compute`): narrowing, the `TotalValue` column, the business filter.
//! - **Pipeline** (`tabmerge-pipeline`): stage orchestration and the run summary.
//! - **Datagen** (`tabmerge-datagen`): seeded synthetic inputs.

pub use tabmerge_pipeline::{
    JoinSettings, Pipeline, PipelineConfig, PipelineOutput, PipelineSummary, RowCounts,
    SourcePaths, SourceTables, StageTimings, derive_enriched, filter_result, join_sources,
    load_sources, narrow_unified,
};

pub use tabmerge_result::{Error, Result};

pub use tabmerge_types::{SourceKind, columns};

pub mod compute {
    //! Narrowing, derivation and filtering kernels.
    pub use tabmerge_compute::*;
}

pub mod datagen {
    //! Synthetic input generation.
    pub use tabmerge_datagen::*;
}

pub mod ingest {
    //! Source readers and writers.
    pub use tabmerge_ingest::*;
}

pub mod join {
    //! Hash joins over record batches.
    pub use tabmerge_join::*;
}
