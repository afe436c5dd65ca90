//! Pipeline configuration.

use std::path::{Path, PathBuf};

use tabmerge_compute::{BusinessFilter, DeriveOptions, NarrowingOptions};
use tabmerge_ingest::CsvReadOptions;
use tabmerge_join::{DuplicateKeyPolicy, JoinType};
use tabmerge_types::SourceKind;

/// Locations of the three input files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourcePaths {
    pub orders: PathBuf,
    pub products: PathBuf,
    pub customers: PathBuf,
}

impl SourcePaths {
    /// The default file names (`orders.csv`, `products.json`, `customers.csv`) inside `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            orders: dir.join(SourceKind::Orders.default_file_name()),
            products: dir.join(SourceKind::Products.default_file_name()),
            customers: dir.join(SourceKind::Customers.default_file_name()),
        }
    }

    pub fn path(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Orders => &self.orders,
            SourceKind::Products => &self.products,
            SourceKind::Customers => &self.customers,
        }
    }
}

/// Join behavior shared by the product and customer joins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoinSettings {
    pub join_type: JoinType,
    pub duplicate_keys: DuplicateKeyPolicy,
}

/// Everything a [`crate::Pipeline`] run needs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub sources: SourcePaths,
    pub csv: CsvReadOptions,
    pub join: JoinSettings,
    pub narrowing: NarrowingOptions,
    pub derive: DeriveOptions,
    pub filter: BusinessFilter,
}

impl PipelineConfig {
    pub fn new(sources: SourcePaths) -> Self {
        Self {
            sources,
            csv: CsvReadOptions::default(),
            join: JoinSettings::default(),
            narrowing: NarrowingOptions::default(),
            derive: DeriveOptions::default(),
            filter: BusinessFilter::default(),
        }
    }

    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(SourcePaths::from_dir(dir))
    }

    pub fn with_filter(mut self, filter: BusinessFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_join(mut self, join: JoinSettings) -> Self {
        self.join = join;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_dir("data")
    }
}
