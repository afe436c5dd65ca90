//! On-disk source fixtures.
//!
//! A [`SourceFixture`] owns a temporary directory and writes source files into it under their
//! default names, so tests can point a pipeline at `fixture.dir()` exactly like a real data
//! directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tabmerge_types::SourceKind;
use tempfile::TempDir;

pub const ORDERS_HEADER: &str = "OrderID,CustomerID,ProductID,Quantity,OrderDate";
pub const CUSTOMERS_HEADER: &str = "CustomerID,Region,Segment";

pub struct SourceFixture {
    dir: TempDir,
}

impl SourceFixture {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Fixture preloaded with the three given sources.
    pub fn with_sources(orders: &str, products: &str, customers: &str) -> io::Result<Self> {
        let fixture = Self::new()?;
        fixture.write(SourceKind::Orders, orders)?;
        fixture.write(SourceKind::Products, products)?;
        fixture.write(SourceKind::Customers, customers)?;
        Ok(fixture)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, kind: SourceKind) -> PathBuf {
        self.dir.path().join(kind.default_file_name())
    }

    /// Write `contents` verbatim as the file for `kind`.
    pub fn write(&self, kind: SourceKind, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(kind);
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn remove(&self, kind: SourceKind) -> io::Result<()> {
        fs::remove_file(self.path(kind))
    }
}

/// Build CSV text from a header and data rows.
pub fn csv(header: &str, rows: &[&str]) -> String {
    let mut out = String::with_capacity(header.len() + rows.len() * 32);
    out.push_str(header);
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}
