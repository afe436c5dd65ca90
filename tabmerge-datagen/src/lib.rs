//! Seeded synthetic inputs for the pipeline.
//!
//! Produces the three source tables with the shapes the pipeline expects: a small product
//! catalog, a medium customer list and a large order log referencing both. Each table is drawn
//! from its own `StdRng` seeded with [`GeneratorConfig::seed`], so a given configuration always
//! yields the same files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tabmerge_compute::days_since_epoch;
use tabmerge_ingest::{CsvWriteOptions, write_csv, write_json_array};
use tabmerge_result::{Error, Result};
use tabmerge_types::{SourceKind, columns};
use time::{Date, Month};

const CATEGORIES: [&str; 4] = ["A", "B", "C", "D"];
const SUPPLIERS: [&str; 4] = ["SupplierOne", "SupplierTwo", "SupplierThree", "SupplierFour"];
const REGIONS: [&str; 4] = ["Nord", "Centro", "Sud", "Isole"];
const SEGMENTS: [(&str, f64); 3] = [("Standard", 0.7), ("Premium", 0.2), ("Business", 0.1)];

const PRICE_RANGE: std::ops::Range<f64> = 5.0..300.0;
const MAX_QUANTITY: i64 = 10;
/// Order dates fall within this many days from January 1st of [`ORDER_YEAR`].
const ORDER_DAYS: i32 = 365;
const ORDER_YEAR: i32 = 2024;

/// Size and seed of a generated data set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub orders: usize,
    pub customers: usize,
    pub products: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            orders: 100_000,
            customers: 5_000,
            products: 20,
            seed: 42,
        }
    }
}

impl GeneratorConfig {
    fn validate(&self) -> Result<()> {
        if self.orders > 0 && (self.customers == 0 || self.products == 0) {
            return Err(Error::InvalidArgumentError(
                "orders need at least one customer and one product to reference".into(),
            ));
        }
        Ok(())
    }
}

/// The three generated tables.
#[derive(Clone, Debug)]
pub struct GeneratedSources {
    pub orders: RecordBatch,
    pub products: RecordBatch,
    pub customers: RecordBatch,
}

impl GeneratedSources {
    pub fn table(&self, kind: SourceKind) -> &RecordBatch {
        match kind {
            SourceKind::Orders => &self.orders,
            SourceKind::Products => &self.products,
            SourceKind::Customers => &self.customers,
        }
    }
}

/// Generate all three tables in memory.
pub fn generate(config: &GeneratorConfig) -> Result<GeneratedSources> {
    config.validate()?;
    Ok(GeneratedSources {
        orders: generate_orders(config)?,
        products: generate_products(config)?,
        customers: generate_customers(config)?,
    })
}

/// Generate the sources and write them into `dir` under their default file names.
///
/// Creates `dir` if needed and returns the written paths in [`SourceKind::ALL`] order.
pub fn write_sources(dir: impl AsRef<Path>, config: &GeneratorConfig) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let sources = generate(config)?;
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(SourceKind::ALL.len());
    for kind in SourceKind::ALL {
        let path = dir.join(kind.default_file_name());
        let table = sources.table(kind);
        match kind {
            SourceKind::Products => write_json_array(&path, table)?,
            SourceKind::Orders | SourceKind::Customers => {
                write_csv(&path, table, &CsvWriteOptions::default())?
            }
        }
        tracing::info!(
            target: "tabmerge-datagen",
            source = %kind,
            rows = table.num_rows(),
            path = %path.display(),
            "wrote source"
        );
        written.push(path);
    }
    Ok(written)
}

/// Products `1..=n` with a name, a category, a supplier and a price rounded to cents.
pub fn generate_products(config: &GeneratorConfig) -> Result<RecordBatch> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.products;

    let mut names = Vec::with_capacity(n);
    let mut categories = Vec::with_capacity(n);
    let mut suppliers = Vec::with_capacity(n);
    let mut prices = Vec::with_capacity(n);
    for id in 1..=n {
        names.push(format!("Prodotto_{id:02}"));
        categories.push(pick(&mut rng, &CATEGORIES));
        suppliers.push(pick(&mut rng, &SUPPLIERS));
        let price: f64 = rng.random_range(PRICE_RANGE);
        prices.push((price * 100.0).round() / 100.0);
    }

    table(vec![
        (columns::PRODUCT_ID, id_column(n)?),
        (columns::PRODUCT_NAME, Arc::new(StringArray::from(names))),
        (columns::CATEGORY, Arc::new(StringArray::from(categories))),
        (columns::SUPPLIER, Arc::new(StringArray::from(suppliers))),
        (columns::PRICE, Arc::new(Float64Array::from(prices))),
    ])
}

/// Customers `1..=n` with a region and a weighted segment.
pub fn generate_customers(config: &GeneratorConfig) -> Result<RecordBatch> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.customers;
    let segments = WeightedIndex::new(SEGMENTS.iter().map(|(_, w)| *w))
        .map_err(|err| Error::Internal(format!("invalid segment weights: {err}")))?;

    let regions: Vec<&str> = (0..n).map(|_| pick(&mut rng, &REGIONS)).collect();
    let segment: Vec<&str> = (0..n)
        .map(|_| SEGMENTS[segments.sample(&mut rng)].0)
        .collect();

    table(vec![
        (columns::CUSTOMER_ID, id_column(n)?),
        (columns::REGION, Arc::new(StringArray::from(regions))),
        (columns::SEGMENT, Arc::new(StringArray::from(segment))),
    ])
}

/// Orders `1..=n` referencing uniformly drawn customers and products.
pub fn generate_orders(config: &GeneratorConfig) -> Result<RecordBatch> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let n = config.orders;
    let customers = i64::try_from(config.customers)
        .map_err(|_| Error::InvalidArgumentError("customer count exceeds i64".into()))?;
    let products = i64::try_from(config.products)
        .map_err(|_| Error::InvalidArgumentError("product count exceeds i64".into()))?;

    let first_day = Date::from_calendar_date(ORDER_YEAR, Month::January, 1)
        .map(days_since_epoch)
        .map_err(|err| Error::Internal(format!("invalid order start date: {err}")))?;

    let customer_ids: Vec<i64> = (0..n).map(|_| rng.random_range(1..=customers)).collect();
    let product_ids: Vec<i64> = (0..n).map(|_| rng.random_range(1..=products)).collect();
    let quantities: Vec<i64> = (0..n).map(|_| rng.random_range(1..=MAX_QUANTITY)).collect();
    let dates: Vec<i32> = (0..n)
        .map(|_| first_day + rng.random_range(0..ORDER_DAYS))
        .collect();

    table(vec![
        (columns::ORDER_ID, id_column(n)?),
        (columns::CUSTOMER_ID, Arc::new(Int64Array::from(customer_ids))),
        (columns::PRODUCT_ID, Arc::new(Int64Array::from(product_ids))),
        (columns::QUANTITY, Arc::new(Int64Array::from(quantities))),
        (columns::ORDER_DATE, Arc::new(Date32Array::from(dates))),
    ])
}

fn pick<'a>(rng: &mut StdRng, choices: &[&'a str]) -> &'a str {
    choices[rng.random_range(0..choices.len())]
}

fn id_column(n: usize) -> Result<ArrayRef> {
    let n = i64::try_from(n)
        .map_err(|_| Error::InvalidArgumentError("row count exceeds i64".into()))?;
    Ok(Arc::new(Int64Array::from_iter_values(1..=n)))
}

fn table(columns: Vec<(&str, ArrayRef)>) -> Result<RecordBatch> {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
