//! Generated files load back through the source readers.

use arrow::datatypes::DataType;
use tabmerge_compute::parse_date_column;
use tabmerge_datagen::{GeneratorConfig, generate, write_sources};
use tabmerge_ingest::{CsvReadOptions, load_source};
use tabmerge_test_utils::init_tracing_for_tests;
use tabmerge_types::{SourceKind, columns};

#[test]
fn written_sources_load_with_contract_types() {
    init_tracing_for_tests();
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig {
        orders: 1_000,
        customers: 100,
        products: 8,
        seed: 42,
    };
    let paths = write_sources(dir.path().join("data"), &config).unwrap();
    assert_eq!(paths.len(), 3);

    let expected = generate(&config).unwrap();
    for (kind, path) in SourceKind::ALL.into_iter().zip(&paths) {
        assert!(path.ends_with(kind.default_file_name()));
        let loaded = load_source(kind, path, &CsvReadOptions::default()).unwrap();
        assert_eq!(loaded.num_rows(), expected.table(kind).num_rows(), "{kind}");
    }

    let orders = load_source(SourceKind::Orders, &paths[0], &CsvReadOptions::default()).unwrap();
    let order_dates = orders.column_by_name(columns::ORDER_DATE).unwrap();
    assert_eq!(order_dates.data_type(), &DataType::Utf8);
    let (parsed, coerced) = parse_date_column(order_dates).unwrap();
    assert_eq!(coerced, 0);
    assert_eq!(
        parsed.as_ref(),
        expected.orders.column_by_name(columns::ORDER_DATE).unwrap().as_ref()
    );

    let products =
        load_source(SourceKind::Products, &paths[1], &CsvReadOptions::default()).unwrap();
    assert_eq!(
        products.column_by_name(columns::PRICE).unwrap().as_ref(),
        expected.products.column_by_name(columns::PRICE).unwrap().as_ref()
    );
}
