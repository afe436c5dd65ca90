//! Narrowing, derivation and filtering applied in pipeline order.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int64Array, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tabmerge_compute::{
    BusinessFilter, DeriveOptions, NarrowingOptions, category_labels, derive_total_value,
    narrow_batch,
};
use tabmerge_test_utils::init_tracing_for_tests;
use tabmerge_types::columns;

fn unified() -> RecordBatch {
    let fields: Vec<(&str, ArrayRef)> = vec![
        (columns::ORDER_ID, Arc::new(Int64Array::from(vec![1, 2, 3]))),
        (columns::CUSTOMER_ID, Arc::new(Int64Array::from(vec![10, 11, 99]))),
        (columns::PRODUCT_ID, Arc::new(StringArray::from(vec!["A", "A", "B"]))),
        (columns::QUANTITY, Arc::new(Int64Array::from(vec![3, 1, 5]))),
        (
            columns::ORDER_DATE,
            Arc::new(StringArray::from(vec!["2024-01-01", "2024-01-02", "2024-01-03"])),
        ),
        (columns::PRICE, Arc::new(Float64Array::from(vec![50.0, 50.0, 40.0]))),
        (
            columns::REGION,
            Arc::new(StringArray::from(vec![Some("Nord"), Some("Sud"), None])),
        ),
        (
            columns::CUSTOMER_MATCHED,
            Arc::new(BooleanArray::from(vec![true, true, false])),
        ),
    ];
    let schema = Arc::new(Schema::new(
        fields
            .iter()
            .map(|(n, a)| Field::new(*n, a.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    RecordBatch::try_new(schema, fields.into_iter().map(|(_, a)| a).collect()).unwrap()
}

#[test]
fn chain_selects_expected_rows() {
    init_tracing_for_tests();
    let input = unified();
    let (optimized, report) = narrow_batch(&input, &NarrowingOptions::default()).unwrap();

    assert_eq!(optimized.num_rows(), input.num_rows());
    assert_eq!(
        optimized.schema().field_with_name(columns::PRICE).unwrap().data_type(),
        &DataType::Float32
    );
    assert_eq!(
        optimized.schema().field_with_name(columns::QUANTITY).unwrap().data_type(),
        &DataType::Int8
    );
    assert_eq!(
        optimized.schema().field_with_name(columns::PRODUCT_ID).unwrap().data_type(),
        &DataType::Utf8
    );
    assert!(report.change(columns::PRODUCT_ID).is_none());
    assert_eq!(
        category_labels(optimized.column_by_name(columns::REGION).unwrap()).unwrap(),
        category_labels(input.column_by_name(columns::REGION).unwrap()).unwrap()
    );

    let enriched = derive_total_value(&optimized, &DeriveOptions::default()).unwrap();
    let result = BusinessFilter::default().apply(&enriched).unwrap();

    // Order 1: 3 x 50 = 150 kept. Order 2: 1 x 50 dropped. Order 3: no customer.
    assert_eq!(result.num_rows(), 1);
    let total = result
        .column_by_name(columns::TOTAL_VALUE)
        .unwrap()
        .as_any()
        .downcast_ref::<Float32Array>()
        .unwrap();
    assert_eq!(total.value(0), 150.0);
}

#[test]
fn narrowing_twice_is_stable() {
    let (once, _) = narrow_batch(&unified(), &NarrowingOptions::default()).unwrap();
    let (twice, report) = narrow_batch(&once, &NarrowingOptions::default()).unwrap();
    assert_eq!(once, twice);
    assert!(report.changes.is_empty());
}
