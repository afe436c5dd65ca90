//! Integration tests for hash joins over record batches.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, DictionaryArray, Float64Array, Int32Array, Int64Array,
    RecordBatch, StringArray,
};
use arrow::datatypes::{DataType, Field, Int8Type, Schema};
use tabmerge_join::{DuplicateKeyPolicy, JoinKey, JoinOptions, JoinType, hash_join};
use tabmerge_result::Error;
use tabmerge_test_utils::init_tracing_for_tests;

fn batch(fields: Vec<(&str, ArrayRef)>) -> RecordBatch {
    let schema = Arc::new(Schema::new(
        fields
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    RecordBatch::try_new(schema, fields.into_iter().map(|(_, a)| a).collect()).unwrap()
}

fn orders() -> RecordBatch {
    batch(vec![
        ("OrderID", Arc::new(Int64Array::from(vec![1, 2, 3, 4]))),
        ("CustomerID", Arc::new(Int64Array::from(vec![10, 11, 99, 10]))),
        ("ProductID", Arc::new(Int64Array::from(vec![1, 2, 1, 3]))),
    ])
}

fn products() -> RecordBatch {
    batch(vec![
        ("ProductID", Arc::new(Int64Array::from(vec![3, 1, 2]))),
        (
            "ProductName",
            Arc::new(StringArray::from(vec!["Prodotto_03", "Prodotto_01", "Prodotto_02"])),
        ),
        ("Price", Arc::new(Float64Array::from(vec![300.0, 50.0, 7.5]))),
    ])
}

fn customers() -> RecordBatch {
    batch(vec![
        ("CustomerID", Arc::new(Int32Array::from(vec![11, 10]))),
        ("Region", Arc::new(StringArray::from(vec!["Sud", "Nord"]))),
    ])
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> &'a T {
    batch
        .column(batch.schema().index_of(name).unwrap())
        .as_any()
        .downcast_ref::<T>()
        .unwrap()
}

#[test]
fn left_join_attaches_right_columns_in_left_order() {
    init_tracing_for_tests();
    let joined = hash_join(
        &orders(),
        &products(),
        &JoinKey::on("ProductID"),
        &JoinOptions::left(),
    )
    .expect("join");

    let names: Vec<_> = joined
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    assert_eq!(
        names,
        vec!["OrderID", "CustomerID", "ProductID", "ProductName", "Price"]
    );

    assert_eq!(column::<Int64Array>(&joined, "OrderID").values(), &[1, 2, 3, 4]);
    let name = column::<StringArray>(&joined, "ProductName");
    assert_eq!(
        name.iter().collect::<Vec<_>>(),
        vec![
            Some("Prodotto_01"),
            Some("Prodotto_02"),
            Some("Prodotto_01"),
            Some("Prodotto_03")
        ]
    );
    assert_eq!(
        column::<Float64Array>(&joined, "Price").values(),
        &[50.0, 7.5, 50.0, 300.0]
    );
}

#[test]
fn left_join_keeps_unmatched_rows_with_nulls() {
    let joined = hash_join(
        &orders(),
        &customers(),
        &JoinKey::on("CustomerID"),
        &JoinOptions::left().with_match_indicator("matched"),
    )
    .expect("join");

    assert_eq!(joined.num_rows(), 4);
    let region = column::<StringArray>(&joined, "Region");
    assert_eq!(region.value(0), "Nord");
    assert_eq!(region.value(1), "Sud");
    assert!(region.is_null(2));
    assert_eq!(region.value(3), "Nord");

    let matched = column::<BooleanArray>(&joined, "matched");
    assert_eq!(
        matched.iter().collect::<Vec<_>>(),
        vec![Some(true), Some(true), Some(false), Some(true)]
    );
    assert!(!joined.schema().field_with_name("matched").unwrap().is_nullable());
    // Left key is preserved even where no customer matched.
    assert_eq!(column::<Int64Array>(&joined, "CustomerID").value(2), 99);
}

#[test]
fn inner_join_drops_unmatched_rows() {
    let joined = hash_join(
        &orders(),
        &customers(),
        &JoinKey::on("CustomerID"),
        &JoinOptions::inner(),
    )
    .expect("join");

    assert_eq!(column::<Int64Array>(&joined, "OrderID").values(), &[1, 2, 4]);
    assert_eq!(column::<StringArray>(&joined, "Region").null_count(), 0);
}

#[test]
fn duplicate_right_keys_fail_by_default() {
    let dup = batch(vec![
        ("CustomerID", Arc::new(Int64Array::from(vec![10, 10]))),
        ("Region", Arc::new(StringArray::from(vec!["Nord", "Sud"]))),
    ]);
    let err = hash_join(
        &orders(),
        &dup,
        &JoinKey::on("CustomerID"),
        &JoinOptions::left().with_right_name("customers"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::JoinKey { ref table, ref key, .. } if table == "customers" && key == "10"
    ));
}

#[test]
fn accepted_duplicate_keys_inflate_rows() {
    let dup = batch(vec![
        ("CustomerID", Arc::new(Int64Array::from(vec![10, 10]))),
        ("Region", Arc::new(StringArray::from(vec!["Nord", "Sud"]))),
    ]);
    let options = JoinOptions {
        join_type: JoinType::Left,
        duplicate_keys: DuplicateKeyPolicy::Accept,
        ..Default::default()
    };
    let joined = hash_join(&orders(), &dup, &JoinKey::on("CustomerID"), &options).unwrap();

    // Orders 1 and 4 reference customer 10 twice over; orders 2 and 3 are unmatched.
    assert_eq!(joined.num_rows(), 6);
    assert_eq!(
        column::<Int64Array>(&joined, "OrderID").values(),
        &[1, 1, 2, 3, 4, 4]
    );
}

#[test]
fn text_keys_join_including_dictionary_keys() {
    let left = batch(vec![
        ("OrderID", Arc::new(Int64Array::from(vec![1, 2]))),
        ("ProductID", Arc::new(StringArray::from(vec!["A", "Z"]))),
    ]);
    let dict: DictionaryArray<Int8Type> = vec!["A", "B"].into_iter().collect();
    let right = batch(vec![
        ("ProductID", Arc::new(dict)),
        ("Price", Arc::new(Float64Array::from(vec![50.0, 9.0]))),
    ]);

    let joined = hash_join(&left, &right, &JoinKey::on("ProductID"), &JoinOptions::left())
        .expect("join");
    let price = column::<Float64Array>(&joined, "Price");
    assert_eq!(price.value(0), 50.0);
    assert!(price.is_null(1));
}

#[test]
fn mismatched_key_types_are_rejected() {
    let left = batch(vec![("ProductID", Arc::new(StringArray::from(vec!["A"])))]);
    let err = hash_join(
        &left,
        &products(),
        &JoinKey::on("ProductID"),
        &JoinOptions::left(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("join key types differ"));
}

#[test]
fn keyless_side_joins_against_any_key_type() {
    let empty = batch(vec![("ProductID", Arc::new(Int64Array::from(Vec::<i64>::new())))]);
    let text_products = batch(vec![
        ("ProductID", Arc::new(StringArray::from(vec!["A", "B"]))),
        ("Price", Arc::new(Float64Array::from(vec![50.0, 120.5]))),
    ]);
    let joined = hash_join(
        &empty,
        &text_products,
        &JoinKey::on("ProductID"),
        &JoinOptions::left(),
    )
    .unwrap();
    assert_eq!(joined.num_rows(), 0);
    assert_eq!(
        joined.schema().field_with_name("Price").unwrap().data_type(),
        &DataType::Float64
    );

    let unkeyed = batch(vec![
        ("ProductID", Arc::new(StringArray::from(vec![None::<&str>, None]))),
        ("Price", Arc::new(Float64Array::from(vec![1.0, 2.0]))),
    ]);
    let joined = hash_join(
        &orders(),
        &unkeyed,
        &JoinKey::on("ProductID"),
        &JoinOptions::left(),
    )
    .unwrap();
    assert_eq!(joined.num_rows(), 4);
    assert_eq!(column::<Float64Array>(&joined, "Price").null_count(), 4);
}

#[test]
fn colliding_right_columns_get_suffix() {
    let left = batch(vec![
        ("CustomerID", Arc::new(Int64Array::from(vec![10]))),
        ("Region", Arc::new(StringArray::from(vec!["Centro"]))),
    ]);
    let joined = hash_join(
        &left,
        &customers(),
        &JoinKey::on("CustomerID"),
        &JoinOptions::left(),
    )
    .unwrap();
    assert_eq!(column::<StringArray>(&joined, "Region").value(0), "Centro");
    assert_eq!(column::<StringArray>(&joined, "Region_right").value(0), "Nord");
}

#[test]
fn empty_right_table_yields_null_columns() {
    let empty = RecordBatch::new_empty(customers().schema());
    let joined = hash_join(
        &orders(),
        &empty,
        &JoinKey::on("CustomerID"),
        &JoinOptions::left(),
    )
    .unwrap();
    assert_eq!(joined.num_rows(), 4);
    assert_eq!(column::<StringArray>(&joined, "Region").null_count(), 4);
    assert_eq!(
        joined.schema().field_with_name("Region").unwrap().data_type(),
        &DataType::Utf8
    );
}

#[test]
fn missing_key_column_is_reported() {
    let err = hash_join(
        &orders(),
        &products(),
        &JoinKey::new("ProductID", "SKU"),
        &JoinOptions::left().with_right_name("products"),
    )
    .unwrap_err();
    assert!(err.to_string().contains("'SKU' not found in products"));
}
