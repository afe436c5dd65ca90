//! The business filter applied to the enriched table.

use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, StringArray};
use arrow::compute::kernels::cmp::{eq, gt};
use arrow::compute::{and, cast, filter_record_batch, is_not_null};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use tabmerge_result::{Error, Result};
use tabmerge_types::columns;

/// How a row proves that its customer exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomerPresence {
    /// A boolean join indicator column that is true where the customer join matched.
    MatchColumn(String),
    /// A customer-side column that is non-null where the customer join matched.
    NonNull(String),
}

/// Row predicate selecting the result rows.
///
/// A row is kept when its total is strictly greater than `min_total_value`, its customer is
/// present, and, if `segment` is set, its segment label equals it. Null values never satisfy a
/// comparison.
#[derive(Clone, Debug)]
pub struct BusinessFilter {
    pub total_column: String,
    pub min_total_value: f64,
    pub customer: CustomerPresence,
    pub segment_column: String,
    pub segment: Option<String>,
}

impl Default for BusinessFilter {
    fn default() -> Self {
        Self {
            total_column: columns::TOTAL_VALUE.to_string(),
            min_total_value: 100.0,
            customer: CustomerPresence::MatchColumn(columns::CUSTOMER_MATCHED.to_string()),
            segment_column: columns::SEGMENT.to_string(),
            segment: None,
        }
    }
}

impl BusinessFilter {
    pub fn with_min_total_value(mut self, min_total_value: f64) -> Self {
        self.min_total_value = min_total_value;
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    pub fn with_customer_presence(mut self, customer: CustomerPresence) -> Self {
        self.customer = customer;
        self
    }

    /// Per-row outcome of the predicate. Null entries mean "not kept".
    pub fn mask(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        let total = column(batch, &self.total_column)?;
        if !(total.data_type().is_floating() || total.data_type().is_integer()) {
            return Err(Error::InvalidArgumentError(format!(
                "filter column '{}' is {}, expected a numeric column",
                self.total_column,
                total.data_type()
            )));
        }
        let total = cast(total, &DataType::Float64)?;
        let threshold = Float64Array::new_scalar(self.min_total_value);
        let mut mask = gt(&total, &threshold)?;

        let present = match &self.customer {
            CustomerPresence::MatchColumn(name) => column(batch, name)?
                .as_any()
                .downcast_ref::<BooleanArray>()
                .cloned()
                .ok_or_else(|| {
                    Error::InvalidArgumentError(format!(
                        "match indicator column '{name}' is not boolean"
                    ))
                })?,
            CustomerPresence::NonNull(name) => is_not_null(column(batch, name)?.as_ref())?,
        };
        mask = and(&mask, &present)?;

        if let Some(segment) = &self.segment {
            let labels = cast(column(batch, &self.segment_column)?, &DataType::Utf8)?;
            let wanted = StringArray::new_scalar(segment.as_str());
            mask = and(&mask, &eq(&labels, &wanted)?)?;
        }
        Ok(mask)
    }

    /// Rows of `batch` satisfying the predicate, in their original order.
    pub fn apply(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = self.mask(batch)?;
        let kept = filter_record_batch(batch, &mask)?;
        tracing::debug!(
            target: "tabmerge-compute",
            input_rows = batch.num_rows(),
            kept_rows = kept.num_rows(),
            min_total_value = self.min_total_value,
            segment = ?self.segment,
            "business filter applied"
        );
        Ok(kept)
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::InvalidArgumentError(format!("filter column '{name}' not found")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float32Array, Int64Array};
    use arrow::datatypes::{Field, Schema};

    use super::*;
    use crate::category::encode_category;

    fn enriched() -> RecordBatch {
        let segment: ArrayRef = Arc::new(StringArray::from(vec![
            Some("Premium"),
            Some("Standard"),
            None,
            Some("Premium"),
            Some("Premium"),
        ]));
        let fields: Vec<(&str, ArrayRef)> = vec![
            ("OrderID", Arc::new(Int64Array::from(vec![1, 2, 3, 4, 5]))),
            (
                "TotalValue",
                Arc::new(Float32Array::from(vec![
                    Some(150.0),
                    Some(250.0),
                    Some(400.0),
                    Some(100.0),
                    None,
                ])),
            ),
            ("Segment", encode_category(&segment).unwrap()),
            (
                "__customer_matched",
                Arc::new(BooleanArray::from(vec![true, true, false, true, true])),
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

    fn order_ids(batch: &RecordBatch) -> Vec<i64> {
        batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .values()
            .to_vec()
    }

    #[test]
    fn keeps_large_orders_with_customers() {
        let kept = BusinessFilter::default().apply(&enriched()).unwrap();
        // 3 has no customer, 4 is not strictly above 100, 5 has a null total.
        assert_eq!(order_ids(&kept), vec![1, 2]);
    }

    #[test]
    fn segment_restricts_further() {
        let kept = BusinessFilter::default()
            .with_segment("Premium")
            .apply(&enriched())
            .unwrap();
        assert_eq!(order_ids(&kept), vec![1]);
    }

    #[test]
    fn non_null_presence_uses_customer_column() {
        let filter = BusinessFilter::default()
            .with_min_total_value(0.0)
            .with_customer_presence(CustomerPresence::NonNull("Segment".into()));
        let kept = filter.apply(&enriched()).unwrap();
        assert_eq!(order_ids(&kept), vec![1, 2, 4]);
    }

    #[test]
    fn missing_indicator_is_an_error() {
        let filter = BusinessFilter::default()
            .with_customer_presence(CustomerPresence::MatchColumn("nope".into()));
        let err = filter.apply(&enriched()).unwrap_err();
        assert!(err.to_string().contains("'nope' not found"));
    }
}
