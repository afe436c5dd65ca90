//! Canonical column names.

pub const ORDER_ID: &str = "OrderID";
pub const CUSTOMER_ID: &str = "CustomerID";
pub const PRODUCT_ID: &str = "ProductID";
pub const QUANTITY: &str = "Quantity";
pub const ORDER_DATE: &str = "OrderDate";

pub const PRODUCT_NAME: &str = "ProductName";
pub const CATEGORY: &str = "Category";
pub const SUPPLIER: &str = "Supplier";
pub const PRICE: &str = "Price";

pub const REGION: &str = "Region";
pub const SEGMENT: &str = "Segment";

/// Derived `Price x Quantity` column.
pub const TOTAL_VALUE: &str = "TotalValue";

/// Join match indicator for the customer join. Internal to the pipeline; dropped from results.
pub const CUSTOMER_MATCHED: &str = "__customer_matched";

/// Join match indicator for the product join. Dropped once unmatched products are counted.
pub const PRODUCT_MATCHED: &str = "__product_matched";
