//! Per-source column contracts.
//!
//! A contract lists the columns a source is expected to provide and the kind of values each
//! holds. The load stage uses it to reject inputs with missing required columns and to cast
//! present columns to one canonical Arrow type per kind, so later stages can rely on stable
//! types regardless of how a file happened to be inferred.

use std::fmt;

use arrow::datatypes::DataType;

use crate::columns;

/// Which input a table was loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Orders,
    Products,
    Customers,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Orders,
        SourceKind::Products,
        SourceKind::Customers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Orders => "orders",
            SourceKind::Products => "products",
            SourceKind::Customers => "customers",
        }
    }

    /// Default file name inside a data directory.
    pub fn default_file_name(self) -> &'static str {
        match self {
            SourceKind::Orders => "orders.csv",
            SourceKind::Products => "products.json",
            SourceKind::Customers => "customers.csv",
        }
    }

    pub fn contract(self) -> &'static SourceContract {
        match self {
            SourceKind::Orders => &ORDERS_CONTRACT,
            SourceKind::Products => &PRODUCTS_CONTRACT,
            SourceKind::Customers => &CUSTOMERS_CONTRACT,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of values a contract column holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Whole numbers, canonicalized to `Int64`.
    Integer,
    /// Any number, canonicalized to `Float64`.
    Number,
    /// Free text, canonicalized to `Utf8`.
    Text,
    /// Join key: integers become `Int64`, text stays `Utf8`.
    Key,
    /// Calendar date: `Date32` is kept, text is kept for the narrowing stage to parse.
    Date,
}

impl ColumnKind {
    /// Canonical type for a column of this kind that was inferred as `actual`.
    ///
    /// Returns `None` when `actual` cannot represent values of this kind.
    pub fn canonical_type(self, actual: &DataType) -> Option<DataType> {
        // Columns with no values at all (header-only files, all-null fields) infer as Null.
        if actual == &DataType::Null {
            return Some(self.empty_type());
        }
        match self {
            ColumnKind::Integer => is_integer(actual).then_some(DataType::Int64),
            ColumnKind::Number => {
                (is_integer(actual) || is_float(actual)).then_some(DataType::Float64)
            }
            ColumnKind::Text => Some(DataType::Utf8),
            ColumnKind::Key => {
                if is_integer(actual) {
                    Some(DataType::Int64)
                } else if is_text(actual) {
                    Some(DataType::Utf8)
                } else {
                    None
                }
            }
            ColumnKind::Date => match actual {
                DataType::Date32 => Some(DataType::Date32),
                DataType::Date64 | DataType::Timestamp(_, _) => Some(DataType::Date32),
                other if is_text(other) => Some(DataType::Utf8),
                _ => None,
            },
        }
    }

    /// Canonical type of a column of this kind that holds no values.
    fn empty_type(self) -> DataType {
        match self {
            ColumnKind::Integer | ColumnKind::Key => DataType::Int64,
            ColumnKind::Number => DataType::Float64,
            ColumnKind::Text | ColumnKind::Date => DataType::Utf8,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Number => "number",
            ColumnKind::Text => "text",
            ColumnKind::Key => "key",
            ColumnKind::Date => "date",
        };
        f.write_str(label)
    }
}

fn is_integer(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn is_float(dt: &DataType) -> bool {
    matches!(dt, DataType::Float16 | DataType::Float32 | DataType::Float64)
}

fn is_text(dt: &DataType) -> bool {
    matches!(dt, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// One column of a source contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnContract {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
    /// Negative values are unexpected and reported when the source is loaded.
    pub non_negative: bool,
}

impl ColumnContract {
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            non_negative: false,
        }
    }

    pub const fn optional(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            non_negative: false,
        }
    }

    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }
}

/// Columns a source provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceContract {
    pub kind: SourceKind,
    pub columns: &'static [ColumnContract],
}

impl SourceContract {
    pub fn column(&self, name: &str) -> Option<&ColumnContract> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnContract> {
        self.columns.iter().filter(|c| c.required)
    }
}

pub static ORDERS_CONTRACT: SourceContract = SourceContract {
    kind: SourceKind::Orders,
    columns: &[
        ColumnContract::required(columns::ORDER_ID, ColumnKind::Integer),
        ColumnContract::required(columns::CUSTOMER_ID, ColumnKind::Integer),
        ColumnContract::required(columns::PRODUCT_ID, ColumnKind::Key),
        ColumnContract::required(columns::QUANTITY, ColumnKind::Integer).non_negative(),
        ColumnContract::required(columns::ORDER_DATE, ColumnKind::Date),
    ],
};

pub static PRODUCTS_CONTRACT: SourceContract = SourceContract {
    kind: SourceKind::Products,
    columns: &[
        ColumnContract::required(columns::PRODUCT_ID, ColumnKind::Key),
        ColumnContract::optional(columns::PRODUCT_NAME, ColumnKind::Text),
        ColumnContract::optional(columns::CATEGORY, ColumnKind::Text),
        ColumnContract::optional(columns::SUPPLIER, ColumnKind::Text),
        ColumnContract::required(columns::PRICE, ColumnKind::Number).non_negative(),
    ],
};

pub static CUSTOMERS_CONTRACT: SourceContract = SourceContract {
    kind: SourceKind::Customers,
    columns: &[
        ColumnContract::required(columns::CUSTOMER_ID, ColumnKind::Integer),
        ColumnContract::optional(columns::REGION, ColumnKind::Text),
        ColumnContract::optional(columns::SEGMENT, ColumnKind::Text),
    ],
};
