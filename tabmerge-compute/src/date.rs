//! Calendar date parsing into the Arrow `Date32` encoding (days since the Unix epoch).

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use tabmerge_result::{Error, Result};
use time::{Date, Month};

/// Julian day number of 1970-01-01.
const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

/// Parse `YYYY-MM-DD` into `Date32` days. Returns `None` for anything else.
///
/// Surrounding whitespace is ignored; the month and day may omit their leading zero.
pub fn parse_date32(text: &str) -> Option<i32> {
    let mut parts = text.trim().split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u8>().ok()?;
    let day = parts.next()?.parse::<u8>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(days_since_epoch(date))
}

/// `Date32` encoding of a calendar date.
pub fn days_since_epoch(date: Date) -> i32 {
    date.to_julian_day() - UNIX_EPOCH_JULIAN_DAY
}

/// Parse a text column into `Date32`, coercing unparseable values to null.
///
/// Returns the parsed column and the number of non-null inputs that became null.
pub fn parse_date_column(column: &ArrayRef) -> Result<(ArrayRef, usize)> {
    let text = match column.data_type() {
        DataType::Utf8 => Arc::clone(column),
        DataType::LargeUtf8 | DataType::Utf8View => cast(column, &DataType::Utf8)?,
        other => {
            return Err(Error::InvalidArgumentError(format!(
                "cannot parse dates from a {other} column"
            )));
        }
    };
    let text = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::Internal("date column did not cast to Utf8".into()))?;

    let mut coerced = 0usize;
    let parsed: Date32Array = text
        .iter()
        .map(|value| {
            let value = value?;
            let days = parse_date32(value);
            if days.is_none() {
                coerced += 1;
            }
            days
        })
        .collect();
    Ok((Arc::new(parsed), coerced))
}
