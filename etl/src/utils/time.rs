use arrow::array::{Array, ArrayRef, AsArray, TimestampMicrosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use common::{Error, Result};

use crate::transform::frame::UNKNOWN;

pub const MICROS_PER_DAY: i64 = 86_400_000_000;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parses one text value into a naive UTC instant. Blank values and the
/// "unknown" fill value are absent instants.
pub fn parse_text_instant(column: &str, raw: &str) -> Result<Option<NaiveDateTime>> {
    let value = raw.trim();
    if value.is_empty() || value == UNKNOWN {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.naive_utc()));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(Some(dt.naive_utc()));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    {
        return Ok(Some(dt));
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    {
        return Ok(date.and_hms_opt(0, 0, 0));
    }

    Err(Error::InvalidTimestamp {
        column: column.to_string(),
        value: raw.to_string(),
    })
}

fn out_of_range(column: &str, value: impl ToString) -> Error {
    Error::InvalidTimestamp {
        column: column.to_string(),
        value: value.to_string(),
    }
}

/// Scales an epoch value to microseconds, rejecting values that overflow.
fn scale_to_micros(column: &str, value: i64, factor: i64) -> Result<i64> {
    value
        .checked_mul(factor)
        .ok_or_else(|| out_of_range(column, value))
}

fn scaled<I>(column: &str, values: I, factor: i64) -> Result<Vec<Option<i64>>>
where
    I: Iterator<Item = Option<i64>>,
{
    values
        .map(|v| v.map(|v| scale_to_micros(column, v, factor)).transpose())
        .collect()
}

/// Converts a text, date, timestamp or numeric column into timezone-naive
/// microsecond instants. Integers and floats are read as epoch nanoseconds
/// (floats truncated) and timezone-aware timestamps keep their UTC wall clock.
pub fn parse_instants(column: &str, array: &ArrayRef) -> Result<TimestampMicrosecondArray> {
    let micros: Vec<Option<i64>> = match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => scaled(
            column,
            array.as_primitive::<TimestampSecondType>().iter(),
            1_000_000,
        )?,
        DataType::Timestamp(TimeUnit::Millisecond, _) => scaled(
            column,
            array.as_primitive::<TimestampMillisecondType>().iter(),
            1_000,
        )?,
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_primitive::<TimestampMicrosecondType>()
            .iter()
            .collect(),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => array
            .as_primitive::<TimestampNanosecondType>()
            .iter()
            .map(|v| v.map(|ns| ns.div_euclid(1_000)))
            .collect(),
        DataType::Date32 => scaled(
            column,
            array
                .as_primitive::<Date32Type>()
                .iter()
                .map(|v| v.map(i64::from)),
            MICROS_PER_DAY,
        )?,
        DataType::Date64 => scaled(column, array.as_primitive::<Date64Type>().iter(), 1_000)?,
        dt if dt.is_integer() => cast(array, &DataType::Int64)?
            .as_primitive::<Int64Type>()
            .iter()
            .map(|v| v.map(|ns| ns.div_euclid(1_000)))
            .collect(),
        dt if dt.is_floating() => cast(array, &DataType::Float64)?
            .as_primitive::<Float64Type>()
            .iter()
            .map(|v| match v {
                Some(ns) if ns.is_nan() => Ok(None),
                // i64::MAX as f64 rounds up to 2^63
                Some(ns) if ns.is_finite() && ns >= i64::MIN as f64 && ns < i64::MAX as f64 => {
                    Ok(Some((ns.trunc() as i64).div_euclid(1_000)))
                }
                Some(ns) => Err(out_of_range(column, ns)),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(array, &DataType::Utf8)?;
            text.as_string::<i32>()
                .iter()
                .map(|v| match v {
                    Some(raw) => Ok(parse_text_instant(column, raw)?
                        .map(|dt| dt.and_utc().timestamp_micros())),
                    None => Ok(None),
                })
                .collect::<Result<Vec<_>>>()?
        }
        other => {
            return Err(Error::UnsupportedColumnType {
                column: column.to_string(),
                data_type: other.to_string(),
            });
        }
    };

    Ok(TimestampMicrosecondArray::from(micros))
}

pub fn hour_of_day(micros: i64) -> Option<u32> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.hour())
}

/// 0 = Monday .. 6 = Sunday
pub fn day_of_week(micros: i64) -> Option<u32> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.weekday().num_days_from_monday())
}

/// Whole days from `micros` to `reference_micros`, rounded down.
pub fn days_between(reference_micros: i64, micros: i64) -> i64 {
    reference_micros
        .saturating_sub(micros)
        .div_euclid(MICROS_PER_DAY)
}

pub fn instant_micros(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}
