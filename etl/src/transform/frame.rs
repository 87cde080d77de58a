use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Scalar, StringArray,
};
use arrow::compute::kernels::boolean::is_not_null;
use arrow::compute::kernels::zip::zip;
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, Field, Float64Type, Schema};
use arrow::record_batch::RecordBatch;
use common::{Error, Result};
use std::sync::Arc;

/// Fill value for missing text.
pub const UNKNOWN: &str = "unknown";

pub fn is_text(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    )
}

pub fn require_columns(dataset: &str, batch: &RecordBatch, columns: &[&str]) -> Result<()> {
    let schema = batch.schema();
    match columns.iter().find(|name| schema.index_of(name).is_err()) {
        Some(missing) => Err(Error::missing_column(dataset, missing)),
        None => Ok(()),
    }
}

pub fn column<'a>(dataset: &str, batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::missing_column(dataset, name))
}

/// Reads a numeric column as f64, treating null and NaN as 0.
pub fn float_values(dataset: &str, batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let array = column(dataset, batch, name)?;
    if !array.data_type().is_numeric() {
        return Err(Error::UnsupportedColumnType {
            column: name.to_string(),
            data_type: array.data_type().to_string(),
        });
    }

    let floats = cast(array, &DataType::Float64)?;
    Ok(floats
        .as_primitive::<Float64Type>()
        .iter()
        .map(|v| v.filter(|x| !x.is_nan()).unwrap_or(0.0))
        .collect())
}

/// Replaces `name` in place, or appends it when the batch has no such column.
pub fn with_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();
    let field = Field::new(name, array.data_type().clone(), true);

    match schema.index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// Fills nulls in every numeric column with 0 (or the per-column default in
/// `numeric_defaults`) and in every text column with "unknown". Other column
/// types are left untouched.
pub fn fill_nulls(batch: &RecordBatch, numeric_defaults: &[(&str, f64)]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let columns = schema
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(field, array)| {
            let data_type = field.data_type();
            if data_type.is_numeric() {
                let value = numeric_defaults
                    .iter()
                    .find(|(name, _)| field.name() == name)
                    .map(|(_, value)| *value)
                    .unwrap_or(0.0);
                fill_numeric(array, value)
            } else if is_text(data_type) {
                fill_text(array)
            } else {
                Ok(array.clone())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn fill_numeric(array: &ArrayRef, value: f64) -> Result<ArrayRef> {
    match array.data_type() {
        // NaN counts as missing for floats
        DataType::Float32 | DataType::Float64 => {
            let filled: Float64Array = cast(array, &DataType::Float64)?
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| Some(v.filter(|x| !x.is_nan()).unwrap_or(value)))
                .collect();
            Ok(cast(&filled, array.data_type())?)
        }
        data_type => {
            if array.null_count() == 0 {
                return Ok(array.clone());
            }
            let fill = cast(&Float64Array::from(vec![value]), data_type)?;
            let mask = is_not_null(array.as_ref())?;
            Ok(zip(&mask, array, &Scalar::new(fill))?)
        }
    }
}

fn fill_text(array: &ArrayRef) -> Result<ArrayRef> {
    if array.null_count() == 0 {
        return Ok(array.clone());
    }
    let fill = cast(&StringArray::from(vec![UNKNOWN]), array.data_type())?;
    let mask = is_not_null(array.as_ref())?;
    Ok(zip(&mask, array, &Scalar::new(fill))?)
}

/// Renders any column as Utf8 text; nulls become "unknown". Booleans are
/// written as "True" and "False".
pub fn to_text(array: &ArrayRef) -> Result<ArrayRef> {
    let text = match array.data_type() {
        DataType::Boolean => {
            let rendered: StringArray = array
                .as_boolean()
                .iter()
                .map(|v| v.map(|b| if b { "True" } else { "False" }))
                .collect();
            Arc::new(rendered) as ArrayRef
        }
        _ => cast(array, &DataType::Utf8)?,
    };
    fill_text(&text)
}

pub fn filter_rows(batch: &RecordBatch, keep: Vec<bool>) -> Result<RecordBatch> {
    Ok(filter_record_batch(batch, &BooleanArray::from(keep))?)
}
