use polars::prelude::{DataFrame, DataType, PolarsError};

use crate::error::{DataFormatError, SchemaError, WattcastError, WattcastResult};

pub(crate) fn polars_err(stage: &str, e: PolarsError) -> WattcastError {
    WattcastError::DataFormat(DataFormatError::DataFrame(format!(
        "Error while {stage}: {e}"
    )))
}

pub(crate) fn is_numeric(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric()
}

pub trait DataFrameExt {
    /// Column names in frame order, as owned strings.
    fn column_names(&self) -> Vec<String>;

    /// Reads a numeric column as `f64` values.
    ///
    /// Fails if the column is missing, non-numeric, or holds a null.
    fn float_values(&self, name: &str) -> WattcastResult<Vec<f64>>;
}

impl DataFrameExt for DataFrame {
    fn column_names(&self) -> Vec<String> {
        self.get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect()
    }

    fn float_values(&self, name: &str) -> WattcastResult<Vec<f64>> {
        let column = self
            .column(name)
            .map_err(|_| SchemaError::MissingColumn(name.to_string()))?;

        if !is_numeric(column.dtype()) {
            return Err(DataFormatError::NonNumericColumn {
                column: name.to_string(),
                dtype: column.dtype().to_string(),
            }
            .into());
        }

        let casted = column
            .cast(&DataType::Float64)
            .map_err(|e| polars_err("casting column to f64", e))?;
        let values = casted
            .f64()
            .map_err(|e| polars_err("reading f64 column", e))?;

        values
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| {
                    DataFormatError::UnresolvedValue {
                        column: name.to_string(),
                        row,
                    }
                    .into()
                })
            })
            .collect()
    }
}
