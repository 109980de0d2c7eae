use polars::prelude::DataFrame;
use tracing::debug;

use crate::{
    config::PipelineConfig,
    error::{SchemaError, WattcastResult},
    features::FeatureTable,
    polars_ext::{is_numeric, polars_err},
};

/// Keeps numeric columns in their original order, then the timestamp.
///
/// Configured non-predictive columns are removed when present. The target
/// must exist and be numeric.
pub fn select_columns(table: FeatureTable, cfg: &PipelineConfig) -> WattcastResult<FeatureTable> {
    let target = cfg.target_column();
    let df = table.as_df();

    let target_col = df
        .column(target)
        .map_err(|_| SchemaError::MissingTarget(target.to_string()))?;
    if !is_numeric(target_col.dtype()) {
        return Err(SchemaError::NonNumericTarget {
            column: target.to_string(),
            dtype: target_col.dtype().to_string(),
        }
        .into());
    }

    let ts = table.timestamp_column().to_string();
    let mut keep = numeric_columns(df);
    keep.retain(|name| name != &ts && !cfg.drop_columns().contains(name));

    let discarded: Vec<String> = table
        .column_names()
        .into_iter()
        .filter(|name| name != &ts && !keep.contains(name))
        .collect();
    if !discarded.is_empty() {
        debug!(?discarded, "Discarded non-feature columns");
    }

    keep.push(ts.clone());
    let selected = df
        .select(keep)
        .map_err(|e| polars_err("selecting feature columns", e))?;

    Ok(FeatureTable::new(selected, ts))
}

fn numeric_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| is_numeric(column.dtype()))
        .map(|column| column.name().to_string())
        .collect()
}
