use std::f64::consts::TAU;

use polars::prelude::{DataType, Expr, IntoLazy, col, lit};

use crate::{
    error::WattcastResult,
    features::{DerivedCol, FeatureTable},
    polars_ext::polars_err,
};

const HOURS_PER_DAY: f64 = 24.0;

/// Appends `hour`, `hour_sin` and `hour_cos` derived from the timestamp.
///
/// The sine/cosine pair places the hour on the unit circle, so 23:00 and 00:00
/// end up as neighbours instead of opposite ends of a 0..23 scale.
pub fn add_time_features(table: FeatureTable) -> WattcastResult<FeatureTable> {
    let ts = table.timestamp_column().to_string();

    let df = table
        .into_df()
        .lazy()
        .with_column(
            col(ts.as_str())
                .dt()
                .hour()
                .cast(DataType::Int32)
                .alias(DerivedCol::Hour),
        )
        .with_columns([
            hour_angle().sin().alias(DerivedCol::HourSin),
            hour_angle().cos().alias(DerivedCol::HourCos),
        ])
        .collect()
        .map_err(|e| polars_err("deriving time features", e))?;

    Ok(FeatureTable::new(df, ts))
}

/// Cyclical encoding of a single hour, identical to the column expressions.
pub fn cyclical_hour(hour: u32) -> (f64, f64) {
    let angle = TAU * f64::from(hour) / HOURS_PER_DAY;
    (angle.sin(), angle.cos())
}

fn hour_angle() -> Expr {
    lit(TAU) * col(DerivedCol::Hour).cast(DataType::Float64) / lit(HOURS_PER_DAY)
}
