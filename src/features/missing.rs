use polars::prelude::{IntoLazy, col};
use tracing::info;

use crate::{error::WattcastResult, features::FeatureTable, polars_ext::polars_err};

/// Removes every row holding a null (or a NaN in a float column).
///
/// After lagging these are exactly the leading `lag_periods` rows. Polars
/// frames carry no index, so the surviving rows are contiguous from zero.
pub fn drop_unresolved(table: FeatureTable) -> WattcastResult<FeatureTable> {
    let predicate = table
        .as_df()
        .schema()
        .iter()
        .map(|(name, dtype)| {
            let resolved = col(name.clone()).is_not_null();
            if dtype.is_float() {
                resolved.and(col(name.clone()).is_not_nan())
            } else {
                resolved
            }
        })
        .reduce(|acc, expr| acc.and(expr));

    let Some(predicate) = predicate else {
        return Ok(table);
    };

    let before = table.height();
    let ts = table.timestamp_column().to_string();
    let df = table
        .into_df()
        .lazy()
        .filter(predicate)
        .collect()
        .map_err(|e| polars_err("dropping unresolved rows", e))?;

    info!(
        dropped = before - df.height(),
        remaining = df.height(),
        "Dropped rows with unresolved values"
    );

    Ok(FeatureTable::new(df, ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PipelineConfig,
        features::{lag::add_lag_features, loader::load_frame, time::add_time_features},
    };
    use polars::prelude::df;

    #[test]
    fn drops_leading_lag_rows() {
        let raw = df![
            "date" => &["2016-01-11 23:00:00", "2016-01-12 00:00:00", "2016-01-12 01:00:00"],
            "Appliances" => &[60.0, 50.0, 40.0],
            "T_out" => &[10.0, 11.0, 12.0],
        ]
        .expect("Failed to build frame");
        let cfg = PipelineConfig::default();

        let table = load_frame(raw, &cfg).expect("Load failed");
        let table = add_time_features(table).expect("Time features failed");
        let table = add_lag_features(table, &cfg).expect("Lag failed");
        let out = drop_unresolved(table).expect("Resolver failed");

        assert_eq!(out.height(), 2);

        let df = out.as_df();
        let lag: Vec<f64> = df
            .column("T_out_lag1")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let hours: Vec<i32> = df
            .column("hour")
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();

        assert_eq!(hours, vec![0, 1]);
        assert_eq!(lag, vec![10.0, 11.0]);
    }

    #[test]
    fn drops_nan_and_null_rows_anywhere() {
        let raw = df![
            "date" => &["2016-01-12 00:00:00", "2016-01-12 01:00:00", "2016-01-12 02:00:00", "2016-01-12 03:00:00"],
            "Appliances" => &[Some(60i64), None, Some(40), Some(30)],
            "T1" => &[1.0, 2.0, f64::NAN, 4.0],
        ]
        .expect("Failed to build frame");

        let table = load_frame(raw, &PipelineConfig::default()).expect("Load failed");
        let out = drop_unresolved(table).expect("Resolver failed");

        assert_eq!(out.height(), 2);
        let kept: Vec<f64> = out
            .as_df()
            .column("T1")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(kept, vec![1.0, 4.0]);
    }

    #[test]
    fn complete_table_is_unchanged() {
        let raw = df![
            "date" => &["2016-01-12 00:00:00", "2016-01-12 01:00:00"],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");

        let table = load_frame(raw, &PipelineConfig::default()).expect("Load failed");
        let out = drop_unresolved(table.clone()).expect("Resolver failed");

        assert!(out.as_df().equals(table.as_df()));
    }
}
