use polars::prelude::{IntoLazy, col, lit};
use tracing::{debug, warn};

use crate::{
    config::PipelineConfig,
    error::{ConfigError, WattcastResult},
    features::FeatureTable,
    polars_ext::polars_err,
};

/// Name of the lagged copy of `source`, e.g. `T_out_lag1`.
pub fn lag_column_name(source: &str, periods: u32) -> String {
    format!("{source}_lag{periods}")
}

/// Appends a lagged copy of every configured source column that is present.
///
/// Row `i` of the lag column holds row `i - periods` of the source; the
/// leading `periods` rows are null. Absent sources are skipped.
pub fn add_lag_features(table: FeatureTable, cfg: &PipelineConfig) -> WattcastResult<FeatureTable> {
    let periods = cfg.lag_periods();
    if periods == 0 {
        return Err(ConfigError::InvalidLagPeriod(periods).into());
    }

    let mut exprs = Vec::with_capacity(cfg.lag_sources().len());
    for source in cfg.lag_sources() {
        if source == cfg.target_column() {
            return Err(ConfigError::TargetLag(source.clone()).into());
        }
        if !table.has_column(source) {
            warn!(column = %source, "Lag source column not found; skipping lag feature");
            continue;
        }

        let name = lag_column_name(source, periods);
        debug!(source = %source, lag = %name, "Adding lag feature");
        exprs.push(
            col(source.as_str())
                .shift(lit(i64::from(periods)))
                .alias(name.as_str()),
        );
    }

    if exprs.is_empty() {
        return Ok(table);
    }

    let ts = table.timestamp_column().to_string();
    let df = table
        .into_df()
        .lazy()
        .with_columns(exprs)
        .collect()
        .map_err(|e| polars_err("deriving lag features", e))?;

    Ok(FeatureTable::new(df, ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::WattcastError, features::loader::load_frame};
    use polars::prelude::df;

    fn table() -> FeatureTable {
        let raw = df![
            "date" => &["2016-01-11 23:00:00", "2016-01-12 00:00:00", "2016-01-12 01:00:00"],
            "Appliances" => &[60.0, 50.0, 40.0],
            "T_out" => &[10.0, 11.0, 12.0],
        ]
        .expect("Failed to build frame");
        load_frame(raw, &PipelineConfig::default()).expect("Failed to parse timestamps")
    }

    #[test]
    fn lag_copies_previous_reading() {
        let out = add_lag_features(table(), &PipelineConfig::default()).expect("Lag failed");

        let lagged: Vec<Option<f64>> = out
            .as_df()
            .column("T_out_lag1")
            .expect("Missing lag column")
            .f64()
            .expect("Not f64")
            .into_iter()
            .collect();
        assert_eq!(lagged, vec![None, Some(10.0), Some(11.0)]);
    }

    #[test]
    fn absent_source_is_omitted() {
        let out = add_lag_features(table(), &PipelineConfig::default()).expect("Lag failed");

        assert!(!out.has_column("RH_out_lag1"));
        assert_eq!(
            out.column_names(),
            vec!["date", "Appliances", "T_out", "T_out_lag1"]
        );
    }

    #[test]
    fn target_is_never_lagged() {
        let out = add_lag_features(table(), &PipelineConfig::default()).expect("Lag failed");
        assert!(!out.has_column("Appliances_lag1"));

        let leaky = PipelineConfig::default().with_lag_sources(["Appliances"]);
        assert!(matches!(
            add_lag_features(table(), &leaky),
            Err(WattcastError::Config(ConfigError::TargetLag(_)))
        ));
    }

    #[test]
    fn longer_lag_window() {
        let cfg = PipelineConfig::default().with_lag_periods(2);
        let out = add_lag_features(table(), &cfg).expect("Lag failed");

        let lagged: Vec<Option<f64>> = out
            .as_df()
            .column("T_out_lag2")
            .expect("Missing lag column")
            .f64()
            .expect("Not f64")
            .into_iter()
            .collect();
        assert_eq!(lagged, vec![None, None, Some(10.0)]);
    }
}
