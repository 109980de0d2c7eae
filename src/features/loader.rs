use std::path::Path;

use polars::prelude::{
    CsvReadOptions, DataFrame, DataType, IntoLazy, SerReader, StrptimeOptions, TimeUnit, col, lit,
};
use tracing::info;

use crate::{
    config::PipelineConfig,
    error::{DataFormatError, WattcastResult},
    features::FeatureTable,
};

/// Reads a delimited file with a header row and parses its timestamp column.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_csv(path: impl AsRef<Path>, cfg: &PipelineConfig) -> WattcastResult<FeatureTable> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(cfg.infer_schema_length()))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .map_err(|e| DataFormatError::Read(e.to_string()))?
        .finish()
        .map_err(|e| DataFormatError::Read(e.to_string()))?;

    info!(rows = df.height(), columns = df.width(), "Loaded raw readings");
    load_frame(df, cfg)
}

/// Parses the timestamp column of an in-memory frame.
///
/// String timestamps are parsed strictly, with the configured format or, when
/// none is set, a format polars infers from the first value. `Date` columns
/// are widened to midnight and `Datetime` columns pass through.
pub fn load_frame(df: DataFrame, cfg: &PipelineConfig) -> WattcastResult<FeatureTable> {
    let ts = cfg.timestamp_column();
    let dtype = df
        .column(ts)
        .map_err(|_| DataFormatError::MissingTimestamp(ts.to_string()))?
        .dtype()
        .clone();

    let parsed = match dtype {
        DataType::Datetime(_, _) => df,
        DataType::Date => df
            .lazy()
            .with_column(col(ts).cast(DataType::Datetime(TimeUnit::Microseconds, None)))
            .collect()
            .map_err(|e| unparseable(cfg, e))?,
        DataType::String => {
            let options = StrptimeOptions {
                format: cfg.timestamp_format().map(Into::into),
                strict: true,
                ..Default::default()
            };
            df.lazy()
                .with_column(col(ts).str().to_datetime(
                    Some(TimeUnit::Microseconds),
                    None,
                    options,
                    lit("raise"),
                ))
                .collect()
                .map_err(|e| unparseable(cfg, e))?
        }
        other => {
            return Err(DataFormatError::UnsupportedTimestampType {
                column: ts.to_string(),
                dtype: other.to_string(),
            }
            .into());
        }
    };

    let nulls = parsed
        .column(ts)
        .map_err(|_| DataFormatError::MissingTimestamp(ts.to_string()))?
        .null_count();
    if nulls > 0 {
        return Err(DataFormatError::NullTimestamp {
            column: ts.to_string(),
            count: nulls,
        }
        .into());
    }

    Ok(FeatureTable::new(parsed, ts))
}

fn unparseable(cfg: &PipelineConfig, e: polars::error::PolarsError) -> DataFormatError {
    DataFormatError::UnparseableTimestamp {
        column: cfg.timestamp_column().to_string(),
        format: cfg.timestamp_format().unwrap_or("inferred").to_string(),
        msg: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WattcastError;
    use chrono::NaiveDate;
    use polars::prelude::df;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        for line in lines {
            writeln!(file, "{line}").expect("Failed to write line");
        }
        file
    }

    #[test]
    fn test_load_csv_parses_timestamps() {
        let file = write_csv(&[
            "date,Appliances,T_out",
            "2016-01-11 17:00:00,60,6.6",
            "2016-01-11 17:10:00,60,6.48",
        ]);

        let table = load_csv(file.path(), &PipelineConfig::default()).expect("Load failed");

        assert_eq!(table.height(), 2);
        assert_eq!(table.timestamp_column(), "date");
        assert!(matches!(
            table.as_df().column("date").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn test_missing_timestamp_column() {
        let file = write_csv(&["Appliances,T_out", "60,6.6"]);

        let result = load_csv(file.path(), &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(WattcastError::DataFormat(DataFormatError::MissingTimestamp(name))) if name == "date"
        ));
    }

    #[test]
    fn test_unparseable_timestamp() {
        let df = df![
            "date" => &["2016-01-11 17:00:00", "not a date"],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");

        let result = load_frame(df, &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(WattcastError::DataFormat(DataFormatError::UnparseableTimestamp { .. }))
        ));
    }

    #[test]
    fn test_null_timestamp_is_rejected() {
        let df = df![
            "date" => &[Some("2016-01-11 17:00:00"), None],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");

        let result = load_frame(df, &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(WattcastError::DataFormat(DataFormatError::NullTimestamp { count: 1, .. }))
        ));
    }

    #[test]
    fn test_numeric_timestamp_is_rejected() {
        let df = df![
            "date" => &[1i64, 2],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");

        let result = load_frame(df, &PipelineConfig::default());
        assert!(matches!(
            result,
            Err(WattcastError::DataFormat(DataFormatError::UnsupportedTimestampType { .. }))
        ));
    }

    #[test]
    fn test_custom_timestamp_format() {
        let cfg = PipelineConfig::default().with_timestamp_format("%d/%m/%Y %H:%M");
        let df = df![
            "date" => &["11/01/2016 17:00", "11/01/2016 18:00"],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");

        let table = load_frame(df, &cfg).expect("Load failed");
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn test_inferred_format_accepts_iso_and_short_stamps() {
        let iso = df![
            "date" => &["2016-01-11T17:00:00", "2016-01-11T18:00:00"],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");
        let no_seconds = df![
            "date" => &["2016-01-11 17:00", "2016-01-11 18:00"],
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");

        for df in [iso, no_seconds] {
            let table = load_frame(df, &PipelineConfig::default()).expect("Load failed");
            assert!(matches!(
                table.as_df().column("date").unwrap().dtype(),
                DataType::Datetime(_, _)
            ));
            assert_eq!(table.as_df().column("date").unwrap().null_count(), 0);
        }
    }

    #[test]
    fn test_date_column_is_widened_to_midnight() {
        let days = [
            NaiveDate::from_ymd_opt(2016, 1, 11).unwrap(),
            NaiveDate::from_ymd_opt(2016, 1, 12).unwrap(),
        ];
        let df = df![
            "date" => &days,
            "Appliances" => &[60i64, 50],
        ]
        .expect("Failed to build frame");
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let table = load_frame(df, &PipelineConfig::default()).expect("Load failed");
        let micros = table
            .as_df()
            .column("date")
            .unwrap()
            .cast(&DataType::Int64)
            .expect("Cast failed");
        let micros = micros.as_materialized_series().i64().expect("Not i64");

        let midnight = days[0].and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp_micros();
        assert_eq!(micros.get(0), Some(midnight));
        assert_eq!(micros.get(1), Some(midnight + 86_400_000_000));
    }
}
