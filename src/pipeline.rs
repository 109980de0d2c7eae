use std::{fs::File, path::Path};

use polars::prelude::{
    Column, CsvWriter, DataFrame, DataType, IntoColumn, PolarsResult, SerWriter, Series,
};
use tracing::info;

use crate::{
    collinearity::{ReductionStep, reduce_collinearity},
    config::PipelineConfig,
    contract::FeatureContract,
    error::{DataFormatError, IoError, SchemaError, WattcastResult},
    features::{
        FeatureTable, lag::add_lag_features, loader, missing::drop_unresolved,
        selector::select_columns, time::add_time_features,
    },
    polars_ext::polars_err,
};

// ================================================================================================
// Feature Set
// ================================================================================================

/// Output of one pipeline run: a model-ready feature matrix, the aligned
/// target vector and the ordered feature-name contract.
///
/// All feature columns are `Float64`. Row `i` of `features`, `target` and
/// `timestamps` describe the same reading.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    features: DataFrame,
    target: Series,
    timestamps: Series,
    contract: FeatureContract,
    removed: Vec<String>,
    steps: Vec<ReductionStep>,
}

impl FeatureSet {
    pub fn features(&self) -> &DataFrame {
        &self.features
    }

    pub fn target(&self) -> &Series {
        &self.target
    }

    pub fn timestamps(&self) -> &Series {
        &self.timestamps
    }

    pub fn contract(&self) -> &FeatureContract {
        &self.contract
    }

    /// Final feature names in column order.
    pub fn feature_names(&self) -> &[String] {
        self.contract.names()
    }

    /// Features removed by the collinearity reducer, in removal order.
    pub fn removed(&self) -> &[String] {
        &self.removed
    }

    pub fn steps(&self) -> &[ReductionStep] {
        &self.steps
    }

    pub fn height(&self) -> usize {
        self.features.height()
    }

    /// Rows `offset..offset + len`, sharing the contract and reduction history.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let offset = offset as i64;
        Self {
            features: self.features.slice(offset, len),
            target: self.target.slice(offset, len),
            timestamps: self.timestamps.slice(offset, len),
            contract: self.contract.clone(),
            removed: self.removed.clone(),
            steps: self.steps.clone(),
        }
    }

    /// Timestamp, target and features side by side, in that order.
    pub fn to_frame(&self) -> WattcastResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.features.width() + 2);
        columns.push(self.timestamps.clone().into_column());
        columns.push(self.target.clone().into_column());
        columns.extend(self.features.get_columns().iter().cloned());

        DataFrame::new(columns).map_err(|e| polars_err("assembling feature set frame", e))
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> WattcastResult<()> {
        let mut df = self.to_frame()?;
        let mut file = File::create(path.as_ref()).map_err(IoError::Io)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| IoError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}

// ================================================================================================
// Pipeline
// ================================================================================================

/// Runs load, selection, time and lag derivation, row resolution and
/// collinearity reduction in sequence. The first failing stage aborts the run.
///
/// # Example
///
/// ```no_run
/// # use wattcast::prelude::*;
/// # fn main() -> WattcastResult<()> {
/// let pipeline = FeaturePipeline::new(PipelineConfig::default())?;
/// let set = pipeline.run_csv("data/energydata_complete.csv")?;
///
/// set.contract().save_json("models/feature_names.json")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FeaturePipeline {
    cfg: PipelineConfig,
}

impl FeaturePipeline {
    pub fn new(cfg: PipelineConfig) -> WattcastResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    #[tracing::instrument(name = "Feature pipeline", skip_all, fields(path = %path.as_ref().display()))]
    pub fn run_csv(&self, path: impl AsRef<Path>) -> WattcastResult<FeatureSet> {
        let table = loader::load_csv(path, &self.cfg)?;
        self.run_table(table)
    }

    #[tracing::instrument(name = "Feature pipeline", skip_all, fields(rows = df.height(), columns = df.width()))]
    pub fn run_frame(&self, df: DataFrame) -> WattcastResult<FeatureSet> {
        let table = loader::load_frame(df, &self.cfg)?;
        self.run_table(table)
    }

    fn run_table(&self, table: FeatureTable) -> WattcastResult<FeatureSet> {
        let cfg = &self.cfg;

        let table = select_columns(table, cfg)?;
        info!(rows = table.height(), columns = table.width(), "Selected numeric columns");

        let table = add_time_features(table)?;
        let table = add_lag_features(table, cfg)?;
        info!(columns = table.width(), "Derived time and lag features");

        let table = drop_unresolved(table)?;
        if table.height() == 0 {
            return Err(DataFormatError::InsufficientRows {
                rows: 0,
                required: 1,
            }
            .into());
        }

        let (features, target, timestamps) = split_target(table, cfg)?;
        let reduction = reduce_collinearity(&features, cfg.vif())?;
        let (features, removed, steps) = reduction.into_parts();

        let names: Vec<String> = features
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        info!(
            rows = features.height(),
            features = ?names,
            removed = ?removed,
            "Feature set ready"
        );

        Ok(FeatureSet {
            features,
            target,
            timestamps,
            contract: FeatureContract::new(names),
            removed,
            steps,
        })
    }
}

/// Convenience wrapper: validate `cfg` and run the pipeline on a CSV file.
pub fn build_features(path: impl AsRef<Path>, cfg: &PipelineConfig) -> WattcastResult<FeatureSet> {
    FeaturePipeline::new(cfg.clone())?.run_csv(path)
}

/// Separates the target and timestamp from the remaining columns, which are
/// widened to `Float64`.
fn split_target(
    table: FeatureTable,
    cfg: &PipelineConfig,
) -> WattcastResult<(DataFrame, Series, Series)> {
    let ts = table.timestamp_column().to_string();
    let target_name = cfg.target_column();
    let df = table.into_df();

    let target = df
        .column(target_name)
        .map_err(|_| SchemaError::MissingTarget(target_name.to_string()))?
        .cast(&DataType::Float64)
        .map_err(|e| polars_err("casting target to f64", e))?
        .as_materialized_series()
        .clone();
    let timestamps = df
        .column(&ts)
        .map_err(|_| DataFormatError::MissingTimestamp(ts.clone()))?
        .as_materialized_series()
        .clone();

    let features = df
        .get_columns()
        .iter()
        .filter(|column| column.name().as_str() != target_name && column.name().as_str() != ts)
        .map(|column| column.cast(&DataType::Float64))
        .collect::<PolarsResult<Vec<Column>>>()
        .and_then(DataFrame::new)
        .map_err(|e| polars_err("building feature matrix", e))?;

    Ok((features, target, timestamps))
}
