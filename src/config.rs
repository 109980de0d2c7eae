use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    collinearity::VifOptions,
    error::{ConfigError, IoError, WattcastResult},
    features::EnergyCol,
};

/// Configuration blueprint for a feature engineering run.
///
/// Every field has a default matching the appliances-energy dataset layout,
/// so `PipelineConfig::default()` is enough for the common case.
///
/// # Example
///
/// ```
/// # use wattcast::prelude::*;
/// let cfg = PipelineConfig::default()
///     .with_vif_threshold(5.0)
///     .with_lag_sources(["T_out"]);
///
/// assert!(cfg.validate().is_ok());
/// assert_eq!(cfg.vif().threshold(), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // ========================================================================
    // Input Layout
    // ========================================================================
    timestamp_column: String,
    /// strftime layout; when unset the loader infers it from the data.
    timestamp_format: Option<String>,
    target_column: String,
    /// Rows scanned by the CSV reader to infer column dtypes.
    infer_schema_length: usize,

    // ========================================================================
    // Feature Derivation
    // ========================================================================
    /// Non-predictive columns removed when present.
    drop_columns: Vec<String>,
    /// Exogenous columns receiving a lagged copy.
    lag_sources: Vec<String>,
    lag_periods: u32,

    // ========================================================================
    // Collinearity Reduction
    // ========================================================================
    vif: VifOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timestamp_column: EnergyCol::Timestamp.to_string(),
            timestamp_format: None,
            target_column: EnergyCol::Appliances.to_string(),
            infer_schema_length: 10_000,
            drop_columns: vec![
                EnergyCol::Lights.to_string(),
                EnergyCol::LightsCapitalized.to_string(),
            ],
            lag_sources: vec![
                EnergyCol::OutdoorTemperature.to_string(),
                EnergyCol::OutdoorHumidity.to_string(),
            ],
            lag_periods: 1,
            vif: VifOptions::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_timestamp_column(mut self, name: impl Into<String>) -> Self {
        self.timestamp_column = name.into();
        self
    }

    pub fn with_timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    pub fn with_target_column(mut self, name: impl Into<String>) -> Self {
        self.target_column = name.into();
        self
    }

    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows;
        self
    }

    pub fn with_drop_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.drop_columns = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lag_sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lag_sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lag_periods(mut self, periods: u32) -> Self {
        self.lag_periods = periods;
        self
    }

    pub fn with_vif_threshold(mut self, threshold: f64) -> Self {
        self.vif = self.vif.with_threshold(threshold);
        self
    }

    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.vif = self.vif.with_fit_intercept(fit_intercept);
        self
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp_column
    }

    pub fn timestamp_format(&self) -> Option<&str> {
        self.timestamp_format.as_deref()
    }

    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    pub fn infer_schema_length(&self) -> usize {
        self.infer_schema_length
    }

    pub fn drop_columns(&self) -> &[String] {
        &self.drop_columns
    }

    pub fn lag_sources(&self) -> &[String] {
        &self.lag_sources
    }

    pub fn lag_periods(&self) -> u32 {
        self.lag_periods
    }

    pub fn vif(&self) -> VifOptions {
        self.vif
    }

    /// Checks the invariants every stage relies on.
    ///
    /// The target and the timestamp may never be lag sources: a lagged target
    /// leaks the label into the feature set.
    pub fn validate(&self) -> WattcastResult<()> {
        self.vif.validate()?;

        if self.lag_periods == 0 {
            return Err(ConfigError::InvalidLagPeriod(self.lag_periods).into());
        }

        for source in &self.lag_sources {
            if source == &self.target_column {
                return Err(ConfigError::TargetLag(source.clone()).into());
            }
            if source == &self.timestamp_column {
                return Err(ConfigError::TimestampLag(source.clone()).into());
            }
        }

        Ok(())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> WattcastResult<Self> {
        let raw = fs::read_to_string(path).map_err(IoError::Io)?;
        let cfg: Self = serde_json::from_str(&raw).map_err(IoError::Json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_file(&self, path: impl AsRef<Path>) -> WattcastResult<()> {
        let raw = serde_json::to_string_pretty(self).map_err(IoError::Json)?;
        fs::write(path, raw).map_err(IoError::Io)?;
        Ok(())
    }
}
