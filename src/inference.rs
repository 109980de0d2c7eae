use std::collections::HashMap;

use chrono::{NaiveDateTime, Timelike};

use crate::{
    config::PipelineConfig,
    contract::FeatureContract,
    error::WattcastResult,
    features::{DerivedCol, lag::lag_column_name, time::cyclical_hour},
};

/// Named feature values for a single prediction request.
///
/// Derived features are computed with the same formulas the batch pipeline
/// uses, so the result can be checked against a [`FeatureContract`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceFeatures {
    values: HashMap<String, f64>,
}

impl InferenceFeatures {
    /// Builds features for one reading taken at `timestamp`.
    ///
    /// `history` holds earlier readings, most recent first, one per sampling
    /// interval. A lag of `n` periods reads `history[n - 1]`, which is the row
    /// the batch shift would pull in; the lag is omitted when that reading is
    /// absent or lacks the source column. The target and any configured drop
    /// column are never copied into the feature values.
    pub fn from_reading(
        timestamp: NaiveDateTime,
        readings: &HashMap<String, f64>,
        history: &[&HashMap<String, f64>],
        cfg: &PipelineConfig,
    ) -> Self {
        let mut values: HashMap<String, f64> = readings
            .iter()
            .filter(|(name, _)| {
                name.as_str() != cfg.target_column() && !cfg.drop_columns().contains(name)
            })
            .map(|(name, value)| (name.clone(), *value))
            .collect();

        let hour = timestamp.hour();
        let (sin, cos) = cyclical_hour(hour);
        values.insert(DerivedCol::Hour.to_string(), f64::from(hour));
        values.insert(DerivedCol::HourSin.to_string(), sin);
        values.insert(DerivedCol::HourCos.to_string(), cos);

        let periods = cfg.lag_periods();
        let lagged = usize::try_from(periods)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| history.get(i));
        if let Some(lagged) = lagged {
            for source in cfg.lag_sources() {
                if let Some(value) = lagged.get(source) {
                    values.insert(lag_column_name(source, periods), *value);
                }
            }
        }

        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn values(&self) -> &HashMap<String, f64> {
        &self.values
    }

    /// Keeps only the features named by `contract`.
    ///
    /// Raw readings that the reducer removed are dropped here; anything the
    /// contract needs but the request lacks still fails in [`Self::to_vector`].
    pub fn restrict_to(mut self, contract: &FeatureContract) -> Self {
        self.values.retain(|name, _| contract.contains(name));
        self
    }

    /// The feature vector in contract order.
    pub fn to_vector(&self, contract: &FeatureContract) -> WattcastResult<Vec<f64>> {
        contract.assemble(&self.values)
    }
}
