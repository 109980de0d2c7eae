//! Stage-by-stage construction of the feature table.
//!
//! Each submodule is one pipeline stage taking a [`FeatureTable`] by value and
//! returning the next one. Columns are appended or dropped; rows are only ever
//! removed after loading.

pub mod lag;
pub mod loader;
pub mod missing;
pub mod selector;
pub mod time;

use polars::prelude::{DataFrame, PlSmallStr};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::polars_ext::DataFrameExt;

// ================================================================================================
// Well-known Columns
// ================================================================================================

/// Columns of the appliances-energy dataset the pipeline treats specially.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
pub enum EnergyCol {
    /// Reading timestamp.
    #[strum(serialize = "date")]
    Timestamp,
    /// Appliance energy use in Wh. The prediction target.
    #[strum(serialize = "Appliances")]
    Appliances,
    /// Light fixture energy use in Wh. A proxy for occupancy, not an independent feature.
    #[strum(serialize = "lights")]
    Lights,
    #[strum(serialize = "Lights")]
    LightsCapitalized,
    /// Outdoor temperature from the nearest weather station.
    #[strum(serialize = "T_out")]
    OutdoorTemperature,
    /// Outdoor relative humidity from the nearest weather station.
    #[strum(serialize = "RH_out")]
    OutdoorHumidity,
}

/// Columns the pipeline derives from the timestamp.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum DerivedCol {
    /// Hour of day, 0 to 23.
    Hour,
    /// `sin(2π · hour / 24)`.
    HourSin,
    /// `cos(2π · hour / 24)`.
    HourCos,
}

impl From<EnergyCol> for PlSmallStr {
    fn from(value: EnergyCol) -> Self {
        value.as_str().into()
    }
}

impl From<DerivedCol> for PlSmallStr {
    fn from(value: DerivedCol) -> Self {
        value.as_str().into()
    }
}

impl EnergyCol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl DerivedCol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

// ================================================================================================
// Feature Table
// ================================================================================================

/// A data frame of readings plus the name of its parsed timestamp column.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    df: DataFrame,
    timestamp: String,
}

impl FeatureTable {
    pub(crate) fn new(df: DataFrame, timestamp: impl Into<String>) -> Self {
        Self {
            df,
            timestamp: timestamp.into(),
        }
    }

    pub fn as_df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn timestamp_column(&self) -> &str {
        &self.timestamp
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df.column_names()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.column(name).is_ok()
    }
}
