//! Feature engineering for building energy prediction.
//!
//! Raw, evenly spaced sensor readings go in; a numeric feature matrix, the
//! aligned target vector and an ordered [`contract::FeatureContract`] come out.
//! Stages run in a fixed order: load, column selection, hour-of-day encoding,
//! lagged exogenous readings, removal of unresolved rows and iterative
//! variance-inflation-factor (VIF) reduction.

pub mod collinearity;
pub mod config;
pub mod contract;
pub mod error;
pub mod features;
pub mod inference;
pub mod metrics;
pub mod pipeline;
pub mod prelude;
pub mod split;

mod polars_ext;
